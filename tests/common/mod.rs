#![allow(dead_code)]

use std::path::PathBuf;

use notify::event::{DataChange, ModifyKind};
use notify::{Event, EventKind};
use tokio::sync::mpsc;

use aldev::watch::{WatchHandle, WatchMessage};

pub use aldev_test_utils::builders::{write_config, AldevConfigBuilder};
pub use aldev_test_utils::fake_deployer::{DeployCall, FakeDeployer};
pub use aldev_test_utils::{init_tracing, with_timeout};

/// A watch handle fed by hand instead of by the OS.
pub fn fake_watch(paths: &[&str]) -> (mpsc::UnboundedSender<WatchMessage>, WatchHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    let paths = paths.iter().map(PathBuf::from).collect();
    (tx, WatchHandle::from_channel(paths, rx))
}

/// What an editor saving `path` looks like.
pub fn write_event(path: &str) -> Event {
    Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(PathBuf::from(path))
}
