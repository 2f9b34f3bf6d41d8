use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aldev::deploy::{DeployFuture, Deployer};
use aldev::errors::AldevError;
use aldev::lifecycle::LoopContext;

/// One call made to the fake, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployCall {
    Prepare(u64),
    Run(u64),
    Teardown,
}

/// A fake deployer that:
/// - records every call it gets
/// - "runs" until its scope is cancelled, like `tilt up`
/// - can be told to fail while preparing, or to panic while running.
#[derive(Debug, Clone, Default)]
pub struct FakeDeployer {
    calls: Arc<Mutex<Vec<DeployCall>>>,
    fail_prepare: Arc<AtomicBool>,
    panic_on_run: Arc<AtomicBool>,
    teardown_delay: Duration,
}

impl FakeDeployer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_prepare(self) -> Self {
        self.fail_prepare.store(true, Ordering::SeqCst);
        self
    }

    pub fn panicking_run(self) -> Self {
        self.panic_on_run.store(true, Ordering::SeqCst);
        self
    }

    /// Make every teardown take this long.
    pub fn with_teardown_delay(mut self, delay: Duration) -> Self {
        self.teardown_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<DeployCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: DeployCall) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    pub fn teardowns(&self) -> usize {
        self.count(DeployCall::Teardown)
    }

    /// Generations that reached the running state.
    pub fn runs(&self) -> Vec<u64> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                DeployCall::Run(g) => Some(*g),
                _ => None,
            })
            .collect()
    }

    /// Poll until `pred` holds on the recorded calls.
    pub async fn wait_until<F>(&self, pred: F)
    where
        F: Fn(&[DeployCall]) -> bool,
    {
        while !pred(&self.calls()) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn record(&self, call: DeployCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Deployer for FakeDeployer {
    fn prepare<'a>(&'a self, scope: &'a LoopContext) -> DeployFuture<'a> {
        Box::pin(async move {
            self.record(DeployCall::Prepare(scope.generation().unwrap_or_default()));
            if self.fail_prepare.load(Ordering::SeqCst) {
                return Err(AldevError::ConfigError("fake prepare failure".to_string()));
            }
            Ok(())
        })
    }

    fn run<'a>(&'a self, scope: &'a LoopContext) -> DeployFuture<'a> {
        Box::pin(async move {
            self.record(DeployCall::Run(scope.generation().unwrap_or_default()));
            if self.panic_on_run.load(Ordering::SeqCst) {
                panic!("fake deployer panicked while running");
            }
            scope.cancelled().await;
            Ok(())
        })
    }

    fn teardown(&self) -> DeployFuture<'_> {
        Box::pin(async move {
            self.record(DeployCall::Teardown);
            if !self.teardown_delay.is_zero() {
                tokio::time::sleep(self.teardown_delay).await;
            }
            Ok(())
        })
    }
}
