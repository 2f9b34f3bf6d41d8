// src/lib.rs

pub mod cli;
pub mod codegen;
pub mod codeswap;
pub mod confgen;
pub mod config;
pub mod deploy;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod githooks;
pub mod i18n;
pub mod init;
pub mod lifecycle;
pub mod logging;
pub mod templates;
pub mod types;
pub mod vendors;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{load_and_validate, AldevConfig};
use crate::deploy::{Deployer, TiltDeployer};
use crate::engine::Supervisor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::lifecycle::Lifecycle;
use crate::types::RunOptions;
use crate::watch::{run_watch_loop, watch_paths, DebounceCache, WatchHandle};

/// Grace period between the loop cancellation and the final stop.
pub const LIFECYCLE_GRACE_MS: u64 = 100;

/// High-level entry point used by `main.rs`: dispatch to the subcommand,
/// or run the watch-and-deploy loop when there is none.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let options = args.run_options();
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    debug!(?options, config = %config_path.display(), command = ?args.command, "starting");

    match &args.command {
        None => watch_and_deploy(&config_path, options, fs).await,
        Some(Command::Confgen) => {
            let cfg = load_and_validate(&config_path)?;
            confgen::generate_deploy_configs(&cfg, fs.as_ref()).await?;
            Ok(())
        }
        Some(Command::Deploylocal) => deploy_local(&config_path, options, fs).await,
        Some(Command::Refresh) => {
            let cfg = load_and_validate(&config_path)?;
            refresh(&cfg, fs.as_ref()).await
        }
        Some(Command::Codeswap) => {
            let cfg = load_and_validate(&config_path)?;
            codeswap::run_codeswap(cfg, fs).await?;
            Ok(())
        }
        Some(Command::Codegen(codegen_args)) => {
            let cfg = load_and_validate(&config_path)?;
            codegen::run_codegen(&cfg, codegen_args.into()).await?;
            Ok(())
        }
        Some(Command::Init(init_args)) => {
            init::run_init(&init_args.into(), fs.as_ref()).await?;
            Ok(())
        }
    }
}

/// The default command: deploy, then redeploy on every change of the aldev
/// config or the API config, until a termination signal.
pub async fn watch_and_deploy(
    config_path: &Path,
    options: RunOptions,
    fs: Arc<dyn FileSystem>,
) -> Result<()> {
    let cfg = load_and_validate(config_path)?;
    githooks::install_git_hooks(&cfg, Path::new("."), fs.as_ref())?;

    let mut watched = vec![config_path.to_path_buf()];
    watched.extend(cfg.api_config_path());
    let handle = watch_paths(&watched)?;

    let lifecycle = Lifecycle::start(LIFECYCLE_GRACE_MS, None);
    let deployer: Arc<dyn Deployer> =
        Arc::new(TiltDeployer::new(config_path, options, &cfg, Arc::clone(&fs)));

    orchestrate(lifecycle, deployer, handle).await?;
    info!("Bye!");
    Ok(())
}

/// Launch the first generation, restart it on every change coming out of
/// `handle`, and return once the lifecycle is done and the last generation
/// has torn down.
///
/// A closed watch source is not an error: the current generation keeps
/// running until the lifecycle is cancelled.
pub async fn orchestrate(
    lifecycle: Lifecycle,
    deployer: Arc<dyn Deployer>,
    handle: WatchHandle,
) -> errors::Result<()> {
    let mut supervisor = Supervisor::new(lifecycle.clone(), deployer);
    supervisor.launch();

    let mut cache = DebounceCache::default();
    let watched = run_watch_loop(handle, &mut cache, &mut supervisor, &lifecycle).await;

    supervisor.wait().await;
    watched
}

/// One generation, no watching.
pub async fn deploy_local(
    config_path: &Path,
    options: RunOptions,
    fs: Arc<dyn FileSystem>,
) -> Result<()> {
    let cfg = load_and_validate(config_path)?;
    let lifecycle = Lifecycle::start(LIFECYCLE_GRACE_MS, None);
    let deployer: Arc<dyn Deployer> =
        Arc::new(TiltDeployer::new(config_path, options, &cfg, Arc::clone(&fs)));

    let mut supervisor = Supervisor::new(lifecycle, deployer);
    supervisor.launch();
    supervisor.wait().await;
    Ok(())
}

/// Download the translations and refresh the vendors, concurrently.
pub async fn refresh(cfg: &AldevConfig, fs: &dyn FileSystem) -> Result<()> {
    let (translations, vendored) = tokio::join!(
        i18n::download_translations(cfg, fs),
        vendors::fetch_vendors(cfg),
    );
    translations?;
    vendored?;
    Ok(())
}
