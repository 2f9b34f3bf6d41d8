// src/deploy/tilt.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::config::{load_and_validate, AldevConfig};
use crate::confgen::generate_deploy_configs;
use crate::deploy::configmap::ensure_configmap;
use crate::deploy::{DeployFuture, Deployer};
use crate::errors::{AldevError, Result};
use crate::exec::{run, run_and_capture, CommandOutcome};
use crate::fs::FileSystem;
use crate::lifecycle::{ErrorPolicy, LoopContext, OutputTarget};
use crate::types::RunOptions;

/// Deploys the app to the local cluster with `tilt up`.
#[derive(Debug)]
pub struct TiltDeployer {
    config_path: PathBuf,
    options: RunOptions,
    fs: Arc<dyn FileSystem>,
    /// Arguments after `tilt up` / `tilt down`, from the last config read.
    tilt_args: Mutex<String>,
}

impl TiltDeployer {
    pub fn new(
        config_path: impl Into<PathBuf>,
        options: RunOptions,
        cfg: &AldevConfig,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            config_path: config_path.into(),
            options,
            fs,
            tilt_args: Mutex::new(tilt_args(&options, cfg)),
        }
    }

    fn current_args(&self) -> String {
        self.tilt_args
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn prepare_inner(&self, scope: &LoopContext) -> Result<()> {
        // Re-read in case the config changed since the last generation.
        let cfg = load_and_validate(&self.config_path)?;
        if cfg.is_library() {
            return Err(AldevError::ConfigError(
                "a library project has nothing to deploy".to_string(),
            ));
        }

        let args = tilt_args(&self.options, &cfg);
        *self.tilt_args.lock().unwrap_or_else(PoisonError::into_inner) = args.clone();

        if self.options.skip_gen {
            debug!("skipping the generation of the deployment configs");
            ensure_configmap(&cfg, self.fs.as_ref()).await?;
        } else {
            generate_deploy_configs(&cfg, self.fs.as_ref()).await?;
        }

        let namespace = format!("{}-{}", cfg.appname, self.options.overlay());
        let existing = run_and_capture(
            "We want to check what's in our namespace",
            None,
            false,
            &format!("kubectl get all --namespace {namespace}"),
        )
        .await?;

        if !String::from_utf8_lossy(&existing).trim().is_empty() {
            run(
                "The namespace needs some cleanup first",
                scope,
                false,
                &format!("tilt down{args}"),
            )
            .await?;
        }

        Ok(())
    }
}

impl Deployer for TiltDeployer {
    fn prepare<'a>(&'a self, scope: &'a LoopContext) -> DeployFuture<'a> {
        Box::pin(self.prepare_inner(scope))
    }

    fn run<'a>(&'a self, scope: &'a LoopContext) -> DeployFuture<'a> {
        Box::pin(async move {
            let mode = if self.options.verbose { " --verbose --debug" } else { "" };
            let cmdline = format!("tilt up{mode} --stream{}", self.current_args());
            run(
                "Now we start Tilt to handle all the k8s & docker deployments",
                scope,
                true,
                &cmdline,
            )
            .await?;
            Ok(())
        })
    }

    fn teardown(&self) -> DeployFuture<'_> {
        Box::pin(async move {
            run_cleanup(&format!("tilt down{}", self.current_args())).await?;
            Ok(())
        })
    }
}

/// Run the final cleanup command of a generation.
///
/// Uncancelable, and a failed exit is only a warning. The invocation is
/// logged at info before anything is spawned, so it shows up even when the
/// process is on its way out.
pub async fn run_cleanup(cmdline: &str) -> Result<CommandOutcome> {
    info!("Cleaning up with: {cmdline}");
    let scope = LoopContext::detached()
        .with_stderr(OutputTarget::Stdout)
        .with_error_policy(ErrorPolicy::Ignore);
    run("We'll clean up the context now", &scope, false, cmdline).await
}

/// Custom Tiltfile flags, e.g. ` -- --use-local --api-only`, or empty.
pub fn tilt_args(options: &RunOptions, cfg: &AldevConfig) -> String {
    let mut flags = Vec::new();
    if options.use_local {
        flags.push("--use-local");
    }
    if cfg.is_api_only() {
        flags.push("--api-only");
    }

    if flags.is_empty() {
        String::new()
    } else {
        format!(" -- {}", flags.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RawAldevConfig, WebSection};

    fn config(with_web: bool) -> AldevConfig {
        AldevConfig::try_from(RawAldevConfig {
            appname: "shop".to_string(),
            web: with_web.then(WebSection::default),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn tilt_args_follow_options_and_config() {
        let local = RunOptions {
            use_local: true,
            ..Default::default()
        };

        assert_eq!(tilt_args(&RunOptions::default(), &config(true)), "");
        assert_eq!(tilt_args(&local, &config(true)), " -- --use-local");
        assert_eq!(
            tilt_args(&local, &config(false)),
            " -- --use-local --api-only"
        );
        assert_eq!(tilt_args(&RunOptions::default(), &config(false)), " -- --api-only");
    }
}
