// src/deploy/configmap.rs

//! The Kubernetes configmap carrying the API's config file.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::AldevConfig;
use crate::errors::{AldevError, Result};
use crate::exec::run_and_capture;
use crate::fs::FileSystem;

/// Generate `<deploying.dir>/base/<app>-cm.yaml` from the API config file.
///
/// The YAML comes from `kubectl create configmap --dry-run=client`; its null
/// `creationTimestamp` is replaced with the config file's modification time,
/// so the manifest only changes when the config does.
pub async fn ensure_configmap(cfg: &AldevConfig, fs: &dyn FileSystem) -> Result<PathBuf> {
    debug!("Making sure the configmap is up-to-date");

    let deploying_dir = cfg
        .deploying_dir()
        .ok_or_else(|| AldevError::ConfigError("Empty 'deploying.dir' config!".to_string()))?;
    let config_path = cfg.api_config_path().ok_or_else(|| {
        AldevError::ConfigError("an `api` section is needed to build the configmap".to_string())
    })?;

    let modified = std::fs::metadata(&config_path)?.modified()?;

    let cmdline = format!(
        "kubectl create configmap {}-configmap -o yaml --dry-run=client --from-file={}",
        cfg.appname,
        config_path.display()
    );
    let output = run_and_capture(
        "We need to build a configmap from our API's config",
        None,
        false,
        &cmdline,
    )
    .await?;

    let manifest = stamp_creation_time(&String::from_utf8_lossy(&output), modified);
    let target = configmap_path(deploying_dir, &cfg.appname);
    fs.write(&target, manifest.as_bytes())?;

    Ok(target)
}

pub fn configmap_path(deploying_dir: &Path, appname: &str) -> PathBuf {
    deploying_dir.join("base").join(format!("{appname}-cm.yaml"))
}

/// Replace the first `creationTimestamp: null` with the given time.
pub fn stamp_creation_time(manifest: &str, modified: SystemTime) -> String {
    let stamp = DateTime::<Utc>::from(modified).format("%Y-%m-%dT%H:%M:%SZ");
    manifest.replacen(
        "creationTimestamp: null",
        &format!("creationTimestamp: \"{stamp}\""),
        1,
    )
}
