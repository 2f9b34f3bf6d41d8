// src/vendors.rs

//! Vendored libraries: git repositories cached in `ALDEV_CACHEDIR` whose
//! content is copied into the project, with a `version.json` stamp.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::{AldevConfig, VendorConfig};
use crate::errors::{AldevError, Result};
use crate::exec::{quick_run, run, run_and_capture};
use crate::lifecycle::{LoopContext, OutputTarget};

pub const CACHE_DIR_ENV: &str = "ALDEV_CACHEDIR";
pub const VERSION_FILE: &str = "version.json";
pub const LATEST: &str = "latest";

/// Content of `version.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionStamp {
    #[serde(rename = "Commit")]
    pub commit: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// What to do with a vendor after looking at its tags and current stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorPlan {
    UpToDate,
    /// Copy the main branch, stamped with the latest tag.
    Latest,
    /// Check the pinned tag out, then copy it.
    Pinned(String),
}

/// Decide whether a vendor needs refreshing.
///
/// `tags` is sorted newest first; the first one is the latest version.
pub fn plan_vendor(
    required: &str,
    tags: &[String],
    latest: &VersionStamp,
    current: Option<&VersionStamp>,
) -> Result<VendorPlan> {
    if required == LATEST {
        return Ok(match current {
            Some(current) if current == latest => VendorPlan::UpToDate,
            _ => VendorPlan::Latest,
        });
    }

    if required != latest.value {
        error!(
            "Required version '{required}' is not the latest available one ({})!",
            latest.value
        );
    }

    if current.is_some_and(|c| c.value == required) {
        return Ok(VendorPlan::UpToDate);
    }

    if !tags.iter().any(|t| t == required) {
        return Err(AldevError::ConfigError(format!(
            "required version '{required}' does not exist"
        )));
    }

    Ok(VendorPlan::Pinned(required.to_string()))
}

/// Fetch or refresh every configured vendor, in parallel.
pub async fn fetch_vendors(cfg: &AldevConfig) -> Result<()> {
    if cfg.vendors.is_empty() {
        return Ok(());
    }

    let cache_dir = std::env::var(CACHE_DIR_ENV)
        .ok()
        .filter(|d| !d.is_empty())
        .ok_or(AldevError::MissingEnv(CACHE_DIR_ENV))?;
    let cache_dir = PathBuf::from(cache_dir);
    let start = Instant::now();

    let mut set = JoinSet::new();
    for vendor in cfg.vendors.iter().cloned() {
        let cache_dir = cache_dir.clone();
        set.spawn(async move {
            let repo = vendor.repo.clone();
            fetch_vendor(&vendor, &cache_dir)
                .await
                .map_err(|err| AldevError::Other(anyhow::anyhow!("vendor '{repo}': {err}")))
        });
    }

    let mut first_error = None;
    while let Some(joined) = set.join_next().await {
        let res = joined.map_err(|err| AldevError::Other(err.into())).and_then(|r| r);
        if let Err(err) = res {
            error!("{err}");
            first_error.get_or_insert(err);
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }

    info!("Done fetching / refreshing the vendors in {:?}", start.elapsed());
    Ok(())
}

async fn fetch_vendor(vendor: &VendorConfig, cache_dir: &Path) -> Result<()> {
    let name = repo_name(&vendor.repo).to_string();
    let repo_path = cache_dir.join(&name);
    let quiet = |dir: &Path| {
        LoopContext::detached()
            .with_exec_dir(dir)
            .with_stdout(OutputTarget::Discard)
            .with_stderr(OutputTarget::Discard)
    };

    if repo_path.is_dir() {
        run(
            &format!("Ensuring the main branch in the '{name}' repo"),
            &quiet(&repo_path),
            false,
            "git checkout main",
        )
        .await?;
        run(
            &format!("Refreshing the cached '{name}' repo"),
            &quiet(&repo_path),
            false,
            "git pull",
        )
        .await?;
    } else {
        tokio::fs::create_dir_all(cache_dir).await?;
        run(
            &format!("Git-cloning / caching the '{name}' repo"),
            &quiet(cache_dir),
            false,
            &format!("git clone {}", clone_url(&vendor.repo)?),
        )
        .await?;
    }

    let tags = list_tags(&repo_path).await?;
    let latest = VersionStamp {
        value: tags.first().cloned().unwrap_or_default(),
        commit: last_commit(&repo_path, "main").await?,
    };

    let target = Path::new(&vendor.to).join(&name);
    let version_file = target.join(VERSION_FILE);
    let current = read_stamp(&version_file).await;

    let next = match plan_vendor(&vendor.version, &tags, &latest, current.as_ref())? {
        VendorPlan::UpToDate => {
            debug!(vendor = %name, "vendor is up to date");
            return Ok(());
        }
        VendorPlan::Latest => latest,
        VendorPlan::Pinned(tag) => {
            run(
                &format!("Checking out the right '{name}' version"),
                &quiet(&repo_path),
                false,
                &format!("git checkout {tag}"),
            )
            .await?;
            VersionStamp {
                commit: last_commit(&repo_path, &tag).await?,
                value: tag,
            }
        }
    };

    debug!("Cleaning '{}' first, if needed", target.display());
    if target.exists() {
        tokio::fs::remove_dir_all(&target).await?;
    }
    tokio::fs::create_dir_all(&target).await?;

    let source = repo_path.join(&vendor.from);
    quick_run(
        &format!("Copying this repo into project: {name}"),
        &format!("cp -r {}/. {}", source.display(), target.display()),
    )
    .await?;
    tokio::fs::write(&version_file, serde_json::to_vec_pretty(&next)?).await?;

    match current {
        Some(current) => info!(
            "Update for vendor '{name}': '{}' ({}) -> '{}' ({})",
            current.value, current.commit, next.value, next.commit
        ),
        None => info!("Installed vendor '{name}': '{}' ({})", next.value, next.commit),
    }
    Ok(())
}

/// `github.com/org/lib` -> `lib`.
pub fn repo_name(repo: &str) -> &str {
    repo.trim_end_matches('/').rsplit('/').next().unwrap_or(repo)
}

/// `github.com/org/lib` -> `git@github.com:org/lib.git`.
pub fn clone_url(repo: &str) -> Result<String> {
    let (host, path) = repo
        .split_once('/')
        .ok_or_else(|| AldevError::ConfigError(format!("bad vendor repo: {repo}")))?;
    Ok(format!("git@{host}:{path}.git"))
}

async fn list_tags(repo_path: &Path) -> Result<Vec<String>> {
    let out = run_and_capture(
        "Getting the latest version",
        Some(repo_path),
        false,
        "git tag -l --sort -version:refname",
    )
    .await?;
    Ok(String::from_utf8_lossy(&out)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

async fn last_commit(repo_path: &Path, rev: &str) -> Result<String> {
    let out = run_and_capture(
        "Getting the latest commit",
        Some(repo_path),
        false,
        &format!("git rev-parse {rev}"),
    )
    .await?;
    Ok(String::from_utf8_lossy(&out).trim().to_string())
}

async fn read_stamp(path: &Path) -> Option<VersionStamp> {
    let bytes = tokio::fs::read(path).await.ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(stamp) => Some(stamp),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "unreadable version file; ignoring it");
            None
        }
    }
}
