// src/init.rs

//! `aldev init`: start a new project from the template repository.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use crate::errors::{AldevError, Result};
use crate::exec::run;
use crate::fs::FileSystem;
use crate::lifecycle::{LoopContext, OutputTarget};
use crate::templates::{names, TemplateSet};
use crate::vendors::{clone_url, CACHE_DIR_ENV};

pub const INIT_REPO_ENV: &str = "ALDEV_INITREPO";

/// Name of the project in the template repository.
const TEMPLATE_NAME: &str = "fullstack-app-template";

/// Flags of the `init` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitOptions {
    pub name: String,
    pub api_only: bool,
    /// Where to push the first commit, if anywhere.
    pub remote: Option<String>,
}

pub fn validate_project_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(' ') || name.contains('_') {
        return Err(AldevError::ConfigError(format!(
            "project name ('{name}') must not be empty, or contain any space or _ characters"
        )));
    }
    Ok(())
}

/// Text replacements to apply to the cloned template, per file.
pub fn customisations(name: &str) -> Vec<(PathBuf, String, String)> {
    let go_module_from = format!("/libs/{TEMPLATE_NAME}");
    let go_module_to = format!("/web/{name}");
    vec![
        (PathBuf::from(".aldev.yaml"), TEMPLATE_NAME.to_string(), name.to_string()),
        (PathBuf::from("api/go.mod"), go_module_from.clone(), go_module_to.clone()),
        (PathBuf::from("api/main/1-start.go"), go_module_from, go_module_to),
        (PathBuf::from("webapp/vite.config.ts"), TEMPLATE_NAME.to_string(), name.to_string()),
        (
            PathBuf::from("webapp/src/routes/+__root.tsx"),
            TEMPLATE_NAME.to_string(),
            name.to_string(),
        ),
    ]
}

/// Replace `from` with `to` in a file, if the file exists.
pub fn replace_in_file(fs: &dyn FileSystem, path: &Path, from: &str, to: &str) -> Result<()> {
    if !fs.is_file(path) {
        debug!("no {} to customise", path.display());
        return Ok(());
    }
    let content = fs.read_to_string(path)?;
    let replaced = content.replace(from, to);
    if replaced != content {
        fs.write(path, replaced.as_bytes())?;
    }
    Ok(())
}

/// Drop the `web` section of an aldev config, making the app API-only.
pub fn strip_web_section(yaml: &str) -> Result<String> {
    let mut doc: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    if let Some(map) = doc.as_mapping_mut() {
        map.remove("web");
    }
    Ok(serde_yaml::to_string(&doc)?)
}

/// The `init` command.
pub async fn run_init(options: &InitOptions, fs: &dyn FileSystem) -> Result<()> {
    validate_project_name(&options.name)?;

    if Path::new(".git").is_dir() {
        return Err(AldevError::ConfigError(
            "cannot run this from an actual Git project".to_string(),
        ));
    }

    let start = Instant::now();
    let cache_dir = env_var(CACHE_DIR_ENV)?;
    let init_repo = env_var(INIT_REPO_ENV)?;
    let cache_dir = PathBuf::from(cache_dir);
    fs.create_dir_all(&cache_dir)?;

    let name = options.name.as_str();
    let in_cache = LoopContext::detached()
        .with_exec_dir(&cache_dir)
        .with_stderr(OutputTarget::Discard);
    run(
        &format!("Git-cloning / caching the '{init_repo}' repo"),
        &in_cache,
        false,
        &format!("git clone {} {name}", clone_url(&init_repo)?),
    )
    .await?;

    let cached = cache_dir.join(name);
    remove_if_exists(&cached.join(".git"))?;
    remove_if_exists(&cached.join(".gitignore"))?;
    remove_if_exists(&cached.join("README.md"))?;

    for (file, from, to) in customisations(name) {
        replace_in_file(fs, &cached.join(file), &from, &to)?;
    }

    if options.api_only {
        debug!("removing the webapp part");
        remove_if_exists(&cached.join("webapp"))?;
        let config = cached.join(".aldev.yaml");
        if fs.is_file(&config) {
            let stripped = strip_web_section(&fs.read_to_string(&config)?)?;
            fs.write(&config, stripped.as_bytes())?;
        }
    }

    run(
        "Moving the project",
        &LoopContext::detached().with_stderr(OutputTarget::Discard),
        false,
        &format!("mv {} {name}", cached.display()),
    )
    .await?;

    let project = LoopContext::detached().with_exec_dir(name);
    run("Initializing Git", &project, false, "git init").await?;
    TemplateSet::new()?.render_to(
        fs,
        &Path::new(name).join(".gitignore"),
        names::GITIGNORE,
        &serde_json::json!({}),
    )?;
    run("Adding the files", &project, false, "git add .").await?;
    run(
        "Committing the files",
        &project,
        false,
        r#"git commit -m "dev: new aldev project""#,
    )
    .await?;

    if let Some(remote) = &options.remote {
        run(
            "Pushing the first commit",
            &project,
            false,
            &format!("git push --set-upstream {remote} main"),
        )
        .await?;
    }

    info!("Done initialising an aldev project in {:?}", start.elapsed());
    Ok(())
}

fn env_var(key: &'static str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(AldevError::MissingEnv(key))
}

fn remove_if_exists(path: &Path) -> Result<()> {
    let res = if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    match res {
        Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
        _ => Ok(()),
    }
}
