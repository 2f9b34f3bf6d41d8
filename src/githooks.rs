// src/githooks.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::AldevConfig;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::templates::{names, TemplateContext, TemplateSet};

/// Install the pre-commit and commit-msg hooks, if `root` is a git
/// repository. Returns the installed hook files.
pub fn install_git_hooks(
    cfg: &AldevConfig,
    root: &Path,
    fs: &dyn FileSystem,
) -> Result<Vec<PathBuf>> {
    if !fs.is_dir(&root.join(".git")) {
        debug!("not a git repository; no hook to install");
        return Ok(Vec::new());
    }

    let templates = TemplateSet::new()?;
    let ctx = TemplateContext::new(cfg);
    let hooks_dir = root.join(".git").join("hooks");

    let mut installed = Vec::with_capacity(2);
    for (file, template) in [
        ("pre-commit", names::GITHOOK_PRECOMMIT),
        ("commit-msg", names::GITHOOK_COMMITMSG),
    ] {
        let path = hooks_dir.join(file);
        templates.render_to(fs, &path, template, &ctx)?;
        fs.set_executable(&path)?;
        debug!("Activated the {file} hook");
        installed.push(path);
    }

    Ok(installed)
}
