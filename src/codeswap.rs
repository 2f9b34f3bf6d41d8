// src/codeswap.rs

//! Code swapping: temporarily rewrite bits of source code (typically
//! import paths to vendored libraries) so they point at local checkouts.
//!
//! Every forward swap leaves a `___HOTSWAPPED___` marker next to the new
//! text; the pre-commit hook refuses commits containing it, and the rollback
//! uses it to find what to restore.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::Event;
use tracing::{debug, error, info, warn};

use crate::config::{AldevConfig, CodeSwapConfig, SwapRule};
use crate::errors::{AldevError, Result};
use crate::exec::run;
use crate::fs::FileSystem;
use crate::lifecycle::{ErrorPolicy, Lifecycle, LoopContext, OutputTarget};
use crate::templates::HOTSWAPPED_TAG;
use crate::watch::{run_watch_loop, watch_paths, ChangeHandler, DebounceCache, Reaction};

/// Grace period of the codeswap lifecycle.
pub const CODESWAP_GRACE_MS: u64 = 10;

/// Directories never walked into.
const SKIPPED_DIRS: [&str; 4] = ["node_modules", ".git", "dist", "vendor"];

/// Delay before swapping after a change, to let the editor finish writing.
const SETTLE_DELAY: Duration = Duration::from_millis(200);

pub fn inline_marker() -> String {
    format!(" /* {HOTSWAPPED_TAG} do not commit! */")
}

pub fn end_of_line_marker() -> String {
    format!(" // {HOTSWAPPED_TAG} do not commit!")
}

/// A swap config together with the files it applies to.
#[derive(Debug, Clone)]
pub struct SwapSet {
    pub config: CodeSwapConfig,
    pub files: Vec<PathBuf>,
}

/// All the swap sets, and the folders to watch for new swap targets.
#[derive(Debug, Clone, Default)]
pub struct SwapPlan {
    pub sets: Vec<SwapSet>,
    pub watched_folders: Vec<PathBuf>,
}

/// Walk every `from` dir of the config and collect the files to swap in.
///
/// A file matched by several configs belongs to the first one only. The
/// watched folders are the dirs holding matched files, plus their parents
/// up to the walk root.
pub fn build_plan(cfg: &AldevConfig, fs: &dyn FileSystem) -> Result<SwapPlan> {
    let mut done = HashSet::new();
    let mut folders = BTreeSet::new();
    let mut sets = Vec::with_capacity(cfg.codeswaps.len());

    for swap in &cfg.codeswaps {
        debug!(
            "--- Swap set: from '{}' for {} file(s)",
            swap.from,
            swap.patterns.join(", ")
        );
        let matcher = build_matcher(&swap.patterns)?;
        let mut files = Vec::new();
        collect_files(
            fs,
            Path::new(&swap.from),
            &matcher,
            &mut files,
            &mut done,
            &mut folders,
        )?;
        sets.push(SwapSet {
            config: swap.clone(),
            files,
        });
    }

    Ok(SwapPlan {
        sets,
        watched_folders: folders.into_iter().collect(),
    })
}

fn build_matcher(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            AldevError::ConfigError(format!("invalid swap pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| AldevError::ConfigError(format!("invalid swap patterns: {e}")))
}

/// Returns whether `dir` holds a matched file, directly or deeper.
fn collect_files(
    fs: &dyn FileSystem,
    dir: &Path,
    matcher: &GlobSet,
    files: &mut Vec<PathBuf>,
    done: &mut HashSet<PathBuf>,
    folders: &mut BTreeSet<PathBuf>,
) -> Result<bool> {
    let mut found = false;

    for entry in fs.read_dir(dir)? {
        let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if fs.is_dir(&entry) {
            if !SKIPPED_DIRS.contains(&name) && collect_files(fs, &entry, matcher, files, done, folders)? {
                found = true;
            }
        } else if matcher.is_match(name) && done.insert(entry.clone()) {
            debug!("Will be watching file: {}", entry.display());
            files.push(entry);
            found = true;
        }
    }

    if found {
        folders.insert(dir.to_path_buf());
    }
    Ok(found)
}

/// Apply (or undo) the swap rules on a piece of text.
pub fn swap_text(text: &str, rules: &[SwapRule], rollback: bool) -> String {
    let mut out = text.to_string();
    for rule in rules {
        let marker = if rule.eofcom {
            end_of_line_marker()
        } else {
            inline_marker()
        };
        let swapped = format!("{}{marker}", rule.with);
        out = if rollback {
            out.replace(&swapped, &rule.replace)
        } else {
            out.replace(&rule.replace, &swapped)
        };
    }
    out
}

/// Swap every file of every set. Returns the number of files rewritten.
///
/// A file that cannot be read or written does not stop the others; the
/// first such error is returned once every file has been tried.
pub fn apply_swaps(fs: &dyn FileSystem, sets: &[SwapSet], rollback: bool) -> Result<usize> {
    let direction = if rollback { "reverse" } else { "forward" };
    let mut changed = 0;
    let mut first_error = None;

    for set in sets {
        for file in &set.files {
            debug!("Checking for swaps to do in file: {}", file.display());
            match swap_file(fs, file, &set.config.swaps, rollback) {
                Ok(true) => {
                    info!("File {} was {direction}-swapped", file.display());
                    changed += 1;
                }
                Ok(false) => {}
                Err(err) => {
                    error!(file = %file.display(), error = %err, "could not {direction}-swap file");
                    first_error.get_or_insert(err);
                }
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(changed),
    }
}

fn swap_file(fs: &dyn FileSystem, file: &Path, rules: &[SwapRule], rollback: bool) -> Result<bool> {
    let content = fs.read_to_string(file)?;
    let modified = swap_text(&content, rules, rollback);
    if modified == content {
        return Ok(false);
    }
    fs.write(file, modified.as_bytes())?;
    Ok(true)
}

/// Keeps the swaps current while files change.
#[derive(Debug)]
pub struct CodeSwapper {
    cfg: AldevConfig,
    fs: Arc<dyn FileSystem>,
    plan: SwapPlan,
    finished: Arc<AtomicBool>,
    tidy_go_mod: bool,
}

impl CodeSwapper {
    pub fn new(cfg: AldevConfig, fs: Arc<dyn FileSystem>, finished: Arc<AtomicBool>) -> Result<Self> {
        let plan = build_plan(&cfg, fs.as_ref())?;
        Ok(Self {
            cfg,
            fs,
            plan,
            finished,
            tidy_go_mod: true,
        })
    }

    /// Skip the `go mod tidy` run after each swap round.
    pub fn without_go_mod_tidy(mut self) -> Self {
        self.tidy_go_mod = false;
        self
    }

    pub fn plan(&self) -> &SwapPlan {
        &self.plan
    }

    /// Swap all the files. Forward swaps are refused once finished.
    ///
    /// `milestone` marks the first and last rounds, which are announced.
    pub async fn swap_all(&self, rollback: bool, milestone: bool) -> Result<()> {
        if !rollback && self.finished.load(Ordering::SeqCst) {
            debug!("finished; refusing to swap forward");
            return Ok(());
        }

        let start = Instant::now();
        apply_swaps(self.fs.as_ref(), &self.plan.sets, rollback)?;

        if milestone {
            info!("Swap Mode {}", if rollback { "OFF" } else { "ON" });
        }
        info!("All the code swapping done in {:?}", start.elapsed());

        if self.tidy_go_mod {
            if let Some(src) = self.cfg.go_src_dir() {
                let scope = LoopContext::detached()
                    .with_exec_dir(src)
                    .with_stderr(OutputTarget::Discard)
                    .with_error_policy(ErrorPolicy::Ignore);
                if let Err(err) =
                    run("Making sure the Go.sum file is synced", &scope, false, "go mod tidy").await
                {
                    warn!(error = %err, "could not run go mod tidy");
                }
            }
        }
        Ok(())
    }
}

impl ChangeHandler for CodeSwapper {
    fn on_change<'a>(
        &'a mut self,
        path: &'a Path,
        event: &'a Event,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Reaction>> + Send + 'a>> {
        Box::pin(async move {
            debug!(
                "/!\\ File modified: {} (event = {:?})",
                path.display(),
                event.kind
            );

            // New files or new imports may have appeared.
            self.plan = build_plan(&self.cfg, self.fs.as_ref())?;
            tokio::time::sleep(SETTLE_DELAY).await;
            self.swap_all(false, false).await?;

            Ok(Reaction::Rewatch(self.plan.watched_folders.clone()))
        })
    }
}

/// The `codeswap` command: swap, keep swapping while files change, and roll
/// everything back on exit.
pub async fn run_codeswap(cfg: AldevConfig, fs: Arc<dyn FileSystem>) -> Result<()> {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    let lifecycle = Lifecycle::start(
        CODESWAP_GRACE_MS,
        Some(Box::new(move || {
            flag.store(true, Ordering::SeqCst);
            debug!("We're finished!");
        })),
    );

    let mut swapper = CodeSwapper::new(cfg, fs, finished)?;
    let outcome = match swapper.swap_all(false, true).await {
        Ok(()) => watch_and_swap(&mut swapper, &lifecycle).await,
        Err(err) => {
            lifecycle.cancel_all().await;
            Err(err)
        }
    };

    // Whatever happened, put the code back.
    match build_plan(&swapper.cfg, swapper.fs.as_ref()) {
        Ok(plan) => swapper.plan = plan,
        Err(err) => warn!(error = %err, "could not re-plan the swaps; rolling back the last plan"),
    }
    let rolled_back = swapper.swap_all(true, true).await;

    outcome.and(rolled_back)
}

async fn watch_and_swap(swapper: &mut CodeSwapper, lifecycle: &Lifecycle) -> Result<()> {
    let handle = match watch_paths(&swapper.plan.watched_folders) {
        Ok(handle) => handle,
        Err(err) => {
            lifecycle.cancel_all().await;
            return Err(err);
        }
    };

    let mut cache = DebounceCache::default();
    run_watch_loop(handle, &mut cache, swapper, lifecycle).await?;
    lifecycle.done().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawAldevConfig;
    use crate::fs::mock::MockFileSystem;

    fn rule(replace: &str, with: &str, eofcom: bool) -> SwapRule {
        SwapRule {
            replace: replace.to_string(),
            with: with.to_string(),
            eofcom,
        }
    }

    fn config(swaps: Vec<CodeSwapConfig>) -> AldevConfig {
        AldevConfig::try_from(RawAldevConfig {
            appname: "shop".to_string(),
            codeswaps: swaps,
            ..Default::default()
        })
        .unwrap()
    }

    fn swap_conf(from: &str, patterns: &[&str], rules: Vec<SwapRule>) -> CodeSwapConfig {
        CodeSwapConfig {
            from: from.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            swaps: rules,
        }
    }

    #[test]
    fn forward_then_rollback_restores_the_text() {
        let rules = vec![rule("from 'lib'", "from '../lib/src'", false)];
        let text = "import { x } from 'lib';\n";

        let swapped = swap_text(text, &rules, false);
        assert_eq!(
            swapped,
            "import { x } from '../lib/src' /* ___HOTSWAPPED___ do not commit! */;\n"
        );
        assert_eq!(swap_text(&swapped, &rules, true), text);
    }

    #[test]
    fn end_of_line_marker_is_used_when_asked() {
        let rules = vec![rule("github.com/org/lib", "../lib", true)];
        let swapped = swap_text("require github.com/org/lib", &rules, false);
        assert_eq!(swapped, "require ../lib // ___HOTSWAPPED___ do not commit!");
    }

    #[test]
    fn plan_skips_ignored_dirs_and_dedupes_files() {
        let fs = MockFileSystem::new();
        fs.add_file("web/src/a.ts", "x");
        fs.add_file("web/src/deep/b.ts", "x");
        fs.add_file("web/src/c.css", "x");
        fs.add_file("web/node_modules/d.ts", "x");
        fs.add_file("web/dist/e.ts", "x");
        fs.add_file("web/other/readme.md", "x");

        let cfg = config(vec![
            swap_conf("web", &["*.ts"], vec![rule("a", "b", false)]),
            swap_conf("web/src", &["*.ts", "*.css"], vec![rule("c", "d", false)]),
        ]);

        let plan = build_plan(&cfg, &fs).unwrap();

        assert_eq!(
            plan.sets[0].files,
            vec![PathBuf::from("web/src/a.ts"), PathBuf::from("web/src/deep/b.ts")]
        );
        assert_eq!(plan.sets[1].files, vec![PathBuf::from("web/src/c.css")]);
        assert_eq!(
            plan.watched_folders,
            vec![
                PathBuf::from("web"),
                PathBuf::from("web/src"),
                PathBuf::from("web/src/deep"),
            ]
        );
    }

    #[test]
    fn apply_swaps_only_rewrites_changed_files() {
        let fs = MockFileSystem::new();
        fs.add_file("src/a.go", "import \"github.com/org/lib\"\n");
        fs.add_file("src/b.go", "package b\n");

        let cfg = config(vec![swap_conf(
            "src",
            &["*.go"],
            vec![rule("\"github.com/org/lib\"", "\"local/lib\"", false)],
        )]);
        let plan = build_plan(&cfg, &fs).unwrap();

        assert_eq!(apply_swaps(&fs, &plan.sets, false).unwrap(), 1);
        assert!(fs.contents("src/a.go").unwrap().contains(HOTSWAPPED_TAG));

        assert_eq!(apply_swaps(&fs, &plan.sets, true).unwrap(), 1);
        assert_eq!(
            fs.contents("src/a.go").unwrap(),
            "import \"github.com/org/lib\"\n"
        );
    }

    #[test]
    fn a_broken_file_does_not_stop_the_others() {
        let fs = MockFileSystem::new();
        fs.add_file("src/b.ts", "from 'lib'");
        let sets = vec![SwapSet {
            config: swap_conf("src", &["*.ts"], vec![rule("'lib'", "'local'", false)]),
            files: vec![PathBuf::from("src/a.ts"), PathBuf::from("src/b.ts")],
        }];

        assert!(apply_swaps(&fs, &sets, false).is_err());
        assert!(fs.contents("src/b.ts").unwrap().contains(HOTSWAPPED_TAG));

        assert!(apply_swaps(&fs, &sets, true).is_err());
        assert_eq!(fs.contents("src/b.ts").unwrap(), "from 'lib'");
    }

    #[tokio::test]
    async fn forward_swaps_are_refused_once_finished() {
        let fs = MockFileSystem::new();
        fs.add_file("src/a.ts", "from 'lib'");
        let cfg = config(vec![swap_conf("src", &["*.ts"], vec![rule("'lib'", "'local'", false)])]);

        let finished = Arc::new(AtomicBool::new(true));
        let swapper = CodeSwapper::new(cfg, Arc::new(fs.clone()), finished)
            .unwrap()
            .without_go_mod_tidy();

        swapper.swap_all(false, false).await.unwrap();

        assert_eq!(fs.contents("src/a.ts").unwrap(), "from 'lib'");
    }
}
