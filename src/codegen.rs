// src/codegen.rs

//! Go code generation: compile the API, let it generate code about itself in
//! three steps (recompiling whenever a step changed the sources), format,
//! then migrate the databases.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use crate::config::AldevConfig;
use crate::errors::{AldevError, Result};
use crate::exec::{quick_run, run};
use crate::lifecycle::LoopContext;

/// Written by the generator into the bin dir; holds `true` when the sources
/// changed.
pub const DIRTY_FILE: &str = "dirty";

/// Flags of the `codegen` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodegenOptions {
    pub compilation_only: bool,
    pub regen: bool,
    pub no_container: bool,
}

const STEPS: [&str; 3] = [
    "Generating stuff: DB list, BOclasses, BO registry...",
    "Generating stuff: BO specs...",
    "Generating stuff: BO vmaps, BO web models, etc...",
];

/// The command lines the pipeline is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenCommands {
    pub src_dir: PathBuf,
    pub bin_dir: String,
    /// Run from the Go sources dir.
    pub compile: String,
    /// Run from the project root.
    pub run: String,
    pub format: String,
}

impl CodegenCommands {
    pub fn from_config(cfg: &AldevConfig) -> Result<Self> {
        let src = cfg
            .go_src_dir()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AldevError::ConfigError("no Go sources dir configured".to_string()))?;
        let bin_dir = cfg.bin_dir().ok_or_else(|| {
            AldevError::ConfigError(
                "`.api.bindir` (or `.lib.bindir` for a library) is empty".to_string(),
            )
        })?;
        let src_dir = PathBuf::from(src);
        let ext = std::env::consts::EXE_SUFFIX;
        let exe = format!("{}-api-local{ext}", cfg.appname);

        let compile = format!("go build -o {bin_dir}/{exe} ./main");

        let mut run = format!("{}", src_dir.join(bin_dir).join(&exe).display());
        if let Some(config) = cfg.api.as_ref().map(|api| &api.config).filter(|c| !c.is_empty()) {
            run.push_str(&format!(" -config {}", src_dir.join(config).display()));
        }
        run.push_str(&format!(
            " -srcdir {} -bindir {}",
            src_dir.display(),
            src_dir.join(bin_dir).display()
        ));
        if let Some(web) = &cfg.web {
            run.push_str(&format!(" -webdir {}", web.srcdir));
        }

        let format = format!(
            "gofumpt -w {} {}",
            src_dir.join("_include").display(),
            src_dir.join("main").display()
        );

        Ok(Self {
            bin_dir: bin_dir.to_string(),
            src_dir,
            compile,
            run,
            format,
        })
    }

    /// Command line of a generation step (1 to 3).
    pub fn step(&self, step: usize, regen: bool) -> String {
        let regen = if regen { " -regen" } else { "" };
        format!("{} -codegen {step}{regen}", self.run)
    }

    pub fn migrate(&self) -> String {
        format!("{} -migrate", self.run)
    }

    pub fn dirty_file(&self) -> PathBuf {
        self.src_dir.join(&self.bin_dir).join(DIRTY_FILE)
    }
}

/// Whether the `dirty` marker says the sources changed.
pub fn code_has_changed(dirty_file: &Path) -> bool {
    std::fs::read_to_string(dirty_file).is_ok_and(|s| s.trim() == "true")
}

/// The `codegen` command.
pub async fn run_codegen(cfg: &AldevConfig, options: CodegenOptions) -> Result<()> {
    let start = Instant::now();
    let cmds = CodegenCommands::from_config(cfg)?;
    let go = LoopContext::detached().with_exec_dir(&cmds.src_dir);

    run(
        "Making sure we're using the right set of dependencies",
        &go,
        false,
        "go mod tidy",
    )
    .await?;
    run("Only compiling & formatting the code", &go, false, &cmds.compile).await?;

    if options.compilation_only {
        return Ok(());
    }

    for (idx, reason) in STEPS.iter().enumerate() {
        let step = idx + 1;
        quick_run(reason, &cmds.step(step, options.regen)).await?;

        if code_has_changed(&cmds.dirty_file()) {
            run(
                &format!("Does it still compile after codegen step {step}?"),
                &go,
                false,
                &cmds.compile,
            )
            .await?;
        } else {
            debug!(step, "no code change; skipping the compilation");
        }
    }

    quick_run("Formatting the code", &cmds.format).await?;

    if !cfg.is_library() {
        quick_run("DB automigration", &cmds.migrate()).await?;
    }

    // The binary run above is a Windows one; containers need a Linux build.
    if cfg!(windows) && !options.no_container && code_has_changed(&cmds.dirty_file()) {
        let linux = go.clone().with_env("GOOS", "linux");
        let compile = format!("go build -o {}/{}-api-local ./main", cmds.bin_dir, cfg.appname);
        run("Compiling for Docker (Linux)", &linux, false, &compile).await?;
    }

    info!("Aldev codegen done in {:?}", start.elapsed());
    Ok(())
}
