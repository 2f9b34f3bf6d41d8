// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::codegen::CodegenOptions;
use crate::config::DEFAULT_CONFIG_FILE;
use crate::init::InitOptions;
use crate::types::RunOptions;

/// Command-line arguments for `aldev`.
///
/// Without a subcommand, aldev builds and deploys the app locally, then
/// restarts everything whenever the config files change.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "aldev",
    version,
    about = "Local development orchestrator: generate, build, deploy and watch.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the aldev config file (YAML).
    #[arg(short = 'f', long = "file", value_name = "PATH", default_value = DEFAULT_CONFIG_FILE, global = true)]
    pub config: String,

    /// Verbose output, for aldev and the tools it drives.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use the local versions of the dependencies (code swaps, `local`
    /// overlay).
    #[arg(short = 's', long = "swap", global = true)]
    pub use_local: bool,

    /// Do not regenerate the deployment files.
    ///
    /// Not global: `-n` is `init --name`.
    #[arg(short = 'n', long = "no-gen")]
    pub no_gen: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `--verbose`, then `ALDEV_LOG`, then `info` is used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliArgs {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            verbose: self.verbose,
            use_local: self.use_local,
            skip_gen: self.no_gen,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Generate the deployment files (k8s manifests, Dockerfiles, Tiltfile).
    Confgen,
    /// Deploy the app to the local cluster once, without watching.
    Deploylocal,
    /// Download the translations and refresh the vendored libraries.
    Refresh,
    /// Swap bits of code while running; swap them back on exit.
    Codeswap,
    /// Compile the Go code and run the code generation steps.
    Codegen(CodegenArgs),
    /// Start a new aldev project from the template repository.
    Init(InitArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CodegenArgs {
    /// Only compile the code, no generation step.
    #[arg(short, long)]
    pub compilation_only: bool,

    /// Force the regeneration.
    #[arg(short, long)]
    pub regen: bool,

    /// Do not build the binary for the containers.
    #[arg(long)]
    pub no_container: bool,
}

impl From<&CodegenArgs> for CodegenOptions {
    fn from(args: &CodegenArgs) -> Self {
        Self {
            compilation_only: args.compilation_only,
            regen: args.regen,
            no_container: args.no_container,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct InitArgs {
    /// Name of the project; no space or `_`.
    #[arg(short, long)]
    pub name: String,

    /// No web app, API only.
    #[arg(short, long)]
    pub api_only: bool,

    /// Git remote to push the first commit to.
    #[arg(long, value_name = "URL")]
    pub remote: Option<String>,
}

impl From<&InitArgs> for InitOptions {
    fn from(args: &InitArgs) -> Self {
        Self {
            name: args.name.clone(),
            api_only: args.api_only,
            remote: args.remote.clone(),
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_watch_mode() {
        let args = CliArgs::try_parse_from(["aldev", "-v", "--swap"]).unwrap();

        assert!(args.command.is_none());
        assert_eq!(args.config, DEFAULT_CONFIG_FILE);
        assert_eq!(
            args.run_options(),
            RunOptions {
                verbose: true,
                use_local: true,
                skip_gen: false,
            }
        );
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let args =
            CliArgs::try_parse_from(["aldev", "-n", "deploylocal", "-f", "other.yaml"]).unwrap();

        assert!(matches!(args.command, Some(Command::Deploylocal)));
        assert_eq!(args.config, "other.yaml");
        assert!(args.no_gen);
    }

    #[test]
    fn codegen_and_init_flags() {
        let args = CliArgs::try_parse_from(["aldev", "codegen", "-c", "-r"]).unwrap();
        let Some(Command::Codegen(codegen)) = &args.command else {
            panic!("expected codegen");
        };
        let options = CodegenOptions::from(codegen);
        assert!(options.compilation_only && options.regen && !options.no_container);

        let args = CliArgs::try_parse_from(["aldev", "init", "-n", "shop", "-a"]).unwrap();
        let Some(Command::Init(init)) = &args.command else {
            panic!("expected init");
        };
        let options = InitOptions::from(init);
        assert_eq!(options.name, "shop");
        assert!(options.api_only);
        assert_eq!(options.remote, None);
    }
}
