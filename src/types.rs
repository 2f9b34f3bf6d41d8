// src/types.rs

/// Options shared by the commands that build and deploy the app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Extra output from the supervised tools (`tilt --verbose --debug`).
    pub verbose: bool,
    /// Deploy with the local versions of the dependencies (code swaps on,
    /// `local` overlay).
    pub use_local: bool,
    /// Do not regenerate the deployment artifacts before deploying.
    pub skip_gen: bool,
}

impl RunOptions {
    /// Kustomize overlay used for local development.
    pub fn overlay(&self) -> &'static str {
        if self.use_local { "local" } else { "dev" }
    }
}
