// src/config/mod.rs

//! Configuration loading and validation for aldev.
//!
//! Responsibilities:
//! - Define the YAML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, DEFAULT_CONFIG_FILE};
pub use model::{
    AldevConfig, ApiSection, CodeSwapConfig, DeployingSection, I18nConfig, LibSection,
    RawAldevConfig, SwapRule, VendorConfig, WebEnvVar, WebSection,
};
