// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AldevError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    TemplateError(#[from] handlebars::RenderError),

    #[error("Invalid template: {0}")]
    TemplateSyntax(#[from] handlebars::TemplateError),

    #[error("File watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Environment variable '{0}' must be set")]
    MissingEnv(&'static str),

    #[error("Command failed ({reason}): '{cmd}' exited with {}", exit_code_display(.code))]
    CommandFailed {
        reason: String,
        cmd: String,
        code: Option<i32>,
    },

    #[error("Invalid command line: '{0}'")]
    InvalidCommand(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn exit_code_display(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AldevError>;
