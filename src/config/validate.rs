// src/config/validate.rs

use globset::Glob;

use crate::config::model::{AldevConfig, RawAldevConfig};
use crate::errors::{AldevError, Result};

impl TryFrom<RawAldevConfig> for AldevConfig {
    type Error = AldevError;

    fn try_from(raw: RawAldevConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(AldevConfig::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawAldevConfig) -> Result<()> {
    validate_app_name(cfg)?;
    validate_api(cfg)?;
    validate_web(cfg)?;
    validate_vendors(cfg)?;
    validate_codeswaps(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> AldevError {
    AldevError::ConfigError(msg.into())
}

fn validate_app_name(cfg: &RawAldevConfig) -> Result<()> {
    let name = cfg.appname.trim();
    if name.is_empty() {
        return Err(config_error("`appname` must not be empty"));
    }
    if name.contains(char::is_whitespace) {
        return Err(config_error(format!(
            "`appname` must not contain spaces (got '{name}')"
        )));
    }
    Ok(())
}

fn validate_api(cfg: &RawAldevConfig) -> Result<()> {
    // A library discards the app sections.
    if cfg.lib.is_some() {
        return Ok(());
    }
    let Some(api) = &cfg.api else {
        return Ok(());
    };

    if api.srcdir.is_empty() {
        return Err(config_error("`api.srcdir` must not be empty"));
    }
    if api.config.is_empty() {
        return Err(config_error("`api.config` must not be empty"));
    }
    if cfg.deploying.as_ref().is_none_or(|d| d.dir.is_empty()) {
        return Err(config_error(
            "`deploying.dir` must be set when an `api` section is configured",
        ));
    }
    if let Some(i18n) = &api.i18n {
        if i18n.keysize == 0 {
            return Err(config_error("`api.i18n.keysize` must be >= 1 (got 0)"));
        }
        if i18n.file.is_empty() {
            return Err(config_error("`api.i18n.file` must not be empty"));
        }
    }
    Ok(())
}

fn validate_web(cfg: &RawAldevConfig) -> Result<()> {
    let Some(web) = &cfg.web else {
        return Ok(());
    };
    for var in &web.envvars {
        if !var.name.starts_with("WEB_") {
            return Err(config_error(format!(
                "web env var '{}' must start with 'WEB_'",
                var.name
            )));
        }
    }
    Ok(())
}

fn validate_vendors(cfg: &RawAldevConfig) -> Result<()> {
    for vendor in &cfg.vendors {
        match vendor.repo.split_once('/') {
            Some((host, path)) if !host.is_empty() && !path.is_empty() => {}
            _ => {
                return Err(config_error(format!(
                    "vendor repo '{}' must look like 'host/path/to/repo'",
                    vendor.repo
                )));
            }
        }
        if vendor.to.is_empty() {
            return Err(config_error(format!(
                "vendor '{}' has an empty `to`",
                vendor.repo
            )));
        }
    }
    Ok(())
}

fn validate_codeswaps(cfg: &RawAldevConfig) -> Result<()> {
    for (idx, swap) in cfg.codeswaps.iter().enumerate() {
        if swap.from.is_empty() {
            return Err(config_error(format!("codeswaps[{idx}] has an empty `from`")));
        }
        if swap.patterns.is_empty() {
            return Err(config_error(format!(
                "codeswaps[{idx}] (from '{}') needs at least one `for` pattern",
                swap.from
            )));
        }
        for pattern in &swap.patterns {
            Glob::new(pattern).map_err(|e| {
                config_error(format!("codeswaps[{idx}]: invalid pattern '{pattern}': {e}"))
            })?;
        }
        if swap.swaps.iter().any(|rule| rule.replace.is_empty()) {
            return Err(config_error(format!(
                "codeswaps[{idx}] has a rule with an empty `replace`"
            )));
        }
    }
    Ok(())
}
