#![allow(dead_code)]

use std::path::{Path, PathBuf};

use aldev::config::{
    AldevConfig, ApiSection, CodeSwapConfig, DeployingSection, I18nConfig, RawAldevConfig,
    SwapRule, VendorConfig, WebEnvVar, WebSection,
};

/// Builder for `AldevConfig` to simplify test setup.
///
/// Starts from a minimal valid API app named `shop`.
pub struct AldevConfigBuilder {
    config: RawAldevConfig,
}

impl AldevConfigBuilder {
    pub fn new(appname: &str) -> Self {
        Self {
            config: RawAldevConfig {
                appname: appname.to_string(),
                api: Some(ApiSection {
                    srcdir: "api".to_string(),
                    config: "config.yaml".to_string(),
                    port: 24243,
                    datadir: "api/data".to_string(),
                    bindir: "tmp".to_string(),
                    i18n: None,
                }),
                deploying: Some(DeployingSection {
                    dir: "deploy".to_string(),
                }),
                ..Default::default()
            },
        }
    }

    pub fn with_web(mut self, srcdir: &str) -> Self {
        self.config.web = Some(WebSection {
            srcdir: srcdir.to_string(),
            port: 5173,
            envvars: Vec::new(),
        });
        self
    }

    pub fn with_web_env(mut self, name: &str, value: &str) -> Self {
        let web = self.config.web.get_or_insert_with(WebSection::default);
        web.envvars.push(WebEnvVar {
            name: name.to_string(),
            desc: format!("{name} description"),
            value: value.to_string(),
        });
        self
    }

    pub fn with_i18n(mut self, links: &[&str], keysize: usize) -> Self {
        if let Some(api) = self.config.api.as_mut() {
            api.i18n = Some(I18nConfig {
                links: links.iter().map(|l| l.to_string()).collect(),
                keysize,
                file: "translations.json".to_string(),
            });
        }
        self
    }

    pub fn with_vendor(mut self, repo: &str, to: &str) -> Self {
        self.config.vendors.push(VendorConfig {
            repo: repo.to_string(),
            version: "latest".to_string(),
            from: String::new(),
            to: to.to_string(),
        });
        self
    }

    pub fn with_codeswap(mut self, from: &str, pattern: &str, replace: &str, with: &str) -> Self {
        self.config.codeswaps.push(CodeSwapConfig {
            from: from.to_string(),
            patterns: vec![pattern.to_string()],
            swaps: vec![SwapRule {
                replace: replace.to_string(),
                with: with.to_string(),
                eofcom: false,
            }],
        });
        self
    }

    pub fn raw(self) -> RawAldevConfig {
        self.config
    }

    pub fn build(self) -> AldevConfig {
        AldevConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Write `cfg` as YAML into `dir/.aldev.yaml`, return the file path.
pub fn write_config(dir: &Path, cfg: &RawAldevConfig) -> PathBuf {
    let path = dir.join(".aldev.yaml");
    let yaml = serde_yaml::to_string(cfg).expect("serialising the config");
    std::fs::write(&path, yaml).expect("writing the config");
    path
}
