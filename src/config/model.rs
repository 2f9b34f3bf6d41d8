// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration as read from `.aldev.yaml`, before validation.
///
/// ```yaml
/// appname: myapp
/// api:
///   srcdir: api
///   config: config.yaml
///   port: 24243
///   datadir: api/data
///   bindir: tmp
///   i18n:
///     links: ["https://sheets.googleapis.com/..."]
///     keysize: 30
///     file: translations.json
/// web:
///   srcdir: webapp
///   port: 5173
///   envvars:
///     - name: WEB_TITLE
///       desc: the page title
///       value: My App
/// deploying:
///   dir: deploy
/// vendors:
///   - repo: github.com/acme/widgets
///     version: latest
///     from: src
///     to: webapp/src/vendor
/// codeswaps:
///   - from: webapp/src
///     for: ["*.ts", "*.tsx"]
///     do:
///       - replace: "@acme/widgets"
///         with: "../../widgets/src"
/// ```
///
/// Every section except `appname` is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawAldevConfig {
    #[serde(default)]
    pub appname: String,

    /// Present when the project is a library rather than an app; `api`,
    /// `web` and `deploying` are then ignored.
    #[serde(default)]
    pub lib: Option<LibSection>,

    #[serde(default)]
    pub api: Option<ApiSection>,

    #[serde(default)]
    pub web: Option<WebSection>,

    #[serde(default)]
    pub vendors: Vec<VendorConfig>,

    #[serde(default)]
    pub deploying: Option<DeployingSection>,

    #[serde(default)]
    pub codeswaps: Vec<CodeSwapConfig>,
}

/// Validated configuration. Only built through `TryFrom<RawAldevConfig>`.
#[derive(Debug, Clone, Serialize)]
pub struct AldevConfig {
    pub appname: String,
    pub lib: Option<LibSection>,
    pub api: Option<ApiSection>,
    pub web: Option<WebSection>,
    pub vendors: Vec<VendorConfig>,
    pub deploying: Option<DeployingSection>,
    pub codeswaps: Vec<CodeSwapConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LibSection {
    #[serde(default)]
    pub srcdir: String,
    /// Where the compiled binary goes, relative to `srcdir`.
    #[serde(default)]
    pub bindir: String,
    /// Command installing the library's dependencies.
    #[serde(default)]
    pub install: String,
    /// Command continuously building the library.
    #[serde(default)]
    pub develop: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiSection {
    #[serde(default)]
    pub srcdir: String,
    /// The API config file, relative to `srcdir`.
    #[serde(default)]
    pub config: String,
    /// Port of the load-balanced API service.
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub i18n: Option<I18nConfig>,
    #[serde(default)]
    pub datadir: String,
    /// Where the compiled binary goes, relative to `srcdir`.
    #[serde(default)]
    pub bindir: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct I18nConfig {
    /// Spreadsheet JSON links; later links override earlier ones.
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub keysize: usize,
    /// Output file, relative to the API's data dir.
    #[serde(default)]
    pub file: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebSection {
    #[serde(default)]
    pub srcdir: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub envvars: Vec<WebEnvVar>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebEnvVar {
    /// Must start with `WEB_`.
    pub name: String,
    #[serde(default)]
    pub desc: String,
    /// Value used in the local dev environment.
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeployingSection {
    #[serde(default)]
    pub dir: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VendorConfig {
    /// `host/path/to/repo`, cloned over SSH.
    pub repo: String,
    /// A tag, or `latest`.
    #[serde(default = "default_vendor_version")]
    pub version: String,
    /// Subdirectory of the repo to copy; empty for the whole tree.
    #[serde(default)]
    pub from: String,
    /// Where the copied tree lands (under `<to>/<repo name>`).
    pub to: String,
}

fn default_vendor_version() -> String {
    "latest".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CodeSwapConfig {
    /// Directory walked to find the files to swap in.
    pub from: String,
    /// File-name globs, e.g. `*.ts`.
    #[serde(default, rename = "for")]
    pub patterns: Vec<String>,
    #[serde(default, rename = "do")]
    pub swaps: Vec<SwapRule>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SwapRule {
    pub replace: String,
    pub with: String,
    /// Put the marker at the end of the line (`// ...`) instead of inline.
    #[serde(default)]
    pub eofcom: bool,
}

impl AldevConfig {
    pub(crate) fn new_unchecked(raw: RawAldevConfig) -> Self {
        Self {
            appname: raw.appname,
            lib: raw.lib,
            api: raw.api,
            web: raw.web,
            vendors: raw.vendors,
            deploying: raw.deploying,
            codeswaps: raw.codeswaps,
        }
    }

    pub fn is_library(&self) -> bool {
        self.lib.is_some()
    }

    /// An app without a web section only deploys its API.
    pub fn is_api_only(&self) -> bool {
        self.web.is_none()
    }

    /// Directory of the Go sources: the library's, else the API's.
    pub fn go_src_dir(&self) -> Option<&str> {
        match (&self.lib, &self.api) {
            (Some(lib), _) => Some(lib.srcdir.as_str()),
            (None, Some(api)) => Some(api.srcdir.as_str()),
            (None, None) => None,
        }
    }

    /// Binary dir relative to the Go sources.
    pub fn bin_dir(&self) -> Option<&str> {
        match (&self.lib, &self.api) {
            (Some(lib), _) => Some(lib.bindir.as_str()),
            (None, Some(api)) => Some(api.bindir.as_str()),
            (None, None) => None,
        }
        .filter(|dir| !dir.is_empty())
    }

    /// Binary dir as seen from the project root.
    pub fn resolved_bin_dir(&self) -> Option<PathBuf> {
        Some(Path::new(self.go_src_dir()?).join(self.bin_dir()?))
    }

    /// Path of the API config file from the project root.
    pub fn api_config_path(&self) -> Option<PathBuf> {
        self.api
            .as_ref()
            .map(|api| Path::new(&api.srcdir).join(&api.config))
    }

    pub fn deploying_dir(&self) -> Option<&Path> {
        self.deploying
            .as_ref()
            .map(|d| Path::new(d.dir.as_str()))
            .filter(|d| !d.as_os_str().is_empty())
    }
}
