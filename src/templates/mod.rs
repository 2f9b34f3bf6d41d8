// src/templates/mod.rs

//! Handlebars templates for every file aldev generates.
//!
//! Templates see the whole [`AldevConfig`] (with its YAML key names, e.g.
//! `{{appname}}`, `{{api.port}}`, `{{deploying.dir}}`) plus a few computed
//! fields, see [`TemplateContext`].

mod docker;
mod k8s;
mod repo;
mod tilt;

use std::path::Path;

use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use crate::config::AldevConfig;
use crate::errors::Result;
use crate::fs::FileSystem;

/// Marker appended to swapped code; also what the pre-commit hook rejects.
pub const HOTSWAPPED_TAG: &str = "___HOTSWAPPED___";

/// Names of the registered templates.
pub mod names {
    pub const TILTFILE: &str = "tiltfile";
    pub const KUSTOMIZATION_BASE: &str = "kustomization-base";
    pub const KUSTOMIZATION_OVERLAY: &str = "kustomization-overlay";
    pub const NAMESPACE: &str = "namespace";
    pub const NO_WEB_CONTAINER_PATCH: &str = "patch-no-web-container";
    pub const API_DEPLOYMENT: &str = "api-deployment";
    pub const API_LB: &str = "api-lb";
    pub const WEB_DEPLOYMENT: &str = "web-deployment";
    pub const DOCKER_LOCAL_API: &str = "docker-local-api";
    pub const DOCKER_LOCAL_WEB: &str = "docker-local-web";
    pub const DOCKER_REMOTE_API: &str = "docker-remote-api";
    pub const DOCKER_REMOTE_WEB: &str = "docker-remote-web";
    pub const WEB_ENV_LIST: &str = "web-env-list";
    pub const GITIGNORE: &str = "gitignore";
    pub const GITHOOK_PRECOMMIT: &str = "githook-precommit";
    pub const GITHOOK_COMMITMSG: &str = "githook-commitmsg";
}

/// Data handed to the templates.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext<'a> {
    #[serde(flatten)]
    pub config: &'a AldevConfig,
    /// Binary dir as seen from the project root.
    pub bindir: String,
    /// Overlay being rendered (`dev`, `local`...), if any.
    pub overlay: Option<&'a str>,
    /// Patch files listed in an overlay's kustomization.
    pub patches: Vec<&'a str>,
    pub hotswap_tag: &'static str,
}

impl<'a> TemplateContext<'a> {
    pub fn new(config: &'a AldevConfig) -> Self {
        Self {
            config,
            bindir: config
                .resolved_bin_dir()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            overlay: None,
            patches: Vec::new(),
            hotswap_tag: HOTSWAPPED_TAG,
        }
    }

    pub fn for_overlay(mut self, overlay: &'a str, patches: Vec<&'a str>) -> Self {
        self.overlay = Some(overlay);
        self.patches = patches;
        self
    }
}

/// The registry holding every template, compiled once.
pub struct TemplateSet {
    registry: Handlebars<'static>,
}

impl std::fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateSet")
            .field("templates", &self.registry.get_templates().len())
            .finish()
    }
}

impl TemplateSet {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        // Generated files are YAML, Dockerfiles and shell; never HTML.
        registry.register_escape_fn(handlebars::no_escape);

        let sources = [
            (names::TILTFILE, tilt::TILTFILE),
            (names::KUSTOMIZATION_BASE, k8s::KUSTOMIZATION_BASE),
            (names::KUSTOMIZATION_OVERLAY, k8s::KUSTOMIZATION_OVERLAY),
            (names::NAMESPACE, k8s::NAMESPACE),
            (names::NO_WEB_CONTAINER_PATCH, k8s::NO_WEB_CONTAINER_PATCH),
            (names::API_DEPLOYMENT, k8s::API_DEPLOYMENT),
            (names::API_LB, k8s::API_LB),
            (names::WEB_DEPLOYMENT, k8s::WEB_DEPLOYMENT),
            (names::DOCKER_LOCAL_API, docker::LOCAL_API),
            (names::DOCKER_LOCAL_WEB, docker::LOCAL_WEB),
            (names::DOCKER_REMOTE_API, docker::REMOTE_API),
            (names::DOCKER_REMOTE_WEB, docker::REMOTE_WEB),
            (names::WEB_ENV_LIST, repo::WEB_ENV_LIST),
            (names::GITIGNORE, repo::GITIGNORE),
            (names::GITHOOK_PRECOMMIT, repo::GITHOOK_PRECOMMIT),
            (names::GITHOOK_COMMITMSG, repo::GITHOOK_COMMITMSG),
        ];
        for (name, source) in sources {
            registry.register_template_string(name, source)?;
        }

        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, name: &str, ctx: &T) -> Result<String> {
        Ok(self.registry.render(name, ctx)?)
    }

    /// Render `name` into `path`, overwriting it.
    pub fn render_to<T: Serialize>(
        &self,
        fs: &dyn FileSystem,
        path: &Path,
        name: &str,
        ctx: &T,
    ) -> Result<()> {
        debug!("Making sure this file exists: {}", path.display());
        let content = self.render(name, ctx)?;
        fs.write(path, content.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiSection, DeployingSection, RawAldevConfig, WebEnvVar, WebSection};

    fn config(with_web: bool) -> AldevConfig {
        let raw = RawAldevConfig {
            appname: "shop".to_string(),
            api: Some(ApiSection {
                srcdir: "api".to_string(),
                config: "config.yaml".to_string(),
                port: 24243,
                datadir: "api/data".to_string(),
                bindir: "tmp".to_string(),
                ..Default::default()
            }),
            web: with_web.then(|| WebSection {
                srcdir: "webapp".to_string(),
                port: 5173,
                envvars: vec![WebEnvVar {
                    name: "WEB_TITLE".to_string(),
                    desc: "page title".to_string(),
                    value: "Shop & Co".to_string(),
                }],
            }),
            deploying: Some(DeployingSection {
                dir: "deploy".to_string(),
            }),
            ..Default::default()
        };
        AldevConfig::try_from(raw).unwrap()
    }

    #[test]
    fn every_template_compiles() {
        assert!(TemplateSet::new().is_ok());
    }

    #[test]
    fn overlay_lists_its_patches() {
        let cfg = config(true);
        let set = TemplateSet::new().unwrap();
        let ctx = TemplateContext::new(&cfg).for_overlay("local", vec!["patch-no-web-container.yaml"]);

        let out = set.render(names::KUSTOMIZATION_OVERLAY, &ctx).unwrap();
        assert!(out.contains("namespace: shop-local"));
        assert!(out.contains("- namespace-local.yaml"));
        assert!(out.contains("patches:"));
        assert!(out.contains("- path: patch-no-web-container.yaml"));

        let plain = TemplateContext::new(&cfg).for_overlay("dev", vec![]);
        let out = set.render(names::KUSTOMIZATION_OVERLAY, &plain).unwrap();
        assert!(!out.contains("patches:"));
    }

    #[test]
    fn tiltfile_web_part_follows_config() {
        let set = TemplateSet::new().unwrap();

        let full = config(true);
        let out = set.render(names::TILTFILE, &TemplateContext::new(&full)).unwrap();
        assert!(out.contains("kustomize('deploy/overlays/dev')"));
        assert!(out.contains("sync('./api/tmp', '/api')"));
        assert!(out.contains(" WEB_TITLE=Shop & Co"));
        assert!(out.contains("port_forwards='5173:5173'"));

        let api_only = config(false);
        let out = set.render(names::TILTFILE, &TemplateContext::new(&api_only)).unwrap();
        assert!(!out.contains("shop-web-depl"));
        assert!(out.contains("shop-api-depl"));
    }

    #[test]
    fn output_is_not_html_escaped() {
        let set = TemplateSet::new().unwrap();
        let cfg = config(true);
        let out = set.render(names::TILTFILE, &TemplateContext::new(&cfg)).unwrap();
        assert!(out.contains("WEB_TITLE=Shop & Co"));
        assert!(!out.contains("&amp;"));
    }
}
