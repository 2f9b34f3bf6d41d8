// src/confgen.rs

//! Generation of the deployment artifacts: kustomize base and overlays,
//! Dockerfiles, the Tiltfile and the web app's env var list.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::AldevConfig;
use crate::deploy::configmap::ensure_configmap;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::templates::{names, TemplateContext, TemplateSet};

/// Overlays generated for every app, with whether they drop the web container.
const OVERLAYS: [(&str, bool); 5] = [
    ("dev", false),
    ("local", true),
    ("sandbox", false),
    ("staging", false),
    ("production", false),
];

const NO_WEB_PATCH_FILE: &str = "patch-no-web-container.yaml";

/// Regenerate every deployment artifact, configmap included.
pub async fn generate_deploy_configs(cfg: &AldevConfig, fs: &dyn FileSystem) -> Result<()> {
    let start = Instant::now();

    if cfg.api.is_some() && !cfg.is_library() {
        ensure_configmap(cfg, fs).await?;
    }
    write_templates(cfg, fs)?;

    info!("Generated the deployment configs in {:?}", start.elapsed());
    Ok(())
}

/// The template-only part of [`generate_deploy_configs`]: no external
/// command involved.
pub fn write_templates(cfg: &AldevConfig, fs: &dyn FileSystem) -> Result<()> {
    let templates = TemplateSet::new()?;
    let ctx = TemplateContext::new(cfg);

    if cfg.is_library() {
        debug!("library project: no deployment config to generate");
        return Ok(());
    }

    if let (Some(_), Some(deploying_dir)) = (&cfg.api, cfg.deploying_dir()) {
        write_base(&templates, &ctx, fs, deploying_dir)?;
        write_dockerfiles(&templates, &ctx, fs, deploying_dir)?;
        write_overlays(&templates, cfg, fs, deploying_dir)?;
        templates.render_to(fs, Path::new("Tiltfile"), names::TILTFILE, &ctx)?;
    }

    if let Some(web) = &cfg.web {
        let env_list = Path::new(&web.srcdir).join(".env-list");
        templates.render_to(fs, &env_list, names::WEB_ENV_LIST, &ctx)?;
    }

    Ok(())
}

fn write_base(
    templates: &TemplateSet,
    ctx: &TemplateContext<'_>,
    fs: &dyn FileSystem,
    deploying_dir: &Path,
) -> Result<()> {
    let app = &ctx.config.appname;
    let base = deploying_dir.join("base");

    templates.render_to(fs, &base.join("kustomization.yaml"), names::KUSTOMIZATION_BASE, ctx)?;
    templates.render_to(fs, &base.join(format!("{app}-api-.yaml")), names::API_DEPLOYMENT, ctx)?;
    templates.render_to(fs, &base.join(format!("{app}-api-lb.yaml")), names::API_LB, ctx)?;
    if ctx.config.web.is_some() {
        templates.render_to(fs, &base.join(format!("{app}-web.yaml")), names::WEB_DEPLOYMENT, ctx)?;
    }
    Ok(())
}

fn write_dockerfiles(
    templates: &TemplateSet,
    ctx: &TemplateContext<'_>,
    fs: &dyn FileSystem,
    deploying_dir: &Path,
) -> Result<()> {
    let app = &ctx.config.appname;
    let docker = deploying_dir.join("docker");

    templates.render_to(fs, &docker.join(format!("{app}-local-api-docker")), names::DOCKER_LOCAL_API, ctx)?;
    templates.render_to(fs, &docker.join(format!("{app}-remote-api-docker")), names::DOCKER_REMOTE_API, ctx)?;
    if ctx.config.web.is_some() {
        templates.render_to(fs, &docker.join(format!("{app}-local-web-docker")), names::DOCKER_LOCAL_WEB, ctx)?;
        templates.render_to(fs, &docker.join(format!("{app}-remote-web-docker")), names::DOCKER_REMOTE_WEB, ctx)?;
    }
    Ok(())
}

fn write_overlays(
    templates: &TemplateSet,
    cfg: &AldevConfig,
    fs: &dyn FileSystem,
    deploying_dir: &Path,
) -> Result<()> {
    let overlays = deploying_dir.join("overlays");

    for (overlay, drops_web) in OVERLAYS {
        let dir = overlays.join(overlay);
        let patches = if drops_web && cfg.web.is_some() {
            vec![NO_WEB_PATCH_FILE]
        } else {
            vec![]
        };

        let ctx = TemplateContext::new(cfg).for_overlay(overlay, patches.clone());
        for patch in patches {
            templates.render_to(fs, &dir.join(patch), names::NO_WEB_CONTAINER_PATCH, &ctx)?;
        }
        templates.render_to(fs, &dir.join("kustomization.yaml"), names::KUSTOMIZATION_OVERLAY, &ctx)?;
        templates.render_to(
            fs,
            &dir.join(format!("namespace-{overlay}.yaml")),
            names::NAMESPACE,
            &ctx,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiSection, DeployingSection, RawAldevConfig, WebSection};
    use crate::fs::mock::MockFileSystem;
    use std::path::PathBuf;

    fn config(with_web: bool) -> AldevConfig {
        AldevConfig::try_from(RawAldevConfig {
            appname: "shop".to_string(),
            api: Some(ApiSection {
                srcdir: "api".to_string(),
                config: "config.yaml".to_string(),
                port: 24243,
                bindir: "tmp".to_string(),
                ..Default::default()
            }),
            web: with_web.then(|| WebSection {
                srcdir: "webapp".to_string(),
                port: 5173,
                envvars: vec![],
            }),
            deploying: Some(DeployingSection {
                dir: "deploy".to_string(),
            }),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn full_app_gets_every_artifact() {
        let fs = MockFileSystem::new();
        write_templates(&config(true), &fs).unwrap();

        let files = fs.files();
        for expected in [
            "Tiltfile",
            "deploy/base/kustomization.yaml",
            "deploy/base/shop-api-.yaml",
            "deploy/base/shop-api-lb.yaml",
            "deploy/base/shop-web.yaml",
            "deploy/docker/shop-local-web-docker",
            "deploy/overlays/local/patch-no-web-container.yaml",
            "deploy/overlays/production/namespace-production.yaml",
            "webapp/.env-list",
        ] {
            assert!(files.contains(&PathBuf::from(expected)), "missing {expected}");
        }
        let base = fs.contents("deploy/base/kustomization.yaml").unwrap();
        assert!(base.contains("shop-web.yaml"));
    }

    #[test]
    fn api_only_app_skips_web_artifacts() {
        let fs = MockFileSystem::new();
        write_templates(&config(false), &fs).unwrap();

        let files = fs.files();
        assert!(!files.contains(&PathBuf::from("deploy/base/shop-web.yaml")));
        assert!(!files.contains(&PathBuf::from("deploy/overlays/local/patch-no-web-container.yaml")));
        assert!(!files.iter().any(|f| f.ends_with(".env-list")));

        let local = fs.contents("deploy/overlays/local/kustomization.yaml").unwrap();
        assert!(!local.contains("patches:"));
        let base = fs.contents("deploy/base/kustomization.yaml").unwrap();
        assert!(!base.contains("shop-web.yaml"));
    }
}
