mod common;
use crate::common::{init_tracing, write_config, AldevConfigBuilder};

use std::fs;

use aldev::config::{load_and_validate, load_from_path};
use aldev::errors::AldevError;

#[test]
fn a_written_config_loads_back() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let raw = AldevConfigBuilder::new("shop")
        .with_web("webapp")
        .with_web_env("WEB_TITLE", "Shop & Co")
        .with_i18n(&["https://sheets.example.com/values"], 40)
        .with_vendor("github.com/org/goald", "api/_vendor")
        .with_codeswap("webapp/src", "*.ts", "from 'goaldr'", "from '../../goaldr/src'")
        .raw();
    let path = write_config(dir.path(), &raw);

    let cfg = load_and_validate(&path).unwrap();

    assert_eq!(cfg.appname, "shop");
    assert!(!cfg.is_api_only());
    assert_eq!(cfg.web.as_ref().unwrap().envvars[0].value, "Shop & Co");
    assert_eq!(cfg.vendors[0].version, "latest");
    assert_eq!(cfg.codeswaps[0].patterns, vec!["*.ts".to_string()]);
    assert_eq!(
        cfg.api_config_path().unwrap(),
        std::path::PathBuf::from("api/config.yaml")
    );
}

#[test]
fn yaml_keys_follow_the_aldev_file_format() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".aldev.yaml");
    fs::write(
        &path,
        r#"
appname: shop
api:
  srcdir: api
  config: config.yaml
  port: 24243
  datadir: api/data
  bindir: tmp
  i18n:
    links:
      - https://sheets.example.com/values
    keysize: 40
    file: translations.json
deploying:
  dir: deploy
codeswaps:
  - from: webapp/src
    for: ["*.ts", "*.tsx"]
    do:
      - replace: "from 'goaldr'"
        with: "from '../../goaldr/src'"
      - replace: github.com/org/goald
        with: ../goald
        eofcom: true
"#,
    )
    .unwrap();

    let cfg = load_and_validate(&path).unwrap();

    assert!(cfg.is_api_only());
    assert_eq!(cfg.api.as_ref().unwrap().i18n.as_ref().unwrap().keysize, 40);
    let swap = &cfg.codeswaps[0];
    assert_eq!(swap.patterns.len(), 2);
    assert!(!swap.swaps[0].eofcom);
    assert!(swap.swaps[1].eofcom);
}

#[test]
fn invalid_configs_are_rejected_with_a_config_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut raw = AldevConfigBuilder::new("shop").raw();
    raw.deploying = None;
    let path = write_config(dir.path(), &raw);

    // Parses fine, but an API needs a deploying dir.
    assert!(load_from_path(&path).is_ok());
    assert!(matches!(
        load_and_validate(&path),
        Err(AldevError::ConfigError(_))
    ));
}

#[test]
fn missing_and_malformed_files_are_errors() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    assert!(matches!(
        load_and_validate(dir.path().join("nope.yaml")),
        Err(AldevError::IoError(_))
    ));

    let bad = dir.path().join("bad.yaml");
    fs::write(&bad, "appname: [unclosed").unwrap();
    assert!(matches!(
        load_and_validate(&bad),
        Err(AldevError::YamlError(_))
    ));
}
