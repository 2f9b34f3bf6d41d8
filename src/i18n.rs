// src/i18n.rs

//! Translations download.
//!
//! Each configured link serves a Google Sheets range as JSON
//! (`{"values": [[...], ...]}`). The first row is the header:
//! namespace, key, hint, then one column per language.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::{AldevConfig, I18nConfig};
use crate::errors::{AldevError, Result};
use crate::fs::FileSystem;

const NAMESPACE_COL: usize = 0;
const KEY_COL: usize = 1;
const FIRST_LANGUAGE_COL: usize = 3;

/// Raw payload of one sheet.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SheetValues {
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

/// One namespace/key couple with its values, each written `"<lg>: <text>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Translation {
    #[serde(rename = "n")]
    pub namespace: String,
    #[serde(rename = "k")]
    pub key: String,
    #[serde(rename = "v")]
    pub values: Vec<String>,
}

/// Download the API translations, if the project has an API.
pub async fn download_translations(cfg: &AldevConfig, fs: &dyn FileSystem) -> Result<()> {
    if cfg.is_library() {
        return Ok(());
    }
    let Some(api) = &cfg.api else {
        return Ok(());
    };

    let i18n = match &api.i18n {
        Some(i18n) if !i18n.links.is_empty() => i18n,
        _ => {
            error!("Empty or incomplete i18n configuration!");
            return Err(AldevError::ConfigError(
                "no i18n link to download translations from".to_string(),
            ));
        }
    };

    download_into(i18n, Path::new(&api.datadir), fs).await
}

async fn download_into(i18n: &I18nConfig, datadir: &Path, fs: &dyn FileSystem) -> Result<()> {
    let start = Instant::now();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let mut sheets = Vec::with_capacity(i18n.links.len());
    for link in &i18n.links {
        debug!(%link, "fetching translations");
        let sheet = client
            .get(link)
            .send()
            .await?
            .error_for_status()?
            .json::<SheetValues>()
            .await?;
        sheets.push(sheet);
    }

    let translations = merge_translations(&sheets, i18n.keysize);
    let json = serde_json::to_string_pretty(&translations)?;

    let filename = datadir.join(&i18n.file);
    fs.write(&filename, json.as_bytes())?;
    info!(
        "Done downloading the translations into '{}' in {:?}",
        filename.display(),
        start.elapsed()
    );
    Ok(())
}

/// Merge the rows of all the sheets. A later row with the same
/// namespace + key replaces the earlier one but lands at its own position.
pub fn merge_translations(sheets: &[SheetValues], keysize: usize) -> Vec<Translation> {
    let mut merged: HashMap<String, (usize, Translation)> = HashMap::new();
    let mut order = 0;

    for sheet in sheets {
        let Some((header, rows)) = sheet.values.split_first() else {
            continue;
        };
        let languages: Vec<String> = header
            .iter()
            .skip(FIRST_LANGUAGE_COL)
            .map(|lg| lg.trim().to_lowercase())
            .collect();

        for row in rows {
            let cell = |idx: usize| row.get(idx).map(|s| s.trim()).unwrap_or_default();

            let translation = Translation {
                namespace: cell(NAMESPACE_COL).to_string(),
                key: key_from_column(cell(KEY_COL), keysize).to_string(),
                values: languages
                    .iter()
                    .enumerate()
                    .map(|(i, lg)| format!("{lg}: {}", cell(FIRST_LANGUAGE_COL + i)))
                    .collect(),
            };

            order += 1;
            let id = format!("{}{}", translation.namespace, translation.key);
            merged.insert(id, (order, translation));
        }
    }

    let mut output: Vec<_> = merged.into_values().collect();
    output.sort_by_key(|(order, _)| *order);
    output.into_iter().map(|(_, t)| t).collect()
}

/// Shorten a key to at most `max` bytes, cutting at the last space at or
/// before `max` when there is one.
pub fn key_from_column(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }

    let cut = value.as_bytes()[1..=max]
        .iter()
        .rposition(|b| *b == b' ')
        .map(|i| i + 1)
        .unwrap_or(max);

    // Never split a multi-byte character.
    let mut cut = cut;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    &value[..cut]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[&str]]) -> SheetValues {
        SheetValues {
            values: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn short_keys_are_kept() {
        assert_eq!(key_from_column("Hello", 10), "Hello");
        assert_eq!(key_from_column("", 10), "");
    }

    #[test]
    fn long_keys_are_cut_at_the_last_space() {
        assert_eq!(key_from_column("Welcome to the shop", 12), "Welcome to");
        assert_eq!(key_from_column("Welcome to", 7), "Welcome");
    }

    #[test]
    fn long_keys_without_space_are_cut_at_max() {
        assert_eq!(key_from_column("Supercalifragilistic", 5), "Super");
        assert_eq!(key_from_column(" leading", 4), " lea");
    }

    #[test]
    fn rows_become_language_tagged_values() {
        let sheets = [sheet(&[
            &["Namespace", "Key", "Hint", "EN", " Fr "],
            &["home", "Hello there", "greeting", "Hello there", "Salut "],
        ])];

        let out = merge_translations(&sheets, 50);

        assert_eq!(
            out,
            vec![Translation {
                namespace: "home".to_string(),
                key: "Hello there".to_string(),
                values: vec!["en: Hello there".to_string(), "fr: Salut".to_string()],
            }]
        );
    }

    #[test]
    fn later_links_override_and_keep_source_order() {
        let first = sheet(&[
            &["n", "k", "h", "en"],
            &["a", "one", "", "1"],
            &["a", "two", "", "2"],
        ]);
        let second = sheet(&[&["n", "k", "h", "en"], &["a", "one", "", "uno"]]);

        let out = merge_translations(&[first, second], 50);

        let keys: Vec<_> = out.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["two", "one"]);
        assert_eq!(out[1].values, vec!["en: uno".to_string()]);
    }

    #[test]
    fn short_rows_and_empty_sheets_are_tolerated() {
        let sheets = [
            SheetValues::default(),
            sheet(&[&["n", "k", "h", "en", "fr"], &["a", "b"]]),
        ];

        let out = merge_translations(&sheets, 50);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].values, vec!["en: ".to_string(), "fr: ".to_string()]);
    }

    #[test]
    fn serialises_with_short_field_names() {
        let t = Translation {
            namespace: "a".to_string(),
            key: "b".to_string(),
            values: vec!["en: c".to_string()],
        };
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json, serde_json::json!({"n": "a", "k": "b", "v": ["en: c"]}));
    }
}
