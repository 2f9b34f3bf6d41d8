// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Deduplicate a watch set, keeping the first occurrence of every path.
///
/// `./api/config.yaml` and `api/config.yaml` count as the same path; the
/// spelling of the first occurrence is kept.
pub fn dedup_paths<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| seen.insert(lexical_key(p)))
        .map(Path::to_path_buf)
        .collect()
}

fn lexical_key(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_spelling_and_order() {
        let paths = ["./api/config.yaml", ".aldev.yaml", "api/config.yaml", ".aldev.yaml"];
        assert_eq!(
            dedup_paths(&paths),
            vec![PathBuf::from("./api/config.yaml"), PathBuf::from(".aldev.yaml")]
        );
    }
}
