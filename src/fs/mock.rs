// src/fs/mock.rs

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Result};

use super::FileSystem;

#[derive(Debug, Clone)]
enum MockEntry {
    File(Vec<u8>),
    Dir,
}

/// In-memory filesystem. Clones share the same tree.
///
/// Paths are normalised (`./a/b` and `a/b` are the same entry); parent
/// directories are created implicitly.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = normalize(path.as_ref());
        let mut entries = self.lock();
        add_parents(&mut entries, &path);
        entries.insert(path, MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        let mut entries = self.lock();
        add_parents(&mut entries, &path);
        entries.insert(path, MockEntry::Dir);
    }

    /// Content of a file, if it exists and is valid UTF-8.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        match self.lock().get(&normalize(path.as_ref())) {
            Some(MockEntry::File(bytes)) => String::from_utf8(bytes.clone()).ok(),
            _ => None,
        }
    }

    /// All file paths, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        self.lock()
            .iter()
            .filter(|(_, e)| matches!(e, MockEntry::File(_)))
            .map(|(p, _)| p.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, MockEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn add_parents(entries: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
    let mut parent = path.parent();
    while let Some(dir) = parent.filter(|d| !d.as_os_str().is_empty()) {
        entries.entry(dir.to_path_buf()).or_insert(MockEntry::Dir);
        parent = dir.parent();
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.lock().get(&normalize(path)) {
            Some(MockEntry::File(content)) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {}", path.display())),
            None => Err(anyhow!("File not found: {}", path.display())),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.add_dir(path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let path = normalize(path);
        path.as_os_str().is_empty() || self.lock().contains_key(&path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().get(&normalize(path)), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let path = normalize(path);
        path.as_os_str().is_empty() || matches!(self.lock().get(&path), Some(MockEntry::Dir))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if !self.is_dir(path) {
            return Err(anyhow!("Not a directory or not found: {}", path.display()));
        }
        let dir = normalize(path);
        let children = self
            .lock()
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()))
            .map(|p| match p.file_name() {
                // Keep the caller's spelling of the directory.
                Some(name) => path.join(name),
                None => p.clone(),
            })
            .collect();
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parents_are_created_and_listed() {
        let fs = MockFileSystem::new();
        fs.add_file("./web/src/app.ts", "import x");
        fs.add_file("web/index.html", "<html>");

        assert!(fs.is_dir(Path::new("web")));
        assert!(fs.is_dir(Path::new("./web/src")));
        assert_eq!(
            fs.read_dir(Path::new("web")).unwrap(),
            vec![PathBuf::from("web/index.html"), PathBuf::from("web/src")]
        );
        assert_eq!(fs.read_dir(Path::new(".")).unwrap(), vec![PathBuf::from("./web")]);
    }
}
