//! Directory-tree storage implementation
//!
//! Layout under the output root:
//!
//! ```text
//! scraped_urls.txt   canonical share URLs, one per line
//! failed_urls.txt    dispatched page URLs, one per line
//! recipes/           one `<escaped id>.json` file per record
//! ```

use crate::recipe::RecipeRecord;
use crate::storage::filename::{record_file_name, record_id_from_file_name};
use crate::storage::traits::{CheckpointStore, StorageError, StorageResult};
use crate::storage::Checkpoint;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const SCRAPED_FILE: &str = "scraped_urls.txt";
pub const FAILED_FILE: &str = "failed_urls.txt";
pub const RECIPES_DIR: &str = "recipes";

/// Checkpoint store backed by plain files in a directory tree
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Opens (creating if needed) a store rooted at `root`
    pub fn new(root: &Path) -> StorageResult<Self> {
        let store = Self {
            root: root.to_path_buf(),
        };
        let recipes = store.recipes_dir();
        fs::create_dir_all(&recipes).map_err(|source| StorageError::Io {
            path: recipes,
            source,
        })?;
        Ok(store)
    }

    /// Opens an existing store without creating anything
    pub fn open_existing(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn recipes_dir(&self) -> PathBuf {
        self.root.join(RECIPES_DIR)
    }

    /// Where the record with identifier `id` is stored
    pub fn record_path(&self, id: &str) -> PathBuf {
        self.recipes_dir().join(record_file_name(id))
    }

    fn read_url_set(&self, name: &str) -> StorageResult<HashSet<String>> {
        let path = self.root.join(name);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashSet::new()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn write_url_set(&self, name: &str, urls: &HashSet<String>) -> StorageResult<()> {
        let mut sorted: Vec<&str> = urls.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        write_atomic(&self.root, name, &sorted.join("\n"))
    }
}

impl CheckpointStore for DirectoryStore {
    fn load_checkpoint(&self) -> StorageResult<Checkpoint> {
        Ok(Checkpoint {
            scraped: self.read_url_set(SCRAPED_FILE)?,
            failed: self.read_url_set(FAILED_FILE)?,
        })
    }

    fn save_checkpoint(&self, checkpoint: &Checkpoint) -> StorageResult<()> {
        self.write_url_set(SCRAPED_FILE, &checkpoint.scraped)?;
        self.write_url_set(FAILED_FILE, &checkpoint.failed)?;
        tracing::debug!(
            "Checkpoint written: {} scraped, {} failed",
            checkpoint.scraped.len(),
            checkpoint.failed.len()
        );
        Ok(())
    }

    fn save_record(&self, record: &RecipeRecord) -> StorageResult<PathBuf> {
        let json = record
            .to_pretty_json()
            .map_err(|source| StorageError::Serialization {
                id: record.id().to_string(),
                source,
            })?;
        let name = record_file_name(record.id());
        write_atomic(&self.recipes_dir(), &name, &json)?;
        Ok(self.recipes_dir().join(name))
    }

    fn count_records(&self) -> StorageResult<usize> {
        let dir = self.recipes_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(source) => return Err(StorageError::Io { path: dir, source }),
        };

        let mut count = 0;
        for entry in entries {
            let entry = entry.map_err(|source| StorageError::Io {
                path: dir.clone(),
                source,
            })?;
            let name = entry.file_name();
            if name
                .to_str()
                .and_then(record_id_from_file_name)
                .is_some()
            {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Writes `{dir}/{name}` by writing a temp file in `dir` then renaming it over the target
fn write_atomic(dir: &Path, name: &str, content: &str) -> StorageResult<()> {
    let io_err = |source| StorageError::Io {
        path: dir.join(name),
        source,
    };

    fs::create_dir_all(dir).map_err(io_err)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(content.as_bytes()).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;

    let target = dir.join(name);
    tmp.persist(&target)
        .map_err(|source| StorageError::Persist {
            path: target,
            source,
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn record(id: &str, name: &str) -> RecipeRecord {
        let content = match json!({"id": id, "name": name, "share": {"url": format!("u/{}", id)}}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        RecipeRecord::from_content(content, "$").unwrap()
    }

    fn checkpoint(scraped: &[&str], failed: &[&str]) -> Checkpoint {
        Checkpoint {
            scraped: scraped.iter().map(|u| u.to_string()).collect(),
            failed: failed.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[test]
    fn test_new_creates_layout() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("out");
        let store = DirectoryStore::new(&root).unwrap();

        assert!(store.recipes_dir().is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    #[test]
    fn test_empty_store_loads_empty_checkpoint() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryStore::new(dir.path()).unwrap();

        let loaded = store.load_checkpoint().unwrap();
        assert!(loaded.scraped.is_empty());
        assert!(loaded.failed.is_empty());
    }

    #[test]
    fn test_checkpoint_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryStore::new(dir.path()).unwrap();
        let saved = checkpoint(&["u/b", "u/a", "u/c"], &["https://x/missing"]);

        store.save_checkpoint(&saved).unwrap();
        let reopened = DirectoryStore::new(dir.path()).unwrap();

        assert_eq!(reopened.load_checkpoint().unwrap(), saved);
    }

    #[test]
    fn test_checkpoint_files_are_sorted_lines() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryStore::new(dir.path()).unwrap();

        store
            .save_checkpoint(&checkpoint(&["u/b", "u/a"], &[]))
            .unwrap();

        let scraped = fs::read_to_string(dir.path().join(SCRAPED_FILE)).unwrap();
        assert_eq!(scraped, "u/a\nu/b");
        let failed = fs::read_to_string(dir.path().join(FAILED_FILE)).unwrap();
        assert_eq!(failed, "");
    }

    #[test]
    fn test_checkpoint_is_rewritten_whole() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryStore::new(dir.path()).unwrap();

        store
            .save_checkpoint(&checkpoint(&["u/a", "u/b"], &["p/x"]))
            .unwrap();
        store.save_checkpoint(&checkpoint(&["u/c"], &[])).unwrap();

        assert_eq!(store.load_checkpoint().unwrap(), checkpoint(&["u/c"], &[]));
    }

    #[test]
    fn test_load_ignores_blank_lines() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryStore::new(dir.path()).unwrap();
        fs::write(dir.path().join(SCRAPED_FILE), "u/a\n\n  \nu/b\n").unwrap();

        let loaded = store.load_checkpoint().unwrap();
        assert_eq!(loaded.scraped.len(), 2);
    }

    #[test]
    fn test_save_record() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryStore::new(dir.path()).unwrap();

        let path = store.save_record(&record("Lemon-Bars-1", "Lemon Bars")).unwrap();

        assert_eq!(path, store.record_path("Lemon-Bars-1"));
        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["name"], "Lemon Bars");
        assert_eq!(written["share"]["url"], "u/Lemon-Bars-1");
    }

    #[test]
    fn test_save_record_twice_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryStore::new(dir.path()).unwrap();

        store.save_record(&record("A", "first")).unwrap();
        let path = store.save_record(&record("A", "second")).unwrap();

        assert_eq!(store.count_records().unwrap(), 1);
        let written: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["name"], "second");
    }

    #[test]
    fn test_count_records_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryStore::new(dir.path()).unwrap();

        store.save_record(&record("A", "a")).unwrap();
        store.save_record(&record("B/1", "b")).unwrap();
        fs::write(store.recipes_dir().join("README"), "notes").unwrap();

        assert_eq!(store.count_records().unwrap(), 2);
    }

    #[test]
    fn test_count_records_without_directory() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryStore::open_existing(&dir.path().join("missing"));
        assert_eq!(store.count_records().unwrap(), 0);
    }
}
