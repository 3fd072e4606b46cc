//! The folder -> date download index.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

/// Maps each download folder to the date it was requested for, so specific
/// original data can be found later. Loaded if present, appended to across
/// runs, never pruned.
pub struct DownloadIndex {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl DownloadIndex {
    pub fn load(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            serde_json::from_str(&fs::read_to_string(path)?)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn insert(&mut self, folder: &str, date: &str) {
        self.entries.insert(folder.to_string(), date.to_string());
    }

    pub fn get(&self, folder: &str) -> Option<&str> {
        self.entries.get(folder).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;

        Ok(())
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn should_start_empty_when_file_is_missing() {
        let dir = TempDir::new().unwrap();
        let index = DownloadIndex::load(&dir.path().join("download_index.json")).unwrap();

        assert_eq!(index.len(), 0);
    }

    #[test]
    fn should_roundtrip_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("download_index.json");

        let mut index = DownloadIndex::load(&path).unwrap();
        index.insert("a1b2c3", "2017-11-24");
        index.save().unwrap();

        let reloaded = DownloadIndex::load(&path).unwrap();
        assert_eq!(reloaded.get("a1b2c3"), Some("2017-11-24"));
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn should_append_without_pruning() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("download_index.json");

        let mut index = DownloadIndex::load(&path).unwrap();
        index.insert("first", "2017-11-24");
        index.save().unwrap();

        let mut index = DownloadIndex::load(&path).unwrap();
        index.insert("second", "2017-12-04");
        index.save().unwrap();

        let reloaded = DownloadIndex::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("first"), Some("2017-11-24"));
    }
}
