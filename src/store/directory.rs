//! `Subcrates` directory store.

use super::CrateStore;
use crate::error::StorageError;
use crate::record::{CrateRecord, CRATE_EXTENSION};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Crates stored as files in one flat directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, CRATE_EXTENSION))
    }
}

impl CrateStore for DirectoryStore {
    fn list_names(&self) -> Result<Vec<String>, StorageError> {
        if !self.root.is_dir() {
            return Err(StorageError::NotADirectory(self.root.clone()));
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                tracing::warn!("Skipping non UTF-8 file name in store: {:?}", entry.path());
                continue;
            };
            if let Some(name) = CrateRecord::name_from_file_name(file_name) {
                names.push(name.to_string());
            }
        }
        tracing::debug!(store = %self.root.display(), count = names.len(), "Listed crates");
        Ok(names)
    }

    fn load(&self, name: &str) -> Result<CrateRecord, StorageError> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(StorageError::NotFound(name.to_string()));
        }
        CrateRecord::load(&path)
    }

    fn save(&self, record: &CrateRecord) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.root)?;
        record.write_to(&self.root)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}
