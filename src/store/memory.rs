//! In-memory store holding encoded crate bytes.

use super::CrateStore;
use crate::error::StorageError;
use crate::record::CrateRecord;
use std::cell::RefCell;
use std::collections::BTreeMap;

/// Keeps encoded bytes per name, so every load and save still goes through
/// the binary codec.
#[derive(Debug, Default)]
pub struct MemoryStore {
    crates: RefCell<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert raw bytes under `name`, bypassing the encoder.
    pub fn insert_raw(&self, name: impl Into<String>, bytes: Vec<u8>) {
        self.crates.borrow_mut().insert(name.into(), bytes);
    }

    pub fn raw(&self, name: &str) -> Option<Vec<u8>> {
        self.crates.borrow().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.crates.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.crates.borrow().is_empty()
    }
}

impl CrateStore for MemoryStore {
    fn list_names(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.crates.borrow().keys().cloned().collect())
    }

    fn load(&self, name: &str) -> Result<CrateRecord, StorageError> {
        let crates = self.crates.borrow();
        let bytes = crates
            .get(name)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;
        CrateRecord::from_bytes(name, bytes).map_err(|e| StorageError::format(name, e))
    }

    fn save(&self, record: &CrateRecord) -> Result<(), StorageError> {
        let bytes = record
            .to_bytes()
            .map_err(|e| StorageError::format(record.name.as_str(), e))?;
        self.crates.borrow_mut().insert(record.name.clone(), bytes);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
