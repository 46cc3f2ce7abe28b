//! Crate Store
//!
//! A flat collection of crates addressed by name. The on-disk form is the
//! Serato `Subcrates` directory, one `<name>.crate` file per record; hierarchy
//! lives only in the names.

mod directory;
mod memory;

pub use directory::DirectoryStore;
pub use memory::MemoryStore;

use crate::error::StorageError;
use crate::record::CrateRecord;

/// Crate store interface
///
/// Callers serialize access to a given store themselves; implementations do
/// no locking.
pub trait CrateStore {
    /// Names of every crate in the store, in no particular order.
    fn list_names(&self) -> Result<Vec<String>, StorageError>;

    /// Decode the crate called `name`.
    fn load(&self, name: &str) -> Result<CrateRecord, StorageError>;

    /// Persist `record` under its own name, replacing any previous version.
    fn save(&self, record: &CrateRecord) -> Result<(), StorageError>;

    /// Human-readable location for reports and logs.
    fn location(&self) -> String;
}
