//! cratedigger: Serato crates from folder trees
//!
//! Mirrors a media folder hierarchy into Serato DJ crates and reads crate
//! stores back as trees. A crate is one binary `.crate` file; its place in the
//! hierarchy is encoded in its name, with `%%` between ancestor segments.
//!
//! - [`codec`] and [`record`]: the tagged binary format.
//! - [`tree`]: the arena tree and flat-name assembly.
//! - [`mirror`]: folder to crate tree.
//! - [`volume`]: which volume a path lives on and where its crates go.
//! - [`store`] and [`session`]: persistence.

pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod mirror;
pub mod record;
pub mod session;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod volume;

pub use error::{ApiError, FormatError, StorageError, TreeError, VolumeError};
pub use mirror::MirrorBuilder;
pub use record::CrateRecord;
pub use session::{StoreSession, SyncReport};
pub use store::{CrateStore, DirectoryStore, MemoryStore};
pub use tree::{CrateTree, NodeId};
pub use volume::{Platform, Volume, VolumeResolver};
