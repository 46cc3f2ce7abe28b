//! Store session: one store, one root label, one operation at a time.

use crate::error::{StorageError, TreeError};
use crate::mirror::{DirectoryListing, MirrorBuilder};
use crate::store::CrateStore;
use crate::tree::{assembler, name, CrateTree};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Outcome of a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub source: String,
    pub store: String,
    /// Crates produced by the mirror.
    pub crates: usize,
    pub tracks: usize,
    /// Crates actually written; zero on a dry run.
    pub written: usize,
    pub dry_run: bool,
}

/// Reads and writes the crates under one root label of a store.
pub struct StoreSession<S: CrateStore> {
    store: S,
    root_label: String,
}

impl<S: CrateStore> StoreSession<S> {
    /// `root_label` may be empty to address the whole store.
    pub fn new(store: S, root_label: impl Into<String>) -> Result<Self, StorageError> {
        let root_label = root_label.into();
        if !root_label.is_empty() {
            name::validate_parent_segment(&root_label)?;
        }
        Ok(Self { store, root_label })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn root_label(&self) -> &str {
        &self.root_label
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Assemble the tree of every crate under the root label.
    pub fn read(&self) -> Result<CrateTree, StorageError> {
        assembler::assemble(&self.store, &self.root_label)
    }

    /// Save every node except the root, parents before children.
    pub fn write(&self, tree: &CrateTree) -> Result<usize, StorageError> {
        if tree.root_name() != self.root_label {
            return Err(TreeError::InvariantViolation(format!(
                "tree rooted at {:?} cannot be written to session {:?}",
                tree.root_name(),
                self.root_label
            ))
            .into());
        }
        let mut written = 0;
        for record in tree.records() {
            self.store.save(record)?;
            written += 1;
        }
        info!(
            store = %self.store.location(),
            root = %self.root_label,
            written,
            "Wrote crates"
        );
        Ok(written)
    }

    /// Mirror `source` without touching the store.
    pub fn mirror<L: DirectoryListing>(
        &self,
        builder: &MirrorBuilder<L>,
        source: &Path,
    ) -> Result<CrateTree, StorageError> {
        if builder.root_label() != self.root_label {
            return Err(TreeError::InvariantViolation(format!(
                "mirror labelled {:?} does not belong to session {:?}",
                builder.root_label(),
                self.root_label
            ))
            .into());
        }
        builder.build(source)
    }

    /// Mirror `source`, then write the result unless `dry_run` is set.
    pub fn sync<L: DirectoryListing>(
        &self,
        builder: &MirrorBuilder<L>,
        source: &Path,
        dry_run: bool,
    ) -> Result<SyncReport, StorageError> {
        let tree = self.mirror(builder, source)?;
        let written = if dry_run { 0 } else { self.write(&tree)? };
        let report = SyncReport {
            source: source.display().to_string(),
            store: self.store.location(),
            crates: tree.descendant_count(tree.root()),
            tracks: tree.track_count(),
            written,
            dry_run,
        };
        info!(
            source = %report.source,
            crates = report.crates,
            tracks = report.tracks,
            dry_run,
            "Sync complete"
        );
        Ok(report)
    }

    /// Prefix shared by every crate this session owns.
    pub fn prefix(&self) -> String {
        name::child_prefix(&self.root_label)
    }
}
