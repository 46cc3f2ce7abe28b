//! Crate node types and arena ids

use crate::record::CrateRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node inside its [`CrateTree`](super::CrateTree) arena.
///
/// Ids are only meaningful for the tree that issued them. The root is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A crate with its position in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrateNode {
    pub(crate) record: CrateRecord,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>, // discovery order
}

impl CrateNode {
    pub(crate) fn new(record: CrateRecord, parent: Option<NodeId>) -> Self {
        Self {
            record,
            parent,
            children: Vec::new(),
        }
    }

    pub fn record(&self) -> &CrateRecord {
        &self.record
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Last segment of the name, or the whole name for the root.
    pub fn segment(&self) -> &str {
        super::name::last_segment(&self.record.name)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn tracks(&self) -> &[String] {
        &self.record.tracks
    }
}
