//! Crate Tree
//!
//! Arena of [`CrateNode`]s addressed by [`NodeId`]. Each node stores its parent
//! id and an ordered list of child ids; children are only ever appended, so the
//! structure cannot form a cycle.
//!
//! The root node is a sentinel that is never persisted. Its name groups every
//! crate of one session (`Media` for mirrored folders); an empty root name
//! stands for the whole store.

pub mod assembler;
pub mod name;
pub mod node;

pub use node::{CrateNode, NodeId};

use crate::error::TreeError;
use crate::record::CrateRecord;
use std::collections::HashMap;

/// A crate hierarchy owned by one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrateTree {
    nodes: Vec<CrateNode>,
    by_name: HashMap<String, NodeId>,
}

impl CrateTree {
    /// Create a tree holding only the root sentinel.
    pub fn new(root_name: &str) -> Result<Self, TreeError> {
        if !root_name.is_empty() {
            name::validate_parent_segment(root_name)?;
        }
        let root = CrateNode::new(CrateRecord::new(root_name), None);
        let mut by_name = HashMap::new();
        by_name.insert(root_name.to_string(), NodeId::ROOT);
        Ok(Self {
            nodes: vec![root],
            by_name,
        })
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn root_name(&self) -> &str {
        self.nodes[0].name()
    }

    pub fn get(&self, id: NodeId) -> Option<&CrateNode> {
        self.nodes.get(id.0)
    }

    /// Like [`get`](Self::get) but an unknown id is an error.
    pub fn node(&self, id: NodeId) -> Result<&CrateNode, TreeError> {
        self.get(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.to_string()))
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent())
    }

    /// Number of nodes including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Attach `record` below `parent`.
    ///
    /// The record name must be `parent.name + delimiter + segment` and must not
    /// already exist in the tree.
    pub fn add_child(&mut self, parent: NodeId, record: CrateRecord) -> Result<NodeId, TreeError> {
        let parent_name = self.node(parent)?.name();
        name::child_segment(parent_name, &record.name)?;
        if self.by_name.contains_key(&record.name) {
            return Err(TreeError::InvariantViolation(format!(
                "duplicate crate name {:?}",
                record.name
            )));
        }

        let id = NodeId(self.nodes.len());
        self.by_name.insert(record.name.clone(), id);
        self.nodes.push(CrateNode::new(record, Some(parent)));
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Append a track to a node during initial population.
    pub fn push_track(&mut self, id: NodeId, track: impl Into<String>) -> Result<(), TreeError> {
        if id == NodeId::ROOT {
            return Err(TreeError::InvariantViolation(
                "the root crate is a sentinel and holds no tracks".to_string(),
            ));
        }
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
        node.record.tracks.push(track.into());
        Ok(())
    }

    /// Pre-order traversal from the root.
    pub fn pre_order(&self) -> PreOrder<'_> {
        self.pre_order_from(NodeId::ROOT)
    }

    /// Pre-order traversal of the subtree at `start`, `start` included.
    pub fn pre_order_from(&self, start: NodeId) -> PreOrder<'_> {
        let stack = if self.get(start).is_some() {
            vec![start]
        } else {
            Vec::new()
        };
        PreOrder { tree: self, stack }
    }

    /// Every persisted record (all nodes but the root) in pre-order.
    pub fn records(&self) -> impl Iterator<Item = &CrateRecord> + '_ {
        self.pre_order()
            .skip(1)
            .filter_map(move |id| self.get(id).map(|n| n.record()))
    }

    /// Number of nodes below `id`.
    pub fn descendant_count(&self, id: NodeId) -> usize {
        self.pre_order_from(id).count().saturating_sub(1)
    }

    /// Total tracks across the tree.
    pub fn track_count(&self) -> usize {
        self.nodes.iter().map(|n| n.tracks().len()).sum()
    }

    /// Text rendering with box-drawing guides, one node per line.
    ///
    /// ```text
    /// Media
    /// └── serato
    ///     ├── 8mm [2]
    ///     └── Tycho
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();
        let root_label = if self.root_name().is_empty() {
            "(store)"
        } else {
            self.root_name()
        };
        out.push_str(root_label);
        out.push('\n');
        self.render_children(NodeId::ROOT, "", &mut out);
        out
    }

    fn render_children(&self, id: NodeId, indent: &str, out: &mut String) {
        let children = self.children(id);
        for (i, &child) in children.iter().enumerate() {
            let Some(node) = self.get(child) else {
                continue;
            };
            let last = i + 1 == children.len();
            out.push_str(indent);
            out.push_str(if last { "└── " } else { "├── " });
            out.push_str(node.segment());
            if !node.tracks().is_empty() {
                out.push_str(&format!(" [{}]", node.tracks().len()));
            }
            out.push('\n');
            let next = format!("{}{}", indent, if last { "    " } else { "│   " });
            self.render_children(child, &next, out);
        }
    }
}

/// Iterator returned by [`CrateTree::pre_order`].
pub struct PreOrder<'a> {
    tree: &'a CrateTree,
    stack: Vec<NodeId>,
}

impl Iterator for PreOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        // Reverse so the first child is visited first.
        self.stack.extend(self.tree.children(id).iter().rev());
        Some(id)
    }
}
