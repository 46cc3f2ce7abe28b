//! Flat→Tree Assembler
//!
//! Rebuilds a [`CrateTree`] from the flat names in a [`CrateStore`]. Names are
//! grouped depth-first: the direct children of a node are the names with
//! exactly one segment after its prefix, and every deeper name is handed to
//! the direct child whose prefix it carries. A name left over at a level has
//! no parent crate, which breaks prefix-closure and aborts the read.
//!
//! A whole-store read is the exception at the top level. Mirrored crates live
//! under a root label (`Media%%...`) that is never saved as a crate of its
//! own, so a missing first segment is filled in with an empty crate.

use super::{name, CrateTree, NodeId};
use crate::error::{StorageError, TreeError};
use crate::record::{CrateRecord, DELIMITER};
use crate::store::CrateStore;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Read every crate under `root_name` from `store` into a tree.
///
/// Names outside the root's prefix belong to other sessions and are skipped.
/// An empty `root_name` takes the whole store.
pub fn assemble<S: CrateStore + ?Sized>(
    store: &S,
    root_name: &str,
) -> Result<CrateTree, StorageError> {
    let mut tree = CrateTree::new(root_name)?;
    let prefix = name::child_prefix(root_name);

    let mut names = store.list_names()?;
    names.sort();

    let mut candidates = Vec::with_capacity(names.len());
    for crate_name in names {
        if crate_name == root_name || !crate_name.starts_with(prefix.as_str()) {
            debug!(crate_name = %crate_name, root = %root_name, "Skipping crate outside root");
            continue;
        }
        name::split(&crate_name)?;
        candidates.push(crate_name);
    }

    let implied = if root_name.is_empty() {
        implied_roots(&candidates)
    } else {
        BTreeSet::new()
    };
    if !implied.is_empty() {
        candidates.extend(implied.iter().cloned());
        candidates.sort();
    }

    attach_level(&mut tree, store, NodeId::ROOT, candidates, &implied)?;
    debug!(
        root = %root_name,
        crates = tree.descendant_count(NodeId::ROOT),
        implied = implied.len(),
        "Assembled crate tree"
    );
    Ok(tree)
}

/// First segments of nested names that have no crate of their own.
fn implied_roots(names: &[String]) -> BTreeSet<String> {
    let present: BTreeSet<&str> = names.iter().map(String::as_str).collect();
    names
        .iter()
        .filter_map(|n| n.split_once(DELIMITER).map(|(top, _)| top))
        .filter(|top| !present.contains(top))
        .map(str::to_string)
        .collect()
}

fn attach_level<S: CrateStore + ?Sized>(
    tree: &mut CrateTree,
    store: &S,
    parent: NodeId,
    candidates: Vec<String>,
    implied: &BTreeSet<String>,
) -> Result<(), StorageError> {
    let prefix_len = name::child_prefix(tree.node(parent)?.name()).len();
    let mut direct = Vec::new();
    let mut below: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for crate_name in candidates {
        match crate_name[prefix_len..].find(DELIMITER) {
            None => direct.push(crate_name),
            Some(end) => below
                .entry(crate_name[..prefix_len + end].to_string())
                .or_default()
                .push(crate_name),
        }
    }

    for crate_name in direct {
        let record = if implied.contains(&crate_name) {
            debug!(crate_name = %crate_name, "Adding empty crate for missing root");
            CrateRecord::new(crate_name.as_str())
        } else {
            load_named(store, &crate_name)?
        };
        let child = tree.add_child(parent, record)?;
        if let Some(mine) = below.remove(&crate_name) {
            attach_level(tree, store, child, mine, implied)?;
        }
    }

    if let Some(orphan) = below.values().flatten().next() {
        return Err(TreeError::InvariantViolation(format!(
            "crate {:?} has no parent crate",
            orphan
        ))
        .into());
    }
    Ok(())
}

fn load_named<S: CrateStore + ?Sized>(
    store: &S,
    crate_name: &str,
) -> Result<CrateRecord, StorageError> {
    let record = store.load(crate_name)?;
    if record.name != crate_name {
        return Err(TreeError::InvariantViolation(format!(
            "store returned crate {:?} for name {:?}",
            record.name, crate_name
        ))
        .into());
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CrateRecord;
    use crate::store::MemoryStore;

    fn store_with(names: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for name in names {
            let mut record = CrateRecord::new(*name);
            record.tracks.push(format!("{}.mp3", name::last_segment(name)));
            store.save(&record).unwrap();
        }
        store
    }

    fn child_segments(tree: &CrateTree, id: NodeId) -> Vec<String> {
        tree.children(id)
            .iter()
            .map(|&c| tree.get(c).unwrap().segment().to_string())
            .collect()
    }

    #[test]
    fn test_reconstructs_hierarchy() {
        let store = store_with(&["Root%%D", "Root%%A%%C", "Root%%A", "Root%%A%%B"]);
        let tree = assemble(&store, "Root").unwrap();

        assert_eq!(child_segments(&tree, tree.root()), vec!["A", "D"]);
        let a = tree.find("Root%%A").unwrap();
        assert_eq!(child_segments(&tree, a), vec!["B", "C"]);
        assert_eq!(tree.descendant_count(tree.root()), 4);
        assert_eq!(tree.get(a).unwrap().tracks(), &["A.mp3".to_string()]);
    }

    #[test]
    fn test_skips_names_outside_root() {
        let store = store_with(&["Root%%A", "House", "House%%Deep", "Rooted%%X"]);
        let tree = assemble(&store, "Root").unwrap();
        assert_eq!(tree.descendant_count(tree.root()), 1);
        assert!(tree.find("House").is_none());
    }

    #[test]
    fn test_empty_root_reads_whole_store() {
        let store = store_with(&["House", "House%%Deep", "Techno"]);
        let tree = assemble(&store, "").unwrap();
        assert_eq!(child_segments(&tree, tree.root()), vec!["House", "Techno"]);
        assert_eq!(tree.descendant_count(tree.root()), 3);
    }

    #[test]
    fn test_whole_store_fills_in_missing_root_label() {
        let store = store_with(&["House", "Media%%serato", "Media%%serato%%8mm"]);
        let tree = assemble(&store, "").unwrap();

        assert_eq!(child_segments(&tree, tree.root()), vec!["House", "Media"]);
        let media = tree.find("Media").unwrap();
        assert!(tree.get(media).unwrap().tracks().is_empty());
        assert_eq!(child_segments(&tree, media), vec!["serato"]);
        assert_eq!(tree.descendant_count(tree.root()), 4);
    }

    #[test]
    fn test_whole_store_still_rejects_deeper_orphans() {
        let store = store_with(&["Media%%serato", "Media%%other%%8mm"]);
        let err = assemble(&store, "").unwrap_err();
        assert!(
            matches!(err, StorageError::Tree(TreeError::InvariantViolation(ref msg)) if msg.contains("Media%%other%%8mm")),
            "{:?}",
            err
        );
    }

    #[test]
    fn test_segments_with_edge_percent_are_read() {
        let store = store_with(&["House", "House%%Top 100%", "Top 100%", "%Intro"]);
        let tree = assemble(&store, "").unwrap();
        assert_eq!(
            child_segments(&tree, tree.root()),
            vec!["%Intro", "House", "Top 100%"]
        );
        let house = tree.find("House").unwrap();
        assert_eq!(child_segments(&tree, house), vec!["Top 100%"]);
    }

    #[test]
    fn test_wide_level_groups_each_subtree() {
        let mut names = Vec::new();
        for i in 0..50 {
            names.push(format!("Root%%{:02}", i));
            names.push(format!("Root%%{:02}%%x", i));
            names.push(format!("Root%%{:02}%%x%%y", i));
        }
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let tree = assemble(&store_with(&refs), "Root").unwrap();
        assert_eq!(tree.children(tree.root()).len(), 50);
        assert_eq!(tree.descendant_count(tree.root()), 150);
        let leaf = tree.find("Root%%49%%x%%y").unwrap();
        assert_eq!(tree.parent(leaf), tree.find("Root%%49%%x"));
    }

    #[test]
    fn test_missing_parent_is_invariant_violation() {
        let store = store_with(&["Root%%A", "Root%%B%%C"]);
        let err = assemble(&store, "Root").unwrap_err();
        assert!(
            matches!(err, StorageError::Tree(TreeError::InvariantViolation(ref msg)) if msg.contains("Root%%B%%C")),
            "{:?}",
            err
        );
    }

    #[test]
    fn test_trailing_delimiter_is_invariant_violation() {
        let store = store_with(&["Root%%A", "Root%%A%%"]);
        let err = assemble(&store, "Root").unwrap_err();
        assert!(matches!(
            err,
            StorageError::Tree(TreeError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_ambiguous_delimiter_is_invariant_violation() {
        let store = store_with(&["Root%%A", "Root%%A%%%B"]);
        let err = assemble(&store, "Root").unwrap_err();
        assert!(matches!(
            err,
            StorageError::Tree(TreeError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_malformed_record_aborts_read() {
        let store = store_with(&["Root%%A", "Root%%A%%B"]);
        store.insert_raw("Root%%A%%B", b"vrsn\x00\x00".to_vec());
        let err = assemble(&store, "Root").unwrap_err();
        assert!(matches!(err, StorageError::Format { ref name, .. } if name == "Root%%A%%B"));
    }

    #[test]
    fn test_empty_store_gives_root_only() {
        let store = MemoryStore::new();
        let tree = assemble(&store, "Media").unwrap();
        assert!(tree.is_empty());
    }
}
