//! Mirror Builder
//!
//! Turns a media folder into a crate tree. The folder and each directory below
//! it become one crate named after its path on the volume:
//!
//! ```text
//! /Volumes/serato/8mm/Opener EP  ->  Media%%serato%%8mm%%Opener EP
//! ```
//!
//! Directories between the volume root and the source folder get empty crates
//! so every mirrored name has its parent in the store.

pub mod listing;

pub use listing::{DirectoryListing, EntryKind, FsListing, ListedEntry, MediaFilter};

use crate::error::{StorageError, TreeError};
use crate::record::CrateRecord;
use crate::tree::{name, CrateTree, NodeId};
use crate::volume::Volume;
use std::path::Path;
use tracing::{debug, info};

/// Root label used for mirrored crates.
pub const DEFAULT_ROOT_LABEL: &str = "Media";

/// Builds crate trees from directories on one volume.
#[derive(Debug, Clone)]
pub struct MirrorBuilder<L = FsListing> {
    root_label: String,
    volume: Volume,
    filter: MediaFilter,
    listing: L,
}

impl MirrorBuilder<FsListing> {
    pub fn new(volume: Volume) -> Self {
        Self {
            root_label: DEFAULT_ROOT_LABEL.to_string(),
            volume,
            filter: MediaFilter::default(),
            listing: FsListing,
        }
    }
}

impl<L: DirectoryListing> MirrorBuilder<L> {
    /// Swap the directory listing, keeping every other setting.
    pub fn with_listing<M: DirectoryListing>(self, listing: M) -> MirrorBuilder<M> {
        MirrorBuilder {
            root_label: self.root_label,
            volume: self.volume,
            filter: self.filter,
            listing,
        }
    }

    pub fn with_root_label(mut self, root_label: impl Into<String>) -> Self {
        self.root_label = root_label.into();
        self
    }

    pub fn with_filter(mut self, filter: MediaFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn root_label(&self) -> &str {
        &self.root_label
    }

    /// Mirror `source` and everything below it.
    pub fn build(&self, source: &Path) -> Result<CrateTree, StorageError> {
        let mut segments = self
            .volume
            .relative_segments(source)
            .map_err(|e| TreeError::InvariantViolation(e.to_string()))?;

        let mut tree = CrateTree::new(&self.root_label)?;
        let volume_name = name::join(&self.root_label, &self.volume.volume_id);
        let mut node = tree.add_child(NodeId::ROOT, CrateRecord::new(volume_name))?;
        for segment in &segments {
            let crate_name = name::join(tree.node(node)?.name(), segment);
            node = tree.add_child(node, CrateRecord::new(crate_name))?;
        }

        self.populate(&mut tree, node, source, &mut segments)?;
        info!(
            source = %source.display(),
            volume = %self.volume.volume_id,
            crates = tree.descendant_count(NodeId::ROOT),
            tracks = tree.track_count(),
            "Mirrored folder"
        );
        Ok(tree)
    }

    /// Fill `node` from `dir`, then recurse into subdirectories in listing order.
    fn populate(
        &self,
        tree: &mut CrateTree,
        node: NodeId,
        dir: &Path,
        segments: &mut Vec<String>,
    ) -> Result<(), StorageError> {
        let mut subdirs = Vec::new();
        for entry in self.listing.list(dir)? {
            match entry.kind {
                EntryKind::File if self.filter.is_media(&entry.name) => {
                    tree.push_track(node, track_path(segments, &entry.name))?;
                }
                EntryKind::File => {}
                EntryKind::Directory => subdirs.push(entry.name),
            }
        }
        debug!(
            crate_name = %tree.node(node)?.name(),
            tracks = tree.node(node)?.tracks().len(),
            "Populated crate"
        );

        for subdir in subdirs {
            let crate_name = name::join(tree.node(node)?.name(), &subdir);
            let child = tree.add_child(node, CrateRecord::new(crate_name))?;
            let child_dir = dir.join(&subdir);
            segments.push(subdir);
            self.populate(tree, child, &child_dir, segments)?;
            segments.pop();
        }
        Ok(())
    }
}

fn track_path(segments: &[String], file_name: &str) -> String {
    let mut parts: Vec<&str> = segments.iter().map(String::as_str).collect();
    parts.push(file_name);
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::VolumeResolver;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Listing backed by a fixed map of directory contents.
    struct FakeListing(HashMap<PathBuf, Vec<ListedEntry>>);

    impl DirectoryListing for FakeListing {
        fn list(&self, dir: &Path) -> Result<Vec<ListedEntry>, StorageError> {
            Ok(self.0.get(dir).cloned().unwrap_or_default())
        }
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_mirror_naming() {
        let temp = TempDir::new().unwrap();
        let volume_root = temp.path().join("serato");
        let source = volume_root.join("8mm").join("Opener EP");
        touch(&source.join("01 Opener.mp3"));

        let tree = MirrorBuilder::new(Volume::explicit(&volume_root))
            .build(&source)
            .unwrap();

        let names: Vec<&str> = tree.records().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Media%%serato",
                "Media%%serato%%8mm",
                "Media%%serato%%8mm%%Opener EP"
            ]
        );
        let leaf = tree.find("Media%%serato%%8mm%%Opener EP").unwrap();
        assert_eq!(
            tree.get(leaf).unwrap().tracks(),
            &["8mm/Opener EP/01 Opener.mp3".to_string()]
        );
        assert!(tree
            .get(tree.find("Media%%serato%%8mm").unwrap())
            .unwrap()
            .tracks()
            .is_empty());
    }

    #[test]
    fn test_track_filtering_at_volume_root() {
        let temp = TempDir::new().unwrap();
        let volume_root = temp.path().join("serato");
        touch(&volume_root.join("a.mp3"));
        touch(&volume_root.join("b.txt"));
        touch(&volume_root.join("c.flac"));

        let tree = MirrorBuilder::new(Volume::explicit(&volume_root))
            .build(&volume_root)
            .unwrap();

        assert_eq!(tree.descendant_count(tree.root()), 1);
        let node = tree.find("Media%%serato").unwrap();
        assert_eq!(tree.get(node).unwrap().tracks(), &["a.mp3", "c.flac"]);
    }

    #[test]
    fn test_pre_order_and_nested_tracks() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("vol");
        touch(&root.join("House").join("Deep").join("x.m4a"));
        touch(&root.join("House").join("y.MP3"));
        touch(&root.join("Techno").join("z.wav"));
        std::fs::create_dir_all(root.join("Empty")).unwrap();

        let tree = MirrorBuilder::new(Volume::explicit(&root))
            .with_root_label("Library")
            .build(&root)
            .unwrap();

        let names: Vec<&str> = tree.records().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Library%%vol",
                "Library%%vol%%Empty",
                "Library%%vol%%House",
                "Library%%vol%%House%%Deep",
                "Library%%vol%%Techno",
            ]
        );
        let deep = tree.find("Library%%vol%%House%%Deep").unwrap();
        assert_eq!(tree.get(deep).unwrap().tracks(), &["House/Deep/x.m4a"]);
        assert_eq!(tree.track_count(), 3);
    }

    #[test]
    fn test_source_outside_volume() {
        let builder = MirrorBuilder::new(Volume::explicit("/Volumes/serato"));
        let err = builder.build(Path::new("/Volumes/other/Music")).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Tree(TreeError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_windows_volume_mirrors_on_any_host() {
        let volume = VolumeResolver::new('C').resolve(r"D:\Music\House").unwrap();
        let source = PathBuf::from(r"d:\Music\House");
        let listing = FakeListing(HashMap::from([(
            source.clone(),
            vec![ListedEntry::file("a.mp3"), ListedEntry::file("notes.txt")],
        )]));
        let tree = MirrorBuilder::new(volume)
            .with_listing(listing)
            .build(&source)
            .unwrap();

        let names: Vec<&str> = tree.records().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Media%%D", "Media%%D%%Music", "Media%%D%%Music%%House"]);
        let house = tree.find("Media%%D%%Music%%House").unwrap();
        assert_eq!(tree.get(house).unwrap().tracks(), &["Music/House/a.mp3"]);
    }

    #[test]
    fn test_percent_directories() {
        let root = PathBuf::from("/vol");
        let listing = FakeListing(HashMap::from([(
            root.clone(),
            vec![ListedEntry::directory("Top 100%")],
        )]));
        let tree = MirrorBuilder::new(Volume::explicit(&root))
            .with_listing(listing)
            .build(&root)
            .unwrap();
        assert!(tree.find("Media%%vol%%Top 100%").is_some());

        let listing = FakeListing(HashMap::from([
            (root.clone(), vec![ListedEntry::directory("Top 100%")]),
            (root.join("Top 100%"), vec![ListedEntry::directory("Sets")]),
        ]));
        let err = MirrorBuilder::new(Volume::explicit(&root))
            .with_listing(listing)
            .build(&root)
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Tree(TreeError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_directory_with_delimiter_is_rejected() {
        let root = PathBuf::from("/vol");
        let listing = FakeListing(HashMap::from([(
            root.clone(),
            vec![ListedEntry::directory("A%%B")],
        )]));
        let err = MirrorBuilder::new(Volume::explicit(&root))
            .with_listing(listing)
            .build(&root)
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Tree(TreeError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_custom_listing_and_filter() {
        let root = PathBuf::from("/vol");
        let listing = FakeListing(HashMap::from([
            (
                root.clone(),
                vec![
                    ListedEntry::file("b.opus"),
                    ListedEntry::file("a.mp3"),
                    ListedEntry::directory("Sets"),
                ],
            ),
            (root.join("Sets"), vec![ListedEntry::file("live.opus")]),
        ]));
        let tree = MirrorBuilder::new(Volume::explicit(&root))
            .with_listing(listing)
            .with_filter(MediaFilter::from_extensions(["opus"]))
            .build(&root)
            .unwrap();

        let vol = tree.find("Media%%vol").unwrap();
        assert_eq!(tree.get(vol).unwrap().tracks(), &["b.opus"]);
        let sets = tree.find("Media%%vol%%Sets").unwrap();
        assert_eq!(tree.get(sets).unwrap().tracks(), &["Sets/live.opus"]);
    }
}
