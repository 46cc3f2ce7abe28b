//! Directory listing and media file recognition.

use crate::error::StorageError;
use std::path::Path;
use walkdir::WalkDir;

/// Extensions recognized as media files.
pub const MEDIA_EXTENSIONS: [&str; 10] = [
    "mp3", "ogg", "alac", "flac", "aif", "wav", "wl.mp3", "mp4", "m4a", "aac",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry directly inside a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl ListedEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }
}

/// Lists the immediate entries of a directory.
pub trait DirectoryListing {
    fn list(&self, dir: &Path) -> Result<Vec<ListedEntry>, StorageError>;
}

/// Filesystem listing: one level deep, sorted by file name, symlinks are
/// neither followed nor reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsListing;

impl DirectoryListing for FsListing {
    fn list(&self, dir: &Path) -> Result<Vec<ListedEntry>, StorageError> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry?;
            let kind = if entry.file_type().is_dir() {
                EntryKind::Directory
            } else if entry.file_type().is_file() {
                EntryKind::File
            } else {
                continue;
            };
            match entry.file_name().to_str() {
                Some(name) => entries.push(ListedEntry {
                    name: name.to_string(),
                    kind,
                }),
                None => tracing::warn!("Skipping non UTF-8 path {:?}", entry.path()),
            }
        }
        Ok(entries)
    }
}

/// Decides which files become tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFilter {
    suffixes: Vec<String>, // ".mp3", lowercase
}

impl MediaFilter {
    pub fn from_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffixes = extensions
            .into_iter()
            .map(|ext| format!(".{}", ext.as_ref().trim_start_matches('.').to_lowercase()))
            .collect();
        Self { suffixes }
    }

    /// Case-insensitive suffix match on the file name.
    pub fn is_media(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.suffixes
            .iter()
            .any(|suffix| lower.len() > suffix.len() && lower.ends_with(suffix.as_str()))
    }
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self::from_extensions(MEDIA_EXTENSIONS)
    }
}
