//! Volume resolution
//!
//! Serato keeps one `_Serato_` directory per volume, and a mirrored crate name
//! embeds the id of the volume its folder lives on. Resolution is purely
//! textual over the two platform conventions, so a Windows path resolves the
//! same way on any host:
//!
//! | path                   | id        | store root                               |
//! |------------------------|-----------|------------------------------------------|
//! | `/Volumes/<n>/...`     | `<n>`     | `/Volumes/<n>/_Serato_/Subcrates`        |
//! | `/Users/<u>/...`       | `root`    | `/Users/<u>/Music/_Serato_/Subcrates`    |
//! | `D:\...`               | `D`       | `D:\_Serato_\Subcrates`                  |
//! | `C:\...` (primary)     | `root`    | `<home>\Music\_Serato_\Subcrates`        |

use crate::error::VolumeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Volume id of the system volume.
pub const ROOT_VOLUME_ID: &str = "root";

const SERATO_DIR: &str = "_Serato_";
const SUBCRATES_DIR: &str = "Subcrates";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mac,
    Windows,
}

impl Platform {
    /// Convention of the running host.
    pub fn host() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Mac
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Mac => write!(f, "mac"),
            Platform::Windows => write!(f, "windows"),
        }
    }
}

/// Where a folder lives and where the crates for that volume are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Volume {
    pub platform: Platform,
    pub volume_id: String,
    pub volume_root: PathBuf,
    pub store_root: PathBuf,
}

impl Volume {
    /// Descriptor for a caller-designated volume root.
    pub fn explicit(volume_root: impl Into<PathBuf>) -> Self {
        let volume_root = volume_root.into();
        let volume_id = volume_root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(ROOT_VOLUME_ID)
            .to_string();
        let store_root = volume_root.join(SERATO_DIR).join(SUBCRATES_DIR);
        Self {
            platform: Platform::host(),
            volume_id,
            volume_root,
            store_root,
        }
    }

    /// Keep the volume but store crates under `<serato_dir>/_Serato_/Subcrates`.
    pub fn with_serato_dir(mut self, serato_dir: impl AsRef<Path>) -> Self {
        self.store_root = serato_dir.as_ref().join(SERATO_DIR).join(SUBCRATES_DIR);
        self
    }

    /// Components of `path` below the volume root.
    ///
    /// Windows volumes are matched textually and case-insensitively, like
    /// [`VolumeResolver::resolve`], so `D:\Music` splits the same on any host.
    pub fn relative_segments(&self, path: &Path) -> Result<Vec<String>, VolumeError> {
        let display = path.display().to_string();
        let outside = || {
            unresolvable(
                &display,
                &format!("not below volume root {}", self.volume_root.display()),
            )
        };
        match self.platform {
            Platform::Windows => {
                let root = self.volume_root.to_str().ok_or_else(outside)?;
                let text = path
                    .to_str()
                    .ok_or_else(|| unresolvable(&display, "path is not valid UTF-8"))?;
                windows_relative(root, text).ok_or_else(outside)
            }
            Platform::Mac => {
                let relative = path.strip_prefix(&self.volume_root).map_err(|_| outside())?;
                let mut segments = Vec::new();
                for component in relative.components() {
                    match component {
                        Component::Normal(part) => segments.push(
                            part.to_str()
                                .ok_or_else(|| unresolvable(&display, "path is not valid UTF-8"))?
                                .to_string(),
                        ),
                        Component::CurDir => {}
                        _ => return Err(outside()),
                    }
                }
                Ok(segments)
            }
        }
    }
}

/// Maps absolute paths onto [`Volume`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeResolver {
    primary_drive: char,
    home_dir: Option<PathBuf>,
}

impl Default for VolumeResolver {
    fn default() -> Self {
        Self {
            primary_drive: 'C',
            home_dir: None,
        }
    }
}

impl VolumeResolver {
    pub fn new(primary_drive: char) -> Self {
        Self {
            primary_drive: primary_drive.to_ascii_uppercase(),
            home_dir: None,
        }
    }

    /// Home used for primary-drive paths that are not under `\Users\<user>`.
    pub fn with_home_dir(mut self, home_dir: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home_dir.into());
        self
    }

    pub fn primary_drive(&self) -> char {
        self.primary_drive
    }

    pub fn resolve_path(&self, path: &Path) -> Result<Volume, VolumeError> {
        let text = path.to_str().ok_or_else(|| VolumeError::UnresolvableVolume {
            path: path.display().to_string(),
            reason: "path is not valid UTF-8".to_string(),
        })?;
        self.resolve(text)
    }

    pub fn resolve(&self, path: &str) -> Result<Volume, VolumeError> {
        if let Some(rest) = path.strip_prefix("/Volumes/") {
            let name = first_component(rest, &['/'])
                .ok_or_else(|| unresolvable(path, "missing volume name after /Volumes/"))?;
            let volume_root = format!("/Volumes/{}", name);
            return Ok(Volume {
                platform: Platform::Mac,
                volume_id: name.to_string(),
                store_root: PathBuf::from(format!(
                    "{}/{}/{}",
                    volume_root, SERATO_DIR, SUBCRATES_DIR
                )),
                volume_root: PathBuf::from(volume_root),
            });
        }

        if let Some(rest) = path.strip_prefix("/Users/") {
            let user = first_component(rest, &['/'])
                .ok_or_else(|| unresolvable(path, "missing user name after /Users/"))?;
            return Ok(Volume {
                platform: Platform::Mac,
                volume_id: ROOT_VOLUME_ID.to_string(),
                volume_root: PathBuf::from("/"),
                store_root: PathBuf::from(format!(
                    "/Users/{}/Music/{}/{}",
                    user, SERATO_DIR, SUBCRATES_DIR
                )),
            });
        }

        if let Some((letter, rest)) = drive_letter(path) {
            return self.resolve_windows(path, letter, rest);
        }

        Err(unresolvable(
            path,
            "expected /Volumes/<name>, /Users/<user> or a drive letter",
        ))
    }

    fn resolve_windows(&self, path: &str, letter: char, rest: &str) -> Result<Volume, VolumeError> {
        let volume_root = format!("{}:\\", letter);
        if letter != self.primary_drive {
            return Ok(Volume {
                platform: Platform::Windows,
                volume_id: letter.to_string(),
                store_root: PathBuf::from(format!(
                    "{}{}\\{}",
                    volume_root, SERATO_DIR, SUBCRATES_DIR
                )),
                volume_root: PathBuf::from(volume_root),
            });
        }

        let home = match users_home(rest) {
            Some(user) => format!("{}Users\\{}", volume_root, user),
            None => self
                .fallback_home()
                .ok_or_else(|| unresolvable(path, "no home directory for the primary drive"))?,
        };
        Ok(Volume {
            platform: Platform::Windows,
            volume_id: ROOT_VOLUME_ID.to_string(),
            volume_root: PathBuf::from(volume_root),
            store_root: PathBuf::from(format!(
                "{}\\Music\\{}\\{}",
                home.trim_end_matches(['\\', '/']),
                SERATO_DIR,
                SUBCRATES_DIR
            )),
        })
    }

    fn fallback_home(&self) -> Option<String> {
        if let Some(home) = &self.home_dir {
            return Some(home.display().to_string());
        }
        // The host home only means something for a Windows path on Windows.
        if cfg!(windows) {
            return directories::BaseDirs::new().map(|dirs| dirs.home_dir().display().to_string());
        }
        None
    }
}

fn unresolvable(path: &str, reason: &str) -> VolumeError {
    VolumeError::UnresolvableVolume {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

fn first_component<'a>(rest: &'a str, separators: &[char]) -> Option<&'a str> {
    rest.split(separators).next().filter(|c| !c.is_empty())
}

/// `X:` followed by a separator or the end of the string.
fn drive_letter(path: &str) -> Option<(char, &str)> {
    let mut chars = path.chars();
    let letter = chars.next().filter(|c| c.is_ascii_alphabetic())?;
    if chars.next() != Some(':') {
        return None;
    }
    let rest = &path[2..];
    if rest.is_empty() {
        return Some((letter.to_ascii_uppercase(), rest));
    }
    let rest = rest.strip_prefix(['\\', '/'])?;
    Some((letter.to_ascii_uppercase(), rest))
}

/// Segments of `path` after `root`, splitting on either separator.
fn windows_relative(root: &str, path: &str) -> Option<Vec<String>> {
    let root = root.trim_end_matches(['\\', '/']);
    let head = path.get(..root.len())?;
    if !head.eq_ignore_ascii_case(root) {
        return None;
    }
    let rest = &path[root.len()..];
    if !rest.is_empty() && !rest.starts_with(['\\', '/']) {
        return None;
    }
    let mut segments = Vec::new();
    for part in rest.split(['\\', '/']) {
        match part {
            "" | "." => {}
            ".." => return None,
            part => segments.push(part.to_string()),
        }
    }
    Some(segments)
}

/// `<user>` when `rest` is `Users\<user>\...`.
fn users_home(rest: &str) -> Option<&str> {
    let mut components = rest.split(['\\', '/']);
    let users = components.next()?;
    if !users.eq_ignore_ascii_case("Users") {
        return None;
    }
    components.next().filter(|user| !user.is_empty())
}
