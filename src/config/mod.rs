//! Configuration
//!
//! Layered with the `config` crate: defaults, the global
//! `config.toml`, an explicit `--config` file, then `CRATEDIGGER__SECTION__KEY`
//! environment variables.
//!
//! ```toml
//! [library]
//! root_label = "Media"
//! primary_drive = "C"
//! home_dir = 'C:\Users\dj'
//! extensions = ["mp3", "flac"]
//!
//! [logging]
//! level = "debug"
//! ```

mod loader;

pub use loader::ConfigLoader;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::mirror::listing::{MediaFilter, MEDIA_EXTENSIONS};
use crate::mirror::DEFAULT_ROOT_LABEL;
use crate::volume::VolumeResolver;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrateDiggerConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub library: LibraryConfig,
}

/// How folders are mirrored and where volumes resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// First segment of every mirrored crate name.
    #[serde(default = "default_root_label")]
    pub root_label: String,

    /// Windows drive whose crates live under the user's home.
    #[serde(default = "default_primary_drive")]
    pub primary_drive: String,

    /// Home directory for primary-drive paths outside `\Users\<user>`.
    #[serde(default)]
    pub home_dir: Option<PathBuf>,

    /// File extensions treated as tracks.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_root_label() -> String {
    DEFAULT_ROOT_LABEL.to_string()
}

fn default_primary_drive() -> String {
    "C".to_string()
}

fn default_extensions() -> Vec<String> {
    MEDIA_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root_label: default_root_label(),
            primary_drive: default_primary_drive(),
            home_dir: None,
            extensions: default_extensions(),
        }
    }
}

impl LibraryConfig {
    pub fn resolver(&self) -> Result<VolumeResolver, ApiError> {
        let mut chars = self.primary_drive.trim().trim_end_matches(':').chars();
        let drive = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => c,
            _ => {
                return Err(ApiError::ConfigError(format!(
                    "library.primary_drive must be a single drive letter, got {:?}",
                    self.primary_drive
                )))
            }
        };
        let resolver = VolumeResolver::new(drive);
        Ok(match &self.home_dir {
            Some(home) => resolver.with_home_dir(home),
            None => resolver,
        })
    }

    pub fn media_filter(&self) -> Result<MediaFilter, ApiError> {
        if self.extensions.iter().all(|e| e.trim_start_matches('.').is_empty()) {
            return Err(ApiError::ConfigError(
                "library.extensions must name at least one extension".to_string(),
            ));
        }
        Ok(MediaFilter::from_extensions(
            self.extensions
                .iter()
                .filter(|e| !e.trim_start_matches('.').is_empty()),
        ))
    }
}
