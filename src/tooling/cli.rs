//! CLI Tooling
//!
//! Command-line interface for mirroring media folders into Serato crates and
//! inspecting existing crate stores. Every command returns its output as a
//! string; the binary decides where it goes.

use crate::config::{ConfigLoader, CrateDiggerConfig};
use crate::error::ApiError;
use crate::logging::LogOverrides;
use crate::mirror::MirrorBuilder;
use crate::record::CrateRecord;
use crate::session::StoreSession;
use crate::store::{CrateStore, DirectoryStore};
use crate::tooling::format::{
    format_crate_json, format_crate_text, format_sync_json, format_sync_text, format_tree_json,
    format_tree_text, format_volume_json, format_volume_text,
};
use crate::volume::Volume;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

/// cratedigger - mirror folders into Serato crates
#[derive(Parser)]
#[command(name = "cratedigger")]
#[command(about = "Mirror media folders into Serato DJ crates and inspect crate stores")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging flags as overrides for the configured logging section.
    pub fn log_overrides(&self) -> LogOverrides {
        LogOverrides {
            verbose: self.verbose,
            level: self.log_level.clone(),
            format: self.log_format.clone(),
            output: self.log_output.clone(),
            file: self.log_file.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mirror a media folder into crates
    Sync {
        /// Folder to mirror
        #[arg(long)]
        library_dir: PathBuf,
        /// Directory holding `_Serato_` (default: resolved from the volume)
        #[arg(long)]
        serato_dir: Option<PathBuf>,
        /// Treat this directory as the volume root instead of resolving one
        #[arg(long)]
        volume_root: Option<PathBuf>,
        /// Build the crates without writing them
        #[arg(long)]
        dry_run: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Render the crate tree of a store
    List {
        /// Directory holding `_Serato_`
        #[arg(long, conflicts_with = "store")]
        serato_dir: Option<PathBuf>,
        /// `Subcrates` directory to read directly
        #[arg(long)]
        store: Option<PathBuf>,
        /// Root label to read under; empty for the whole store
        #[arg(long)]
        root: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Decode and print one crate file
    Show {
        /// Path to a `.crate` file
        path: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the volume a path belongs to
    Resolve {
        /// Absolute path to resolve
        path: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_format(format: &str) -> Result<OutputFormat, ApiError> {
    match format {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(ApiError::InvalidArgument(format!(
            "Invalid format: {} (must be 'text' or 'json')",
            other
        ))),
    }
}

/// CLI context holding the loaded configuration
pub struct CliContext {
    config: CrateDiggerConfig,
}

impl CliContext {
    /// Create a new CLI context, loading configuration from the standard sources.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = ConfigLoader::load(config_path.as_deref())?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: CrateDiggerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CrateDiggerConfig {
        &self.config
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Sync {
                library_dir,
                serato_dir,
                volume_root,
                dry_run,
                format,
            } => self.handle_sync(
                library_dir,
                serato_dir.as_deref(),
                volume_root.as_deref(),
                *dry_run,
                parse_format(format)?,
            ),
            Commands::List {
                serato_dir,
                store,
                root,
                format,
            } => self.handle_list(
                serato_dir.as_deref(),
                store.as_deref(),
                root.as_deref(),
                parse_format(format)?,
            ),
            Commands::Show { path, format } => self.handle_show(path, parse_format(format)?),
            Commands::Resolve { path, format } => self.handle_resolve(path, parse_format(format)?),
        }
    }

    fn handle_sync(
        &self,
        library_dir: &Path,
        serato_dir: Option<&Path>,
        volume_root: Option<&Path>,
        dry_run: bool,
        format: OutputFormat,
    ) -> Result<String, ApiError> {
        let source = canonical_dir(library_dir, "library directory")?;
        let volume = match volume_root {
            Some(root) => Volume::explicit(canonical_dir(root, "volume root")?),
            None => self.config.library.resolver()?.resolve_path(&source)?,
        };
        let volume = match serato_dir {
            Some(dir) => volume.with_serato_dir(dir),
            None => volume,
        };
        info!(
            source = %source.display(),
            volume = %volume.volume_id,
            store = %volume.store_root.display(),
            dry_run,
            "Starting sync"
        );

        let label = &self.config.library.root_label;
        let session = StoreSession::new(DirectoryStore::new(&volume.store_root), label.as_str())?;
        let builder = MirrorBuilder::new(volume.clone())
            .with_root_label(label.as_str())
            .with_filter(self.config.library.media_filter()?);
        let report = session.sync(&builder, &source, dry_run)?;

        match format {
            OutputFormat::Text => Ok(format_sync_text(&report, &volume)),
            OutputFormat::Json => Ok(format_sync_json(&report, &volume)?),
        }
    }

    fn handle_list(
        &self,
        serato_dir: Option<&Path>,
        store: Option<&Path>,
        root: Option<&str>,
        format: OutputFormat,
    ) -> Result<String, ApiError> {
        let store_root = match (store, serato_dir) {
            (Some(store), _) => store.to_path_buf(),
            (None, Some(dir)) => dir.join("_Serato_").join("Subcrates"),
            (None, None) => default_store_root()?,
        };
        let root = root.unwrap_or(self.config.library.root_label.as_str());
        let session = StoreSession::new(DirectoryStore::new(store_root), root)?;
        let tree = session.read()?;
        let location = session.store().location();

        match format {
            OutputFormat::Text => Ok(format_tree_text(&tree, &location)),
            OutputFormat::Json => Ok(format_tree_json(&tree, &location)?),
        }
    }

    fn handle_show(&self, path: &Path, format: OutputFormat) -> Result<String, ApiError> {
        if !path.is_file() {
            return Err(ApiError::InvalidArgument(format!(
                "Crate file not found: {}",
                path.display()
            )));
        }
        let record = CrateRecord::load(path)?;
        match format {
            OutputFormat::Text => Ok(format_crate_text(&record)),
            OutputFormat::Json => Ok(format_crate_json(&record)?),
        }
    }

    fn handle_resolve(&self, path: &str, format: OutputFormat) -> Result<String, ApiError> {
        let volume = self.config.library.resolver()?.resolve(path)?;
        match format {
            OutputFormat::Text => Ok(format_volume_text(path, &volume)),
            OutputFormat::Json => Ok(format_volume_json(&volume)?),
        }
    }
}

fn canonical_dir(path: &Path, what: &str) -> Result<PathBuf, ApiError> {
    let canonical = dunce::canonicalize(path).map_err(|e| {
        ApiError::InvalidArgument(format!("Cannot open {} {}: {}", what, path.display(), e))
    })?;
    if !canonical.is_dir() {
        return Err(ApiError::InvalidArgument(format!(
            "{} is not a directory: {}",
            what,
            path.display()
        )));
    }
    Ok(canonical)
}

/// `~/Music/_Serato_/Subcrates`, where Serato keeps crates for the system volume.
fn default_store_root() -> Result<PathBuf, ApiError> {
    let dirs = directories::BaseDirs::new().ok_or_else(|| {
        ApiError::ConfigError("Could not determine home directory".to_string())
    })?;
    Ok(dirs
        .home_dir()
        .join("Music")
        .join("_Serato_")
        .join("Subcrates"))
}
