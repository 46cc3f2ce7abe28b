//! ConfigLoader: composes config sources and deserializes to CrateDiggerConfig.

use super::CrateDiggerConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use std::path::{Path, PathBuf};

/// Prefix for `CRATEDIGGER__SECTION__KEY` variables.
pub const ENV_PREFIX: &str = "CRATEDIGGER";

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// `<config dir>/cratedigger/config.toml` for the current platform.
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "cratedigger", "cratedigger")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from files and environment.
    ///
    /// Precedence: defaults (lowest) -> global file -> `explicit` -> environment (highest).
    /// A missing global file is skipped; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<CrateDiggerConfig, ConfigError> {
        Self::load_from_sources(
            Self::global_config_path().as_deref(),
            explicit,
            environment(),
        )
    }

    /// Create default configuration.
    pub fn default() -> CrateDiggerConfig {
        CrateDiggerConfig::default()
    }

    pub(crate) fn load_from_sources(
        global: Option<&Path>,
        explicit: Option<&Path>,
        env: Environment,
    ) -> Result<CrateDiggerConfig, ConfigError> {
        let mut builder = builder_with_defaults()?;
        if let Some(path) = global {
            builder = builder.add_source(File::from(path).required(false));
        }
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ConfigError::Message(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path).required(true));
        }
        let config = builder.add_source(env).build()?;
        config.try_deserialize()
    }
}

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(Config::builder().add_source(Config::try_from(&CrateDiggerConfig::default())?))
}

/// Environment overlay; `library.extensions` takes a comma-separated list.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("library.extensions")
        .try_parsing(true)
}
