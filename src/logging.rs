//! Logging System
//!
//! Structured logging through `tracing`. Level, format, and destination come
//! from (highest first) command-line flags, `CRATEDIGGER_LOG*` environment
//! variables, the `[logging]` config section, and defaults. Logs go to stderr
//! by default so command output on stdout stays machine-readable.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const ENV_LOG: &str = "CRATEDIGGER_LOG";
pub const ENV_LOG_FORMAT: &str = "CRATEDIGGER_LOG_FORMAT";
pub const ENV_LOG_OUTPUT: &str = "CRATEDIGGER_LOG_OUTPUT";
pub const ENV_LOG_FILE: &str = "CRATEDIGGER_LOG_FILE";
pub const ENV_LOG_MODULES: &str = "CRATEDIGGER_LOG_MODULES";

/// Resolve the log file path with precedence: CLI, `CRATEDIGGER_LOG_FILE`, config file, default.
pub fn resolve_log_file_path(
    cli_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
) -> Result<PathBuf, ApiError> {
    let env_file = std::env::var(ENV_LOG_FILE).ok().map(PathBuf::from);
    [cli_file, env_file, config_file]
        .into_iter()
        .flatten()
        .find(|p| !p.as_os_str().is_empty())
        .map(Ok)
        .unwrap_or_else(default_log_file_path)
}

fn default_log_file_path() -> Result<PathBuf, ApiError> {
    let project_dirs = directories::ProjectDirs::from("", "cratedigger", "cratedigger")
        .ok_or_else(|| {
            ApiError::ConfigError(
                "Could not determine platform state directory for log file".to_string(),
            )
        })?;
    // state_dir only exists on Linux.
    let dir = project_dirs
        .state_dir()
        .unwrap_or_else(|| project_dirs.data_local_dir());
    Ok(dir.join("cratedigger.log"))
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether logging is enabled (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file, file+stderr, both
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output includes file; None means use runtime default
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format only, stdout/stderr only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

/// Logging flags given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOverrides {
    /// `--verbose`: debug level unless a level is given explicitly.
    pub verbose: bool,
    pub level: Option<String>,
    pub format: Option<String>,
    pub output: Option<String>,
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Layer `CRATEDIGGER_LOG_*` variables over this config.
    ///
    /// `CRATEDIGGER_LOG` itself is a full filter directive and is read when the
    /// filter is built.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(format) = lookup(ENV_LOG_FORMAT).filter(|f| !f.is_empty()) {
            self.format = format;
        }
        if let Some(output) = lookup(ENV_LOG_OUTPUT).filter(|o| !o.is_empty()) {
            self.output = output;
        }
        if let Some(file) = lookup(ENV_LOG_FILE).filter(|f| !f.is_empty()) {
            self.file = Some(PathBuf::from(file));
        }
        if let Some(modules) = lookup(ENV_LOG_MODULES) {
            for module_spec in modules.split(',').filter(|s| !s.trim().is_empty()) {
                let (module, level) = module_spec.split_once('=').ok_or_else(|| {
                    ApiError::ConfigError(format!(
                        "Invalid module directive from env: {:?} (expected module=level)",
                        module_spec
                    ))
                })?;
                self.modules
                    .insert(module.trim().to_string(), level.trim().to_string());
            }
        }
        Ok(self)
    }

    /// Apply command-line flags, which beat every other source.
    pub fn with_overrides(mut self, overrides: &LogOverrides) -> Self {
        if let Some(level) = &overrides.level {
            self.level = level.clone();
        } else if overrides.verbose {
            self.level = "debug".to_string();
        }
        if let Some(format) = &overrides.format {
            self.format = format.clone();
        }
        if let Some(output) = &overrides.output {
            self.output = output.clone();
        }
        if let Some(file) = &overrides.file {
            self.file = Some(file.clone());
        }
        self
    }
}

/// Initialize the logging system
///
/// Priority order (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables (CRATEDIGGER_LOG, CRATEDIGGER_LOG_FORMAT, etc.)
/// 3. Configuration file
/// 4. Defaults
///
/// Calling this twice keeps the first subscriber.
pub fn init_logging(config: &LoggingConfig, overrides: &LogOverrides) -> Result<(), ApiError> {
    let config = config
        .clone()
        .with_env(|key| std::env::var(key).ok())?
        .with_overrides(overrides);

    if !config.enabled {
        let _ = Registry::default()
            .with(EnvFilter::new("off"))
            .with(fmt::layer().with_writer(std::io::sink))
            .try_init();
        return Ok(());
    }

    // An explicit CLI level beats a CRATEDIGGER_LOG directive.
    let env_directive = if overrides.level.is_some() || overrides.verbose {
        None
    } else {
        std::env::var(ENV_LOG).ok().filter(|d| !d.is_empty())
    };
    let filter = build_env_filter(&config, env_directive.as_deref())?;
    let format = determine_format(&config)?;
    let output = parse_output_destinations(&config.output)?;
    let writer = build_writer(&config, &output)?;
    let use_color = config.color && !output.file;

    let base_subscriber = Registry::default().with(filter);
    let result = if format == LogFormat::Json {
        base_subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init()
    } else {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(writer),
            )
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
    Ok(())
}

fn build_writer(
    config: &LoggingConfig,
    output: &OutputDestinations,
) -> Result<BoxMakeWriter, ApiError> {
    if output.file {
        let file = Arc::new(open_log_file(config)?);
        if output.stderr {
            return Ok(BoxMakeWriter::new(file.and(std::io::stderr)));
        }
        return Ok(BoxMakeWriter::new(file));
    }
    Ok(match (output.stdout, output.stderr) {
        (true, true) => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
        (true, false) => BoxMakeWriter::new(std::io::stdout),
        _ => BoxMakeWriter::new(std::io::stderr),
    })
}

fn open_log_file(config: &LoggingConfig) -> Result<std::fs::File, ApiError> {
    let log_file = resolve_log_file_path(None, config.file.clone())?;
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ApiError::ConfigError(format!("Failed to create log directory: {}", e))
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .map_err(|e| ApiError::ConfigError(format!("Failed to open log file {:?}: {}", log_file, e)))
}

/// Build the filter from a `CRATEDIGGER_LOG` directive or the config.
fn build_env_filter(
    config: &LoggingConfig,
    env_directive: Option<&str>,
) -> Result<EnvFilter, ApiError> {
    if let Some(directive) = env_directive {
        return EnvFilter::try_new(directive)
            .map_err(|e| ApiError::ConfigError(format!("Invalid {}: {}", ENV_LOG, e)));
    }

    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| ApiError::ConfigError(format!("Invalid log level {:?}: {}", config.level, e)))?;
    for (module, module_level) in &config.modules {
        let directive = format!("{}={}", module, module_level);
        filter = filter.add_directive(
            directive
                .parse()
                .map_err(|e| ApiError::ConfigError(format!("Invalid log directive: {}", e)))?,
        );
    }
    Ok(filter)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Text,
}

fn determine_format(config: &LoggingConfig) -> Result<LogFormat, ApiError> {
    match config.format.as_str() {
        "json" => Ok(LogFormat::Json),
        "text" => Ok(LogFormat::Text),
        other => Err(ApiError::ConfigError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            other
        ))),
    }
}

/// Output destinations
#[derive(Debug)]
struct OutputDestinations {
    stdout: bool,
    stderr: bool,
    file: bool,
}

fn parse_output_destinations(output: &str) -> Result<OutputDestinations, ApiError> {
    let (stdout, stderr, file) = match output {
        "stdout" => (true, false, false),
        "stderr" => (false, true, false),
        "file" => (false, false, true),
        "file+stderr" => (false, true, true),
        "both" => (true, true, false),
        _ => {
            return Err(ApiError::ConfigError(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr', 'file', 'file+stderr', or 'both')",
                output
            )))
        }
    };
    Ok(OutputDestinations {
        stdout,
        stderr,
        file,
    })
}
