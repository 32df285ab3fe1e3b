//! Loading the frame configuration from YAML or TOML files.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, trace};

use super::path::{PathResolver, default_config_path};
use super::schema::FrameConfig;
use crate::error::{FrameError, Result};

/// Configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format (.yaml, .yml).
    Yaml,
    /// TOML format (.toml).
    Toml,
}

impl ConfigFormat {
    /// Detect format from file extension.
    ///
    /// Returns `None` if the extension is not recognized.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        trace!(extension = %ext, "Detecting config format from extension");
        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Get the canonical file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        }
    }

    fn detect(path: &Path) -> Result<Self> {
        Self::from_extension(path).ok_or_else(|| {
            FrameError::ConfigParse(format!(
                "Unknown config format for '{}': expected .yaml, .yml, or .toml",
                path.display()
            ))
        })
    }
}

/// The effective configuration and where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedConfig {
    /// The file it was read from, or `None` when built-in defaults apply.
    pub source: Option<PathBuf>,
    #[serde(flatten)]
    pub config: FrameConfig,
}

/// Load a configuration file.
///
/// Relative `database` and `output_dir` paths are resolved against the
/// config file's directory and `~` is expanded.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist or cannot be read
/// - The format cannot be detected from the extension
/// - The file content cannot be parsed
/// - Validation fails
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FrameConfig> {
    let path = path.as_ref();
    info!("Loading configuration file");

    let format = ConfigFormat::detect(path)?;
    debug!(format = ?format, "Detected config format");

    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FrameError::ConfigNotFound {
                path: path.display().to_string(),
            }
        } else {
            FrameError::Io(e)
        }
    })?;
    debug!(bytes = content.len(), "Read config file");

    let mut config = load_config_from_str(&content, format)?;

    let resolver = PathResolver::new(path)?;
    if let Some(database) = &config.database {
        config.database = Some(resolver.resolve(database)?);
    }
    if let Some(output_dir) = &config.output_dir {
        config.output_dir = Some(resolver.resolve(output_dir)?);
    }
    Ok(config)
}

/// Parse and validate configuration text.
///
/// # Errors
///
/// Returns an error if parsing or validation fails.
#[instrument(skip(content), fields(format = ?format, content_len = content.len()))]
pub fn load_config_from_str(content: &str, format: ConfigFormat) -> Result<FrameConfig> {
    let config: FrameConfig = if content.trim().is_empty() {
        FrameConfig::default()
    } else {
        match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| FrameError::ConfigParse(format!("YAML: {e}")))?,
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| FrameError::ConfigParse(format!("TOML: {e}")))?
            }
        }
    };

    config.validate()?;

    info!(
        slots = config.slots.len(),
        interval_ms = config.interval_ms,
        strategy = ?config.canvas.strategy,
        "Configuration loaded and validated"
    );
    Ok(config)
}

/// Load the configuration the CLI should use.
///
/// An explicit path must exist. Without one the default location is tried
/// and built-in defaults are used when no file is there.
pub fn load_or_default(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        return Ok(LoadedConfig {
            source: Some(path.to_path_buf()),
            config: load_config(path)?,
        });
    }

    let path = default_config_path()?;
    if path.exists() {
        Ok(LoadedConfig {
            config: load_config(&path)?,
            source: Some(path),
        })
    } else {
        debug!(path = %path.display(), "No config file, using defaults");
        Ok(LoadedConfig {
            source: None,
            config: FrameConfig::default(),
        })
    }
}

/// Write a configuration file, creating parent directories.
///
/// The format follows the file extension.
#[instrument(skip(config), fields(path = %path.as_ref().display()))]
pub fn save_config<P: AsRef<Path>>(config: &FrameConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = ConfigFormat::detect(path)?;

    let content = match format {
        ConfigFormat::Yaml => serde_yaml::to_string(config)
            .map_err(|e| FrameError::ConfigParse(format!("YAML: {e}")))?,
        ConfigFormat::Toml => toml::to_string_pretty(config)
            .map_err(|e| FrameError::ConfigParse(format!("TOML: {e}")))?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    info!("Configuration saved");
    Ok(())
}
