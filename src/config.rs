use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shape::ClassifierConfig;
use crate::tool::ToolSettings;

/// Settings file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "inkshape.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub grid_cell_size: u32,
    /// Side of the square a gesture erase clears
    pub gesture_erase_size: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            grid_cell_size: 20,
            gesture_erase_size: 40.0,
        }
    }
}

/// Everything configurable about a drawing session.
///
/// Every field has a default, so a partial file only overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub canvas: CanvasConfig,
    pub classifier: ClassifierConfig,
    pub tools: ToolSettings,
    /// Where saved drawings go; kept in memory when unset
    pub storage_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_json(json: &str, path: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json, path)
    }

    /// Load `path`, or [`DEFAULT_CONFIG_FILE`] when none is given. A missing
    /// file yields the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(ConfigError::Read { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(err),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "canvas must not be empty ({}x{})",
                self.canvas.width, self.canvas.height
            )));
        }
        if self.canvas.grid_cell_size == 0 {
            return Err(ConfigError::Invalid("grid_cell_size must be positive".to_owned()));
        }
        if self.classifier.simplify_tolerance < 0.0 {
            return Err(ConfigError::Invalid("simplify_tolerance must not be negative".to_owned()));
        }
        Ok(())
    }
}
