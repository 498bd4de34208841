//! Configuration for the handshot pipeline
//!
//! Loaded from TOML. Every section and field has a default, so an empty file
//! (or no file at all) yields the stock tuning.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Thumb-tip to index-knuckle distance (m) under which the trigger pose counts
pub const DEFAULT_TRIGGER_DISTANCE: f32 = 0.04;
/// Lateral spawn offset along the hand's X axis (m)
pub const DEFAULT_FINGER_LENGTH: f32 = 0.25;
pub const DEFAULT_PROJECTILE_RADIUS: f32 = 0.05;
pub const DEFAULT_PROJECTILE_MASS: f32 = 1.0;
pub const DEFAULT_LAUNCH_FORCE: f32 = 300.0;

const CONFIG_FILE_NAME: &str = "handshot.toml";

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gesture: GestureConfig,
    pub projectile: ProjectileConfig,
    pub logging: LoggingConfig,
}

/// Gesture detection tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub trigger_distance: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            trigger_distance: DEFAULT_TRIGGER_DISTANCE,
        }
    }
}

/// Projectile shape, material and launch parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub finger_length: f32,
    pub radius: f32,
    pub mass: f32,
    pub launch_force: f32,
    /// RGB in 0.0..=1.0
    pub color: [f32; 3],
    pub metallic: bool,
    /// Oldest projectiles are despawned past this many; unset keeps them all
    pub max_live: Option<usize>,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            finger_length: DEFAULT_FINGER_LENGTH,
            radius: DEFAULT_PROJECTILE_RADIUS,
            mass: DEFAULT_PROJECTILE_MASS,
            launch_force: DEFAULT_LAUNCH_FORCE,
            color: [1.0, 1.0, 1.0],
            metallic: true,
            max_live: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive; `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path` if given, else the platform config dir, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// `<config dir>/handshot/handshot.toml` for the current platform
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "handshot", "handshot")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> Result<()> {
        positive("gesture.trigger_distance", self.gesture.trigger_distance)?;
        positive("projectile.radius", self.projectile.radius)?;
        positive("projectile.mass", self.projectile.mass)?;
        non_negative("projectile.finger_length", self.projectile.finger_length)?;
        non_negative("projectile.launch_force", self.projectile.launch_force)?;

        if self
            .projectile
            .color
            .iter()
            .any(|c| !(0.0..=1.0).contains(c))
        {
            return Err(ConfigError::Invalid {
                field: "projectile.color",
                reason: "channels must be within 0.0..=1.0".to_string(),
            });
        }

        if self.projectile.max_live == Some(0) {
            return Err(ConfigError::Invalid {
                field: "projectile.max_live",
                reason: "must be at least 1 when set".to_string(),
            });
        }

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a positive number, got {}", value),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a non-negative number, got {}", value),
        })
    }
}
