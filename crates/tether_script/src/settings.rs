//! Runtime settings

use crate::physics::RaycastOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Runtime settings. Every field has a default, so a partial file is fine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    pub logging: LoggingSettings,
    pub physics: PhysicsSettings,
    pub dispatch: DispatchSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub default_layer_mask: i32,
    /// `None` is unbounded.
    pub default_max_distance: Option<f32>,
    pub query_sensors: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Catch panics in script hooks and treat them as failed calls.
    pub isolate_panics: bool,
    /// Warn when a single update callback runs longer than this.
    pub slow_callback_warn_ms: Option<f64>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
        }
    }
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            default_layer_mask: -1,
            default_max_distance: None,
            query_sensors: false,
        }
    }
}

impl PhysicsSettings {
    pub fn raycast_options(&self) -> RaycastOptions {
        RaycastOptions {
            max_distance: self.default_max_distance.unwrap_or(f32::INFINITY),
            layer_mask: self.default_layer_mask,
            query_sensors: self.query_sensors,
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            isolate_panics: true,
            slow_callback_warn_ms: None,
        }
    }
}

impl RuntimeSettings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "loaded runtime settings");
        Ok(settings)
    }
}
