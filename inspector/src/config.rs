//! Inspector settings, loadable from TOML.

use std::path::Path;

use collscope_debug_drawer::DrawerConfig;
use serde::Deserialize;

use crate::error::ConfigError;

/// Settings of the collision inspector and of the drawer it drives.
///
/// ```toml
/// mouse_raycast_max_distance = 5000.0
/// raycast_log_capacity = 64
///
/// [drawer]
/// circle_tolerance = 0.05
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    pub drawer: DrawerConfig,
    /// Length of the ray cast through the mouse cursor.
    pub mouse_raycast_max_distance: f32,
    /// Intercepted raycasts kept for the log panel.
    pub raycast_log_capacity: usize,
    /// Radius of the sphere highlighting a hovered vertex.
    pub vertex_sphere_radius: f32,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            drawer: DrawerConfig::default(),
            mouse_raycast_max_distance: 100_000.0,
            raycast_log_capacity: 32,
            vertex_sphere_radius: 0.1,
        }
    }
}

impl InspectorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Load from `path`, falling back to defaults if it is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded inspector config from {}", path.display());
                config
            }
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Self::default()
            }
            Err(e) => {
                log::warn!("{e}; using default inspector config");
                Self::default()
            }
        }
    }
}
