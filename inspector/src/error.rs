//! Inspector error types.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the raycast interception point.
///
/// A failed hook never takes the inspector down; the "Log raycasts" toggle
/// simply becomes unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// No scene exposes a raycast entry point to hook.
    #[error("no scene with a raycast entry point")]
    NoEntryPoint,
    /// The installer did not hand back the original function.
    #[error("original raycast function is missing")]
    MissingOriginal,
    /// Only one raycast interception may exist at a time.
    #[error("raycast interception is already installed")]
    AlreadyInstalled,
    /// The installer failed to patch, enable or disable the hook.
    #[error("hook installer failed: {0}")]
    Installer(String),
}

/// Failures loading [`InspectorConfig`](crate::InspectorConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
