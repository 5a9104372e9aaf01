//! TOML loading for simulation runs.

use std::path::{Path, PathBuf};

use derive_more::derive::From;
use serde::de::DeserializeOwned;

mod simulation;

pub use simulation::*;

#[derive(Debug, From)]
pub enum ConfigError {
    #[from(ignore)]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    Malformed(toml::de::Error),

    #[from(ignore)]
    Invalid(String),
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unreadable { source, .. } => Some(source),
            Self::Malformed(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreadable { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            Self::Malformed(err) => write!(f, "malformed simulation file: {err}"),
            Self::Invalid(reason) => write!(f, "invalid simulation: {reason}"),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Deserializes any TOML document held in memory.
///
/// # Errors
///
/// [`ConfigError::Malformed`] when the content does not fit `T`.
pub fn from_toml<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    Ok(toml::from_str(content)?)
}

/// Reads `target` and deserializes it as TOML.
///
/// # Errors
///
/// [`ConfigError::Unreadable`] carrying the path when the file cannot be read
/// and [`ConfigError::Malformed`] when its content does not fit `T`.
pub fn from_path<T, V>(target: V) -> ConfigResult<T>
where
    T: DeserializeOwned,
    V: Into<PathBuf>,
{
    let path = target.into();
    let content = read(&path)?;
    let loaded = from_toml(&content)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(loaded)
}

fn read(path: &Path) -> ConfigResult<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}
