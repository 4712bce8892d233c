//! Host configuration
//!
//! The printer is described by a TOML file. Retraction settings come from
//! its `[firmware_retraction]` section unless a persisted snapshot exists.

pub mod loader;
pub mod toml;

pub use loader::{load_config, load_retraction, load_snapshot, save_snapshot};
pub use toml::{parse_config, HostConfig};

use std::path::PathBuf;

use fwretract_core::config::persist::PersistError;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// TOML syntax or type error
    #[error("TOML parse error: {0}")]
    Toml(#[from] ::toml::de::Error),
    /// A value is out of range
    #[error("invalid value for [{section}] {field}: {reason}")]
    Invalid {
        section: &'static str,
        field: &'static str,
        reason: &'static str,
    },
    /// Snapshot blob rejected
    #[error("{}: {reason}", path.display())]
    Snapshot { path: PathBuf, reason: PersistError },
}
