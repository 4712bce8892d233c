//! Persisted retraction settings
//!
//! The retraction configuration is stored as a postcard blob behind a small
//! header so that stale or foreign data is rejected on load.

use serde::{Deserialize, Serialize};

use super::types::RetractionConfig;

/// Magic number to identify a retraction snapshot
pub const SNAPSHOT_MAGIC: u32 = 0x4657_5254; // "FWRT"

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u8 = 1;

/// Upper bound of an encoded snapshot in bytes
pub const MAX_SNAPSHOT_SIZE: usize = 128;

/// Header plus configuration, as written to storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    /// Stored settings
    pub config: RetractionConfig,
}

impl Snapshot {
    pub fn new(config: RetractionConfig) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: SNAPSHOT_VERSION,
            config,
        }
    }

    /// Check if the header matches this build
    pub fn is_valid(&self) -> bool {
        self.magic == SNAPSHOT_MAGIC && self.version == SNAPSHOT_VERSION
    }
}

/// Snapshot codec errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistError {
    /// Output buffer too small or value not encodable
    Encode,
    /// Input is truncated or malformed
    Decode,
    /// Input is not a retraction snapshot
    BadMagic,
    /// Snapshot was written by an incompatible version
    VersionMismatch,
}

impl core::fmt::Display for PersistError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            PersistError::Encode => "snapshot encoding failed",
            PersistError::Decode => "snapshot is malformed",
            PersistError::BadMagic => "not a retraction snapshot",
            PersistError::VersionMismatch => "unsupported snapshot version",
        };
        f.write_str(text)
    }
}

/// Encode a configuration into `buf`, returning the used part
pub fn encode<'a>(config: &RetractionConfig, buf: &'a mut [u8]) -> Result<&'a mut [u8], PersistError> {
    postcard::to_slice(&Snapshot::new(config.clone()), buf).map_err(|_| PersistError::Encode)
}

/// Decode a snapshot, clamping the stored values to their bounds
pub fn decode(bytes: &[u8]) -> Result<RetractionConfig, PersistError> {
    let snapshot: Snapshot = postcard::from_bytes(bytes).map_err(|_| PersistError::Decode)?;

    if !snapshot.is_valid() {
        return Err(if snapshot.magic != SNAPSHOT_MAGIC {
            PersistError::BadMagic
        } else {
            PersistError::VersionMismatch
        });
    }

    Ok(snapshot.config.sanitized())
}
