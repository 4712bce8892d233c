//! Configuration persistence
//!
//! Loads the printer configuration file and the persisted retraction
//! snapshot. The snapshot takes precedence over the TOML section; a
//! missing or unreadable snapshot falls back to the TOML values.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info, warn};

use fwretract_core::config::persist::{self, MAX_SNAPSHOT_SIZE};
use fwretract_core::config::RetractionConfig;

use super::toml::{parse_config, HostConfig};
use super::ConfigError;

/// Read and parse a TOML configuration file
pub fn load_config(path: &Path) -> Result<HostConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(bytes = text.len(), path = %path.display(), "read configuration");

    let config = parse_config(&text)?;
    log_config_summary(&config);
    Ok(config)
}

/// Read a retraction snapshot, `None` if the file does not exist
pub fn load_snapshot(path: &Path) -> Result<Option<RetractionConfig>, ConfigError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    persist::decode(&bytes)
        .map(Some)
        .map_err(|reason| ConfigError::Snapshot {
            path: path.to_path_buf(),
            reason,
        })
}

/// Write the retraction settings as a snapshot
pub fn save_snapshot(path: &Path, config: &RetractionConfig) -> Result<(), ConfigError> {
    let mut buffer = [0u8; MAX_SNAPSHOT_SIZE];
    let bytes = persist::encode(config, &mut buffer).map_err(|reason| ConfigError::Snapshot {
        path: path.to_path_buf(),
        reason,
    })?;

    fs::write(path, &*bytes).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(bytes = bytes.len(), path = %path.display(), "saved retraction snapshot");
    Ok(())
}

/// Retraction settings to start with
///
/// Tries the snapshot first, falls back to `[firmware_retraction]`.
pub fn load_retraction(config: &HostConfig, snapshot: Option<&Path>) -> RetractionConfig {
    if let Some(path) = snapshot {
        match load_snapshot(path) {
            Ok(Some(retraction)) => {
                info!(path = %path.display(), "loaded retraction settings from snapshot");
                return retraction;
            }
            Ok(None) => {
                debug!(path = %path.display(), "no snapshot found, using configuration file");
            }
            Err(e) => {
                warn!("failed to load snapshot: {e}, using configuration file");
            }
        }
    }
    config.retraction()
}

fn log_config_summary(config: &HostConfig) {
    let limits = config.machine_limits();
    let envelope = config.envelope();
    info!(
        max_velocity = limits.max_velocity,
        max_accel = limits.max_accel,
        z_max = envelope.z_max,
        xy_bounds = envelope.xy.is_some(),
        job_queue = config.has_job_queue(),
        "printer configuration loaded"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use fwretract_core::config::ZHopStyle;

    const CONFIG: &str = "[printer]\nmax_velocity = 300.0\nmax_accel = 3000.0\n\
                          [stepper_z]\nposition_max = 180.0\n\
                          [firmware_retraction]\nretract_length = 0.5\n";

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fwretract-loader-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_snapshot_overrides_toml() {
        let path = scratch("override.bin");
        let stored = RetractionConfig {
            retract_length: 1.4,
            z_hop_style: ZHopStyle::Ramp,
            ..Default::default()
        };
        save_snapshot(&path, &stored).unwrap();

        let config = parse_config(CONFIG).unwrap();
        assert_eq!(load_retraction(&config, Some(&path)), stored);
        assert_eq!(load_retraction(&config, None).retract_length, 0.5);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_snapshot_falls_back() {
        let path = scratch("missing.bin");
        assert!(load_snapshot(&path).unwrap().is_none());

        let config = parse_config(CONFIG).unwrap();
        assert_eq!(load_retraction(&config, Some(&path)).retract_length, 0.5);
    }

    #[test]
    fn test_corrupt_snapshot_falls_back() {
        let path = scratch("corrupt.bin");
        fs::write(&path, b"not a snapshot").unwrap();

        assert!(matches!(load_snapshot(&path), Err(ConfigError::Snapshot { .. })));

        let config = parse_config(CONFIG).unwrap();
        assert_eq!(load_retraction(&config, Some(&path)).retract_length, 0.5);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_config_reports_path() {
        let path = scratch("absent.toml");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_load_config_from_file() {
        let path = scratch("printer.toml");
        fs::write(&path, CONFIG).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.stepper_z.position_max, 180.0);

        fs::remove_file(&path).unwrap();
    }
}
