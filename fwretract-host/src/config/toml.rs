//! TOML printer configuration
//!
//! Section names follow the usual printer configuration layout:
//!
//! ```toml
//! [printer]
//! max_velocity = 300.0
//! max_accel = 3000.0
//!
//! [stepper_z]
//! position_max = 180.0
//!
//! [firmware_retraction]
//! retract_length = 0.8
//! z_hop_height = 0.4
//! z_hop_style = "helix"
//! ```

use serde::Deserialize;
use tracing::warn;

use fwretract_core::config::{
    Envelope, MachineLimits, RetractionConfig, XyBounds, ZHopStyle, DEFAULT_SQUARE_CORNER_VELOCITY,
};

use super::ConfigError;

/// Default minimum extrusion temperature (°C)
pub const DEFAULT_MIN_EXTRUDE_TEMP: f64 = 170.0;

/// Whole configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    pub printer: PrinterSection,
    pub stepper_x: Option<StepperSection>,
    pub stepper_y: Option<StepperSection>,
    pub stepper_z: StepperSection,
    #[serde(default)]
    pub extruder: ExtruderSection,
    #[serde(default)]
    pub firmware_retraction: RetractionSection,
    /// Presence enables the job queue events
    pub virtual_sdcard: Option<::toml::Table>,
}

/// `[printer]`
#[derive(Debug, Clone, Deserialize)]
pub struct PrinterSection {
    pub max_velocity: f64,
    pub max_accel: f64,
    pub max_accel_to_decel: Option<f64>,
    pub square_corner_velocity: Option<f64>,
}

/// `[stepper_x]`, `[stepper_y]`, `[stepper_z]`
#[derive(Debug, Clone, Deserialize)]
pub struct StepperSection {
    #[serde(default)]
    pub position_min: f64,
    pub position_max: f64,
}

/// `[extruder]`
#[derive(Debug, Clone, Deserialize)]
pub struct ExtruderSection {
    #[serde(default = "default_min_extrude_temp")]
    pub min_extrude_temp: f64,
}

fn default_min_extrude_temp() -> f64 {
    DEFAULT_MIN_EXTRUDE_TEMP
}

impl Default for ExtruderSection {
    fn default() -> Self {
        Self {
            min_extrude_temp: DEFAULT_MIN_EXTRUDE_TEMP,
        }
    }
}

/// `[firmware_retraction]`, every key optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetractionSection {
    pub retract_length: Option<f64>,
    pub retract_speed: Option<f64>,
    pub unretract_extra_length: Option<f64>,
    pub unretract_speed: Option<f64>,
    pub z_hop_height: Option<f64>,
    pub z_hop_style: Option<String>,
    pub helix_slope: Option<f64>,
    pub verbose: Option<bool>,
    pub config_params_on_clear: Option<bool>,
}

/// Parse and validate a configuration file
pub fn parse_config(text: &str) -> Result<HostConfig, ConfigError> {
    let config: HostConfig = ::toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

impl HostConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let positive = |section, field, value: f64| {
            if value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    section,
                    field,
                    reason: "must be positive",
                })
            }
        };

        positive("printer", "max_velocity", self.printer.max_velocity)?;
        positive("printer", "max_accel", self.printer.max_accel)?;
        if let Some(value) = self.printer.max_accel_to_decel {
            positive("printer", "max_accel_to_decel", value)?;
        }

        let steppers = [
            ("stepper_x", self.stepper_x.as_ref()),
            ("stepper_y", self.stepper_y.as_ref()),
            ("stepper_z", Some(&self.stepper_z)),
        ];
        for (section, stepper) in steppers {
            if let Some(stepper) = stepper {
                if stepper.position_max <= stepper.position_min {
                    return Err(ConfigError::Invalid {
                        section,
                        field: "position_max",
                        reason: "must be above position_min",
                    });
                }
            }
        }
        Ok(())
    }

    pub fn machine_limits(&self) -> MachineLimits {
        let mut limits = MachineLimits::new(self.printer.max_velocity, self.printer.max_accel);
        if let Some(value) = self.printer.max_accel_to_decel {
            limits.max_accel_to_decel = value;
        }
        limits.square_corner_velocity = self
            .printer
            .square_corner_velocity
            .unwrap_or(DEFAULT_SQUARE_CORNER_VELOCITY);
        limits
    }

    /// Travel envelope; X/Y bounds need both X and Y steppers
    pub fn envelope(&self) -> Envelope {
        let envelope = Envelope::new(self.stepper_z.position_max);
        match (&self.stepper_x, &self.stepper_y) {
            (Some(x), Some(y)) => envelope.with_xy(XyBounds::new(
                x.position_min,
                x.position_max,
                y.position_min,
                y.position_max,
            )),
            _ => envelope,
        }
    }

    pub fn has_job_queue(&self) -> bool {
        self.virtual_sdcard.is_some()
    }

    /// Retraction settings from `[firmware_retraction]`
    ///
    /// Out-of-range values are clamped; an unknown z-hop style falls back
    /// to standard.
    pub fn retraction(&self) -> RetractionConfig {
        let section = &self.firmware_retraction;
        let defaults = RetractionConfig::default();

        let z_hop_style = match section.z_hop_style.as_deref() {
            None => defaults.z_hop_style,
            Some(name) => ZHopStyle::from_name(name).unwrap_or_else(|| {
                warn!(style = name, "invalid z_hop_style, using standard");
                ZHopStyle::Standard
            }),
        };

        RetractionConfig {
            retract_length: section.retract_length.unwrap_or(defaults.retract_length),
            retract_speed: section.retract_speed.unwrap_or(defaults.retract_speed),
            unretract_extra_length: section
                .unretract_extra_length
                .unwrap_or(defaults.unretract_extra_length),
            unretract_speed: section.unretract_speed.unwrap_or(defaults.unretract_speed),
            z_hop_height: section.z_hop_height.unwrap_or(defaults.z_hop_height),
            z_hop_style,
            helix_slope: section.helix_slope.unwrap_or(defaults.helix_slope),
            verbose: section.verbose.unwrap_or(defaults.verbose),
            config_params_on_clear: section
                .config_params_on_clear
                .unwrap_or(defaults.config_params_on_clear),
        }
        .sanitized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[printer]
max_velocity = 300.0
max_accel = 3000.0

[stepper_x]
position_min = 0.0
position_max = 200.0

[stepper_y]
position_max = 220.0

[stepper_z]
position_max = 180.0

[extruder]
min_extrude_temp = 180.0

[firmware_retraction]
retract_length = 0.8
retract_speed = 0.5
z_hop_height = 0.4
z_hop_style = "Helix"
verbose = true

[virtual_sdcard]
path = "~/gcodes"
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(FULL).unwrap();

        let limits = config.machine_limits();
        assert_eq!(limits.max_accel_to_decel, 1500.0);
        assert_eq!(limits.square_corner_velocity, 5.0);

        let envelope = config.envelope();
        assert_eq!(envelope.z_max, 180.0);
        assert_eq!(envelope.xy.map(|b| b.y_max), Some(220.0));

        assert_eq!(config.extruder.min_extrude_temp, 180.0);
        assert!(config.has_job_queue());

        let retraction = config.retraction();
        assert_eq!(retraction.retract_length, 0.8);
        assert_eq!(retraction.retract_speed, 1.0);
        assert_eq!(retraction.z_hop_style, ZHopStyle::Helix);
        assert!(retraction.verbose);
        assert!(retraction.config_params_on_clear);
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = parse_config(
            "[printer]\nmax_velocity = 200\nmax_accel = 1000\n\
             square_corner_velocity = 8.0\n[stepper_z]\nposition_max = 250\n",
        )
        .unwrap();
        assert!(config.envelope().xy.is_none());
        assert!(!config.has_job_queue());
        assert_eq!(config.extruder.min_extrude_temp, DEFAULT_MIN_EXTRUDE_TEMP);
        assert_eq!(config.machine_limits().square_corner_velocity, 8.0);
        assert_eq!(config.retraction(), RetractionConfig::default());
    }

    #[test]
    fn test_invalid_style_falls_back() {
        let text = FULL.replace("\"Helix\"", "\"wobble\"");
        let config = parse_config(&text).unwrap();
        assert_eq!(config.retraction().z_hop_style, ZHopStyle::Standard);
    }

    #[test]
    fn test_missing_section() {
        let err = parse_config("[printer]\nmax_velocity = 200.0\nmax_accel = 1000.0\n");
        assert!(matches!(err, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_rejects_bad_values() {
        let text = FULL.replace("max_accel = 3000.0", "max_accel = 0.0");
        assert!(matches!(
            parse_config(&text),
            Err(ConfigError::Invalid {
                field: "max_accel",
                ..
            })
        ));

        let text = FULL.replace("position_max = 180.0", "position_max = -1.0");
        assert!(matches!(
            parse_config(&text),
            Err(ConfigError::Invalid {
                section: "stepper_z",
                ..
            })
        ));
    }
}
