//! Retraction parameter types
//!
//! These types hold the live retraction settings. Values coming from a
//! configuration file or a `SET_RETRACTION` request are clamped to their
//! bounds rather than rejected.

use core::fmt;

use fwretract_protocol::SetRetraction;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default filament retract speed (mm/s)
pub const DEFAULT_RETRACT_SPEED: f64 = 20.0;

/// Default filament unretract speed (mm/s)
pub const DEFAULT_UNRETRACT_SPEED: f64 = 10.0;

/// Lowest accepted retract/unretract speed (mm/s)
pub const MIN_SPEED: f64 = 1.0;

/// Lowest accepted extra unretract length (mm)
pub const MIN_UNRETRACT_EXTRA_LENGTH: f64 = -1.0;

/// Default helix slope (hop height per mm of helix radius)
pub const DEFAULT_HELIX_SLOPE: f64 = 0.328;

/// Lowest accepted helix slope
pub const MIN_HELIX_SLOPE: f64 = 0.01;

/// How the z-hop move is performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ZHopStyle {
    /// Straight vertical move right after the retract
    #[default]
    Standard,
    /// Hop blended into the first move after the retract
    Ramp,
    /// Helical arc up to the hop height
    Helix,
}

impl ZHopStyle {
    /// All known styles
    pub const ALL: [ZHopStyle; 3] = [ZHopStyle::Standard, ZHopStyle::Ramp, ZHopStyle::Helix];

    /// Look up a style by name, ignoring case and surrounding whitespace
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZHopStyle::Standard => "standard",
            ZHopStyle::Ramp => "ramp",
            ZHopStyle::Helix => "helix",
        }
    }
}

impl fmt::Display for ZHopStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retraction configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RetractionConfig {
    /// Filament retract length in mm (0 disables retraction)
    pub retract_length: f64,
    /// Retract speed in mm/s
    pub retract_speed: f64,
    /// Length added to the unretract move in mm (negative under-extrudes)
    pub unretract_extra_length: f64,
    /// Unretract speed in mm/s
    pub unretract_speed: f64,
    /// Z-hop height in mm (0 disables z-hop)
    pub z_hop_height: f64,
    /// Z-hop style
    pub z_hop_style: ZHopStyle,
    /// Hop height per mm of helix radius
    pub helix_slope: f64,
    /// Report ignored commands and state changes to the user
    pub verbose: bool,
    /// Return to these settings when retraction is cleared
    pub config_params_on_clear: bool,
}

impl Default for RetractionConfig {
    fn default() -> Self {
        Self {
            retract_length: 0.0,
            retract_speed: DEFAULT_RETRACT_SPEED,
            unretract_extra_length: 0.0,
            unretract_speed: DEFAULT_UNRETRACT_SPEED,
            z_hop_height: 0.0,
            z_hop_style: ZHopStyle::Standard,
            helix_slope: DEFAULT_HELIX_SLOPE,
            verbose: false,
            config_params_on_clear: true,
        }
    }
}

/// What `RetractionConfig::apply` had to correct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ApplyReport {
    /// Requested z-hop style was unknown and fell back to standard
    pub style_reset: bool,
}

/// Clamp to a lower bound; NaN lands on the bound
fn at_least(value: f64, min: f64) -> f64 {
    if value >= min {
        value
    } else {
        min
    }
}

impl RetractionConfig {
    /// Clamp every field to its valid range
    pub fn sanitized(mut self) -> Self {
        self.retract_length = at_least(self.retract_length, 0.0);
        self.retract_speed = at_least(self.retract_speed, MIN_SPEED);
        self.unretract_extra_length =
            at_least(self.unretract_extra_length, MIN_UNRETRACT_EXTRA_LENGTH);
        self.unretract_speed = at_least(self.unretract_speed, MIN_SPEED);
        self.z_hop_height = at_least(self.z_hop_height, 0.0);
        self.helix_slope = at_least(self.helix_slope, MIN_HELIX_SLOPE);
        self
    }

    /// Filament length pushed back on unretract
    pub fn unretract_length(&self) -> f64 {
        self.retract_length + self.unretract_extra_length
    }

    /// Check if G10 does anything at all
    pub fn retraction_enabled(&self) -> bool {
        self.retract_length > 0.0
    }

    /// Check if retracts include a z-hop
    pub fn hop_enabled(&self) -> bool {
        self.z_hop_height > 0.0
    }

    /// Apply the fields present in a `SET_RETRACTION` request
    pub fn apply(&mut self, req: &SetRetraction) -> ApplyReport {
        let mut report = ApplyReport::default();

        if let Some(v) = req.retract_length {
            self.retract_length = at_least(v, 0.0);
        }
        if let Some(v) = req.retract_speed {
            self.retract_speed = at_least(v, MIN_SPEED);
        }
        if let Some(v) = req.unretract_extra_length {
            self.unretract_extra_length = at_least(v, MIN_UNRETRACT_EXTRA_LENGTH);
        }
        if let Some(v) = req.unretract_speed {
            self.unretract_speed = at_least(v, MIN_SPEED);
        }
        if let Some(v) = req.z_hop_height {
            self.z_hop_height = at_least(v, 0.0);
        }
        if let Some(name) = &req.z_hop_style {
            self.z_hop_style = match ZHopStyle::from_name(name) {
                Some(style) => style,
                None => {
                    report.style_reset = true;
                    ZHopStyle::Standard
                }
            };
        }

        report
    }
}
