//! Machine-side configuration
//!
//! Printer motion maxima and the travel envelope used to keep z-hop moves
//! inside the machine.

use fwretract_protocol::VelocityLimitUpdate;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default square corner velocity (mm/s)
pub const DEFAULT_SQUARE_CORNER_VELOCITY: f64 = 5.0;

/// Printer-wide motion maxima from the printer configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MachineLimits {
    /// Maximum toolhead velocity (mm/s)
    pub max_velocity: f64,
    /// Maximum acceleration (mm/s²)
    pub max_accel: f64,
    /// Maximum accel-to-decel (mm/s²)
    pub max_accel_to_decel: f64,
    /// Maximum square corner velocity (mm/s)
    pub square_corner_velocity: f64,
}

impl MachineLimits {
    /// Create limits with the usual derived defaults
    ///
    /// Accel-to-decel defaults to half of the acceleration.
    pub fn new(max_velocity: f64, max_accel: f64) -> Self {
        Self {
            max_velocity,
            max_accel,
            max_accel_to_decel: max_accel / 2.0,
            square_corner_velocity: DEFAULT_SQUARE_CORNER_VELOCITY,
        }
    }

    /// The maxima as currently-applied limits
    pub fn as_velocity_limits(&self) -> VelocityLimits {
        VelocityLimits {
            velocity: self.max_velocity,
            accel: self.max_accel,
            accel_to_decel: self.max_accel_to_decel,
            square_corner_velocity: self.square_corner_velocity,
        }
    }
}

/// Velocity limits currently applied by the toolhead
///
/// Save/restore of the G-code state does not cover these, so the state
/// machine snapshots them around every retract and unretract.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VelocityLimits {
    pub velocity: f64,
    pub accel: f64,
    pub accel_to_decel: f64,
    pub square_corner_velocity: f64,
}

impl VelocityLimits {
    /// Update that puts every limit back to these values
    pub fn restore_update(&self) -> VelocityLimitUpdate {
        VelocityLimitUpdate {
            velocity: Some(self.velocity),
            accel: Some(self.accel),
            accel_to_decel: Some(self.accel_to_decel),
            square_corner_velocity: Some(self.square_corner_velocity),
        }
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, update: &VelocityLimitUpdate) {
        if let Some(v) = update.velocity {
            self.velocity = v;
        }
        if let Some(v) = update.accel {
            self.accel = v;
        }
        if let Some(v) = update.accel_to_decel {
            self.accel_to_decel = v;
        }
        if let Some(v) = update.square_corner_velocity {
            self.square_corner_velocity = v;
        }
    }
}

/// Edge of the build plate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Left edge (minimum X)
    XMin,
    /// Right edge (maximum X)
    XMax,
    /// Front edge (minimum Y)
    YMin,
    /// Back edge (maximum Y)
    YMax,
}

impl Edge {
    /// Unit vector pointing from this edge into the plate
    pub fn inward_normal(&self) -> (f64, f64) {
        match self {
            Edge::XMin => (1.0, 0.0),
            Edge::XMax => (-1.0, 0.0),
            Edge::YMin => (0.0, 1.0),
            Edge::YMax => (0.0, -1.0),
        }
    }
}

/// X/Y travel limits
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct XyBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl XyBounds {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Nearest edge and the perpendicular distance to it
    ///
    /// The distance is negative when the point lies outside the bounds.
    /// Ties resolve in the order left, right, front, back.
    pub fn nearest_edge(&self, x: f64, y: f64) -> (Edge, f64) {
        let candidates = [
            (Edge::XMin, x - self.x_min),
            (Edge::XMax, self.x_max - x),
            (Edge::YMin, y - self.y_min),
            (Edge::YMax, self.y_max - y),
        ];

        let mut nearest = candidates[0];
        for candidate in &candidates[1..] {
            if candidate.1 < nearest.1 {
                nearest = *candidate;
            }
        }
        nearest
    }

    /// Horizontal midpoint of the plate
    pub fn mid_x(&self) -> f64 {
        (self.x_min + self.x_max) / 2.0
    }
}

/// Travel envelope of the toolhead
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Envelope {
    /// Maximum Z travel
    pub z_max: f64,
    /// X/Y limits, when the kinematics report them
    pub xy: Option<XyBounds>,
}

impl Envelope {
    /// Envelope with only a Z limit
    pub fn new(z_max: f64) -> Self {
        Self { z_max, xy: None }
    }

    pub fn with_xy(mut self, bounds: XyBounds) -> Self {
        self.xy = Some(bounds);
        self
    }
}
