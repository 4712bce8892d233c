//! Commands emitted by the retraction core
//!
//! The core never talks to the motion planner directly. It builds a short
//! script of these commands and hands it to the host, which runs it on the
//! plain (unrewritten) handlers. `Display` renders the G-code text.

use core::fmt;

use crate::params::{Decimal, MoveParams};

/// Named slot for the host's save/restore G-code state primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StateSlot {
    /// State saved around a retract bracket
    Retract,
    /// State saved around an unretract bracket
    Unretract,
}

impl StateSlot {
    /// Name used by `SAVE_GCODE_STATE` / `RESTORE_GCODE_STATE`
    pub fn name(&self) -> &'static str {
        match self {
            StateSlot::Retract => "_retract_state",
            StateSlot::Unretract => "_unretract_state",
        }
    }
}

/// Rotation of an arc move in the XY plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArcDirection {
    /// G2
    Clockwise,
    /// G3
    CounterClockwise,
}

impl ArcDirection {
    pub fn code(&self) -> &'static str {
        match self {
            ArcDirection::Clockwise => "G2",
            ArcDirection::CounterClockwise => "G3",
        }
    }
}

/// Partial update of the toolhead velocity limits
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VelocityLimitUpdate {
    pub velocity: Option<f64>,
    pub accel: Option<f64>,
    pub accel_to_decel: Option<f64>,
    pub square_corner_velocity: Option<f64>,
}

/// Helical arc in the XY plane ending at an absolute Z
///
/// `i` and `j` are the centre offsets from the current position.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArcMove {
    pub direction: ArcDirection,
    pub z: f64,
    pub i: f64,
    pub j: f64,
    /// Feedrate in mm/min
    pub feedrate: f64,
}

/// A single command of a retraction script
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GcodeCommand {
    /// SAVE_GCODE_STATE
    SaveState(StateSlot),
    /// RESTORE_GCODE_STATE
    RestoreState(StateSlot),
    /// G90
    AbsoluteCoordinates,
    /// G91
    RelativeCoordinates,
    /// M204 S
    SetAcceleration(f64),
    /// SET_VELOCITY_LIMIT
    SetVelocityLimit(VelocityLimitUpdate),
    /// G17
    SelectXyPlane,
    /// G1
    Linear(MoveParams),
    /// G2 / G3
    Arc(ArcMove),
}

impl fmt::Display for GcodeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GcodeCommand::SaveState(slot) => write!(f, "SAVE_GCODE_STATE NAME={}", slot.name()),
            GcodeCommand::RestoreState(slot) => {
                write!(f, "RESTORE_GCODE_STATE NAME={}", slot.name())
            }
            GcodeCommand::AbsoluteCoordinates => f.write_str("G90"),
            GcodeCommand::RelativeCoordinates => f.write_str("G91"),
            GcodeCommand::SetAcceleration(accel) => write!(f, "M204 S{}", Decimal(*accel)),
            GcodeCommand::SetVelocityLimit(limits) => {
                f.write_str("SET_VELOCITY_LIMIT")?;
                let fields = [
                    ("VELOCITY", limits.velocity),
                    ("ACCEL", limits.accel),
                    ("ACCEL_TO_DECEL", limits.accel_to_decel),
                    ("SQUARE_CORNER_VELOCITY", limits.square_corner_velocity),
                ];
                for (key, value) in fields {
                    if let Some(value) = value {
                        write!(f, " {}={}", key, Decimal(value))?;
                    }
                }
                Ok(())
            }
            GcodeCommand::SelectXyPlane => f.write_str("G17"),
            GcodeCommand::Linear(params) => write!(f, "G1{}", params),
            GcodeCommand::Arc(arc) => write!(
                f,
                "{} Z{} I{} J{} F{}",
                arc.direction.code(),
                Decimal(arc.z),
                Decimal(arc.i),
                Decimal(arc.j),
                Decimal(arc.feedrate)
            ),
        }
    }
}
