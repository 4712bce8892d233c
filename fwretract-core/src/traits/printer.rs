//! Printer status and command execution traits

use fwretract_protocol::GcodeCommand;

use crate::config::{Envelope, VelocityLimits};

/// Which axes have been homed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HomedAxes {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl HomedAxes {
    pub const fn all() -> Self {
        Self {
            x: true,
            y: true,
            z: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            x: false,
            y: false,
            z: false,
        }
    }

    /// Check if X, Y and Z are all homed
    pub fn is_all(&self) -> bool {
        self.x && self.y && self.z
    }
}

/// G-code coordinate interpretation for X/Y/Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoordinateMode {
    /// G90
    #[default]
    Absolute,
    /// G91
    Relative,
}

/// Toolhead position in G-code coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub e: f64,
}

/// Read-only view of the printer state
pub trait PrinterStatus {
    /// Axes homed since the motors were last enabled
    fn homed_axes(&self) -> HomedAxes;

    /// Check if the active extruder is hot enough to move filament
    fn can_extrude(&self) -> bool;

    /// Last commanded position
    fn gcode_position(&self) -> Position;

    /// Current coordinate mode
    fn coordinate_mode(&self) -> CoordinateMode;

    /// Velocity limits currently applied by the toolhead
    fn velocity_limits(&self) -> VelocityLimits;

    /// Travel envelope of the machine
    fn envelope(&self) -> Envelope;
}

/// Executes command scripts on the plain motion handlers
///
/// Commands given here must never be routed back through the retraction
/// rewriter.
pub trait CommandSink {
    /// Run the commands in order
    fn run_script(&mut self, script: &[GcodeCommand]);
}

/// A printer the retraction state machine can drive
pub trait Printer: PrinterStatus + CommandSink {}

impl<T: PrinterStatus + CommandSink + ?Sized> Printer for T {}
