//! Simulated printer
//!
//! Stands in for the motion planner, heaters and kinematics. Commands are
//! applied to a G-code position model and recorded as the output stream.

use std::collections::HashMap;

use tracing::trace;

use fwretract_core::config::{Envelope, MachineLimits, VelocityLimits};
use fwretract_core::traits::{CommandSink, CoordinateMode, HomedAxes, Position, PrinterStatus};
use fwretract_protocol::{GcodeCommand, MoveParams, StateSlot};

/// What `SAVE_GCODE_STATE` captures
#[derive(Debug, Clone, Copy, PartialEq)]
struct SavedState {
    mode: CoordinateMode,
    feedrate: Option<f64>,
}

/// Printer model driven by the dispatcher
#[derive(Debug, Clone)]
pub struct SimulatedPrinter {
    homed: HomedAxes,
    temperature: f64,
    min_extrude_temp: f64,
    position: Position,
    mode: CoordinateMode,
    feedrate: Option<f64>,
    limits: VelocityLimits,
    envelope: Envelope,
    saved: HashMap<StateSlot, SavedState>,
    output: Vec<String>,
}

impl SimulatedPrinter {
    /// Cold, unhomed printer at the origin
    pub fn new(limits: &MachineLimits, envelope: Envelope, min_extrude_temp: f64) -> Self {
        Self {
            homed: HomedAxes::none(),
            temperature: 0.0,
            min_extrude_temp,
            position: Position::default(),
            mode: CoordinateMode::Absolute,
            feedrate: None,
            limits: limits.as_velocity_limits(),
            envelope,
            saved: HashMap::new(),
            output: Vec::new(),
        }
    }

    /// Home all axes to the minimum position
    pub fn home(&mut self) {
        self.homed = HomedAxes::all();
        let (x, y) = match self.envelope.xy {
            Some(bounds) => (bounds.x_min, bounds.y_min),
            None => (0.0, 0.0),
        };
        self.position.x = x;
        self.position.y = y;
        self.position.z = 0.0;
    }

    /// Disable the steppers, losing the homed state
    pub fn motors_off(&mut self) {
        self.homed = HomedAxes::none();
    }

    /// Set the extruder temperature; the simulated heater is instant
    pub fn set_temperature(&mut self, target: f64) {
        self.temperature = target;
    }

    pub fn set_coordinate_mode(&mut self, mode: CoordinateMode) {
        self.mode = mode;
    }

    /// Record a line the printer does not model
    pub fn passthrough(&mut self, line: &str) {
        self.output.push(line.to_string());
    }

    /// Record a line for a command the dispatcher already applied
    pub fn record(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    /// Every command executed so far, as G-code
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Take the recorded output, leaving it empty
    pub fn drain_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    fn apply_move(&mut self, params: &MoveParams) {
        let relative = self.mode == CoordinateMode::Relative;
        let axes = [
            (&mut self.position.x, params.x),
            (&mut self.position.y, params.y),
            (&mut self.position.z, params.z),
            (&mut self.position.e, params.e),
        ];
        for (axis, value) in axes {
            if let Some(value) = value {
                *axis = if relative { *axis + value } else { value };
            }
        }
        if params.f.is_some() {
            self.feedrate = params.f;
        }
    }

    fn execute(&mut self, command: &GcodeCommand) {
        match command {
            GcodeCommand::SaveState(slot) => {
                let state = SavedState {
                    mode: self.mode,
                    feedrate: self.feedrate,
                };
                self.saved.insert(*slot, state);
            }
            GcodeCommand::RestoreState(slot) => {
                if let Some(state) = self.saved.get(slot) {
                    self.mode = state.mode;
                    self.feedrate = state.feedrate;
                }
            }
            GcodeCommand::AbsoluteCoordinates => self.mode = CoordinateMode::Absolute,
            GcodeCommand::RelativeCoordinates => self.mode = CoordinateMode::Relative,
            GcodeCommand::SetAcceleration(accel) => self.limits.accel = *accel,
            GcodeCommand::SetVelocityLimit(update) => self.limits.apply(update),
            GcodeCommand::SelectXyPlane => {}
            GcodeCommand::Linear(params) => self.apply_move(params),
            // Full circle, so only Z changes
            GcodeCommand::Arc(arc) => {
                self.position.z = arc.z;
                self.feedrate = Some(arc.feedrate);
            }
        }
        trace!(%command, "executed");
        self.output.push(command.to_string());
    }
}

impl PrinterStatus for SimulatedPrinter {
    fn homed_axes(&self) -> HomedAxes {
        self.homed
    }

    fn can_extrude(&self) -> bool {
        self.temperature >= self.min_extrude_temp
    }

    fn gcode_position(&self) -> Position {
        self.position
    }

    fn coordinate_mode(&self) -> CoordinateMode {
        self.mode
    }

    fn velocity_limits(&self) -> VelocityLimits {
        self.limits
    }

    fn envelope(&self) -> Envelope {
        self.envelope
    }
}

impl CommandSink for SimulatedPrinter {
    fn run_script(&mut self, script: &[GcodeCommand]) {
        for command in script {
            self.execute(command);
        }
    }
}
