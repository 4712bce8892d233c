//! Recording printer for unit tests

extern crate std;

use std::vec::Vec;

use fwretract_protocol::{GcodeCommand, StateSlot};

use crate::config::{Envelope, MachineLimits, VelocityLimits, XyBounds};
use crate::traits::{CommandSink, CoordinateMode, HomedAxes, Position, PrinterStatus};

/// Printer double that executes scripts just enough to track position
pub struct MockPrinter {
    pub homed: HomedAxes,
    pub hot: bool,
    pub position: Position,
    pub mode: CoordinateMode,
    pub limits: VelocityLimits,
    pub envelope: Envelope,
    pub scripts: Vec<Vec<GcodeCommand>>,
    saved: Vec<(StateSlot, CoordinateMode)>,
}

impl MockPrinter {
    /// Homed, hot printer on a 200x200x180 bed at Z=10
    pub fn ready() -> Self {
        Self {
            homed: HomedAxes::all(),
            hot: true,
            position: Position {
                x: 100.0,
                y: 100.0,
                z: 10.0,
                e: 0.0,
            },
            mode: CoordinateMode::Absolute,
            limits: machine_limits().as_velocity_limits(),
            envelope: Envelope::new(180.0).with_xy(XyBounds::new(0.0, 200.0, 0.0, 200.0)),
            scripts: Vec::new(),
            saved: Vec::new(),
        }
    }

    /// Every executed command rendered as G-code, in order
    pub fn lines(&self) -> Vec<std::string::String> {
        use std::string::ToString;
        self.scripts
            .iter()
            .flatten()
            .map(|command| command.to_string())
            .collect()
    }

    pub fn last_script(&self) -> Vec<std::string::String> {
        use std::string::ToString;
        self.scripts
            .last()
            .map(|script| script.iter().map(|c| c.to_string()).collect())
            .unwrap_or_default()
    }

    fn execute(&mut self, command: &GcodeCommand) {
        match command {
            GcodeCommand::SaveState(slot) => {
                self.saved.retain(|(s, _)| s != slot);
                self.saved.push((*slot, self.mode));
            }
            GcodeCommand::RestoreState(slot) => {
                if let Some((_, mode)) = self.saved.iter().find(|(s, _)| s == slot) {
                    self.mode = *mode;
                }
            }
            GcodeCommand::AbsoluteCoordinates => self.mode = CoordinateMode::Absolute,
            GcodeCommand::RelativeCoordinates => self.mode = CoordinateMode::Relative,
            GcodeCommand::SetAcceleration(accel) => self.limits.accel = *accel,
            GcodeCommand::SetVelocityLimit(update) => self.limits.apply(update),
            GcodeCommand::SelectXyPlane => {}
            GcodeCommand::Linear(params) => {
                let relative = self.mode == CoordinateMode::Relative;
                let axes = [
                    (&mut self.position.x, params.x),
                    (&mut self.position.y, params.y),
                    (&mut self.position.z, params.z),
                ];
                for (axis, value) in axes {
                    if let Some(value) = value {
                        *axis = if relative { *axis + value } else { value };
                    }
                }
                // Extruder always relative, as with M83
                if let Some(e) = params.e {
                    self.position.e += e;
                }
            }
            GcodeCommand::Arc(arc) => self.position.z = arc.z,
        }
    }
}

pub fn machine_limits() -> MachineLimits {
    MachineLimits::new(300.0, 3000.0)
}

impl PrinterStatus for MockPrinter {
    fn homed_axes(&self) -> HomedAxes {
        self.homed
    }

    fn can_extrude(&self) -> bool {
        self.hot
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

impl CommandSink for MockPrinter {
    fn run_script(&mut self, script: &[GcodeCommand]) {
        for command in script {
            self.execute(command);
        }
        self.scripts.push(script.to_vec());
    }
}
