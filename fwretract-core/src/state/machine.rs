//! Retraction state machine
//!
//! Owns the live configuration and the retract/unretract state. Every
//! operation builds at most one command script, hands it to the printer and
//! reports an [`Outcome`].

use fwretract_protocol::{ArcMove, GcodeCommand, MoveParams, SetRetraction, StateSlot, VelocityLimitUpdate};
use heapless::Vec;

use super::outcome::{Outcome, Rejection};
use super::queue::DeferredQueue;
use super::status::{Report, Status};
use crate::config::{MachineLimits, RetractionConfig, VelocityLimits, ZHopStyle};
use crate::motion::{GeometryPlanner, Helix, HopPlan, MotionRewriter};
use crate::traits::{Position, Printer};

/// Share of the maximum velocity used for hop moves
pub const RETRACTION_MOVE_SPEED_FRACTION: f64 = 0.8;

/// Longest script a single operation emits
pub const MAX_SCRIPT_LEN: usize = 12;

/// Commands emitted by one operation
pub type Script = Vec<GcodeCommand, MAX_SCRIPT_LEN>;

/// Filament state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    #[default]
    Unretracted,
    Retracted,
}

/// Operations that move between phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Operation {
    Retract,
    Unretract,
    Clear,
}

impl Phase {
    /// Next phase after an operation; operations invalid in this phase keep it
    pub fn transition(self, operation: Operation) -> Self {
        use Operation::*;
        use Phase::*;

        match (self, operation) {
            (Unretracted, Retract) => Retracted,
            (Retracted, Unretract) | (Retracted, Clear) => Unretracted,
            (phase, _) => phase,
        }
    }
}

/// Runtime state owned by the state machine
#[derive(Debug, Clone, Default)]
pub struct RetractionState {
    pub phase: Phase,
    /// Ramp hop armed, waiting for the next move
    pub ramp_pending: bool,
    /// Position at the last operation or dispatched move
    pub position: Position,
    /// Hop computed at the last retract
    pub hop: HopPlan,
    /// Helix computed at the last helix retract
    pub helix: Option<Helix>,
    pub deferred: DeferredQueue,
    /// Limits to restore at the end of the script being built
    pub saved_limits: Option<VelocityLimits>,
}

/// Firmware retraction with z-hop
pub struct RetractionStateMachine {
    initial: RetractionConfig,
    config: RetractionConfig,
    limits: MachineLimits,
    state: RetractionState,
    rewriter: MotionRewriter,
}

/// G-code feedrate (mm/min, whole numbers) for a speed in mm/s
fn feedrate(speed: f64) -> f64 {
    (speed * 60.0) as i64 as f64
}

/// Append to a script; scripts are bounded well below [`MAX_SCRIPT_LEN`]
fn emit(script: &mut Script, command: GcodeCommand) {
    let _ = script.push(command);
}

impl RetractionStateMachine {
    /// Create a state machine from the persisted configuration
    pub fn new(config: RetractionConfig, limits: MachineLimits) -> Self {
        let config = config.sanitized();
        Self {
            initial: config.clone(),
            config,
            limits,
            state: RetractionState::default(),
            rewriter: MotionRewriter::new(),
        }
    }

    pub fn config(&self) -> &RetractionConfig {
        &self.config
    }

    /// Configuration restored on clear
    pub fn initial_config(&self) -> &RetractionConfig {
        &self.initial
    }

    pub fn limits(&self) -> &MachineLimits {
        &self.limits
    }

    pub fn state(&self) -> &RetractionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_retracted(&self) -> bool {
        self.state.phase == Phase::Retracted
    }

    pub fn ramp_pending(&self) -> bool {
        self.state.ramp_pending
    }

    /// Check if moves are currently routed through the rewriter
    pub fn rewriter_engaged(&self) -> bool {
        self.is_retracted() && self.rewriter.is_installed()
    }

    fn hop_feedrate(&self) -> f64 {
        feedrate(RETRACTION_MOVE_SPEED_FRACTION * self.limits.max_velocity)
    }

    fn max_velocity_update(&self) -> VelocityLimitUpdate {
        VelocityLimitUpdate {
            velocity: Some(self.limits.max_velocity),
            square_corner_velocity: Some(self.limits.square_corner_velocity),
            ..Default::default()
        }
    }

    /// G10: retract the filament and lift the nozzle
    pub fn retract<P: Printer + ?Sized>(&mut self, printer: &mut P) -> Outcome {
        if self.is_retracted() {
            return Outcome::Ignored(Rejection::AlreadyRetracted);
        }
        if !printer.homed_axes().is_all() {
            return Outcome::Ignored(Rejection::NotHomed);
        }
        if !printer.can_extrude() {
            return Outcome::Ignored(Rejection::ExtruderCold);
        }
        if !self.config.retraction_enabled() {
            return Outcome::Ignored(Rejection::RetractionDisabled);
        }

        let position = printer.gcode_position();
        self.state.position = position;
        self.state.saved_limits = Some(printer.velocity_limits());

        let mut script = Script::new();
        emit(&mut script, GcodeCommand::SaveState(StateSlot::Retract));
        emit(&mut script, GcodeCommand::RelativeCoordinates);
        emit(&mut script, GcodeCommand::SetAcceleration(self.limits.max_accel));
        emit(
            &mut script,
            GcodeCommand::Linear(
                MoveParams::new()
                    .with_e(-self.config.retract_length)
                    .with_f(feedrate(self.config.retract_speed)),
            ),
        );
        emit(&mut script, GcodeCommand::AbsoluteCoordinates);

        let hop = self.config.hop_enabled();
        if hop {
            let planner = GeometryPlanner::new(printer.envelope());
            let plan = planner.retract_hop(self.config.z_hop_height, position.z);
            self.state.hop = plan;

            emit(&mut script, GcodeCommand::SetVelocityLimit(self.max_velocity_update()));

            let straight = GcodeCommand::Linear(
                MoveParams::new()
                    .with_z(plan.target_z)
                    .with_f(self.hop_feedrate()),
            );
            match self.config.z_hop_style {
                ZHopStyle::Standard => emit(&mut script, straight),
                ZHopStyle::Helix => {
                    let helix = planner.helix(
                        plan.safe_height,
                        self.config.helix_slope,
                        position.x,
                        position.y,
                    );
                    self.state.helix = Some(helix);

                    if helix.is_degenerate() {
                        emit(&mut script, straight);
                    } else {
                        emit(&mut script, GcodeCommand::SelectXyPlane);
                        emit(
                            &mut script,
                            GcodeCommand::Arc(ArcMove {
                                direction: helix.direction,
                                z: plan.target_z,
                                i: helix.i,
                                j: helix.j,
                                feedrate: self.hop_feedrate(),
                            }),
                        );
                    }
                }
                ZHopStyle::Ramp => self.state.ramp_pending = true,
            }
        }

        if let Some(saved) = self.state.saved_limits.take() {
            emit(&mut script, GcodeCommand::SetVelocityLimit(saved.restore_update()));
        }
        emit(&mut script, GcodeCommand::RestoreState(StateSlot::Retract));

        printer.run_script(&script);
        self.state.phase = self.state.phase.transition(Operation::Retract);

        if hop {
            self.rewriter.install();
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("retracted, hop {}", self.state.hop.safe_height);

        Outcome::Retracted
    }

    /// G11: lower the nozzle and push the filament back
    pub fn unretract<P: Printer + ?Sized>(&mut self, printer: &mut P) -> Outcome {
        if !self.is_retracted() {
            return Outcome::Ignored(Rejection::NotRetracted);
        }
        if !printer.can_extrude() {
            self.clear();
            #[cfg(feature = "defmt")]
            defmt::warn!("extruder cold, retraction cleared without unretract");
            return Outcome::ClearedCold;
        }

        let hop = self.config.hop_enabled();
        if hop {
            self.rewriter.uninstall();
        }

        let position = printer.gcode_position();
        self.state.position = position;
        self.state.saved_limits = Some(printer.velocity_limits());

        let mut script = Script::new();
        emit(&mut script, GcodeCommand::SaveState(StateSlot::Unretract));
        emit(&mut script, GcodeCommand::RelativeCoordinates);
        emit(&mut script, GcodeCommand::SetAcceleration(self.limits.max_accel));

        if hop && !core::mem::take(&mut self.state.ramp_pending) {
            let planner = GeometryPlanner::new(printer.envelope());
            let drop = planner.unretract_hop(self.state.hop.safe_height, position.z);

            emit(&mut script, GcodeCommand::SetVelocityLimit(self.max_velocity_update()));
            emit(
                &mut script,
                GcodeCommand::Linear(MoveParams::new().with_z(-drop).with_f(self.hop_feedrate())),
            );
        }

        emit(
            &mut script,
            GcodeCommand::Linear(
                MoveParams::new()
                    .with_e(self.config.unretract_length())
                    .with_f(feedrate(self.config.unretract_speed)),
            ),
        );
        if let Some(saved) = self.state.saved_limits.take() {
            emit(&mut script, GcodeCommand::SetVelocityLimit(saved.restore_update()));
        }
        emit(&mut script, GcodeCommand::RestoreState(StateSlot::Unretract));

        printer.run_script(&script);
        self.state.phase = self.state.phase.transition(Operation::Unretract);
        self.state.ramp_pending = false;

        let queued = self.state.deferred.take();
        let mut style_reset = false;
        for request in &queued {
            if let Outcome::Applied { style_reset: true } = self.apply(request) {
                style_reset = true;
            }
        }

        Outcome::Unretracted {
            replayed: queued.len(),
            style_reset,
        }
    }

    /// Drop the retraction state without any motion
    pub fn clear(&mut self) -> Outcome {
        if !self.is_retracted() {
            return Outcome::Ignored(Rejection::NotRetracted);
        }

        self.rewriter.uninstall();
        self.state.phase = self.state.phase.transition(Operation::Clear);
        self.state.ramp_pending = false;
        self.state.deferred.clear();

        if self.config.config_params_on_clear {
            self.config = self.initial.clone();
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("retraction cleared");

        Outcome::Cleared
    }

    /// SET_RETRACTION: apply now, or queue until the next unretract
    pub fn set(&mut self, request: SetRetraction) -> Outcome {
        match self.state.phase {
            Phase::Unretracted => self.apply(&request),
            Phase::Retracted => Outcome::Queued {
                position: self.state.deferred.push(request),
            },
        }
    }

    fn apply(&mut self, request: &SetRetraction) -> Outcome {
        let report = self.config.apply(request);
        if report.style_reset {
            #[cfg(feature = "defmt")]
            defmt::warn!("invalid z_hop_style, using standard");
        }
        Outcome::Applied {
            style_reset: report.style_reset,
        }
    }

    /// Run one G0/G1 move, folding in the hop while one is in flight
    ///
    /// Returns the parameters actually sent to the printer.
    pub fn dispatch_move<P: Printer + ?Sized>(
        &mut self,
        printer: &mut P,
        params: MoveParams,
    ) -> MoveParams {
        let params = if self.rewriter_engaged() {
            self.rewriter.rewrite(
                params,
                &self.state.hop,
                &mut self.state.ramp_pending,
                printer.coordinate_mode(),
            )
        } else {
            params
        };

        printer.run_script(&[GcodeCommand::Linear(params)]);
        self.state.position = printer.gcode_position();
        params
    }

    pub fn status(&self) -> Status {
        Status::new(
            &self.config,
            self.is_retracted(),
            self.state.ramp_pending,
            self.state.hop.safe_height,
        )
    }

    /// GET_RETRACTION response
    pub fn report(&self) -> Report<'_> {
        Report {
            config: &self.config,
            is_retracted: self.is_retracted(),
            ramp_pending: self.state.ramp_pending,
            queue: &self.state.deferred,
        }
    }
}
