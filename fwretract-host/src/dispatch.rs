//! Command dispatcher
//!
//! Routes parsed G-code lines to the retraction state machine or the
//! printer, and turns homing, motor-off and job macros into lifecycle
//! events for the governor.

use tracing::{debug, info, warn};

use fwretract_core::config::RetractionConfig;
use fwretract_core::lifecycle::{LifecycleEvent, LifecycleGovernor};
use fwretract_core::state::{Outcome, RetractionStateMachine};
use fwretract_core::traits::CoordinateMode;
use fwretract_protocol::{parse_line, LineError, Request};

use crate::config::HostConfig;
use crate::printer::SimulatedPrinter;

/// Owns the core and the printer, processes one line at a time
pub struct Dispatcher {
    machine: RetractionStateMachine,
    governor: LifecycleGovernor,
    printer: SimulatedPrinter,
}

/// Job macros that map to lifecycle events
fn job_events(name: &str) -> &'static [LifecycleEvent] {
    use LifecycleEvent::*;

    const RESET: &[LifecycleEvent] = &[JobReset];
    const PRINT: &[LifecycleEvent] = &[JobReset, JobStarted];
    const PAUSE: &[LifecycleEvent] = &[JobPaused];
    const RESUME: &[LifecycleEvent] = &[JobResumed];
    const CANCEL: &[LifecycleEvent] = &[JobCancelled];

    match name.to_ascii_uppercase().as_str() {
        "SDCARD_RESET_FILE" => RESET,
        "SDCARD_PRINT_FILE" => PRINT,
        "PAUSE" => PAUSE,
        "RESUME" => RESUME,
        "CANCEL_PRINT" => CANCEL,
        _ => &[],
    }
}

impl Dispatcher {
    pub fn new(
        machine: RetractionStateMachine,
        governor: LifecycleGovernor,
        printer: SimulatedPrinter,
    ) -> Self {
        Self {
            machine,
            governor,
            printer,
        }
    }

    /// Build the whole stack from a configuration file
    pub fn from_config(config: &HostConfig, retraction: RetractionConfig) -> Self {
        let limits = config.machine_limits();
        let printer = SimulatedPrinter::new(
            &limits,
            config.envelope(),
            config.extruder.min_extrude_temp,
        );
        Self::new(
            RetractionStateMachine::new(retraction, limits),
            LifecycleGovernor::new(config.has_job_queue()),
            printer,
        )
    }

    pub fn machine(&self) -> &RetractionStateMachine {
        &self.machine
    }

    pub fn printer(&self) -> &SimulatedPrinter {
        &self.printer
    }

    pub fn printer_mut(&mut self) -> &mut SimulatedPrinter {
        &mut self.printer
    }

    /// Process one line, returning the responses for the user
    pub fn handle_line(&mut self, line: &str) -> Vec<String> {
        let mut responses = Vec::new();

        let request = match parse_line(line) {
            Ok(request) => request,
            Err(LineError::Empty) => return responses,
            Err(e) => {
                warn!(line, "rejected: {e}");
                responses.push(format!("Error: {e}: {}", line.trim()));
                return responses;
            }
        };

        match request {
            Request::Retract => {
                let outcome = self.machine.retract(&mut self.printer);
                self.respond(&mut responses, "G10", outcome);
            }
            Request::Unretract => {
                let outcome = self.machine.unretract(&mut self.printer);
                self.respond(&mut responses, "G11", outcome);
            }
            Request::SetRetraction(set) => {
                let outcome = self.machine.set(set);
                self.respond(&mut responses, "SET_RETRACTION", outcome);
            }
            Request::GetRetraction => {
                let report = self.machine.report().to_string();
                responses.extend(report.lines().map(str::to_string));
            }
            Request::ClearRetraction => {
                let outcome = self.machine.clear();
                self.respond(&mut responses, "CLEAR_RETRACTION", outcome);
            }
            Request::Move(params) => {
                let sent = self.machine.dispatch_move(&mut self.printer, params);
                if sent != params {
                    debug!(%sent, "move rewritten");
                }
            }
            Request::AbsoluteCoordinates => {
                self.printer.set_coordinate_mode(CoordinateMode::Absolute);
                self.printer.record("G90");
            }
            Request::RelativeCoordinates => {
                self.printer.set_coordinate_mode(CoordinateMode::Relative);
                self.printer.record("G91");
            }
            Request::Home => {
                self.signal_into(&mut responses, LifecycleEvent::HomingBegin);
                self.printer.home();
                self.printer.passthrough(line.trim());
            }
            Request::MotorsOff => {
                self.printer.passthrough(line.trim());
                self.printer.motors_off();
                self.signal_into(&mut responses, LifecycleEvent::MotorsOff);
            }
            Request::SetExtruderTemp { target, .. } => {
                self.printer.set_temperature(target);
                self.printer.passthrough(line.trim());
            }
            Request::Other(name) => {
                for event in job_events(name) {
                    self.signal_into(&mut responses, *event);
                }
                self.printer.passthrough(line.trim());
            }
        }

        responses
    }

    /// Deliver a lifecycle event, returning the responses for the user
    pub fn signal(&mut self, event: LifecycleEvent) -> Vec<String> {
        let mut responses = Vec::new();
        self.signal_into(&mut responses, event);
        responses
    }

    /// End of the input stream; the job is complete
    pub fn finish(&mut self) -> Vec<String> {
        self.signal(LifecycleEvent::JobCompleted)
    }

    fn signal_into(&mut self, responses: &mut Vec<String>, event: LifecycleEvent) {
        debug!(?event, "lifecycle event");
        if let Some(outcome) = self.governor.handle(event, &mut self.machine) {
            info!(?event, ?outcome, "retraction reset by lifecycle event");
            self.respond(responses, "lifecycle", outcome);
        }
    }

    fn respond(&self, responses: &mut Vec<String>, command: &str, outcome: Outcome) {
        if outcome.is_warning() {
            warn!(command, "{}", outcome.message());
        } else {
            info!(command, ?outcome, "{}", outcome.message());
        }

        if outcome.is_warning() || self.machine.config().verbose {
            responses.push(outcome.message().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use fwretract_core::config::ZHopStyle;

    const CONFIG: &str = r#"
[printer]
max_velocity = 300.0
max_accel = 3000.0

[stepper_x]
position_max = 200.0

[stepper_y]
position_max = 200.0

[stepper_z]
position_max = 180.0

[firmware_retraction]
retract_length = 0.8
retract_speed = 35.0
z_hop_height = 0.4
"#;

    fn dispatcher(extra: &str) -> Dispatcher {
        let config = parse_config(&format!("{CONFIG}{extra}")).unwrap();
        let retraction = config.retraction();
        Dispatcher::from_config(&config, retraction)
    }

    fn run(dispatcher: &mut Dispatcher, lines: &[&str]) -> Vec<String> {
        lines
            .iter()
            .flat_map(|line| dispatcher.handle_line(line))
            .collect()
    }

    fn ready(extra: &str) -> Dispatcher {
        let mut d = dispatcher(extra);
        run(&mut d, &["G28", "M109 S210", "G1 X50 Y50 Z0.3 F6000"]);
        d.printer_mut().drain_output();
        d
    }

    #[test]
    fn test_stream_rewriting() {
        let mut d = ready("");

        run(
            &mut d,
            &["G10", "G1 X60 Y50 Z0.3", "G1 X70", "G11", "G1 X80 Z0.3"],
        );

        let output = d.printer().output();
        assert_eq!(output[0], "SAVE_GCODE_STATE NAME=_retract_state");
        assert!(output.contains(&"G1 Z0.7 F14400".to_string()));
        assert!(output.contains(&"G1 X60 Y50 Z0.7".to_string()));
        assert!(output.contains(&"G1 X70".to_string()));
        assert!(output.contains(&"G1 Z-0.4 F14400".to_string()));
        assert_eq!(output.last().map(String::as_str), Some("G1 X80 Z0.3"));
    }

    #[test]
    fn test_numbered_and_compact_moves_rewritten() {
        let mut d = ready("");
        run(&mut d, &["N10 G10*33", "N11 G1 X60 Z0.3*90", "G1X70Z0.3"]);

        let output = d.printer().output();
        assert!(d.machine().is_retracted());
        assert!(output.contains(&"G1 X60 Z0.7".to_string()));
        assert_eq!(output.last().map(String::as_str), Some("G1 X70 Z0.7"));
    }

    #[test]
    fn test_cold_or_unhomed_retract_ignored() {
        let mut d = dispatcher("");
        run(&mut d, &["G10"]);
        assert!(!d.machine().is_retracted());

        run(&mut d, &["G28", "G10"]);
        assert!(!d.machine().is_retracted());

        run(&mut d, &["M104 S215", "G10"]);
        assert!(d.machine().is_retracted());
    }

    #[test]
    fn test_verbose_responses() {
        let mut quiet = dispatcher("");
        assert!(run(&mut quiet, &["G11"]).is_empty());

        let mut verbose = dispatcher("verbose = true\n");
        assert_eq!(
            run(&mut verbose, &["G11"]),
            vec!["Printer is not retracted. Command ignored!"]
        );
    }

    #[test]
    fn test_warnings_always_reported() {
        let mut d = dispatcher("");
        let responses = run(&mut d, &["SET_RETRACTION Z_HOP_STYLE=zigzag"]);
        assert_eq!(responses.len(), 1);
        assert!(responses[0].contains("invalid"));
    }

    #[test]
    fn test_deferred_invalid_style_warns_on_unretract() {
        let mut d = ready("z_hop_style = \"helix\"\n");
        assert!(run(&mut d, &["G10", "SET_RETRACTION Z_HOP_STYLE=zigzag"]).is_empty());

        let responses = run(&mut d, &["G11"]);
        assert_eq!(responses.len(), 1);
        assert!(responses[0].contains("invalid z_hop_style"));
        assert_eq!(d.machine().config().z_hop_style, ZHopStyle::Standard);
    }

    #[test]
    fn test_get_retraction_lists_queue() {
        let mut d = ready("");
        run(
            &mut d,
            &[
                "G10",
                "SET_RETRACTION RETRACT_LENGTH=1.5",
                "SET_RETRACTION Z_HOP_STYLE=ramp",
            ],
        );

        let responses = run(&mut d, &["GET_RETRACTION"]);
        assert_eq!(responses.len(), 3);
        assert!(responses[0].starts_with("RETRACT_LENGTH=0.80000 "));
        assert!(responses[0].ends_with("RETRACTED=true RAMP_MOVE=false"));
        assert_eq!(responses[1], "Stored command #1: SET_RETRACTION RETRACT_LENGTH=1.5");
        assert_eq!(responses[2], "Stored command #2: SET_RETRACTION Z_HOP_STYLE=ramp");

        run(&mut d, &["G11"]);
        assert_eq!(d.machine().config().retract_length, 1.5);
    }

    #[test]
    fn test_homing_clears_retraction() {
        let mut d = ready("");
        run(&mut d, &["G10"]);
        assert!(d.machine().is_retracted());

        run(&mut d, &["G28"]);
        assert!(!d.machine().is_retracted());
    }

    #[test]
    fn test_motors_off_clears_retraction() {
        let mut d = ready("");
        run(&mut d, &["G10", "M84"]);
        assert!(!d.machine().is_retracted());
    }

    #[test]
    fn test_pause_resume_keeps_retraction() {
        let mut d = ready("[virtual_sdcard]\n");
        run(&mut d, &["G10", "PAUSE", "RESUME"]);
        assert!(d.machine().is_retracted());

        run(&mut d, &["PAUSE", "SDCARD_PRINT_FILE FILENAME=next.gcode"]);
        assert!(!d.machine().is_retracted());
    }

    #[test]
    fn test_homing_during_pause_keeps_retraction() {
        let mut d = ready("[virtual_sdcard]\n");
        run(&mut d, &["G10", "pause", "G28 X Y"]);
        assert!(d.machine().is_retracted());

        // The pause only covers one clear
        run(&mut d, &["M84"]);
        assert!(!d.machine().is_retracted());
    }

    #[test]
    fn test_job_macros_without_job_queue() {
        let mut d = ready("");
        run(&mut d, &["G10", "CANCEL_PRINT"]);
        assert!(d.machine().is_retracted());
        assert_eq!(d.printer().output().last().map(String::as_str), Some("CANCEL_PRINT"));
    }

    #[test]
    fn test_finish_completes_job() {
        let mut d = ready("[virtual_sdcard]\n");
        run(&mut d, &["G10"]);
        d.finish();
        assert!(!d.machine().is_retracted());
    }

    #[test]
    fn test_parse_errors_reported() {
        let mut d = dispatcher("");
        let responses = run(&mut d, &["G1 X1.2.3", "", "; comment only"]);
        assert_eq!(responses, vec!["Error: invalid number: G1 X1.2.3"]);
    }

    #[test]
    fn test_unknown_commands_pass_through() {
        let mut d = dispatcher("");
        run(&mut d, &["M106 S255 ; fan", "G90"]);
        assert_eq!(d.printer().output(), ["M106 S255 ; fan", "G90"]);
    }
}
