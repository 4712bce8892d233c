//! Lifecycle governor
//!
//! Clears the retraction when the print lifecycle says the nozzle is no
//! longer where the retract left it. A pause suppresses exactly one such
//! clear, so the resume can unretract normally.

use super::events::LifecycleEvent;
use crate::state::{Outcome, RetractionStateMachine};

/// Arbitrates lifecycle events against the retraction state
#[derive(Debug, Clone, Default)]
pub struct LifecycleGovernor {
    /// Job queue events are delivered
    job_queue: bool,
    /// A pause is in effect; the next evaluation must not clear
    pause_suppressed: bool,
}

impl LifecycleGovernor {
    /// Create a governor; `job_queue` enables the managed-job events
    pub fn new(job_queue: bool) -> Self {
        Self {
            job_queue,
            pause_suppressed: false,
        }
    }

    pub fn has_job_queue(&self) -> bool {
        self.job_queue
    }

    pub fn is_pause_suppressed(&self) -> bool {
        self.pause_suppressed
    }

    /// Handle one event
    ///
    /// Returns the outcome of the clear when one was attempted.
    pub fn handle(
        &mut self,
        event: LifecycleEvent,
        machine: &mut RetractionStateMachine,
    ) -> Option<Outcome> {
        use LifecycleEvent::*;

        if event.is_job_event() && !self.job_queue {
            return None;
        }

        match event {
            HomingBegin | MotorsOff | JobCompleted | JobResumed => self.evaluate(machine),
            JobReset | JobStarted | JobCancelled => {
                self.pause_suppressed = false;
                self.evaluate(machine)
            }
            JobPaused => {
                self.pause_suppressed = true;
                None
            }
        }
    }

    fn evaluate(&mut self, machine: &mut RetractionStateMachine) -> Option<Outcome> {
        if !machine.is_retracted() {
            return None;
        }
        if core::mem::take(&mut self.pause_suppressed) {
            #[cfg(feature = "defmt")]
            defmt::debug!("clear suppressed by pause");
            return None;
        }
        Some(machine.clear())
    }
}
