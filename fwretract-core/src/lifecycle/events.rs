//! Print lifecycle events

/// Signals that can reset the retraction state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleEvent {
    // Streaming events, always observed
    /// A homing move has begun
    HomingBegin,
    /// All stepper motors were disabled
    MotorsOff,

    // Managed-job events, observed only with a job queue
    /// The job file was reset
    JobReset,
    /// A job started printing
    JobStarted,
    /// A paused job resumed
    JobResumed,
    /// The job finished
    JobCompleted,
    /// The job was cancelled
    JobCancelled,
    /// The job was paused
    JobPaused,
}

impl LifecycleEvent {
    /// Check if this event comes from plain command streaming
    pub fn is_streaming_event(&self) -> bool {
        matches!(self, LifecycleEvent::HomingBegin | LifecycleEvent::MotorsOff)
    }

    /// Check if this event comes from the job queue
    pub fn is_job_event(&self) -> bool {
        !self.is_streaming_event()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_families() {
        assert!(LifecycleEvent::HomingBegin.is_streaming_event());
        assert!(LifecycleEvent::MotorsOff.is_streaming_event());
        assert!(!LifecycleEvent::JobStarted.is_streaming_event());

        assert!(LifecycleEvent::JobPaused.is_job_event());
        assert!(LifecycleEvent::JobResumed.is_job_event());
        assert!(!LifecycleEvent::HomingBegin.is_job_event());
    }
}
