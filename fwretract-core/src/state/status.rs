//! Status snapshot and the `GET_RETRACTION` report

use core::fmt;

use fwretract_protocol::SetRetraction;

#[cfg(feature = "serde")]
use serde::Serialize;

use super::queue::DeferredQueue;
use crate::config::{RetractionConfig, ZHopStyle};

/// Retraction status for external introspection
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Status {
    pub retract_length: f64,
    pub retract_speed: f64,
    pub unretract_extra_length: f64,
    pub unretract_speed: f64,
    pub z_hop_height: f64,
    pub z_hop_style: ZHopStyle,
    pub helix_slope: f64,
    pub verbose: bool,
    pub config_params_on_clear: bool,
    pub is_retracted: bool,
    pub ramp_pending: bool,
    /// Hop height after the envelope clamp of the last retract
    pub safe_z_hop_height: f64,
    pub unretract_length: f64,
}

impl Status {
    pub(crate) fn new(
        config: &RetractionConfig,
        is_retracted: bool,
        ramp_pending: bool,
        safe_z_hop_height: f64,
    ) -> Self {
        Self {
            retract_length: config.retract_length,
            retract_speed: config.retract_speed,
            unretract_extra_length: config.unretract_extra_length,
            unretract_speed: config.unretract_speed,
            z_hop_height: config.z_hop_height,
            z_hop_style: config.z_hop_style,
            helix_slope: config.helix_slope,
            verbose: config.verbose,
            config_params_on_clear: config.config_params_on_clear,
            is_retracted,
            ramp_pending,
            safe_z_hop_height,
            unretract_length: config.unretract_length(),
        }
    }
}

/// `GET_RETRACTION` response
///
/// One parameter line, then one line per queued request in arrival order.
pub struct Report<'a> {
    pub(crate) config: &'a RetractionConfig,
    pub(crate) is_retracted: bool,
    pub(crate) ramp_pending: bool,
    pub(crate) queue: &'a DeferredQueue,
}

impl Report<'_> {
    /// Queued requests in arrival order
    pub fn queued(&self) -> impl Iterator<Item = &SetRetraction> {
        self.queue.iter()
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.config;
        write!(
            f,
            "RETRACT_LENGTH={:.5} RETRACT_SPEED={:.5} UNRETRACT_EXTRA_LENGTH={:.5} \
             UNRETRACT_SPEED={:.5} Z_HOP_HEIGHT={:.5} Z_HOP_STYLE={} RETRACTED={} RAMP_MOVE={}",
            c.retract_length,
            c.retract_speed,
            c.unretract_extra_length,
            c.unretract_speed,
            c.z_hop_height,
            c.z_hop_style,
            self.is_retracted,
            self.ramp_pending,
        )?;

        for (index, request) in self.queued().enumerate() {
            write!(f, "\nStored command #{}: SET_RETRACTION {}", index + 1, request)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    #[test]
    fn test_report_line() {
        let config = RetractionConfig {
            retract_length: 0.8,
            z_hop_height: 0.4,
            z_hop_style: ZHopStyle::Ramp,
            ..Default::default()
        };
        let queue = DeferredQueue::new();
        let report = Report {
            config: &config,
            is_retracted: true,
            ramp_pending: false,
            queue: &queue,
        };

        assert_eq!(
            report.to_string(),
            "RETRACT_LENGTH=0.80000 RETRACT_SPEED=20.00000 UNRETRACT_EXTRA_LENGTH=0.00000 \
             UNRETRACT_SPEED=10.00000 Z_HOP_HEIGHT=0.40000 Z_HOP_STYLE=ramp RETRACTED=true \
             RAMP_MOVE=false"
        );
    }

    #[test]
    fn test_report_lists_queue_in_arrival_order() {
        let config = RetractionConfig::default();
        let mut queue = DeferredQueue::new();
        queue.push(SetRetraction {
            retract_length: Some(1.0),
            ..Default::default()
        });
        queue.push(SetRetraction {
            z_hop_height: Some(0.2),
            ..Default::default()
        });
        let report = Report {
            config: &config,
            is_retracted: true,
            ramp_pending: false,
            queue: &queue,
        };

        let text = report.to_string();
        let lines: std::vec::Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "Stored command #1: SET_RETRACTION RETRACT_LENGTH=1");
        assert_eq!(lines[2], "Stored command #2: SET_RETRACTION Z_HOP_HEIGHT=0.2");
    }

    #[test]
    fn test_status_unretract_length() {
        let config = RetractionConfig {
            retract_length: 1.0,
            unretract_extra_length: -0.25,
            ..Default::default()
        };
        let status = Status::new(&config, false, false, 0.0);
        assert_eq!(status.unretract_length, 0.75);
        assert!(!status.is_retracted);
    }
}
