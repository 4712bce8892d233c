//! Collaborator traits
//!
//! These traits define the interface between the retraction logic and the
//! host that owns the motion planner, heaters and kinematics.

pub mod printer;

pub use printer::{CommandSink, CoordinateMode, HomedAxes, Position, Printer, PrinterStatus};
