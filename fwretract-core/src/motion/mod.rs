//! Z-hop motion
//!
//! Geometry for the hop itself and the rewriting of moves made while it is
//! in flight.

pub mod geometry;
pub mod rewriter;

pub use geometry::{GeometryPlanner, Helix, HopPlan, HELIX_MIN_RADIUS};
pub use rewriter::MotionRewriter;
