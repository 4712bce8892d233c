//! Firmware retraction core logic
//!
//! This crate contains the retraction/z-hop behaviour, independent of any
//! particular host or motion planner:
//!
//! - Configuration types and the persisted snapshot codec
//! - Collaborator traits the host implements (printer status, script sink)
//! - Z-hop geometry (envelope clamping, helix placement)
//! - Motion rewriting while a hop is in flight
//! - The retract/unretract state machine with its deferred command queue
//! - Print lifecycle supervision

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod lifecycle;
pub mod motion;
pub mod state;
pub mod traits;

#[cfg(test)]
mod testing;
