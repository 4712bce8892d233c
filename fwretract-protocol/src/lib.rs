//! G-code command vocabulary for firmware retraction
//!
//! This crate defines the textual boundary between a G-code stream and the
//! retraction core. Lines are parsed once, here, into typed requests whose
//! fields are all optional and already numeric:
//!
//! ```text
//! SET_RETRACTION RETRACT_LENGTH=0.8 Z_HOP_STYLE=helix
//!      │
//!      ▼
//! Request::SetRetraction(SetRetraction { retract_length: Some(0.8), .. })
//! ```
//!
//! In the other direction, the core emits [`GcodeCommand`] scripts which
//! render back to plain G-code text through `Display`.

#![no_std]
#![deny(unsafe_code)]

pub mod gcode;
pub mod line;
pub mod params;

pub use gcode::{ArcDirection, ArcMove, GcodeCommand, StateSlot, VelocityLimitUpdate};
pub use line::{parse_line, LineError, Request};
pub use params::{Decimal, MoveParams, SetRetraction, StyleName, MAX_STYLE_NAME_LEN};
