//! Firmware retraction host
//!
//! Embeds the retraction core in a simulated printer and streams G-code
//! through it:
//!
//! - TOML printer configuration and persisted retraction snapshots
//! - A simulated printer implementing the core's collaborator traits
//! - The command dispatcher, including lifecycle signal synthesis

pub mod config;
pub mod dispatch;
pub mod printer;

pub use config::{ConfigError, HostConfig};
pub use dispatch::Dispatcher;
pub use printer::SimulatedPrinter;
