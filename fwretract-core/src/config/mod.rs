//! Configuration types
//!
//! Retraction parameters and the machine-side limits they are checked
//! against. With the `serde` feature, retraction parameters can be stored
//! as postcard binary snapshots.

pub mod machine;
#[cfg(feature = "serde")]
pub mod persist;
pub mod types;

pub use machine::*;
pub use types::*;
