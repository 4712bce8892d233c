//! Print lifecycle supervision
//!
//! Returns the retraction state to a safe baseline when a print starts,
//! stops or the machine is re-homed.

pub mod events;
pub mod governor;

pub use events::LifecycleEvent;
pub use governor::LifecycleGovernor;
