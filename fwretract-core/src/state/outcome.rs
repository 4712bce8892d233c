//! Results of retraction operations
//!
//! Operations never fail. A command that cannot run in the current state is
//! reported as ignored with the guard that stopped it.

/// Guard that stopped an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    /// X, Y and Z are not all homed
    NotHomed,
    /// Extruder is below its minimum extrusion temperature
    ExtruderCold,
    /// Retract length is zero
    RetractionDisabled,
    /// Filament is already retracted
    AlreadyRetracted,
    /// Filament is not retracted
    NotRetracted,
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::NotHomed => "Printer is not homed. Command ignored!",
            Rejection::ExtruderCold => "Extruder temperature too low. Command ignored!",
            Rejection::RetractionDisabled => {
                "Retraction length zero. Firmware retraction disabled. Command ignored!"
            }
            Rejection::AlreadyRetracted => "Printer is already in retract state. Command ignored!",
            Rejection::NotRetracted => "Printer is not retracted. Command ignored!",
        }
    }
}

/// What an operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Filament retracted, hop performed or armed
    Retracted,
    /// Filament unretracted, `replayed` queued requests applied afterwards
    ///
    /// `style_reset` is set when a replayed request carried an unknown
    /// z-hop style.
    Unretracted { replayed: usize, style_reset: bool },
    /// Retraction state dropped without motion
    Cleared,
    /// Unretract refused on a cold extruder, state cleared instead
    ClearedCold,
    /// Parameters applied
    Applied { style_reset: bool },
    /// Parameters queued until the next unretract, at this 1-based position
    Queued { position: usize },
    /// Nothing happened
    Ignored(Rejection),
}

impl Outcome {
    /// Human-readable notice for verbose output
    pub fn message(&self) -> &'static str {
        match self {
            Outcome::Retracted => "Filament retracted.",
            Outcome::Unretracted {
                style_reset: true, ..
            } => {
                "Filament unretracted. A stored SET_RETRACTION carried an invalid \
                 z_hop_style value. Using \"standard\" as default."
            }
            Outcome::Unretracted { replayed: 0, .. } => "Filament unretracted.",
            Outcome::Unretracted { .. } => {
                "Filament unretracted. Stored SET_RETRACTION commands applied."
            }
            Outcome::Cleared => {
                "Retraction, including SET_RETRACTION command queue, was cleared. \
                 Z-hop is undone on next move."
            }
            Outcome::ClearedCold => {
                "Extruder temperature low. Retraction cleared without retract move. \
                 Z-hop will be undone on next toolhead move."
            }
            Outcome::Applied { style_reset: false } => "Retraction parameters updated.",
            Outcome::Applied { style_reset: true } => {
                "The provided z_hop_style value is invalid. Using \"standard\" as default."
            }
            Outcome::Queued { .. } => {
                "Printer in retract state. SET_RETRACTION will be executed once unretracted!"
            }
            Outcome::Ignored(rejection) => rejection.message(),
        }
    }

    /// Check if the operation was refused by a guard
    pub fn is_ignored(&self) -> bool {
        matches!(self, Outcome::Ignored(_))
    }

    /// Check if the outcome carries a warning that is always reported
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Outcome::ClearedCold
                | Outcome::Applied { style_reset: true }
                | Outcome::Unretracted {
                    style_reset: true,
                    ..
                }
        )
    }
}
