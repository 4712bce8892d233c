//! Motion command rewriting while a z-hop is in flight
//!
//! While retracted with a hop, every move still targets the un-hopped
//! layer height. The rewriter folds the hop offset into the Z of each move
//! until the unretract drops the toolhead back down.

use fwretract_protocol::MoveParams;

use super::geometry::HopPlan;
use crate::traits::CoordinateMode;

/// Z rewriting stage in front of the plain move handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionRewriter {
    installed: bool,
}

impl MotionRewriter {
    pub const fn new() -> Self {
        Self { installed: false }
    }

    /// Route moves through the rewriter
    ///
    /// Returns false if it was already installed.
    pub fn install(&mut self) -> bool {
        !core::mem::replace(&mut self.installed, true)
    }

    /// Route moves straight to the plain handler
    ///
    /// Returns false if it was not installed.
    pub fn uninstall(&mut self) -> bool {
        core::mem::replace(&mut self.installed, false)
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Apply the hop offset to one move
    ///
    /// A pending ramp is consumed by the first move seen: it gets the hop
    /// folded in whether or not it carries a Z.
    pub fn rewrite(
        &self,
        mut params: MoveParams,
        hop: &HopPlan,
        ramp_pending: &mut bool,
        mode: CoordinateMode,
    ) -> MoveParams {
        if core::mem::take(ramp_pending) {
            params.z = Some(match (params.z, mode) {
                (Some(z), _) => z + hop.safe_height,
                (None, CoordinateMode::Relative) => hop.safe_height,
                (None, CoordinateMode::Absolute) => hop.target_z,
            });
            return params;
        }

        if let (Some(z), CoordinateMode::Absolute) = (params.z, mode) {
            params.z = Some(z + hop.safe_height);
        }
        params
    }
}
