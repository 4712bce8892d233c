//! Z-hop geometry
//!
//! Keeps the hop inside the travel envelope and places the helix arc so it
//! never leaves the build plate.

use fwretract_protocol::ArcDirection;

use crate::config::Envelope;

/// Smallest helix radius emitted as an arc (mm)
pub const HELIX_MIN_RADIUS: f64 = 0.01;

/// Clamped hop for one retract
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HopPlan {
    /// Height actually lifted, after the envelope clamp
    pub safe_height: f64,
    /// Absolute Z at the top of the hop
    pub target_z: f64,
}

/// Placement of a helical hop
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Helix {
    /// Arc radius, 0 when the hop degrades to a straight move
    pub radius: f64,
    /// X offset of the arc centre from the toolhead
    pub i: f64,
    /// Y offset of the arc centre from the toolhead
    pub j: f64,
    pub direction: ArcDirection,
}

impl Helix {
    /// Check if the hop must be a straight vertical move instead
    pub fn is_degenerate(&self) -> bool {
        self.radius <= 0.0
    }
}

/// Computes hop heights and helix placement for an envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryPlanner {
    envelope: Envelope,
}

impl GeometryPlanner {
    pub fn new(envelope: Envelope) -> Self {
        Self { envelope }
    }

    /// Hop at retract time: never above the configured height, never past Z max
    pub fn retract_hop(&self, height: f64, z: f64) -> HopPlan {
        let headroom = (self.envelope.z_max - z).max(0.0);
        let safe_height = height.min(headroom).max(0.0);
        HopPlan {
            safe_height,
            target_z: z + safe_height,
        }
    }

    /// Height to drop at unretract time, recomputed from the current Z
    ///
    /// The drop never takes the toolhead below Z=0.
    pub fn unretract_hop(&self, safe_height: f64, z: f64) -> f64 {
        if z - safe_height < 0.0 {
            z.max(0.0)
        } else {
            safe_height
        }
    }

    /// Place a helix of the given hop height at X/Y
    pub fn helix(&self, safe_height: f64, slope: f64, x: f64, y: f64) -> Helix {
        let nominal = (safe_height / slope).max(HELIX_MIN_RADIUS);

        let Some(bounds) = self.envelope.xy else {
            return Helix {
                radius: nominal,
                i: -nominal,
                j: 0.0,
                direction: ArcDirection::CounterClockwise,
            };
        };

        let (edge, distance) = bounds.nearest_edge(x, y);
        let radius = if distance <= nominal {
            0.0
        } else if distance <= 2.0 * nominal {
            (distance - nominal).max(HELIX_MIN_RADIUS)
        } else {
            nominal
        };

        let (nx, ny) = edge.inward_normal();
        let direction = if x >= bounds.mid_x() {
            ArcDirection::Clockwise
        } else {
            ArcDirection::CounterClockwise
        };

        Helix {
            radius,
            // Avoid emitting "-0" offsets
            i: nx * radius + 0.0,
            j: ny * radius + 0.0,
            direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::XyBounds;
    use proptest::prelude::*;

    fn bed() -> GeometryPlanner {
        GeometryPlanner::new(Envelope::new(180.0).with_xy(XyBounds::new(0.0, 200.0, 0.0, 200.0)))
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_retract_hop_unclamped() {
        let plan = bed().retract_hop(0.4, 10.0);
        assert_eq!(plan.safe_height, 0.4);
        assert!(close(plan.target_z, 10.4));
    }

    #[test]
    fn test_retract_hop_clamped_at_z_max() {
        let plan = bed().retract_hop(2.0, 179.5);
        assert!(close(plan.safe_height, 0.5));
        assert!(close(plan.target_z, 180.0));

        // Already above the envelope
        let plan = bed().retract_hop(2.0, 181.0);
        assert_eq!(plan.safe_height, 0.0);
        assert_eq!(plan.target_z, 181.0);
    }

    #[test]
    fn test_unretract_hop_symmetric_without_travel() {
        let planner = bed();
        let plan = planner.retract_hop(2.0, 179.0);
        let drop = planner.unretract_hop(plan.safe_height, plan.target_z);
        assert!(close(drop, plan.safe_height));
        assert!(close(drop, 1.0));
    }

    #[test]
    fn test_unretract_hop_clamped_at_low_z() {
        let planner = bed();
        assert_eq!(planner.unretract_hop(0.4, 0.25), 0.25);
        assert_eq!(planner.unretract_hop(0.4, -0.1), 0.0);
        assert_eq!(planner.unretract_hop(0.4, 0.4), 0.4);
    }

    #[test]
    fn test_helix_degenerate_near_edge() {
        // Nominal radius 2 / 0.328 is about 6.1, the left edge is 3 away
        let helix = bed().helix(2.0, 0.328, 3.0, 100.0);
        assert_eq!(helix.radius, 0.0);
        assert!(helix.is_degenerate());
    }

    #[test]
    fn test_helix_full_radius_in_centre() {
        let helix = bed().helix(2.0, 0.328, 50.0, 100.0);
        assert!(close(helix.radius, 2.0 / 0.328));
        // Nearest edge is the left one, centre lies to the right
        assert!(close(helix.i, helix.radius));
        assert_eq!(helix.j, 0.0);
        assert_eq!(helix.direction, ArcDirection::CounterClockwise);
    }

    #[test]
    fn test_helix_transition_zone_shrinks() {
        let nominal = 2.0 / 0.328;
        // Near the back edge, right half of the bed
        let y = 200.0 - 1.5 * nominal;
        let helix = bed().helix(2.0, 0.328, 150.0, y);

        assert!(close(helix.radius, 0.5 * nominal));
        assert_eq!(helix.i, 0.0);
        assert!(close(helix.j, -helix.radius));
        assert_eq!(helix.direction, ArcDirection::Clockwise);
    }

    #[test]
    fn test_helix_direction_at_midpoint() {
        let helix = bed().helix(0.4, 0.328, 100.0, 100.0);
        assert_eq!(helix.direction, ArcDirection::Clockwise);
        let helix = bed().helix(0.4, 0.328, 99.9, 100.0);
        assert_eq!(helix.direction, ArcDirection::CounterClockwise);
    }

    #[test]
    fn test_helix_without_bounds() {
        let planner = GeometryPlanner::new(Envelope::new(200.0));
        let helix = planner.helix(0.4, 0.328, 0.0, 0.0);

        assert!(close(helix.radius, 0.4 / 0.328));
        assert!(close(helix.i, -helix.radius));
        assert_eq!(helix.j, 0.0);
        assert_eq!(helix.direction, ArcDirection::CounterClockwise);
    }

    #[test]
    fn test_helix_minimum_radius() {
        let planner = GeometryPlanner::new(Envelope::new(200.0));
        let helix = planner.helix(0.0, 0.328, 0.0, 0.0);
        assert_eq!(helix.radius, HELIX_MIN_RADIUS);
    }

    proptest! {
        #[test]
        fn test_retract_hop_stays_in_envelope(h in 0.0f64..10.0, z in 0.0f64..200.0) {
            let plan = bed().retract_hop(h, z);
            prop_assert!(plan.safe_height >= 0.0);
            prop_assert!(plan.safe_height <= h);
            prop_assert!(plan.target_z <= 180.0 + 1e-9 || plan.safe_height == 0.0);
        }

        #[test]
        fn test_helix_radius_never_negative(
            h in 0.1f64..5.0,
            x in -10.0f64..210.0,
            y in -10.0f64..210.0,
        ) {
            let helix = bed().helix(h, 0.328, x, y);
            prop_assert!(helix.radius >= 0.0);

            let (_, d) = XyBounds::new(0.0, 200.0, 0.0, 200.0).nearest_edge(x, y);
            let nominal = (h / 0.328).max(HELIX_MIN_RADIUS);
            if d <= nominal {
                prop_assert_eq!(helix.radius, 0.0);
            } else {
                // The whole circle stays on the plate
                prop_assert!(2.0 * helix.radius <= d + 1e-9);
            }
        }
    }
}
