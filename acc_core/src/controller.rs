//! Gap controllers for the ACC vehicle.
//!
//! The `GapController` trait is the seam for alternative laws; the workspace
//! ships the linear PD law only:
//!
//! a = kp·(d − d_desired) + kd·Δv
//!
//! with d = lead.position − acc.position and Δv = lead.velocity − acc.velocity.

use serde::{Deserialize, Serialize};

/// Maps the current gap state to a commanded acceleration (m/s²).
pub trait GapController {
    fn acceleration(&self, relative_distance: f64, relative_velocity: f64) -> f64;
}

/// Proportional-derivative controller on the gap error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdController {
    /// Gain on gap error (1/s²)
    pub kp: f64,
    /// Gain on relative velocity (1/s)
    pub kd: f64,
    /// Target distance to the lead vehicle (m)
    pub desired_gap: f64,
}

impl Default for PdController {
    fn default() -> Self {
        Self {
            kp: 0.5,
            kd: 0.1,
            desired_gap: 50.0,
        }
    }
}

impl GapController for PdController {
    fn acceleration(&self, relative_distance: f64, relative_velocity: f64) -> f64 {
        self.kp * (relative_distance - self.desired_gap) + self.kd * relative_velocity
    }
}
