//! Fundamental types used across the entire workspace.

use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identifier types — newtype wrappers so IDs are never confused at compile time
// ---------------------------------------------------------------------------

/// highD vehicle identifier. `0` marks an empty neighbour slot.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VehicleId(pub u64);

impl VehicleId {
    /// "No such vehicle".
    pub const NONE: VehicleId = VehicleId(0);

    /// True if this slot refers to an actual vehicle.
    pub fn is_some(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TrajectoryRecord
// ---------------------------------------------------------------------------

/// One observation of one tracked vehicle at one time frame (a highD track row).
///
/// Keys follow the highD column names (`xVelocity`, `precedingXVelocity`, ...).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryRecord {
    /// Discrete time index
    pub frame: u64,
    /// Vehicle this row belongs to
    pub id: VehicleId,
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// Bounding box length (m)
    pub width: Option<f64>,
    /// Bounding box width across the lane (m)
    pub height: Option<f64>,
    pub x_velocity: Option<f64>,
    pub y_velocity: Option<f64>,
    pub x_acceleration: Option<f64>,
    pub y_acceleration: Option<f64>,
    pub front_sight_distance: Option<f64>,
    pub back_sight_distance: Option<f64>,
    /// Distance headway to the preceding vehicle (m)
    pub dhw: Option<f64>,
    /// Time headway to the preceding vehicle (s)
    pub thw: Option<f64>,
    /// Recorded time-to-collision; informational only
    pub ttc: Option<f64>,
    pub preceding_x_velocity: Option<f64>,
    pub preceding_id: VehicleId,
    #[serde(default)]
    pub following_id: VehicleId,
    #[serde(default)]
    pub left_preceding_id: VehicleId,
    #[serde(default)]
    pub left_alongside_id: VehicleId,
    #[serde(default)]
    pub left_following_id: VehicleId,
    #[serde(default)]
    pub right_preceding_id: VehicleId,
    #[serde(default)]
    pub right_alongside_id: VehicleId,
    #[serde(default)]
    pub right_following_id: VehicleId,
    pub lane_id: Option<i64>,
}

/// Numeric fields that the classifier or the simulator read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    X,
    XVelocity,
    XAcceleration,
    FrontSightDistance,
    Dhw,
    Thw,
    PrecedingXVelocity,
}

impl Field {
    /// Column name as it appears in highD files and record JSON.
    pub fn name(self) -> &'static str {
        match self {
            Field::X => "x",
            Field::XVelocity => "xVelocity",
            Field::XAcceleration => "xAcceleration",
            Field::FrontSightDistance => "frontSightDistance",
            Field::Dhw => "dhw",
            Field::Thw => "thw",
            Field::PrecedingXVelocity => "precedingXVelocity",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TrajectoryRecord {
    /// True if a lead vehicle is present in the same lane.
    pub fn has_lead(&self) -> bool {
        self.preceding_id.is_some()
    }

    /// Raw (possibly absent) value of a numeric field.
    pub fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::X => self.x,
            Field::XVelocity => self.x_velocity,
            Field::XAcceleration => self.x_acceleration,
            Field::FrontSightDistance => self.front_sight_distance,
            Field::Dhw => self.dhw,
            Field::Thw => self.thw,
            Field::PrecedingXVelocity => self.preceding_x_velocity,
        }
    }

    /// Value of a field the caller cannot do without. Never substitutes a default.
    pub fn require(&self, field: Field) -> Result<f64, RecordError> {
        match self.value(field) {
            None => Err(RecordError::MissingField {
                frame: self.frame,
                id: self.id,
                field,
            }),
            Some(v) if !v.is_finite() => Err(RecordError::NonFinite {
                frame: self.frame,
                id: self.id,
                field,
                value: v,
            }),
            Some(v) => Ok(v),
        }
    }
}

// ---------------------------------------------------------------------------
// SafetyVerdict
// ---------------------------------------------------------------------------

/// Outcome of re-simulating one challenging record under the ACC law.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SafetyVerdict {
    /// Vehicle id of the source record
    pub scenario_id: VehicleId,
    /// Frame of the source record (correlation key)
    pub frame: u64,
    /// False iff some step had a finite TTC at or below the safe bound
    pub collision_avoided: bool,
    pub max_relative_distance: f64,
    pub min_relative_distance: f64,
    /// Smallest finite TTC; `None` when the gap never closed
    pub min_ttc: Option<f64>,
    pub average_velocity_acc: f64,
    pub average_velocity_lead: f64,
}
