//! Risk classifier: decides whether a recorded following event is "challenging".
//!
//! A record is challenging when any one of three independent conditions holds:
//! - **following too close**: `dhw <= max_dhw` or `thw <= max_thw` (inclusive)
//! - **high relative velocity**: `|xVelocity - precedingXVelocity| >= min_relative_velocity`
//! - **strong deceleration**: `xAcceleration < max_deceleration` (strict)
//!
//! Records without a lead vehicle (`precedingId == 0`) are never challenging and
//! none of their other fields are read.

use crate::{
    error::RecordError,
    types::{Field, TrajectoryRecord},
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Thresholds used by [`RiskClassifier`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Unsafe distance headway (m), inclusive
    pub max_dhw: f64,
    /// Unsafe time headway (s), inclusive
    pub max_thw: f64,
    /// High relative velocity along x (m/s), inclusive
    pub min_relative_velocity: f64,
    /// Hard deceleration bound (m/s²), exclusive
    pub max_deceleration: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_dhw: 10.0,
            max_thw: 3.0,
            min_relative_velocity: 5.0,
            max_deceleration: -2.0,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), RecordError> {
        let values = [
            ("max_dhw", self.max_dhw),
            ("max_thw", self.max_thw),
            ("min_relative_velocity", self.min_relative_velocity),
            ("max_deceleration", self.max_deceleration),
        ];
        for (name, v) in values {
            if !v.is_finite() {
                return Err(RecordError::InvalidConfig(format!(
                    "classifier.{name} must be finite, got {v}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// The individual risk terms behind a classification, for reporting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// `|xVelocity - precedingXVelocity|` (m/s)
    pub relative_velocity_x: f64,
    pub following_too_close: bool,
    pub high_relative_velocity: bool,
    pub strong_deceleration: bool,
}

impl RiskAssessment {
    pub fn is_challenging(&self) -> bool {
        self.following_too_close || self.high_relative_velocity || self.strong_deceleration
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct RiskClassifier {
    pub config: ClassifierConfig,
}

impl RiskClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Evaluate every risk term. Fails if a required field is absent or not finite.
    ///
    /// Does not look at `precedingId`; use [`classify`](Self::classify) for the
    /// full contract.
    pub fn assess(&self, record: &TrajectoryRecord) -> Result<RiskAssessment, RecordError> {
        let cfg = &self.config;
        let vx = record.require(Field::XVelocity)?;
        let lead_vx = record.require(Field::PrecedingXVelocity)?;
        let dhw = record.require(Field::Dhw)?;
        let thw = record.require(Field::Thw)?;
        let ax = record.require(Field::XAcceleration)?;

        let relative_velocity_x = (vx - lead_vx).abs();
        Ok(RiskAssessment {
            relative_velocity_x,
            following_too_close: dhw <= cfg.max_dhw || thw <= cfg.max_thw,
            high_relative_velocity: relative_velocity_x >= cfg.min_relative_velocity,
            strong_deceleration: ax < cfg.max_deceleration,
        })
    }

    /// `Ok(true)` if the record describes a challenging following event.
    pub fn classify(&self, record: &TrajectoryRecord) -> Result<bool, RecordError> {
        if !record.has_lead() {
            return Ok(false);
        }
        Ok(self.assess(record)?.is_challenging())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VehicleId;

    /// A relaxed following event: large gaps, matched speeds, gentle braking.
    fn calm_record() -> TrajectoryRecord {
        TrajectoryRecord {
            frame: 100,
            id: VehicleId(12),
            x: Some(250.0),
            x_velocity: Some(30.0),
            preceding_x_velocity: Some(31.0),
            front_sight_distance: Some(120.0),
            dhw: Some(80.0),
            thw: Some(3.5),
            x_acceleration: Some(-0.3),
            preceding_id: VehicleId(11),
            ..Default::default()
        }
    }

    #[test]
    fn calm_following_is_not_challenging() {
        let clf = RiskClassifier::default();
        assert!(!clf.classify(&calm_record()).unwrap());
    }

    #[test]
    fn no_lead_vehicle_is_never_challenging() {
        let clf = RiskClassifier::default();
        // Every other field would trip the classifier, or is missing entirely.
        let rec = TrajectoryRecord {
            dhw: Some(1.0),
            thw: None,
            preceding_id: VehicleId::NONE,
            ..calm_record()
        };
        assert!(!clf.classify(&rec).unwrap());
    }

    #[test]
    fn dhw_threshold_is_inclusive() {
        let clf = RiskClassifier::default();
        let rec = TrajectoryRecord {
            dhw: Some(10.0),
            ..calm_record()
        };
        let a = clf.assess(&rec).unwrap();
        assert!(a.following_too_close);
        assert!(clf.classify(&rec).unwrap());

        let rec = TrajectoryRecord {
            dhw: Some(10.000_001),
            ..calm_record()
        };
        assert!(!clf.classify(&rec).unwrap());
    }

    #[test]
    fn thw_threshold_is_inclusive() {
        let clf = RiskClassifier::default();
        let rec = TrajectoryRecord {
            thw: Some(3.0),
            ..calm_record()
        };
        assert!(clf.classify(&rec).unwrap());
        let rec = TrajectoryRecord {
            thw: Some(2.2),
            ..calm_record()
        };
        assert!(clf.assess(&rec).unwrap().following_too_close);
    }

    #[test]
    fn relative_velocity_is_symmetric() {
        let clf = RiskClassifier::default();
        let slower = TrajectoryRecord {
            x_velocity: Some(25.0),
            ..calm_record()
        };
        let faster = TrajectoryRecord {
            x_velocity: Some(37.0),
            ..calm_record()
        };
        let a = clf.assess(&slower).unwrap();
        let b = clf.assess(&faster).unwrap();
        assert!(a.high_relative_velocity && b.high_relative_velocity);
        assert_eq!(a.relative_velocity_x, 6.0);
        assert_eq!(b.relative_velocity_x, 6.0);

        let exactly = TrajectoryRecord {
            x_velocity: Some(26.0),
            ..calm_record()
        };
        assert!(clf.assess(&exactly).unwrap().high_relative_velocity);
    }

    #[test]
    fn deceleration_threshold_is_exclusive() {
        let clf = RiskClassifier::default();
        let rec = TrajectoryRecord {
            x_acceleration: Some(-2.0),
            ..calm_record()
        };
        let a = clf.assess(&rec).unwrap();
        assert!(!a.strong_deceleration);
        assert!(!clf.classify(&rec).unwrap());

        let rec = TrajectoryRecord {
            x_acceleration: Some(-2.01),
            ..calm_record()
        };
        assert!(clf.classify(&rec).unwrap());
    }

    #[test]
    fn each_term_alone_is_sufficient() {
        let clf = RiskClassifier::default();
        let cases = [
            TrajectoryRecord {
                dhw: Some(9.0),
                ..calm_record()
            },
            TrajectoryRecord {
                thw: Some(1.0),
                ..calm_record()
            },
            TrajectoryRecord {
                preceding_x_velocity: Some(40.0),
                ..calm_record()
            },
            TrajectoryRecord {
                x_acceleration: Some(-4.0),
                ..calm_record()
            },
        ];
        for rec in &cases {
            assert!(clf.classify(rec).unwrap(), "{rec:?}");
        }
    }

    #[test]
    fn missing_field_is_an_error() {
        let clf = RiskClassifier::default();
        let rec = TrajectoryRecord {
            thw: None,
            ..calm_record()
        };
        let err = clf.classify(&rec).unwrap_err();
        assert_eq!(
            err,
            RecordError::MissingField {
                frame: 100,
                id: VehicleId(12),
                field: Field::Thw,
            }
        );
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let clf = RiskClassifier::new(ClassifierConfig {
            max_dhw: 100.0,
            ..ClassifierConfig::default()
        });
        assert!(clf.classify(&calm_record()).unwrap());
    }

    #[test]
    fn validate_rejects_nan_threshold() {
        let cfg = ClassifierConfig {
            max_thw: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(RecordError::InvalidConfig(_))));
    }
}
