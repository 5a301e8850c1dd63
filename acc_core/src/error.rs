use crate::types::{Field, VehicleId};
use thiserror::Error;

/// Why a single record could not be classified or simulated.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("frame {frame}, vehicle {id}: missing required field `{field}`")]
    MissingField {
        frame: u64,
        id: VehicleId,
        field: Field,
    },
    #[error("frame {frame}, vehicle {id}: field `{field}` is not a finite number ({value})")]
    NonFinite {
        frame: u64,
        id: VehicleId,
        field: Field,
        value: f64,
    },
    #[error("frame {frame}, vehicle {id}: no preceding vehicle")]
    NoLeadVehicle { frame: u64, id: VehicleId },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
