//! `acc_core` — Risk classification and ACC re-simulation of highway following events.
//!
//! # Module layout
//! - [`types`]      — Trajectory records, safety verdicts, vehicle IDs
//! - [`error`]      — Per-record error taxonomy
//! - [`classifier`] — Challenging-scenario filter (headway, closing speed, braking)
//! - [`vehicle`]    — Longitudinal point-mass model
//! - [`controller`] — Gap controllers (linear PD)
//! - [`simulator`]  — Two-vehicle ACC re-simulation and TTC
//! - [`pipeline`]   — Batch orchestrator (classify → simulate)
//! - [`metrics`]    — Avoidance rate, TTC statistics

pub mod classifier;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod simulator;
pub mod types;
pub mod vehicle;

pub use classifier::{ClassifierConfig, RiskAssessment, RiskClassifier};
pub use controller::{GapController, PdController};
pub use error::RecordError;
pub use pipeline::{EvaluationConfig, EvaluationOutput, EvaluationPipeline};
pub use simulator::{AccConfig, AccSimulator, LeadMotion};
pub use types::{SafetyVerdict, TrajectoryRecord, VehicleId};
