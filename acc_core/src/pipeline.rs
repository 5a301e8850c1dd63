//! Pipeline orchestrator: classify a batch of records, then re-simulate the
//! challenging ones.
//!
//! # Processing steps per batch
//! 1. Drop records without a lead vehicle
//! 2. Classify the rest (in parallel); collect per-record failures
//! 3. Simulate every challenging record (in parallel); collect failures
//! 4. Accumulate metrics
//!
//! Records are independent, so output order always equals input order and a
//! failing record never affects its neighbours.

use crate::{
    classifier::{ClassifierConfig, RiskClassifier},
    controller::PdController,
    error::RecordError,
    metrics::EvaluationMetrics,
    simulator::{AccConfig, AccSimulator},
    types::{SafetyVerdict, TrajectoryRecord},
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Every tunable constant of the evaluation, grouped by stage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub classifier: ClassifierConfig,
    pub acc: AccConfig,
    pub controller: PdController,
}

impl EvaluationConfig {
    pub fn validate(&self) -> Result<(), RecordError> {
        self.classifier.validate()?;
        self.acc.validate()?;
        let c = &self.controller;
        if ![c.kp, c.kd, c.desired_gap].iter().all(|v| v.is_finite()) {
            return Err(RecordError::InvalidConfig(format!(
                "controller gains must be finite, got {c:?}"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// A record that could not be processed, by its position in the input batch.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordFailure {
    pub index: usize,
    pub error: RecordError,
}

/// Outputs of the classifier stage.
#[derive(Clone, Debug, Default)]
pub struct FilterOutput {
    /// Challenging records, in input order
    pub challenging: Vec<TrajectoryRecord>,
    /// Records seen
    pub n_records: usize,
    /// Records dropped for lack of a lead vehicle
    pub n_no_lead: usize,
    pub failures: Vec<RecordFailure>,
    pub total_time_us: u64,
}

/// Outputs of the simulation stage.
#[derive(Clone, Debug, Default)]
pub struct SimulationOutput {
    /// One verdict per successfully simulated record, in input order
    pub verdicts: Vec<SafetyVerdict>,
    pub failures: Vec<RecordFailure>,
    pub total_time_us: u64,
}

/// Outputs of a full classify + simulate pass.
#[derive(Clone, Debug, Default)]
pub struct EvaluationOutput {
    pub filter: FilterOutput,
    pub simulation: SimulationOutput,
    pub metrics: EvaluationMetrics,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Holds the two stateless stages; safe to share across threads.
pub struct EvaluationPipeline {
    pub classifier: RiskClassifier,
    pub simulator: AccSimulator<PdController>,
}

enum Classified {
    NoLead,
    Calm,
    Challenging,
}

impl EvaluationPipeline {
    pub fn new(config: EvaluationConfig) -> Result<Self, RecordError> {
        config.validate()?;
        let EvaluationConfig {
            classifier,
            acc,
            controller,
        } = config;
        Ok(Self {
            classifier: RiskClassifier::new(classifier),
            simulator: AccSimulator::with_controller(acc, controller),
        })
    }

    /// Classifier stage over a batch.
    pub fn filter(&self, records: &[TrajectoryRecord]) -> FilterOutput {
        let start = Instant::now();

        let results: Vec<Result<Classified, RecordError>> = records
            .par_iter()
            .map(|rec| {
                if !rec.has_lead() {
                    return Ok(Classified::NoLead);
                }
                Ok(if self.classifier.classify(rec)? {
                    Classified::Challenging
                } else {
                    Classified::Calm
                })
            })
            .collect();

        let mut out = FilterOutput {
            n_records: records.len(),
            ..Default::default()
        };
        for (index, (rec, res)) in records.iter().zip(results).enumerate() {
            match res {
                Ok(Classified::NoLead) => out.n_no_lead += 1,
                Ok(Classified::Calm) => {}
                Ok(Classified::Challenging) => out.challenging.push(rec.clone()),
                Err(error) => {
                    warn!(index, %error, "record skipped by classifier");
                    out.failures.push(RecordFailure { index, error });
                }
            }
        }

        out.total_time_us = start.elapsed().as_micros() as u64;
        debug!(
            records = out.n_records,
            no_lead = out.n_no_lead,
            challenging = out.challenging.len(),
            failures = out.failures.len(),
            elapsed_us = out.total_time_us,
            "filter pass done"
        );
        out
    }

    /// Simulation stage over a batch. Every record is simulated; no classification.
    pub fn simulate(&self, records: &[TrajectoryRecord]) -> SimulationOutput {
        let start = Instant::now();

        let results: Vec<Result<SafetyVerdict, RecordError>> = records
            .par_iter()
            .map(|rec| self.simulator.simulate(rec))
            .collect();

        let mut out = SimulationOutput::default();
        for (index, res) in results.into_iter().enumerate() {
            match res {
                Ok(v) => out.verdicts.push(v),
                Err(error) => {
                    warn!(index, %error, "record skipped by simulator");
                    out.failures.push(RecordFailure { index, error });
                }
            }
        }

        out.total_time_us = start.elapsed().as_micros() as u64;
        debug!(
            verdicts = out.verdicts.len(),
            failures = out.failures.len(),
            elapsed_us = out.total_time_us,
            "simulation pass done"
        );
        out
    }

    /// Classify, then simulate the challenging records.
    pub fn run(&self, records: &[TrajectoryRecord]) -> EvaluationOutput {
        let filter = self.filter(records);
        let simulation = self.simulate(&filter.challenging);

        let mut metrics = EvaluationMetrics::default();
        metrics.accumulate_filter(
            filter.n_records,
            filter.n_no_lead,
            filter.challenging.len(),
            filter.failures.len(),
        );
        metrics.accumulate_verdicts(&simulation.verdicts, simulation.failures.len());

        EvaluationOutput {
            filter,
            simulation,
            metrics,
        }
    }
}
