//! ACC re-simulation of one challenging following event.
//!
//! # Processing steps per record
//! 1. Build the two vehicles from the record:
//!    - lead: `(x, xVelocity)`
//!    - ACC:  `(x − frontSightDistance, precedingXVelocity)`
//! 2. For `t = 0, dt, …, horizon` (inclusive, `floor(horizon/dt) + 1` steps):
//!    gap state → controller command → advance the ACC vehicle → TTC of the
//!    pre-step gap state
//! 3. Fold the step trace into a [`SafetyVerdict`]
//!
//! The lead vehicle receives no commanded acceleration. Whether its position is
//! integrated at all is chosen by [`LeadMotion`].

use crate::{
    controller::{GapController, PdController},
    error::RecordError,
    types::{Field, SafetyVerdict, TrajectoryRecord},
    vehicle::VehicleModel,
};
use serde::{Deserialize, Serialize};

/// Absorbs rounding in `horizon / dt` so that 10.0 / 0.1 yields 101 steps.
const STEP_EPS: f64 = 1e-9;

/// Upper bound on `horizon / dt` accepted by [`AccConfig::validate`].
pub const MAX_STEPS: f64 = 1e7;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// How the lead vehicle evolves over the horizon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadMotion {
    /// Lead state is never advanced; it stays at its recorded position.
    #[default]
    Held,
    /// Lead position is integrated every step at its recorded velocity.
    ConstantVelocity,
}

/// Parameters of one re-simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccConfig {
    /// Integration step (s)
    pub dt: f64,
    /// Simulated duration (s), endpoint included
    pub horizon: f64,
    /// A finite TTC at or below this (s) counts as a potential collision
    pub safe_ttc: f64,
    pub lead_motion: LeadMotion,
}

impl Default for AccConfig {
    fn default() -> Self {
        Self {
            dt: 0.1,
            horizon: 10.0,
            safe_ttc: 2.0,
            lead_motion: LeadMotion::Held,
        }
    }
}

impl AccConfig {
    pub fn validate(&self) -> Result<(), RecordError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(RecordError::InvalidConfig(format!(
                "acc.dt must be positive, got {}",
                self.dt
            )));
        }
        if !(self.horizon.is_finite() && self.horizon >= 0.0) {
            return Err(RecordError::InvalidConfig(format!(
                "acc.horizon must be non-negative, got {}",
                self.horizon
            )));
        }
        if self.horizon / self.dt > MAX_STEPS {
            return Err(RecordError::InvalidConfig(format!(
                "acc.horizon / acc.dt must not exceed {MAX_STEPS}, got {} / {}",
                self.horizon, self.dt
            )));
        }
        if !self.safe_ttc.is_finite() {
            return Err(RecordError::InvalidConfig(format!(
                "acc.safe_ttc must be finite, got {}",
                self.safe_ttc
            )));
        }
        Ok(())
    }

    /// Number of simulated steps: `floor(horizon / dt) + 1`.
    ///
    /// Only meaningful for a config that passed [`validate`](Self::validate).
    pub fn n_steps(&self) -> usize {
        let whole = (self.horizon / self.dt + STEP_EPS).floor() as usize;
        whole.saturating_add(1)
    }
}

// ---------------------------------------------------------------------------
// Step trace
// ---------------------------------------------------------------------------

/// Everything recorded for one simulation step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimStep {
    pub time: f64,
    /// lead.position − acc.position, before the step
    pub relative_distance: f64,
    /// lead.velocity − acc.velocity, before the step
    pub relative_velocity: f64,
    /// Command applied to the ACC vehicle
    pub acceleration: f64,
    /// `+inf` unless the gap is closing
    pub ttc: f64,
    /// ACC velocity after the step
    pub acc_velocity: f64,
    pub lead_velocity: f64,
}

/// Time until the gap closes at the current relative velocity.
///
/// Returns `+inf` unless `relative_velocity < 0`, so the division never sees zero.
pub fn time_to_collision(relative_distance: f64, relative_velocity: f64) -> f64 {
    if relative_velocity < 0.0 {
        (relative_distance / relative_velocity).abs()
    } else {
        f64::INFINITY
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Two-vehicle ACC simulator. Stateless between records.
#[derive(Clone, Debug, Default)]
pub struct AccSimulator<C = PdController> {
    pub config: AccConfig,
    pub controller: C,
}

impl AccSimulator<PdController> {
    pub fn new(config: AccConfig) -> Self {
        Self {
            config,
            controller: PdController::default(),
        }
    }
}

impl<C: GapController> AccSimulator<C> {
    pub fn with_controller(config: AccConfig, controller: C) -> Self {
        Self { config, controller }
    }

    /// Initial (lead, ACC) vehicle states for a record.
    pub fn initial_states(
        &self,
        record: &TrajectoryRecord,
    ) -> Result<(VehicleModel, VehicleModel), RecordError> {
        if !record.has_lead() {
            return Err(RecordError::NoLeadVehicle {
                frame: record.frame,
                id: record.id,
            });
        }
        let x = record.require(Field::X)?;
        let vx = record.require(Field::XVelocity)?;
        let sight = record.require(Field::FrontSightDistance)?;
        let lead_vx = record.require(Field::PrecedingXVelocity)?;

        Ok((VehicleModel::new(x, vx), VehicleModel::new(x - sight, lead_vx)))
    }

    /// Run the full horizon and return every step.
    pub fn trace(&self, record: &TrajectoryRecord) -> Result<Vec<SimStep>, RecordError> {
        self.config.validate()?;
        let (mut lead, mut acc) = self.initial_states(record)?;
        let dt = self.config.dt;
        let n = self.config.n_steps();

        let mut steps = Vec::with_capacity(n);
        for i in 0..n {
            let relative_distance = lead.position() - acc.position();
            let relative_velocity = lead.velocity() - acc.velocity();
            let acceleration = self
                .controller
                .acceleration(relative_distance, relative_velocity);

            acc.update_state(acceleration, dt);
            if self.config.lead_motion == LeadMotion::ConstantVelocity {
                lead.update_state(0.0, dt);
            }

            steps.push(SimStep {
                time: i as f64 * dt,
                relative_distance,
                relative_velocity,
                acceleration,
                ttc: time_to_collision(relative_distance, relative_velocity),
                acc_velocity: acc.velocity(),
                lead_velocity: lead.velocity(),
            });
        }
        Ok(steps)
    }

    /// Re-simulate `record` and summarise the run.
    pub fn simulate(&self, record: &TrajectoryRecord) -> Result<SafetyVerdict, RecordError> {
        let steps = self.trace(record)?;
        Ok(summarize(record, &steps, self.config.safe_ttc))
    }
}

/// Fold a step trace into a verdict. `trace` always yields at least one step.
fn summarize(
    record: &TrajectoryRecord,
    steps: &[SimStep],
    safe_ttc: f64,
) -> SafetyVerdict {
    let n = steps.len().max(1) as f64;

    let mut max_rd = f64::NEG_INFINITY;
    let mut min_rd = f64::INFINITY;
    let mut min_ttc = f64::INFINITY;
    let mut sum_acc = 0.0;
    let mut sum_lead = 0.0;
    let mut collision_avoided = true;

    for s in steps {
        max_rd = max_rd.max(s.relative_distance);
        min_rd = min_rd.min(s.relative_distance);
        min_ttc = min_ttc.min(s.ttc);
        sum_acc += s.acc_velocity;
        sum_lead += s.lead_velocity;
        // Sticky: one unsafe step decides the run.
        if s.ttc.is_finite() && s.ttc <= safe_ttc {
            collision_avoided = false;
        }
    }

    SafetyVerdict {
        scenario_id: record.id,
        frame: record.frame,
        collision_avoided,
        max_relative_distance: max_rd,
        min_relative_distance: min_rd,
        min_ttc: min_ttc.is_finite().then_some(min_ttc),
        average_velocity_acc: sum_acc / n,
        average_velocity_lead: sum_lead / n,
    }
}
