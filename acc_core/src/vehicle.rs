//! Longitudinal point-mass vehicle model.
//!
//! ## State vector
//! s = [position, velocity]ᵀ  (metres, m/s along the lane)
//!
//! ## Transition under commanded acceleration `a`
//! position += velocity·dt + ½·a·dt²
//! velocity += a·dt

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// One vehicle in the two-vehicle following model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleModel {
    pub state: Vector2<f64>,
}

impl VehicleModel {
    pub fn new(position: f64, velocity: f64) -> Self {
        Self {
            state: Vector2::new(position, velocity),
        }
    }

    pub fn position(&self) -> f64 {
        self.state[0]
    }

    pub fn velocity(&self) -> f64 {
        self.state[1]
    }

    /// Advance the state by `dt` seconds under constant acceleration.
    pub fn update_state(&mut self, acceleration: f64, dt: f64) {
        self.state[0] += self.state[1] * dt + 0.5 * acceleration * dt * dt;
        self.state[1] += acceleration * dt;
    }
}
