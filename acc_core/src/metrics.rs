//! Evaluation metrics: how many records were challenging, and how the ACC law fared.

use crate::types::SafetyVerdict;
use serde::{Deserialize, Serialize};

/// Accumulated statistics over one or more batches.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// Records presented to the classifier stage
    pub n_records: u64,
    /// Records skipped because no lead vehicle was present
    pub n_no_lead: u64,
    /// Records classified as challenging
    pub n_challenging: u64,
    /// Verdicts produced
    pub n_simulated: u64,
    /// Verdicts with `collision_avoided == true`
    pub n_collisions_avoided: u64,
    /// Records that failed classification or simulation
    pub n_failures: u64,
    /// Smallest finite TTC over every verdict
    pub min_ttc: Option<f64>,
    /// Sum of finite per-verdict `min_ttc`, for the mean
    pub sum_min_ttc: f64,
    /// Number of verdicts with a finite `min_ttc`
    pub n_closing: u64,
}

impl EvaluationMetrics {
    /// Fraction of simulated events in which the ACC law kept TTC above the bound.
    pub fn avoidance_rate(&self) -> f64 {
        if self.n_simulated == 0 {
            1.0
        } else {
            self.n_collisions_avoided as f64 / self.n_simulated as f64
        }
    }

    /// Mean of the finite per-verdict minimum TTCs.
    pub fn mean_min_ttc(&self) -> Option<f64> {
        if self.n_closing == 0 {
            None
        } else {
            Some(self.sum_min_ttc / self.n_closing as f64)
        }
    }

    /// Record the outcome of one classifier pass.
    pub fn accumulate_filter(
        &mut self,
        n_records: usize,
        n_no_lead: usize,
        n_challenging: usize,
        n_failures: usize,
    ) {
        self.n_records += n_records as u64;
        self.n_no_lead += n_no_lead as u64;
        self.n_challenging += n_challenging as u64;
        self.n_failures += n_failures as u64;
    }

    /// Record one simulation pass.
    pub fn accumulate_verdicts(&mut self, verdicts: &[SafetyVerdict], n_failures: usize) {
        self.n_failures += n_failures as u64;
        for v in verdicts {
            self.n_simulated += 1;
            if v.collision_avoided {
                self.n_collisions_avoided += 1;
            }
            if let Some(ttc) = v.min_ttc {
                self.sum_min_ttc += ttc;
                self.n_closing += 1;
                self.min_ttc = Some(self.min_ttc.map_or(ttc, |m| m.min(ttc)));
            }
        }
    }

    /// Merge another accumulator into this one.
    pub fn merge(&mut self, other: &EvaluationMetrics) {
        self.n_records += other.n_records;
        self.n_no_lead += other.n_no_lead;
        self.n_challenging += other.n_challenging;
        self.n_simulated += other.n_simulated;
        self.n_collisions_avoided += other.n_collisions_avoided;
        self.n_failures += other.n_failures;
        self.sum_min_ttc += other.sum_min_ttc;
        self.n_closing += other.n_closing;
        self.min_ttc = match (self.min_ttc, other.min_ttc) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VehicleId;
    use approx::assert_abs_diff_eq;

    fn verdict(avoided: bool, min_ttc: Option<f64>) -> SafetyVerdict {
        SafetyVerdict {
            scenario_id: VehicleId(1),
            frame: 1,
            collision_avoided: avoided,
            max_relative_distance: 60.0,
            min_relative_distance: 20.0,
            min_ttc,
            average_velocity_acc: 25.0,
            average_velocity_lead: 24.0,
        }
    }

    #[test]
    fn empty_metrics_are_neutral() {
        let m = EvaluationMetrics::default();
        assert_eq!(m.avoidance_rate(), 1.0);
        assert_eq!(m.mean_min_ttc(), None);
    }

    #[test]
    fn verdicts_accumulate() {
        let mut m = EvaluationMetrics::default();
        m.accumulate_verdicts(
            &[
                verdict(true, None),
                verdict(false, Some(1.5)),
                verdict(true, Some(4.5)),
                verdict(true, Some(3.0)),
            ],
            1,
        );
        assert_eq!(m.n_simulated, 4);
        assert_eq!(m.n_collisions_avoided, 3);
        assert_eq!(m.n_failures, 1);
        assert_eq!(m.min_ttc, Some(1.5));
        assert_abs_diff_eq!(m.avoidance_rate(), 0.75);
        assert_abs_diff_eq!(m.mean_min_ttc().unwrap(), 3.0);
    }

    #[test]
    fn merge_combines_counts_and_minimum() {
        let mut a = EvaluationMetrics::default();
        a.accumulate_filter(10, 2, 5, 1);
        a.accumulate_verdicts(&[verdict(true, Some(6.0))], 0);

        let mut b = EvaluationMetrics::default();
        b.accumulate_filter(4, 0, 1, 0);
        b.accumulate_verdicts(&[verdict(false, Some(0.9))], 0);

        a.merge(&b);
        assert_eq!(a.n_records, 14);
        assert_eq!(a.n_no_lead, 2);
        assert_eq!(a.n_challenging, 6);
        assert_eq!(a.n_simulated, 2);
        assert_eq!(a.n_failures, 1);
        assert_eq!(a.min_ttc, Some(0.9));
    }
}
