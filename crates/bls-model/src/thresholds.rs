//! Decision thresholds for significance, sample flags and notes.

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Thresholds used by the lift calculator and the insight notes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Two-sided significance level; a result is clear when `p < alpha`.
    pub alpha: f64,
    /// Either arm below this sample size is flagged "Limited sample".
    pub min_n_warn: u64,
    /// Either arm below this sample size is flagged "Low sample".
    pub min_n_low: u64,
    /// Minimum |lift| (percent) for a non-significant result to read as possible.
    pub possible_lift_pct: f64,
    /// Minimum |lift| (percent) for a significant result to be headline-worthy.
    pub headline_lift_pct: f64,
    /// Gap (percentage points) below which a change reads as "slightly".
    pub meaningful_gap_pts: f64,
    /// Minimum observations per arm for the continuous test.
    pub min_observations: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            min_n_warn: 120,
            min_n_low: 80,
            possible_lift_pct: 8.0,
            headline_lift_pct: 10.0,
            meaningful_gap_pts: 0.8,
            min_observations: 2,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(SettingsError::invalid("thresholds.alpha", "must be in (0, 1)"));
        }
        if self.min_n_low > self.min_n_warn {
            return Err(SettingsError::invalid(
                "thresholds.min_n_low",
                "must not exceed thresholds.min_n_warn",
            ));
        }
        if self.min_observations < 2 {
            return Err(SettingsError::invalid(
                "thresholds.min_observations",
                "must be at least 2 to estimate variance",
            ));
        }
        for (field, value) in [
            ("thresholds.possible_lift_pct", self.possible_lift_pct),
            ("thresholds.headline_lift_pct", self.headline_lift_pct),
            ("thresholds.meaningful_gap_pts", self.meaningful_gap_pts),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::invalid(field, "must be a non-negative number"));
            }
        }
        Ok(())
    }

    /// Confidence level matching `alpha`, e.g. 0.95.
    pub fn confidence_level(&self) -> f64 {
        1.0 - self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let thresholds = Thresholds::default();
        assert!(thresholds.validate().is_ok());
        assert!((thresholds.confidence_level() - 0.95).abs() < 1e-12);
    }

    #[test]
    fn rejects_inverted_sample_flags() {
        let thresholds = Thresholds {
            min_n_low: 200,
            ..Thresholds::default()
        };
        assert!(thresholds.validate().is_err());
    }
}
