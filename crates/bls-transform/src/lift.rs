//! Lift, confidence and effect size of one comparison.
//!
//! Proportions use the pooled two-proportion z-test with Cohen's h;
//! continuous metrics use Welch's t-test with Cohen's d. The confidence
//! interval of the difference is always `d +/- z(1 - alpha/2) * se_unpooled`.
//! Lift is relative to the magnitude of the control mean, so its sign
//! always follows the difference.

use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use bls_model::{
    ArmKind, ArmStats, DataFlag, EffectBand, InsufficientDataError, InsufficientReason, LiftStats,
    TestKind, Thresholds,
};

use crate::arms::Comparison;

fn standard_normal() -> Option<Normal> {
    Normal::new(0.0, 1.0).ok()
}

/// Two-sided p-value of a z statistic.
fn normal_p_value(z: f64) -> f64 {
    match standard_normal() {
        Some(normal) => 2.0 * normal.sf(z.abs()),
        None => 1.0,
    }
}

/// Two-sided p-value of a t statistic with `df` degrees of freedom.
fn student_p_value(t: f64, df: f64) -> f64 {
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * dist.sf(t.abs()),
        Err(_) => normal_p_value(t),
    }
}

/// Critical value `z(1 - alpha/2)`, e.g. 1.96 for alpha = 0.05.
pub fn z_critical(alpha: f64) -> f64 {
    standard_normal().map_or(1.96, |normal| normal.inverse_cdf(1.0 - alpha / 2.0))
}

/// Sample-size flag: "Low sample" below `min_n_low`, "Limited sample" below `min_n_warn`.
pub fn data_flag(control_n: u64, exposed_n: u64, thresholds: &Thresholds) -> Option<DataFlag> {
    let smallest = control_n.min(exposed_n);
    if smallest < thresholds.min_n_low {
        Some(DataFlag::LowSample)
    } else if smallest < thresholds.min_n_warn {
        Some(DataFlag::LimitedSample)
    } else {
        None
    }
}

/// Welch-Satterthwaite degrees of freedom.
fn welch_df(control: &ArmStats, exposed: &ArmStats) -> f64 {
    let a = control.variance / control.n as f64;
    let b = exposed.variance / exposed.n as f64;
    let denominator =
        a.powi(2) / (control.n as f64 - 1.0) + b.powi(2) / (exposed.n as f64 - 1.0);
    (a + b).powi(2) / denominator
}

fn cohens_h(control: f64, exposed: f64) -> f64 {
    2.0 * exposed.sqrt().asin() - 2.0 * control.sqrt().asin()
}

fn cohens_d(control: &ArmStats, exposed: &ArmStats) -> f64 {
    let (nc, ne) = (control.n as f64, exposed.n as f64);
    let pooled = (((nc - 1.0) * control.variance + (ne - 1.0) * exposed.variance)
        / (nc + ne - 2.0))
        .sqrt();
    if pooled > 0.0 && pooled.is_finite() {
        (exposed.mean - control.mean) / pooled
    } else {
        0.0
    }
}

struct TestOutcome {
    std_error: f64,
    statistic: f64,
    p_value: f64,
    effect_size: f64,
    test: TestKind,
}

fn two_proportion_z(control: &ArmStats, exposed: &ArmStats, difference: f64) -> TestOutcome {
    let (nc, ne) = (control.n as f64, exposed.n as f64);
    let pooled = (control.mean * nc + exposed.mean * ne) / (nc + ne);
    let std_error = (pooled * (1.0 - pooled) * (1.0 / nc + 1.0 / ne)).sqrt();
    let statistic = difference / std_error;
    TestOutcome {
        std_error,
        statistic,
        p_value: normal_p_value(statistic),
        effect_size: cohens_h(control.mean, exposed.mean),
        test: TestKind::TwoProportionZ,
    }
}

fn welch_t(control: &ArmStats, exposed: &ArmStats, difference: f64) -> TestOutcome {
    let std_error = (control.variance / control.n as f64 + exposed.variance / exposed.n as f64)
        .sqrt();
    let statistic = difference / std_error;
    let degrees_of_freedom = welch_df(control, exposed);
    TestOutcome {
        std_error,
        statistic,
        p_value: student_p_value(statistic, degrees_of_freedom),
        effect_size: cohens_d(control, exposed),
        test: TestKind::WelchT { degrees_of_freedom },
    }
}

/// Computes lift statistics, or the reason the comparison cannot be scored.
pub fn compute_lift(
    comparison: &Comparison,
    thresholds: &Thresholds,
) -> Result<LiftStats, InsufficientDataError> {
    let insufficient = |reason: InsufficientReason| InsufficientDataError {
        label: comparison.key.label(),
        reason,
    };
    let control = comparison.control.clone().map_err(insufficient)?;
    let exposed = comparison.exposed.clone().map_err(insufficient)?;

    if control.mean == 0.0 {
        return Err(insufficient(InsufficientReason::ZeroBaseline));
    }

    let difference = exposed.mean - control.mean;
    let proportion = control.kind == ArmKind::Proportion && exposed.kind == ArmKind::Proportion;
    let outcome = if proportion {
        two_proportion_z(&control, &exposed, difference)
    } else {
        welch_t(&control, &exposed, difference)
    };
    if !(outcome.std_error > 0.0 && outcome.std_error.is_finite()) {
        return Err(insufficient(InsufficientReason::ZeroStandardError));
    }

    let se_difference = (control.variance / control.n as f64
        + exposed.variance / exposed.n as f64)
        .sqrt();
    let margin = z_critical(thresholds.alpha) * se_difference;
    let p_value = if outcome.p_value.is_finite() {
        outcome.p_value.clamp(0.0, 1.0)
    } else {
        1.0
    };

    Ok(LiftStats {
        control_mean: control.mean,
        exposed_mean: exposed.mean,
        difference,
        lift: difference / control.mean.abs(),
        std_error: outcome.std_error,
        se_difference,
        statistic: outcome.statistic,
        p_value,
        confidence: (1.0 - p_value).clamp(0.0, 1.0),
        ci_low: difference - margin,
        ci_high: difference + margin,
        significant: p_value < thresholds.alpha,
        effect_size: outcome.effect_size,
        effect_band: EffectBand::from_effect(outcome.effect_size),
        data_flag: data_flag(control.n, exposed.n, thresholds),
        test: outcome.test,
    })
}
