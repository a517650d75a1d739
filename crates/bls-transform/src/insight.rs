//! Verdicts and plain-language notes for lift results.

use bls_model::{DataFlag, Insight, LiftStats, Thresholds, Verdict};

const DEFAULT_KPI_LABEL: &str = "KPI";

/// Categorical verdict of a result.
///
/// With `include_non_definitive` off every result reads as a clear
/// increase or decline by the sign of its difference.
pub fn verdict(stats: &LiftStats, thresholds: &Thresholds, include_non_definitive: bool) -> Verdict {
    let lift_pct = stats.lift_pct();
    let by_sign = |up: Verdict, down: Verdict| if stats.difference >= 0.0 { up } else { down };

    if !include_non_definitive || stats.significant {
        return by_sign(Verdict::ClearUp, Verdict::ClearDown);
    }
    let low_sample = stats.data_flag == Some(DataFlag::LowSample);
    if lift_pct.is_finite() && lift_pct.abs() >= thresholds.possible_lift_pct && !low_sample {
        if stats.difference > 0.0 {
            return Verdict::PossibleUp;
        }
        return Verdict::PossibleDown;
    }
    Verdict::NoClear
}

fn note(stats: &LiftStats) -> String {
    let flag = stats.data_flag.map(|flag| flag.label().to_lowercase());
    match (stats.significant, flag) {
        (false, Some(flag)) => format!("Not definitive; {flag}."),
        (false, None) => "Not definitive; treat as directional.".to_string(),
        (true, Some(flag)) => format!("Clear result; {flag}."),
        (true, None) => "Clear result.".to_string(),
    }
}

fn meaning(stats: &LiftStats, kpi: &str, thresholds: &Thresholds) -> String {
    let gap = stats.difference_pts();
    if gap >= 0.0 {
        if gap >= thresholds.meaningful_gap_pts {
            format!("{kpi} moved up in the exposed group by {gap:.2} points.")
        } else {
            format!("{kpi} is slightly higher in the exposed group.")
        }
    } else if gap.abs() >= thresholds.meaningful_gap_pts {
        format!("{kpi} dropped in the exposed group by {:.2} points.", gap.abs())
    } else {
        format!("{kpi} is slightly lower in the exposed group.")
    }
}

fn decision(stats: &LiftStats, verdict: Verdict, thresholds: &Thresholds) -> &'static str {
    match verdict {
        Verdict::ClearUp | Verdict::ClearDown => {
            if stats.significant && stats.lift_pct().abs() >= thresholds.headline_lift_pct {
                "Safe to cite as evidence. Use it to justify the next decision."
            } else if stats.significant {
                "Usable as evidence, but the size is modest. Pair with context."
            } else {
                "Direction is clear, but confidence is weaker than ideal."
            }
        }
        Verdict::PossibleUp | Verdict::PossibleDown => {
            "Direction is plausible. Keep it in, but avoid strong claims."
        }
        Verdict::NoClear => "No clear change. Keep it for completeness, not as a headline.",
    }
}

fn kpi_label(kpi: &str) -> &str {
    if kpi.trim().is_empty() {
        DEFAULT_KPI_LABEL
    } else {
        kpi
    }
}

/// Builds the verdict and its three note lines.
pub fn build_insight(
    stats: &LiftStats,
    kpi: &str,
    thresholds: &Thresholds,
    include_non_definitive: bool,
) -> Insight {
    let verdict = verdict(stats, thresholds, include_non_definitive);
    Insight {
        verdict,
        note: note(stats),
        meaning: meaning(stats, kpi_label(kpi), thresholds),
        decision: decision(stats, verdict, thresholds).to_string(),
    }
}

/// "What changed" and "how to use it" lines for a result that could not be scored.
pub fn incomplete_lines(kpi: &str) -> (String, String) {
    (
        format!(
            "{}: data is incomplete, so the result is not readable.",
            kpi_label(kpi)
        ),
        "Do not use this as evidence until the input is fixed.".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use bls_model::{EffectBand, TestKind};

    use super::*;

    fn stats(lift: f64, difference: f64, significant: bool, flag: Option<DataFlag>) -> LiftStats {
        LiftStats {
            control_mean: 0.4,
            exposed_mean: 0.4 + difference,
            difference,
            lift,
            std_error: 0.03,
            se_difference: 0.03,
            statistic: difference / 0.03,
            p_value: if significant { 0.01 } else { 0.3 },
            confidence: if significant { 0.99 } else { 0.7 },
            ci_low: difference - 0.06,
            ci_high: difference + 0.06,
            significant,
            effect_size: 0.1,
            effect_band: EffectBand::Negligible,
            data_flag: flag,
            test: TestKind::TwoProportionZ,
        }
    }

    #[test]
    fn significant_large_lift_is_safe_to_cite() {
        let insight = build_insight(
            &stats(0.15, 0.06, true, None),
            "Awareness",
            &Thresholds::default(),
            true,
        );
        assert_eq!(insight.verdict, Verdict::ClearUp);
        assert_eq!(insight.note, "Clear result.");
        assert_eq!(
            insight.meaning,
            "Awareness moved up in the exposed group by 6.00 points."
        );
        assert_eq!(
            insight.decision,
            "Safe to cite as evidence. Use it to justify the next decision."
        );
    }

    #[test]
    fn large_non_significant_lift_is_possible() {
        let thresholds = Thresholds::default();
        let limited = stats(-0.09, -0.036, false, Some(DataFlag::LimitedSample));
        let insight = build_insight(&limited, "Consideration", &thresholds, true);
        assert_eq!(insight.verdict, Verdict::PossibleDown);
        assert_eq!(insight.note, "Not definitive; limited sample.");
        assert_eq!(
            insight.meaning,
            "Consideration dropped in the exposed group by 3.60 points."
        );

        let low = stats(0.2, 0.08, false, Some(DataFlag::LowSample));
        assert_eq!(verdict(&low, &thresholds, true), Verdict::NoClear);
    }

    #[test]
    fn hiding_non_definitive_forces_a_direction() {
        let thresholds = Thresholds::default();
        let small = stats(-0.01, -0.004, false, None);
        assert_eq!(verdict(&small, &thresholds, true), Verdict::NoClear);
        let insight = build_insight(&small, "", &thresholds, false);
        assert_eq!(insight.verdict, Verdict::ClearDown);
        assert_eq!(insight.meaning, "KPI is slightly lower in the exposed group.");
        assert_eq!(
            insight.decision,
            "Direction is clear, but confidence is weaker than ideal."
        );
    }

    #[test]
    fn incomplete_rows_are_not_evidence() {
        let (meaning, decision) = incomplete_lines("Recall");
        assert_eq!(meaning, "Recall: data is incomplete, so the result is not readable.");
        assert!(decision.starts_with("Do not use"));
    }
}
