//! Number and label formatting shared by the table and detail pages.

use bls_model::LiftResult;

pub fn format_pct(value: f64) -> String {
    format!("{value:+.2}%")
}

pub fn format_optional_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), format_pct)
}

/// Confidence in [0, 1] shown as a percentage, e.g. `93.8%`.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// Verdict label, or "Insufficient data" for rows that could not be scored.
pub fn verdict_text(result: &LiftResult) -> String {
    match result.assessment() {
        Some(assessment) => assessment.insight.state_label().to_string(),
        None => "Insufficient data".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_carry_a_sign() {
        assert_eq!(format_pct(16.25), "+16.25%");
        assert_eq!(format_pct(-3.0), "-3.00%");
        assert_eq!(format_optional_pct(None), "-");
        assert_eq!(format_confidence(0.93804), "93.8%");
    }
}
