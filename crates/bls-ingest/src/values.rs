//! Cell parsing helpers.

use polars::prelude::DataFrame;

use crate::error::Result;

/// Percent-looking values above this are read as percentages.
const PERCENT_CUTOFF: f64 = 1.5;

/// Parses a number, tolerating thousands separators and a trailing `%`.
///
/// Returns the value and whether it carried a percent sign.
fn parse_decorated(value: &str) -> Option<(f64, bool)> {
    let cleaned = value.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    let (digits, percent) = match cleaned.strip_suffix('%') {
        Some(stripped) => (stripped.trim().to_string(), true),
        None => (cleaned, false),
    };
    let parsed = digits.parse::<f64>().ok()?;
    parsed.is_finite().then_some((parsed, percent))
}

/// Parses a plain numeric metric. `45%` reads as 0.45.
pub fn parse_number(value: &str) -> Option<f64> {
    parse_decorated(value).map(|(v, percent)| if percent { v / 100.0 } else { v })
}

/// Parses a score into a proportion.
///
/// Accepts `47.10%`, `47.10` (read as percent because it is above 1.5) and
/// `0.471`; all three give 0.471.
pub fn parse_score(value: &str) -> Option<f64> {
    let (v, percent) = parse_decorated(value)?;
    if percent || v > PERCENT_CUTOFF {
        Some(v / 100.0)
    } else {
        Some(v)
    }
}

/// Parses a sample size. Spreadsheet floats such as `1200.0` are accepted;
/// fractional or negative counts are not.
pub fn parse_sample(value: &str) -> Option<u64> {
    let v = parse_number(value)?;
    if v < 0.0 || v.fract() != 0.0 || v > u64::MAX as f64 {
        return None;
    }
    Some(v as u64)
}

pub fn parse_order(value: &str) -> Option<i64> {
    let v = parse_number(value)?;
    (v.fract() == 0.0).then_some(v as i64)
}

/// Returns a column's cells as owned strings, or all `None` when the column is absent.
pub fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    if !df.get_column_names().iter().any(|col| col.as_str() == name) {
        return Ok(vec![None; df.height()]);
    }
    let values = df.column(name)?.str()?;
    Ok(values
        .into_iter()
        .map(|value| {
            value
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_accepts_all_three_spellings() {
        for raw in ["47.10%", "47.10", "0.471", " 47.1 % "] {
            let value = parse_score(raw).unwrap();
            assert!((value - 0.471).abs() < 1e-9, "{raw} -> {value}");
        }
    }

    #[test]
    fn small_percent_sign_is_still_a_percent() {
        assert!((parse_score("1%").unwrap() - 0.01).abs() < 1e-12);
        assert!((parse_score("1").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unreadable_scores_are_none() {
        assert_eq!(parse_score(""), None);
        assert_eq!(parse_score("n/a"), None);
        assert_eq!(parse_score("NaN"), None);
    }

    #[test]
    fn sample_sizes_must_be_whole() {
        assert_eq!(parse_sample("1,200"), Some(1200));
        assert_eq!(parse_sample("1200.0"), Some(1200));
        assert_eq!(parse_sample("12.5"), None);
        assert_eq!(parse_sample("-3"), None);
    }

    #[test]
    fn metric_percent_is_scaled() {
        assert_eq!(parse_number("45%"), Some(0.45));
        assert_eq!(parse_number("3.5"), Some(3.5));
    }
}
