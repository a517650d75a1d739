//! Plain-language definitions of the reported metrics.

/// `(column, definition)` pairs in results-table order.
pub const METRIC_DEFINITIONS: &[(&str, &str)] = &[
    ("Control", "Share of the control group showing the KPI (or its mean metric)."),
    ("Exposed", "Share of the exposed group showing the KPI (or its mean metric)."),
    ("Gap", "The simple gap: exposed minus control (percentage points for shares)."),
    ("Lift", "Relative change vs control. Example: 10% to 12% is +20% lift."),
    ("Statistic", "How far the difference is from no change, in standard units."),
    ("p-value", "How likely this result is due to chance. Lower is stronger."),
    ("Confidence", "One minus the p-value. Closer to 1 means more trustworthy."),
    ("CI low", "Lower bound of the likely difference range."),
    ("CI high", "Upper bound of the likely difference range."),
    ("Significant", "True if the result clears the configured confidence threshold."),
    ("Effect size", "How big the change is (size, not just significance)."),
    ("Effect band", "Negligible / Small / Medium / Large effect size band."),
    ("Data flag", "Low or limited sample warning from the per-arm sample sizes."),
    ("Verdict", "Clear, possible or no clear change, from significance and size."),
];
