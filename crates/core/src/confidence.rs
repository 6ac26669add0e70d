//! Aggregate-confidence policy for attribute records.
//!
//! A detection's attribute row carries up to three independent component
//! confidences (upper color, lower color, gender). The aggregate is the
//! arithmetic mean of the components that are present; missing components
//! are excluded from the average, not treated as zero. An attribute with
//! no components at all has aggregate 0.
//!
//! The same policy must be applied everywhere the aggregate is used:
//! search filtering, search ordering, alert evaluation, and display.
//! [`AGGREGATE_CONFIDENCE_SQL`] is the Postgres twin of
//! [`aggregate_confidence`]; keep the two in sync.

/// Mean of the present component confidences, 0.0 when none are present.
pub fn aggregate_confidence(
    upper_color_confidence: Option<f64>,
    lower_color_confidence: Option<f64>,
    gender_confidence: Option<f64>,
) -> f64 {
    let components = [
        upper_color_confidence,
        lower_color_confidence,
        gender_confidence,
    ];
    let present: Vec<f64> = components.iter().filter_map(|c| *c).collect();
    if present.is_empty() {
        return 0.0;
    }
    present.iter().sum::<f64>() / present.len() as f64
}

/// Postgres expression computing the same aggregate over an `attributes`
/// row aliased as `a`. Used for both the confidence filter and the
/// confidence sort so the two can never disagree.
pub const AGGREGATE_CONFIDENCE_SQL: &str = "\
    COALESCE(\
        (COALESCE(a.upper_color_confidence, 0) \
         + COALESCE(a.lower_color_confidence, 0) \
         + COALESCE(a.gender_confidence, 0)) \
        / NULLIF(\
            (a.upper_color_confidence IS NOT NULL)::int \
            + (a.lower_color_confidence IS NOT NULL)::int \
            + (a.gender_confidence IS NOT NULL)::int, 0), \
        0)";

/// Round a confidence to 3 decimals for display/export.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
