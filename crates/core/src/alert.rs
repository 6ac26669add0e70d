//! Alert-rule matching and validation.
//!
//! A rule matches a detection's attribute when every predicate the rule
//! sets equals the attribute value and the attribute's derived aggregate
//! confidence reaches the rule's minimum. Matching is pure; persistence
//! and idempotence live in the repository layer.

use serde::Serialize;

use crate::error::CoreError;

/// The attribute predicates of an alert rule. `None` means "do not filter
/// on this dimension".
#[derive(Debug, Clone, Default)]
pub struct RulePredicates {
    pub gender: Option<String>,
    pub upper_color: Option<String>,
    pub lower_color: Option<String>,
    pub min_confidence: f64,
}

/// The attribute values of a persisted detection, as seen by the matcher.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AttributeValues {
    pub gender: Option<String>,
    pub upper_color: Option<String>,
    pub lower_color: Option<String>,
}

impl RulePredicates {
    /// A rule with no attribute predicate at all would fire on every
    /// detection; such rules are rejected at creation time.
    pub fn has_any_predicate(&self) -> bool {
        self.gender.is_some() || self.upper_color.is_some() || self.lower_color.is_some()
    }
}

/// Validate a rule's predicates and threshold.
pub fn validate_rule(name: &str, predicates: &RulePredicates) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Alert rule name must not be empty".to_string(),
        ));
    }
    if !predicates.has_any_predicate() {
        return Err(CoreError::Validation(
            "At least one attribute filter (gender, upper_color, lower_color) must be specified"
                .to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&predicates.min_confidence) {
        return Err(CoreError::Validation(format!(
            "min_confidence must be within [0, 1], got {}",
            predicates.min_confidence
        )));
    }
    Ok(())
}

/// Whether a rule matches an attribute with the given derived aggregate
/// confidence.
pub fn rule_matches(
    predicates: &RulePredicates,
    attribute: &AttributeValues,
    aggregate_confidence: f64,
) -> bool {
    if aggregate_confidence < predicates.min_confidence {
        return false;
    }

    fn predicate_ok(predicate: &Option<String>, value: &Option<String>) -> bool {
        match predicate {
            None => true,
            Some(wanted) => value.as_deref() == Some(wanted.as_str()),
        }
    }

    predicate_ok(&predicates.gender, &attribute.gender)
        && predicate_ok(&predicates.upper_color, &attribute.upper_color)
        && predicate_ok(&predicates.lower_color, &attribute.lower_color)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
