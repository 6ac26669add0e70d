//! Alert rule and triggered alert entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vigil_core::alert::RulePredicates;
use vigil_core::types::{DbId, Timestamp};

/// A row from the `alert_rules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertRule {
    pub id: DbId,
    pub owner_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub gender: Option<String>,
    pub upper_color: Option<String>,
    pub lower_color: Option<String>,
    pub min_confidence: f64,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AlertRule {
    pub fn predicates(&self) -> RulePredicates {
        RulePredicates {
            gender: self.gender.clone(),
            upper_color: self.upper_color.clone(),
            lower_color: self.lower_color.clone(),
            min_confidence: self.min_confidence,
        }
    }
}

/// DTO for creating an alert rule.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAlertRule {
    pub name: String,
    pub description: Option<String>,
    pub gender: Option<String>,
    pub upper_color: Option<String>,
    pub lower_color: Option<String>,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_min_confidence() -> f64 {
    0.7
}

fn default_true() -> bool {
    true
}

/// DTO for updating an alert rule; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAlertRule {
    pub name: Option<String>,
    pub description: Option<String>,
    pub gender: Option<String>,
    pub upper_color: Option<String>,
    pub lower_color: Option<String>,
    pub min_confidence: Option<f64>,
    pub is_active: Option<bool>,
}

/// A row from the `triggered_alerts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TriggeredAlert {
    pub id: DbId,
    pub rule_id: DbId,
    pub detection_id: DbId,
    pub video_id: DbId,
    pub matched_attributes: serde_json::Value,
    pub confidence_score: f64,
    pub timestamp_secs: f64,
    pub is_read: bool,
    pub is_acknowledged: bool,
    pub acknowledged_by: Option<DbId>,
    pub acknowledged_at: Option<Timestamp>,
    pub triggered_at: Timestamp,
}

/// DTO for recording a triggered alert.
#[derive(Debug, Clone)]
pub struct CreateTriggeredAlert {
    pub rule_id: DbId,
    pub detection_id: DbId,
    pub video_id: DbId,
    pub matched_attributes: serde_json::Value,
    pub confidence_score: f64,
    pub timestamp_secs: f64,
}

/// Counters for the alert stats endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertStats {
    pub total_rules: i64,
    pub active_rules: i64,
    pub total_triggered: i64,
    pub unread: i64,
    pub unacknowledged: i64,
}
