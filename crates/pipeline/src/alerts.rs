//! Alert evaluation against newly persisted attributes.

use sqlx::PgPool;
use vigil_core::alert::{rule_matches, AttributeValues};
use vigil_core::types::DbId;
use vigil_db::models::alert::{AlertRule, CreateTriggeredAlert};
use vigil_db::repositories::alert_repo::AlertRepo;

/// Evaluates active alert rules against persisted detections.
pub struct AlertEvaluator;

impl AlertEvaluator {
    /// Load the rules a run evaluates against. Inactive rules never
    /// fire.
    pub async fn active_rules(pool: &PgPool) -> Result<Vec<AlertRule>, sqlx::Error> {
        AlertRepo::list_rules(pool, true).await
    }

    /// Evaluate one persisted detection's attribute against all given
    /// rules; insert a triggered alert per match. Idempotent through the
    /// repository's conflict handling. Returns how many alerts were
    /// newly created.
    pub async fn evaluate_detection(
        pool: &PgPool,
        rules: &[AlertRule],
        video_id: DbId,
        detection_id: DbId,
        timestamp_secs: f64,
        attribute: &AttributeValues,
        aggregate_confidence: f64,
    ) -> Result<u64, sqlx::Error> {
        let mut created = 0;
        for rule in rules {
            if !rule_matches(&rule.predicates(), attribute, aggregate_confidence) {
                continue;
            }
            let matched_attributes =
                serde_json::to_value(attribute).unwrap_or(serde_json::Value::Null);
            let inserted = AlertRepo::insert_triggered(
                pool,
                &CreateTriggeredAlert {
                    rule_id: rule.id,
                    detection_id,
                    video_id,
                    matched_attributes,
                    confidence_score: aggregate_confidence,
                    timestamp_secs,
                },
            )
            .await?;
            if inserted {
                created += 1;
                tracing::info!(
                    rule_id = rule.id,
                    detection_id,
                    video_id,
                    confidence = aggregate_confidence,
                    "Alert triggered",
                );
            }
        }
        Ok(created)
    }
}
