//! Repository for the `alert_rules` and `triggered_alerts` tables.

use sqlx::PgPool;
use vigil_core::types::DbId;

use crate::models::alert::{
    AlertRule, AlertStats, CreateAlertRule, CreateTriggeredAlert, TriggeredAlert, UpdateAlertRule,
};

/// Column list for `alert_rules` SELECT queries.
const RULE_COLUMNS: &str = "\
    id, owner_id, name, description, gender, upper_color, lower_color, \
    min_confidence, is_active, created_at, updated_at";

/// Column list for `triggered_alerts` SELECT queries.
const TRIGGERED_COLUMNS: &str = "\
    id, rule_id, detection_id, video_id, matched_attributes, \
    confidence_score, timestamp_secs, is_read, is_acknowledged, \
    acknowledged_by, acknowledged_at, triggered_at";

/// Provides query operations for alert rules and triggered alerts.
pub struct AlertRepo;

impl AlertRepo {
    // -----------------------------------------------------------------------
    // Rules
    // -----------------------------------------------------------------------

    pub async fn insert_rule(
        pool: &PgPool,
        owner_id: Option<DbId>,
        rule: &CreateAlertRule,
    ) -> Result<AlertRule, sqlx::Error> {
        let query = format!(
            "INSERT INTO alert_rules \
             (owner_id, name, description, gender, upper_color, lower_color, \
              min_confidence, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {RULE_COLUMNS}"
        );
        sqlx::query_as::<_, AlertRule>(&query)
            .bind(owner_id)
            .bind(&rule.name)
            .bind(&rule.description)
            .bind(&rule.gender)
            .bind(&rule.upper_color)
            .bind(&rule.lower_color)
            .bind(rule.min_confidence)
            .bind(rule.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn get_rule(pool: &PgPool, id: DbId) -> Result<Option<AlertRule>, sqlx::Error> {
        let query = format!("SELECT {RULE_COLUMNS} FROM alert_rules WHERE id = $1");
        sqlx::query_as::<_, AlertRule>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_rules(
        pool: &PgPool,
        active_only: bool,
    ) -> Result<Vec<AlertRule>, sqlx::Error> {
        let filter = if active_only { "WHERE is_active" } else { "" };
        let query = format!(
            "SELECT {RULE_COLUMNS} FROM alert_rules {filter} ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, AlertRule>(&query).fetch_all(pool).await
    }

    /// Patch a rule; absent fields keep their current value.
    pub async fn update_rule(
        pool: &PgPool,
        id: DbId,
        update: &UpdateAlertRule,
    ) -> Result<Option<AlertRule>, sqlx::Error> {
        let query = format!(
            "UPDATE alert_rules SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                gender = COALESCE($4, gender), \
                upper_color = COALESCE($5, upper_color), \
                lower_color = COALESCE($6, lower_color), \
                min_confidence = COALESCE($7, min_confidence), \
                is_active = COALESCE($8, is_active), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {RULE_COLUMNS}"
        );
        sqlx::query_as::<_, AlertRule>(&query)
            .bind(id)
            .bind(&update.name)
            .bind(&update.description)
            .bind(&update.gender)
            .bind(&update.upper_color)
            .bind(&update.lower_color)
            .bind(update.min_confidence)
            .bind(update.is_active)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete_rule(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM alert_rules WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    // -----------------------------------------------------------------------
    // Triggered alerts
    // -----------------------------------------------------------------------

    /// Record a triggered alert. Idempotent: re-evaluating the same rule
    /// against the same detection inserts nothing. Returns whether a row
    /// was created.
    pub async fn insert_triggered(
        pool: &PgPool,
        alert: &CreateTriggeredAlert,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO triggered_alerts \
             (rule_id, detection_id, video_id, matched_attributes, \
              confidence_score, timestamp_secs) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT ON CONSTRAINT uq_alert_once DO NOTHING",
        )
        .bind(alert.rule_id)
        .bind(alert.detection_id)
        .bind(alert.video_id)
        .bind(&alert.matched_attributes)
        .bind(alert.confidence_score)
        .bind(alert.timestamp_secs)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn get_triggered(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TriggeredAlert>, sqlx::Error> {
        let query = format!("SELECT {TRIGGERED_COLUMNS} FROM triggered_alerts WHERE id = $1");
        sqlx::query_as::<_, TriggeredAlert>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_triggered(
        pool: &PgPool,
        unread_only: bool,
        unacknowledged_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TriggeredAlert>, sqlx::Error> {
        let mut clauses = vec!["TRUE"];
        if unread_only {
            clauses.push("NOT is_read");
        }
        if unacknowledged_only {
            clauses.push("NOT is_acknowledged");
        }
        let query = format!(
            "SELECT {TRIGGERED_COLUMNS} FROM triggered_alerts \
             WHERE {} \
             ORDER BY triggered_at DESC, id DESC \
             LIMIT $1 OFFSET $2",
            clauses.join(" AND ")
        );
        sqlx::query_as::<_, TriggeredAlert>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Mark one alert read. Idempotent.
    pub async fn mark_read(pool: &PgPool, id: DbId) -> Result<Option<TriggeredAlert>, sqlx::Error> {
        let query = format!(
            "UPDATE triggered_alerts SET is_read = TRUE WHERE id = $1 \
             RETURNING {TRIGGERED_COLUMNS}"
        );
        sqlx::query_as::<_, TriggeredAlert>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Acknowledge an alert: one-way, also marks it read.
    pub async fn acknowledge(
        pool: &PgPool,
        id: DbId,
        acknowledged_by: DbId,
    ) -> Result<Option<TriggeredAlert>, sqlx::Error> {
        let query = format!(
            "UPDATE triggered_alerts SET \
                is_read = TRUE, \
                is_acknowledged = TRUE, \
                acknowledged_by = COALESCE(acknowledged_by, $2), \
                acknowledged_at = COALESCE(acknowledged_at, now()) \
             WHERE id = $1 \
             RETURNING {TRIGGERED_COLUMNS}"
        );
        sqlx::query_as::<_, TriggeredAlert>(&query)
            .bind(id)
            .bind(acknowledged_by)
            .fetch_optional(pool)
            .await
    }

    /// Mark every unread alert read; returns how many rows changed.
    pub async fn mark_all_read(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE triggered_alerts SET is_read = TRUE WHERE NOT is_read")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn stats(pool: &PgPool) -> Result<AlertStats, sqlx::Error> {
        sqlx::query_as::<_, AlertStats>(
            "SELECT \
                (SELECT COUNT(*) FROM alert_rules) AS total_rules, \
                (SELECT COUNT(*) FROM alert_rules WHERE is_active) AS active_rules, \
                COUNT(*)::BIGINT AS total_triggered, \
                COUNT(*) FILTER (WHERE NOT is_read)::BIGINT AS unread, \
                COUNT(*) FILTER (WHERE NOT is_acknowledged)::BIGINT AS unacknowledged \
             FROM triggered_alerts",
        )
        .fetch_one(pool)
        .await
    }
}
