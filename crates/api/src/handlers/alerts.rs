//! Handlers for alert rules and triggered alerts.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use vigil_core::alert::{validate_rule, RulePredicates};
use vigil_core::error::CoreError;
use vigil_core::search::{clamp_limit, clamp_offset, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
use vigil_core::types::DbId;
use vigil_db::models::alert::{
    AlertRule, AlertStats, CreateAlertRule, TriggeredAlert, UpdateAlertRule,
};
use vigil_db::repositories::alert_repo::AlertRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

fn rule_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "AlertRule",
        id,
    })
}

fn alert_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Alert",
        id,
    })
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RuleListParams {
    #[serde(default)]
    pub active_only: bool,
}

/// GET /api/v1/alerts/rules
pub async fn list_rules(
    State(state): State<AppState>,
    Query(params): Query<RuleListParams>,
) -> AppResult<Json<DataResponse<Vec<AlertRule>>>> {
    let rules = AlertRepo::list_rules(&state.pool, params.active_only).await?;
    Ok(Json(DataResponse { data: rules }))
}

/// POST /api/v1/alerts/rules
///
/// A rule must carry at least one attribute predicate and a threshold
/// within [0, 1]; unfiltered rules would fire on every detection.
pub async fn create_rule(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(rule): Json<CreateAlertRule>,
) -> AppResult<(StatusCode, Json<AlertRule>)> {
    let predicates = RulePredicates {
        gender: rule.gender.clone(),
        upper_color: rule.upper_color.clone(),
        lower_color: rule.lower_color.clone(),
        min_confidence: rule.min_confidence,
    };
    validate_rule(&rule.name, &predicates)?;

    let created = AlertRepo::insert_rule(&state.pool, user.map(|u| u.user_id), &rule).await?;
    tracing::info!(rule_id = created.id, name = %created.name, "Alert rule created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/alerts/rules/{id}
pub async fn get_rule(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<AlertRule>> {
    let rule = AlertRepo::get_rule(&state.pool, id)
        .await?
        .ok_or_else(|| rule_not_found(id))?;
    Ok(Json(rule))
}

/// PUT /api/v1/alerts/rules/{id}
///
/// Patch semantics: absent fields keep their current value. The merged
/// rule is re-validated so a patch can never leave a rule predicate-free
/// or out of range.
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(update): Json<UpdateAlertRule>,
) -> AppResult<Json<AlertRule>> {
    let existing = AlertRepo::get_rule(&state.pool, id)
        .await?
        .ok_or_else(|| rule_not_found(id))?;

    let merged_name = update.name.clone().unwrap_or_else(|| existing.name.clone());
    let merged = RulePredicates {
        gender: update.gender.clone().or(existing.gender),
        upper_color: update.upper_color.clone().or(existing.upper_color),
        lower_color: update.lower_color.clone().or(existing.lower_color),
        min_confidence: update.min_confidence.unwrap_or(existing.min_confidence),
    };
    validate_rule(&merged_name, &merged)?;

    let rule = AlertRepo::update_rule(&state.pool, id, &update)
        .await?
        .ok_or_else(|| rule_not_found(id))?;
    Ok(Json(rule))
}

/// DELETE /api/v1/alerts/rules/{id}
///
/// Removes the rule; its triggered alerts cascade at the schema level.
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !AlertRepo::delete_rule(&state.pool, id).await? {
        return Err(rule_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Triggered alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TriggeredListParams {
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default)]
    pub unacknowledged_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/alerts
pub async fn list_triggered(
    State(state): State<AppState>,
    Query(params): Query<TriggeredListParams>,
) -> AppResult<Json<DataResponse<Vec<TriggeredAlert>>>> {
    let limit = clamp_limit(params.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
    let offset = clamp_offset(params.offset);
    let alerts = AlertRepo::list_triggered(
        &state.pool,
        params.unread_only,
        params.unacknowledged_only,
        limit,
        offset,
    )
    .await?;
    Ok(Json(DataResponse { data: alerts }))
}

/// GET /api/v1/alerts/stats
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<AlertStats>> {
    let stats = AlertRepo::stats(&state.pool).await?;
    Ok(Json(stats))
}

/// POST /api/v1/alerts/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<TriggeredAlert>> {
    let alert = AlertRepo::mark_read(&state.pool, id)
        .await?
        .ok_or_else(|| alert_not_found(id))?;
    Ok(Json(alert))
}

/// POST /api/v1/alerts/{id}/acknowledge
///
/// Requires caller identity: the first acknowledger and timestamp are
/// recorded once and never overwritten by later acknowledgements.
pub async fn acknowledge(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<TriggeredAlert>> {
    let alert = AlertRepo::acknowledge(&state.pool, id, user.user_id)
        .await?
        .ok_or_else(|| alert_not_found(id))?;
    Ok(Json(alert))
}

/// POST /api/v1/alerts/read-all
pub async fn read_all(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let updated = AlertRepo::mark_all_read(&state.pool).await?;
    Ok(Json(json!({ "updated": updated })))
}
