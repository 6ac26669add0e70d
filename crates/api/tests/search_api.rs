//! Integration tests for natural-language and structured search plus
//! the search history trail.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, get, post_json, post_json_as, seed_detection, seed_video};
use serde_json::json;
use sqlx::PgPool;
use vigil_core::types::DbId;

/// Three detections in one video:
/// - frame 15: female/red, aggregate 0.85
/// - frame 30: male/blue, aggregate 0.90
/// - frame 45: female/red, aggregate 0.50 (below the default cutoff)
async fn seed_corpus(pool: &PgPool) -> DbId {
    let video = seed_video(pool).await;
    seed_detection(pool, video.id, 15, Some("female"), Some(0.9), Some("red"), Some(0.8)).await;
    seed_detection(pool, video.id, 30, Some("male"), Some(0.95), Some("blue"), Some(0.85)).await;
    seed_detection(pool, video.id, 45, Some("female"), Some(0.5), Some("red"), Some(0.5)).await;
    video.id
}

// -- structured search -------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn advanced_search_predicates_are_conjunctive(pool: PgPool) {
    seed_corpus(&pool).await;

    let body = json!({ "gender": "female", "upper_color": "red" });
    let response = post_json(common::build_test_app(pool), "/api/v1/search/advanced", &body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    // The low-confidence female/red hit is excluded by the default 0.6 cutoff.
    assert_eq!(json["total"], 1);
    assert_eq!(json["data"][0]["frame_number"], 15);
    assert_eq!(json["data"][0]["aggregate_confidence"], 0.85);
    assert_eq!(json["data"][0]["video_filename"], "lobby_cam.mp4");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn default_confidence_cutoff_always_applies(pool: PgPool) {
    seed_corpus(&pool).await;

    let response = post_json(common::build_test_app(pool), "/api/v1/search/advanced", &json!({})).await;
    let json = body_json(response).await;
    assert_eq!(json["total"], 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn total_is_counted_before_pagination(pool: PgPool) {
    seed_corpus(&pool).await;

    let body = json!({ "limit": 1 });
    let response = post_json(common::build_test_app(pool), "/api/v1/search/advanced", &body).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["total"], 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn out_of_range_confidence_is_rejected(pool: PgPool) {
    let body = json!({ "min_confidence": 2.0 });
    let response = post_json(common::build_test_app(pool), "/api/v1/search/advanced", &body).await;
    common::assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}

// -- natural-language search -------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn nl_query_is_parsed_and_executed(pool: PgPool) {
    seed_corpus(&pool).await;

    let body = json!({ "query": "female wearing red shirt" });
    let response = post_json(common::build_test_app(pool), "/api/v1/search/query", &body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["parsed"]["gender"], "female");
    assert_eq!(json["parsed"]["upper_color"], "red");
    assert_eq!(json["parsed"]["lower_color"], serde_json::Value::Null);
    assert_eq!(json["total"], 1);
    assert_eq!(json["data"][0]["frame_number"], 15);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn nl_query_without_extractable_predicates_searches_everything(pool: PgPool) {
    seed_corpus(&pool).await;

    let body = json!({ "query": "anyone suspicious in the lobby" });
    let response = post_json(common::build_test_app(pool), "/api/v1/search/query", &body).await;
    let json = body_json(response).await;
    // Unmatched dimensions are left unset, never guessed.
    assert_eq!(json["total"], 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn empty_query_text_is_rejected(pool: PgPool) {
    let body = json!({ "query": "   " });
    let response = post_json(common::build_test_app(pool), "/api/v1/search/query", &body).await;
    common::assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}

// -- history -----------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn executed_queries_are_recorded(pool: PgPool) {
    seed_corpus(&pool).await;

    let body = json!({ "query": "male wearing blue jacket" });
    post_json_as(common::build_test_app(pool.clone()), "/api/v1/search/query", &body, 7).await;

    let response = get(common::build_test_app(pool), "/api/v1/search/history").await;
    let json = body_json(response).await;
    let entries = json["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["query_text"], "male wearing blue jacket");
    assert_eq!(entries[0]["user_id"], 7);
    assert_eq!(entries[0]["result_count"], 1);
    assert_eq!(entries[0]["parsed_attributes"]["gender"], "male");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn history_delete_and_clear(pool: PgPool) {
    seed_corpus(&pool).await;
    let app = common::build_test_app(pool.clone());
    post_json(app, "/api/v1/search/query", &json!({ "query": "female" })).await;
    post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/search/advanced",
        &json!({ "gender": "male" }),
    )
    .await;

    let response = get(common::build_test_app(pool.clone()), "/api/v1/search/history").await;
    let json = body_json(response).await;
    let entries = json["data"].as_array().unwrap().clone();
    assert_eq!(entries.len(), 2);

    let response = delete(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/search/history/{}", entries[0]["id"]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = delete(common::build_test_app(pool.clone()), "/api/v1/search/history").await;
    let json = body_json(response).await;
    assert_eq!(json["deleted"], 1);

    let response = get(common::build_test_app(pool), "/api/v1/search/history").await;
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}
