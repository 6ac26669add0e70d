//! Caller-identity extractor for Axum handlers.
//!
//! Identity arrives as a numeric `x-user-id` header set by the fronting
//! gateway; this service trusts it and only records it (upload ownership,
//! alert acknowledgement, search history). There is no session handling
//! here.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use vigil_core::error::CoreError;
use vigil_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// Caller identity extracted from the `x-user-id` header.
///
/// As a required extractor the header must be present and numeric; as
/// `Option<AuthUser>` an absent header yields `None`, but a malformed
/// one is still rejected.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// The caller's internal database id.
    pub user_id: DbId,
}

fn parse_user_header(parts: &Parts) -> Result<Option<AuthUser>, AppError> {
    let Some(value) = parts.headers.get("x-user-id") else {
        return Ok(None);
    };
    let user_id = value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<DbId>().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "x-user-id header must be a numeric user id".into(),
            ))
        })?;
    Ok(Some(AuthUser { user_id }))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parse_user_header(parts)?.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing x-user-id header".into()))
        })
    }
}

impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        parse_user_header(parts)
    }
}
