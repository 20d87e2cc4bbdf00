//! services/api/src/web/study_sessions.rs
//!
//! Study session endpoints. A session starts with `completed_at` unset and is
//! completed by stamping the current time. Completing again overwrites the
//! stamp with the later time.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use flipwise_core::domain::StudySession;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

use crate::error::HttpError;
use crate::web::rest::ErrorBody;
use crate::web::params::from_query_or_body;
use crate::web::state::AppState;
use crate::web::SuccessResponse;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct StudySessionResponse {
    pub id: String,
    pub user_id: String,
    pub study_set_id: String,
    pub mode: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<StudySession> for StudySessionResponse {
    fn from(s: StudySession) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            study_set_id: s.study_set_id,
            mode: s.mode,
            created_at: s.created_at,
            completed_at: s.completed_at,
        }
    }
}

/// Accepted as query parameters or as a JSON body.
#[derive(Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CreateStudySessionParams {
    pub user_id: String,
    pub study_set_id: String,
    /// The study mode, e.g. `flashcard` or `written`.
    pub mode: String,
}

/// POST /api/study-sessions - Start a study session
#[utoipa::path(
    post,
    path = "/api/study-sessions",
    params(CreateStudySessionParams),
    request_body(content = CreateStudySessionParams, description = "Alternative to the query parameters."),
    responses(
        (status = 200, description = "Session started", body = StudySessionResponse),
        (status = 400, description = "Missing parameters", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn create_study_session_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<StudySessionResponse>, HttpError> {
    let params: CreateStudySessionParams = from_query_or_body(query, &body)?;

    let session = state
        .db
        .create_study_session(&params.user_id, &params.study_set_id, &params.mode)
        .await
        .map_err(|e| {
            error!("Failed to start study session for {}: {}", params.user_id, e);
            HttpError::internal(e)
        })?;

    info!(
        "Started {} session {} on set {}",
        session.mode, session.id, session.study_set_id
    );
    Ok(Json(session.into()))
}

/// PUT /api/study-sessions/{session_id}/complete - Mark a session completed
#[utoipa::path(
    put,
    path = "/api/study-sessions/{session_id}/complete",
    params(("session_id" = String, Path, description = "The study session id.")),
    responses(
        (status = 200, description = "Session completed", body = SuccessResponse),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn complete_study_session_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SuccessResponse>, HttpError> {
    state
        .db
        .complete_study_session(&session_id, Utc::now())
        .await
        .map_err(|e| {
            error!("Failed to complete study session {}: {}", session_id, e);
            HttpError::internal(e)
        })?;

    info!("Completed study session {}", session_id);
    Ok(Json(SuccessResponse::ok()))
}
