//! services/api/src/web/profile.rs
//!
//! Profile endpoints.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use flipwise_core::domain::Profile;
use flipwise_core::ports::PortError;
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
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            username: p.username,
            updated_at: p.updated_at,
        }
    }
}

/// Accepted as a query parameter or as a JSON body.
#[derive(Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UpdateProfileParams {
    pub username: String,
}

/// GET /api/profile/{user_id}
#[utoipa::path(
    get,
    path = "/api/profile/{user_id}",
    params(("user_id" = String, Path, description = "The user's id.")),
    responses(
        (status = 200, description = "Profile found", body = ProfileResponse),
        (status = 404, description = "Profile not found", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileResponse>, HttpError> {
    match state.db.get_profile(&user_id).await {
        Ok(profile) => Ok(Json(profile.into())),
        Err(PortError::NotFound(_)) => Err(HttpError::NotFound("Profile not found".to_string())),
        Err(e) => {
            error!("Failed to load profile {}: {}", user_id, e);
            Err(HttpError::internal(e))
        }
    }
}

/// PUT /api/profile/{user_id}
#[utoipa::path(
    put,
    path = "/api/profile/{user_id}",
    params(
        ("user_id" = String, Path, description = "The user's id."),
        UpdateProfileParams
    ),
    request_body(content = UpdateProfileParams, description = "Alternative to the query parameter."),
    responses(
        (status = 200, description = "Profile updated", body = SuccessResponse),
        (status = 400, description = "Missing username", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<SuccessResponse>, HttpError> {
    let params: UpdateProfileParams = from_query_or_body(query, &body)?;

    state
        .db
        .update_profile_username(&user_id, &params.username, Utc::now())
        .await
        .map_err(|e| {
            error!("Failed to update profile {}: {}", user_id, e);
            HttpError::internal(e)
        })?;

    info!("Updated username for {}", user_id);
    Ok(Json(SuccessResponse::ok()))
}
