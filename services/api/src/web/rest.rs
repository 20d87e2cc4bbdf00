//! services/api/src/web/rest.rs
//!
//! The router for the REST API, the shared response shapes, the health check,
//! and the master definition for the OpenAPI specification.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsOrigins;
use crate::error::ApiError;
use crate::web::{auth, profile, state::AppState, study_sessions, study_sets};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login_handler,
        auth::register_handler,
        auth::logout_handler,
        profile::get_profile_handler,
        profile::update_profile_handler,
        study_sets::list_study_sets_handler,
        study_sets::get_study_set_handler,
        study_sets::create_study_set_handler,
        study_sets::update_study_set_handler,
        study_sets::delete_study_set_handler,
        study_sessions::create_study_session_handler,
        study_sessions::complete_study_session_handler,
        health_handler,
    ),
    components(
        schemas(
            auth::LoginRequest,
            auth::RegisterRequest,
            auth::SessionPayload,
            auth::AuthUserResponse,
            auth::SessionTokens,
            profile::ProfileResponse,
            profile::UpdateProfileParams,
            study_sets::StudySetResponse,
            study_sets::StudySetDetail,
            study_sets::FlashcardResponse,
            study_sets::StudySetPayload,
            study_sets::FlashcardPayload,
            study_sessions::StudySessionResponse,
            study_sessions::CreateStudySessionParams,
            SuccessResponse,
            HealthResponse,
            ErrorBody,
        )
    ),
    tags(
        (name = "FlipWise API", description = "Study sets, flashcards and study sessions.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Response Structs
//=========================================================================================

/// `{"success": true}`, with the affected id when there is one.
#[derive(Serialize, Deserialize, ToSchema, Debug, PartialEq)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            id: None,
        }
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            success: true,
            id: Some(id.into()),
        }
    }
}

/// The body of every error response.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

//=========================================================================================
// Health
//=========================================================================================

/// GET /api/health - Liveness check
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

//=========================================================================================
// Router
//=========================================================================================

/// Builds the full application: every `/api` route plus the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route(
            "/profile/{user_id}",
            get(profile::get_profile_handler).put(profile::update_profile_handler),
        )
        .route(
            "/study-sets",
            get(study_sets::list_study_sets_handler).post(study_sets::create_study_set_handler),
        )
        .route(
            "/study-sets/{set_id}",
            get(study_sets::get_study_set_handler)
                .put(study_sets::update_study_set_handler)
                .delete(study_sets::delete_study_set_handler),
        )
        .route(
            "/study-sessions",
            post(study_sessions::create_study_session_handler),
        )
        .route(
            "/study-sessions/{session_id}/complete",
            put(study_sessions::complete_study_session_handler),
        )
        .route("/health", get(health_handler))
        .with_state(app_state);

    Router::new()
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

/// CORS for the web client, which sends every request with credentials.
///
/// Browsers refuse a credentialed response carrying `Access-Control-Allow-Origin: *`,
/// so "any origin" echoes the caller's `Origin` back instead.
pub fn cors_layer(origins: &CorsOrigins) -> Result<CorsLayer, ApiError> {
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::mirror_request(),
        CorsOrigins::List(list) => {
            let values = list
                .iter()
                .map(|o| {
                    o.parse::<HeaderValue>().map_err(|e| {
                        ApiError::Internal(format!("Invalid CORS origin '{}': {}", o, e))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            AllowOrigin::list(values)
        }
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]))
}
