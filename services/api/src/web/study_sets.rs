//! services/api/src/web/study_sets.rs
//!
//! Study set endpoints. Mutations check ownership first, then write. None of
//! the multi-step writes are atomic: a failure part way through leaves the
//! earlier steps applied.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use flipwise_core::domain::{Flashcard, FlashcardInput, NewFlashcard, StudySet, StudySetDraft};
use flipwise_core::ports::PortError;
use flipwise_core::reconcile::reconcile_flashcards;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::error::HttpError;
use crate::web::rest::ErrorBody;
use crate::web::state::AppState;
use crate::web::SuccessResponse;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
pub struct StudySetResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StudySet> for StudySetResponse {
    fn from(s: StudySet) -> Self {
        Self {
            id: s.id,
            title: s.title,
            description: s.description,
            user_id: s.user_id,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct FlashcardResponse {
    pub id: String,
    pub study_set_id: String,
    pub front_text: String,
    pub back_text: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Flashcard> for FlashcardResponse {
    fn from(c: Flashcard) -> Self {
        Self {
            id: c.id,
            study_set_id: c.study_set_id,
            front_text: c.front_text,
            back_text: c.back_text,
            updated_at: c.updated_at,
        }
    }
}

/// A study set with all of its cards.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct StudySetDetail {
    #[serde(flatten)]
    pub study_set: StudySetResponse,
    pub flashcards: Vec<FlashcardResponse>,
}

/// A submitted card. `id` is present only for cards that already exist.
#[derive(Deserialize, ToSchema)]
pub struct FlashcardPayload {
    pub id: Option<String>,
    pub front_text: String,
    pub back_text: String,
}

#[derive(Deserialize, ToSchema)]
pub struct StudySetPayload {
    pub title: String,
    pub description: Option<String>,
    pub flashcards: Vec<FlashcardPayload>,
}

impl StudySetPayload {
    fn into_parts(self) -> (StudySetDraft, Vec<FlashcardInput>) {
        let draft = StudySetDraft {
            title: self.title,
            description: self.description,
        };
        let cards = self
            .flashcards
            .into_iter()
            .map(|c| FlashcardInput {
                id: c.id.filter(|id| !id.is_empty()),
                front_text: c.front_text,
                back_text: c.back_text,
            })
            .collect();
        (draft, cards)
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OwnerFilter {
    /// Only list sets owned by this user.
    pub user_id: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActingUser {
    /// The user performing the change.
    pub user_id: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Fails with 403 unless `user_id` owns `set_id`. A set that does not exist
/// has no owner, so it is rejected the same way.
async fn require_owner(
    state: &AppState,
    set_id: &str,
    user_id: &str,
    action: &str,
) -> Result<(), HttpError> {
    let forbidden = || {
        warn!("User {} may not {} study set {}", user_id, action, set_id);
        HttpError::Forbidden(format!(
            "You don't have permission to {} this study set",
            action
        ))
    };
    match state.db.get_study_set_owner(set_id).await {
        Ok(owner) if owner == user_id => Ok(()),
        Ok(_) | Err(PortError::NotFound(_)) => Err(forbidden()),
        Err(e) => {
            error!("Failed to check owner of study set {}: {}", set_id, e);
            Err(HttpError::internal(e))
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/study-sets - List study sets, newest first
#[utoipa::path(
    get,
    path = "/api/study-sets",
    params(OwnerFilter),
    responses(
        (status = 200, description = "Study sets", body = [StudySetResponse]),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn list_study_sets_handler(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<OwnerFilter>,
) -> Result<Json<Vec<StudySetResponse>>, HttpError> {
    let owner = filter.user_id.as_deref().filter(|u| !u.is_empty());
    let sets = state.db.list_study_sets(owner).await.map_err(|e| {
        error!("Failed to list study sets: {}", e);
        HttpError::internal(e)
    })?;
    Ok(Json(sets.into_iter().map(Into::into).collect()))
}

/// GET /api/study-sets/{set_id} - A study set and its flashcards
#[utoipa::path(
    get,
    path = "/api/study-sets/{set_id}",
    params(("set_id" = String, Path, description = "The study set id.")),
    responses(
        (status = 200, description = "Study set found", body = StudySetDetail),
        (status = 404, description = "Study set not found", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn get_study_set_handler(
    State(state): State<Arc<AppState>>,
    Path(set_id): Path<String>,
) -> Result<Json<StudySetDetail>, HttpError> {
    let study_set = match state.db.get_study_set(&set_id).await {
        Ok(set) => set,
        Err(PortError::NotFound(_)) => {
            return Err(HttpError::NotFound("Study set not found".to_string()))
        }
        Err(e) => {
            error!("Failed to load study set {}: {}", set_id, e);
            return Err(HttpError::internal(e));
        }
    };

    let flashcards = state.db.list_flashcards(&set_id).await.map_err(|e| {
        error!("Failed to load flashcards for {}: {}", set_id, e);
        HttpError::internal(e)
    })?;

    Ok(Json(StudySetDetail {
        study_set: study_set.into(),
        flashcards: flashcards.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/study-sets - Create a study set with its flashcards
///
/// Submitted card ids are ignored. If inserting the cards fails, the set
/// itself has already been created and is left without cards.
#[utoipa::path(
    post,
    path = "/api/study-sets",
    params(ActingUser),
    request_body = StudySetPayload,
    responses(
        (status = 200, description = "Study set created", body = StudySetResponse),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn create_study_set_handler(
    State(state): State<Arc<AppState>>,
    Query(actor): Query<ActingUser>,
    Json(payload): Json<StudySetPayload>,
) -> Result<Json<StudySetResponse>, HttpError> {
    let (draft, cards) = payload.into_parts();

    let study_set = state
        .db
        .create_study_set(&actor.user_id, &draft)
        .await
        .map_err(|e| {
            error!("Failed to create study set for {}: {}", actor.user_id, e);
            HttpError::internal(e)
        })?;

    let new_cards: Vec<NewFlashcard> = cards
        .into_iter()
        .map(|c| NewFlashcard {
            front_text: c.front_text,
            back_text: c.back_text,
        })
        .collect();
    if !new_cards.is_empty() {
        state
            .db
            .insert_flashcards(&study_set.id, &new_cards)
            .await
            .map_err(|e| {
                error!("Failed to add flashcards to new set {}: {}", study_set.id, e);
                HttpError::internal(e)
            })?;
    }

    info!(
        "Created study set {} with {} cards for {}",
        study_set.id,
        new_cards.len(),
        actor.user_id
    );
    Ok(Json(study_set.into()))
}

/// PUT /api/study-sets/{set_id} - Edit a study set and reconcile its cards
#[utoipa::path(
    put,
    path = "/api/study-sets/{set_id}",
    params(("set_id" = String, Path, description = "The study set id."), ActingUser),
    request_body = StudySetPayload,
    responses(
        (status = 200, description = "Study set updated", body = SuccessResponse),
        (status = 403, description = "Caller does not own the study set", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn update_study_set_handler(
    State(state): State<Arc<AppState>>,
    Path(set_id): Path<String>,
    Query(actor): Query<ActingUser>,
    Json(payload): Json<StudySetPayload>,
) -> Result<Json<SuccessResponse>, HttpError> {
    require_owner(&state, &set_id, &actor.user_id, "update").await?;

    let (draft, cards) = payload.into_parts();
    let now = Utc::now();

    state
        .db
        .update_study_set(&set_id, &draft, now)
        .await
        .map_err(|e| {
            error!("Failed to update study set {}: {}", set_id, e);
            HttpError::internal(e)
        })?;

    let summary = reconcile_flashcards(state.db.as_ref(), &set_id, cards, now)
        .await
        .map_err(|e| {
            error!("Failed to reconcile flashcards for {}: {}", set_id, e);
            HttpError::internal(e)
        })?;

    info!(
        "Updated study set {}: {} deleted, {} updated, {} inserted",
        set_id, summary.deleted, summary.updated, summary.inserted
    );
    Ok(Json(SuccessResponse::with_id(set_id)))
}

/// DELETE /api/study-sets/{set_id} - Delete a study set
///
/// Its flashcards are removed by the backend's cascade.
#[utoipa::path(
    delete,
    path = "/api/study-sets/{set_id}",
    params(("set_id" = String, Path, description = "The study set id."), ActingUser),
    responses(
        (status = 200, description = "Study set deleted", body = SuccessResponse),
        (status = 403, description = "Caller does not own the study set", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn delete_study_set_handler(
    State(state): State<Arc<AppState>>,
    Path(set_id): Path<String>,
    Query(actor): Query<ActingUser>,
) -> Result<Json<SuccessResponse>, HttpError> {
    require_owner(&state, &set_id, &actor.user_id, "delete").await?;

    state.db.delete_study_set(&set_id).await.map_err(|e| {
        error!("Failed to delete study set {}: {}", set_id, e);
        HttpError::internal(e)
    })?;

    info!("Deleted study set {}", set_id);
    Ok(Json(SuccessResponse::ok()))
}
