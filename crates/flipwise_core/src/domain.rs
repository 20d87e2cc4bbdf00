//! crates/flipwise_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any storage backend or serialization format.
//! Ids are opaque strings issued by the hosted backend.

use chrono::{DateTime, Utc};

/// The user identity returned by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// The result of a successful sign-in or sign-up.
///
/// Sign-up may return a user without tokens when the backend requires email
/// confirmation first, so the token fields are optional.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
}

/// A user's public profile. One per user, created at registration.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A titled collection of flashcards owned by one user.
#[derive(Debug, Clone)]
pub struct StudySet {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields a caller supplies when creating or editing a study set.
#[derive(Debug, Clone)]
pub struct StudySetDraft {
    pub title: String,
    pub description: Option<String>,
}

/// A stored flashcard.
#[derive(Debug, Clone)]
pub struct Flashcard {
    pub id: String,
    pub study_set_id: String,
    pub front_text: String,
    pub back_text: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A flashcard as submitted by a client.
///
/// `id` is present only when the card is believed to already exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardInput {
    pub id: Option<String>,
    pub front_text: String,
    pub back_text: String,
}

/// Card text for a row that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFlashcard {
    pub front_text: String,
    pub back_text: String,
}

/// New text for an existing card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardUpdate {
    pub id: String,
    pub front_text: String,
    pub back_text: String,
}

/// Records one study attempt. `completed_at` is `None` while in progress.
#[derive(Debug, Clone)]
pub struct StudySession {
    pub id: String,
    pub user_id: String,
    pub study_set_id: String,
    pub mode: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
