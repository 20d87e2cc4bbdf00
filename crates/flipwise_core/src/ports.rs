//! crates/flipwise_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the hosted backend this API
//! delegates to. These traits form the boundary of the hexagonal architecture,
//! allowing the handlers to be independent of the concrete backend client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::{
    AuthSession, Flashcard, FlashcardUpdate, NewFlashcard, Profile, StudySession, StudySet,
    StudySetDraft,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// The message carries the backend's own wording so handlers can surface it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Unexpected(String),
}

impl PortError {
    /// The bare message, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            PortError::NotFound(m)
            | PortError::Unauthorized(m)
            | PortError::Rejected(m)
            | PortError::Unexpected(m) => m,
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Tables
//=========================================================================================

/// The tables owned by the hosted backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Profiles,
    StudySets,
    Flashcards,
    StudySessions,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::StudySets => "study_sets",
            Table::Flashcards => "flashcards",
            Table::StudySessions => "study_sessions",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues a session.
    async fn sign_in(&self, email: &str, password: &str) -> PortResult<AuthSession>;

    /// Creates a new auth user.
    async fn sign_up(&self, email: &str, password: &str) -> PortResult<AuthSession>;

    /// Revokes the session behind `access_token`, if one is given.
    async fn sign_out(&self, access_token: Option<&str>) -> PortResult<()>;
}

/// Table access for the four tables. Single-row lookups that match nothing
/// return `PortError::NotFound`; updates and deletes that match nothing succeed.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Profiles ---
    async fn get_profile(&self, user_id: &str) -> PortResult<Profile>;

    async fn create_profile(&self, user_id: &str, username: &str) -> PortResult<Profile>;

    async fn update_profile_username(
        &self,
        user_id: &str,
        username: &str,
        updated_at: DateTime<Utc>,
    ) -> PortResult<()>;

    // --- Study Sets ---
    /// Lists sets, newest `created_at` first, optionally filtered by owner.
    async fn list_study_sets(&self, owner: Option<&str>) -> PortResult<Vec<StudySet>>;

    async fn get_study_set(&self, set_id: &str) -> PortResult<StudySet>;

    async fn get_study_set_owner(&self, set_id: &str) -> PortResult<String>;

    async fn create_study_set(&self, user_id: &str, draft: &StudySetDraft) -> PortResult<StudySet>;

    async fn update_study_set(
        &self,
        set_id: &str,
        draft: &StudySetDraft,
        updated_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Deletes the set. Its flashcards are removed by the backend's cascade.
    async fn delete_study_set(&self, set_id: &str) -> PortResult<()>;

    // --- Flashcards ---
    async fn list_flashcards(&self, set_id: &str) -> PortResult<Vec<Flashcard>>;

    async fn list_flashcard_ids(&self, set_id: &str) -> PortResult<Vec<String>>;

    async fn insert_flashcards(
        &self,
        set_id: &str,
        cards: &[NewFlashcard],
    ) -> PortResult<Vec<Flashcard>>;

    async fn update_flashcard(
        &self,
        update: &FlashcardUpdate,
        updated_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn delete_flashcards(&self, ids: &[String]) -> PortResult<()>;

    // --- Study Sessions ---
    async fn create_study_session(
        &self,
        user_id: &str,
        study_set_id: &str,
        mode: &str,
    ) -> PortResult<StudySession>;

    async fn complete_study_session(
        &self,
        session_id: &str,
        completed_at: DateTime<Utc>,
    ) -> PortResult<()>;
}
