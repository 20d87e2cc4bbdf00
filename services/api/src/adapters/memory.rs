//! services/api/src/adapters/memory.rs
//!
//! A process-local backend implementing both the `AuthService` and
//! `DatabaseService` ports. Used for local development without a Supabase
//! project and as the test double for handler tests.
//!
//! Mirrors the hosted backend where handlers can observe it: generated ids,
//! newest-first listing, cascade on study-set delete, foreign-key checks on
//! flashcard inserts, and zero-row updates that succeed. Writes to a table can
//! be made to fail so partial-failure paths are reachable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flipwise_core::domain::{
    AuthSession, AuthUser, Flashcard, FlashcardUpdate, NewFlashcard, Profile, StudySession,
    StudySet, StudySetDraft,
};
use flipwise_core::ports::{AuthService, DatabaseService, PortError, PortResult, Table};
use std::collections::HashSet;
use tokio::sync::Mutex;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;
const TOKEN_TTL_SECS: i64 = 3600;

struct StoredUser {
    id: String,
    email: String,
    password: String,
}

#[derive(Default)]
struct Store {
    users: Vec<StoredUser>,
    tokens: HashSet<String>,
    profiles: Vec<Profile>,
    study_sets: Vec<StudySet>,
    flashcards: Vec<Flashcard>,
    study_sessions: Vec<StudySession>,
    failing: HashSet<Table>,
}

impl Store {
    fn check_writable(&self, table: Table) -> PortResult<()> {
        if self.failing.contains(&table) {
            return Err(PortError::Unexpected(format!(
                "simulated failure writing to {}",
                table
            )));
        }
        Ok(())
    }

    fn issue_session(&mut self, user: AuthUser) -> AuthSession {
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone());
        AuthSession {
            user,
            access_token: Some(token),
            refresh_token: Some(Uuid::new_v4().to_string()),
            token_type: Some("bearer".to_string()),
            expires_in: Some(TOKEN_TTL_SECS),
        }
    }
}

/// The in-memory backend. Cheap to construct; share it behind an `Arc`.
#[derive(Default)]
pub struct InMemoryBackend {
    store: Mutex<Store>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent insert, update and delete on `table` fail.
    pub async fn fail_writes_to(&self, table: Table) {
        self.store.lock().await.failing.insert(table);
    }

    pub async fn clear_failures(&self) {
        self.store.lock().await.failing.clear();
    }

    /// Whether `token` belongs to a session that has not been signed out.
    pub async fn is_token_active(&self, token: &str) -> bool {
        self.store.lock().await.tokens.contains(token)
    }

    /// Looks up a study session by id. Sessions have no read endpoint, so
    /// this exists for callers that hold the backend directly.
    pub async fn study_session(&self, session_id: &str) -> Option<StudySession> {
        self.store
            .lock()
            .await
            .study_sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for InMemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> PortResult<AuthSession> {
        let mut store = self.store.lock().await;
        let user = store
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email) && u.password == password)
            .map(|u| AuthUser {
                id: u.id.clone(),
                email: Some(u.email.clone()),
            })
            .ok_or_else(|| PortError::Rejected("Invalid login credentials".to_string()))?;
        Ok(store.issue_session(user))
    }

    async fn sign_up(&self, email: &str, password: &str) -> PortResult<AuthSession> {
        let email = email.trim();
        if email.split_once('@').map_or(true, |(local, domain)| local.is_empty() || domain.is_empty()) {
            return Err(PortError::Rejected(
                "Unable to validate email address: invalid format".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PortError::Rejected(format!(
                "Password should be at least {} characters.",
                MIN_PASSWORD_LEN
            )));
        }

        let mut store = self.store.lock().await;
        if store.users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(PortError::Rejected("User already registered".to_string()));
        }
        let user = StoredUser {
            id: new_id(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let auth_user = AuthUser {
            id: user.id.clone(),
            email: Some(user.email.clone()),
        };
        store.users.push(user);
        Ok(store.issue_session(auth_user))
    }

    async fn sign_out(&self, access_token: Option<&str>) -> PortResult<()> {
        if let Some(token) = access_token {
            self.store.lock().await.tokens.remove(token);
        }
        Ok(())
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for InMemoryBackend {
    async fn get_profile(&self, user_id: &str) -> PortResult<Profile> {
        let store = self.store.lock().await;
        store
            .profiles
            .iter()
            .find(|p| p.id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("profiles row {} not found", user_id)))
    }

    async fn create_profile(&self, user_id: &str, username: &str) -> PortResult<Profile> {
        let mut store = self.store.lock().await;
        store.check_writable(Table::Profiles)?;
        if store.profiles.iter().any(|p| p.id == user_id) {
            return Err(PortError::Rejected(
                "duplicate key value violates unique constraint \"profiles_pkey\"".to_string(),
            ));
        }
        let profile = Profile {
            id: user_id.to_string(),
            username: username.to_string(),
            updated_at: Some(Utc::now()),
        };
        store.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn update_profile_username(
        &self,
        user_id: &str,
        username: &str,
        updated_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut store = self.store.lock().await;
        store.check_writable(Table::Profiles)?;
        if let Some(profile) = store.profiles.iter_mut().find(|p| p.id == user_id) {
            profile.username = username.to_string();
            profile.updated_at = Some(updated_at);
        }
        Ok(())
    }

    async fn list_study_sets(&self, owner: Option<&str>) -> PortResult<Vec<StudySet>> {
        let store = self.store.lock().await;
        // Reverse insertion order first so equal timestamps still list newest first.
        let mut sets: Vec<StudySet> = store
            .study_sets
            .iter()
            .rev()
            .filter(|s| owner.map_or(true, |o| s.user_id == o))
            .cloned()
            .collect();
        sets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sets)
    }

    async fn get_study_set(&self, set_id: &str) -> PortResult<StudySet> {
        let store = self.store.lock().await;
        store
            .study_sets
            .iter()
            .find(|s| s.id == set_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("study_sets row {} not found", set_id)))
    }

    async fn get_study_set_owner(&self, set_id: &str) -> PortResult<String> {
        self.get_study_set(set_id).await.map(|s| s.user_id)
    }

    async fn create_study_set(&self, user_id: &str, draft: &StudySetDraft) -> PortResult<StudySet> {
        let mut store = self.store.lock().await;
        store.check_writable(Table::StudySets)?;
        let now = Utc::now();
        let set = StudySet {
            id: new_id(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        store.study_sets.push(set.clone());
        Ok(set)
    }

    async fn update_study_set(
        &self,
        set_id: &str,
        draft: &StudySetDraft,
        updated_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut store = self.store.lock().await;
        store.check_writable(Table::StudySets)?;
        if let Some(set) = store.study_sets.iter_mut().find(|s| s.id == set_id) {
            set.title = draft.title.clone();
            set.description = draft.description.clone();
            set.updated_at = updated_at;
        }
        Ok(())
    }

    async fn delete_study_set(&self, set_id: &str) -> PortResult<()> {
        let mut store = self.store.lock().await;
        store.check_writable(Table::StudySets)?;
        store.study_sets.retain(|s| s.id != set_id);
        store.flashcards.retain(|c| c.study_set_id != set_id);
        Ok(())
    }

    async fn list_flashcards(&self, set_id: &str) -> PortResult<Vec<Flashcard>> {
        let store = self.store.lock().await;
        Ok(store
            .flashcards
            .iter()
            .filter(|c| c.study_set_id == set_id)
            .cloned()
            .collect())
    }

    async fn list_flashcard_ids(&self, set_id: &str) -> PortResult<Vec<String>> {
        let cards = self.list_flashcards(set_id).await?;
        Ok(cards.into_iter().map(|c| c.id).collect())
    }

    async fn insert_flashcards(
        &self,
        set_id: &str,
        cards: &[NewFlashcard],
    ) -> PortResult<Vec<Flashcard>> {
        let mut store = self.store.lock().await;
        store.check_writable(Table::Flashcards)?;
        if !store.study_sets.iter().any(|s| s.id == set_id) {
            return Err(PortError::Rejected(
                "insert or update on table \"flashcards\" violates foreign key constraint"
                    .to_string(),
            ));
        }
        let now = Utc::now();
        let inserted: Vec<Flashcard> = cards
            .iter()
            .map(|card| Flashcard {
                id: new_id(),
                study_set_id: set_id.to_string(),
                front_text: card.front_text.clone(),
                back_text: card.back_text.clone(),
                updated_at: Some(now),
            })
            .collect();
        store.flashcards.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn update_flashcard(
        &self,
        update: &FlashcardUpdate,
        updated_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut store = self.store.lock().await;
        store.check_writable(Table::Flashcards)?;
        if let Some(card) = store.flashcards.iter_mut().find(|c| c.id == update.id) {
            card.front_text = update.front_text.clone();
            card.back_text = update.back_text.clone();
            card.updated_at = Some(updated_at);
        }
        Ok(())
    }

    async fn delete_flashcards(&self, ids: &[String]) -> PortResult<()> {
        let mut store = self.store.lock().await;
        store.check_writable(Table::Flashcards)?;
        store.flashcards.retain(|c| !ids.contains(&c.id));
        Ok(())
    }

    async fn create_study_session(
        &self,
        user_id: &str,
        study_set_id: &str,
        mode: &str,
    ) -> PortResult<StudySession> {
        let mut store = self.store.lock().await;
        store.check_writable(Table::StudySessions)?;
        let session = StudySession {
            id: new_id(),
            user_id: user_id.to_string(),
            study_set_id: study_set_id.to_string(),
            mode: mode.to_string(),
            created_at: Utc::now(),
            completed_at: None,
        };
        store.study_sessions.push(session.clone());
        Ok(session)
    }

    async fn complete_study_session(
        &self,
        session_id: &str,
        completed_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut store = self.store.lock().await;
        store.check_writable(Table::StudySessions)?;
        if let Some(session) = store.study_sessions.iter_mut().find(|s| s.id == session_id) {
            session.completed_at = Some(completed_at);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let backend = InMemoryBackend::new();
        let created = backend.sign_up("a@b.com", "secret1").await.unwrap();
        let session = backend.sign_in("A@b.com", "secret1").await.unwrap();

        assert_eq!(created.user.id, session.user.id);
        assert!(session.access_token.is_some());
    }

    #[tokio::test]
    async fn sign_up_rejects_duplicates_and_short_passwords() {
        let backend = InMemoryBackend::new();
        backend.sign_up("a@b.com", "secret1").await.unwrap();

        assert!(matches!(
            backend.sign_up("a@b.com", "secret2").await,
            Err(PortError::Rejected(_))
        ));
        assert!(matches!(
            backend.sign_up("c@d.com", "123").await,
            Err(PortError::Rejected(_))
        ));
        assert!(matches!(
            backend.sign_up("not-an-email", "secret1").await,
            Err(PortError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn sign_out_revokes_the_token() {
        let backend = InMemoryBackend::new();
        let session = backend.sign_up("a@b.com", "secret1").await.unwrap();
        let token = session.access_token.unwrap();

        assert!(backend.is_token_active(&token).await);
        backend.sign_out(Some(&token)).await.unwrap();
        assert!(!backend.is_token_active(&token).await);
    }

    #[tokio::test]
    async fn deleting_a_set_cascades_to_its_cards() {
        let backend = InMemoryBackend::new();
        let draft = StudySetDraft {
            title: "Capitals".into(),
            description: None,
        };
        let set = backend.create_study_set("u1", &draft).await.unwrap();
        let card = NewFlashcard {
            front_text: "France".into(),
            back_text: "Paris".into(),
        };
        backend.insert_flashcards(&set.id, &[card]).await.unwrap();

        backend.delete_study_set(&set.id).await.unwrap();

        assert!(backend.list_flashcards(&set.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cards_need_an_existing_set() {
        let backend = InMemoryBackend::new();
        let card = NewFlashcard {
            front_text: "q".into(),
            back_text: "a".into(),
        };
        assert!(matches!(
            backend.insert_flashcards("missing", &[card]).await,
            Err(PortError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn injected_failures_block_writes_only() {
        let backend = InMemoryBackend::new();
        backend.fail_writes_to(Table::StudySets).await;
        let draft = StudySetDraft {
            title: "t".into(),
            description: None,
        };

        assert!(backend.create_study_set("u1", &draft).await.is_err());
        assert!(backend.list_study_sets(None).await.unwrap().is_empty());

        backend.clear_failures().await;
        assert!(backend.create_study_set("u1", &draft).await.is_ok());
    }
}
