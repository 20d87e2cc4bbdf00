//! services/api/src/adapters/db.rs
//!
//! This module contains the table adapter, the concrete implementation of the
//! `DatabaseService` port from the `core` crate. It talks to the Supabase
//! PostgREST endpoint; row-level storage, defaults and cascades live there.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flipwise_core::domain::{
    Flashcard, FlashcardUpdate, NewFlashcard, Profile, StudySession, StudySet, StudySetDraft,
};
use flipwise_core::ports::{DatabaseService, PortError, PortResult, Table};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::supabase::SupabaseClient;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A table adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct SupabaseDbAdapter {
    client: SupabaseClient,
}

impl SupabaseDbAdapter {
    /// Creates a new `SupabaseDbAdapter`.
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn table(&self, method: Method, table: Table) -> RequestBuilder {
        self.client
            .request(method, &self.client.table_url(table), None)
    }

    /// `select=<columns>` plus the given filters.
    async fn select<T: DeserializeOwned>(
        &self,
        table: Table,
        columns: &str,
        filters: &[(&str, String)],
    ) -> PortResult<Vec<T>> {
        let req = self
            .table(Method::GET, table)
            .query(&[("select", columns)])
            .query(filters);
        self.client.send_json(req).await
    }

    /// Fetches at most one row, `NotFound` when there is none.
    ///
    /// Row ids are uuid columns; PostgREST answers a malformed one with a 400,
    /// so such ids are reported as missing without a round trip.
    async fn select_single<T: DeserializeOwned>(
        &self,
        table: Table,
        columns: &str,
        id: &str,
    ) -> PortResult<T> {
        if Uuid::parse_str(id).is_err() {
            return Err(PortError::NotFound(format!("{} row {} not found", table, id)));
        }
        let rows: Vec<T> = self
            .select(table, columns, &[("id", eq(id)), ("limit", "1".to_string())])
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| PortError::NotFound(format!("{} row {} not found", table, id)))
    }

    async fn insert<T: DeserializeOwned>(
        &self,
        table: Table,
        body: serde_json::Value,
    ) -> PortResult<Vec<T>> {
        let req = self
            .table(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&body);
        self.client.send_json(req).await
    }

    async fn update_by_id(&self, table: Table, id: &str, body: serde_json::Value) -> PortResult<()> {
        let req = self
            .table(Method::PATCH, table)
            .query(&[("id", eq(id))])
            .header("Prefer", "return=minimal")
            .json(&body);
        self.client.send(req).await
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

fn in_list(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

fn first<T>(rows: Vec<T>, table: Table) -> PortResult<T> {
    rows.into_iter()
        .next()
        .ok_or_else(|| PortError::Unexpected(format!("Insert into {} returned no rows", table)))
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct ProfileRecord {
    id: String,
    username: String,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}
impl ProfileRecord {
    fn to_domain(self) -> Profile {
        Profile {
            id: self.id,
            username: self.username,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Deserialize)]
struct StudySetRecord {
    id: String,
    title: String,
    description: Option<String>,
    user_id: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}
impl StudySetRecord {
    fn to_domain(self) -> StudySet {
        StudySet {
            id: self.id,
            title: self.title,
            description: self.description,
            user_id: self.user_id,
            updated_at: self.updated_at.unwrap_or(self.created_at),
            created_at: self.created_at,
        }
    }
}

#[derive(Deserialize)]
struct OwnerRecord {
    user_id: String,
}

#[derive(Deserialize)]
struct IdRecord {
    id: String,
}

#[derive(Deserialize)]
struct FlashcardRecord {
    id: String,
    study_set_id: String,
    front_text: String,
    back_text: String,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}
impl FlashcardRecord {
    fn to_domain(self) -> Flashcard {
        Flashcard {
            id: self.id,
            study_set_id: self.study_set_id,
            front_text: self.front_text,
            back_text: self.back_text,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Deserialize)]
struct StudySessionRecord {
    id: String,
    user_id: String,
    study_set_id: String,
    mode: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}
impl StudySessionRecord {
    fn to_domain(self) -> StudySession {
        StudySession {
            id: self.id,
            user_id: self.user_id,
            study_set_id: self.study_set_id,
            mode: self.mode,
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for SupabaseDbAdapter {
    async fn get_profile(&self, user_id: &str) -> PortResult<Profile> {
        let record: ProfileRecord = self.select_single(Table::Profiles, "*", user_id).await?;
        Ok(record.to_domain())
    }

    async fn create_profile(&self, user_id: &str, username: &str) -> PortResult<Profile> {
        let rows: Vec<ProfileRecord> = self
            .insert(Table::Profiles, json!({ "id": user_id, "username": username }))
            .await?;
        Ok(first(rows, Table::Profiles)?.to_domain())
    }

    async fn update_profile_username(
        &self,
        user_id: &str,
        username: &str,
        updated_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.update_by_id(
            Table::Profiles,
            user_id,
            json!({ "username": username, "updated_at": updated_at }),
        )
        .await
    }

    async fn list_study_sets(&self, owner: Option<&str>) -> PortResult<Vec<StudySet>> {
        let mut filters = vec![("order", "created_at.desc".to_string())];
        if let Some(owner) = owner {
            filters.push(("user_id", eq(owner)));
        }
        let records: Vec<StudySetRecord> =
            self.select(Table::StudySets, "*", &filters).await?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_study_set(&self, set_id: &str) -> PortResult<StudySet> {
        let record: StudySetRecord = self.select_single(Table::StudySets, "*", set_id).await?;
        Ok(record.to_domain())
    }

    async fn get_study_set_owner(&self, set_id: &str) -> PortResult<String> {
        let record: OwnerRecord = self
            .select_single(Table::StudySets, "user_id", set_id)
            .await?;
        Ok(record.user_id)
    }

    async fn create_study_set(&self, user_id: &str, draft: &StudySetDraft) -> PortResult<StudySet> {
        let rows: Vec<StudySetRecord> = self
            .insert(
                Table::StudySets,
                json!({
                    "title": draft.title,
                    "description": draft.description,
                    "user_id": user_id,
                }),
            )
            .await?;
        Ok(first(rows, Table::StudySets)?.to_domain())
    }

    async fn update_study_set(
        &self,
        set_id: &str,
        draft: &StudySetDraft,
        updated_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.update_by_id(
            Table::StudySets,
            set_id,
            json!({
                "title": draft.title,
                "description": draft.description,
                "updated_at": updated_at,
            }),
        )
        .await
    }

    async fn delete_study_set(&self, set_id: &str) -> PortResult<()> {
        let req = self
            .table(Method::DELETE, Table::StudySets)
            .query(&[("id", eq(set_id))]);
        self.client.send(req).await
    }

    async fn list_flashcards(&self, set_id: &str) -> PortResult<Vec<Flashcard>> {
        let records: Vec<FlashcardRecord> = self
            .select(Table::Flashcards, "*", &[("study_set_id", eq(set_id))])
            .await?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_flashcard_ids(&self, set_id: &str) -> PortResult<Vec<String>> {
        let records: Vec<IdRecord> = self
            .select(Table::Flashcards, "id", &[("study_set_id", eq(set_id))])
            .await?;
        Ok(records.into_iter().map(|r| r.id).collect())
    }

    async fn insert_flashcards(
        &self,
        set_id: &str,
        cards: &[NewFlashcard],
    ) -> PortResult<Vec<Flashcard>> {
        let rows: Vec<serde_json::Value> = cards
            .iter()
            .map(|card| {
                json!({
                    "study_set_id": set_id,
                    "front_text": card.front_text,
                    "back_text": card.back_text,
                })
            })
            .collect();
        let records: Vec<FlashcardRecord> = self
            .insert(Table::Flashcards, serde_json::Value::Array(rows))
            .await?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_flashcard(
        &self,
        update: &FlashcardUpdate,
        updated_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.update_by_id(
            Table::Flashcards,
            &update.id,
            json!({
                "front_text": update.front_text,
                "back_text": update.back_text,
                "updated_at": updated_at,
            }),
        )
        .await
    }

    async fn delete_flashcards(&self, ids: &[String]) -> PortResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let req = self
            .table(Method::DELETE, Table::Flashcards)
            .query(&[("id", in_list(ids))]);
        self.client.send(req).await
    }

    async fn create_study_session(
        &self,
        user_id: &str,
        study_set_id: &str,
        mode: &str,
    ) -> PortResult<StudySession> {
        let rows: Vec<StudySessionRecord> = self
            .insert(
                Table::StudySessions,
                json!({
                    "user_id": user_id,
                    "study_set_id": study_set_id,
                    "mode": mode,
                }),
            )
            .await?;
        Ok(first(rows, Table::StudySessions)?.to_domain())
    }

    async fn complete_study_session(
        &self,
        session_id: &str,
        completed_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.update_by_id(
            Table::StudySessions,
            session_id,
            json!({ "completed_at": completed_at }),
        )
        .await
    }
}
