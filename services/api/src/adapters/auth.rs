//! services/api/src/adapters/auth.rs
//!
//! The Supabase auth (GoTrue) adapter, implementing the `AuthService` port.

use async_trait::async_trait;
use flipwise_core::domain::{AuthSession, AuthUser};
use flipwise_core::ports::{AuthService, PortResult};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::supabase::SupabaseClient;

/// An adapter that implements the `AuthService` port against Supabase auth.
#[derive(Clone)]
pub struct SupabaseAuthAdapter {
    client: SupabaseClient,
}

impl SupabaseAuthAdapter {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct UserRecord {
    id: String,
    email: Option<String>,
}
impl UserRecord {
    fn to_domain(self) -> AuthUser {
        AuthUser {
            id: self.id,
            email: self.email,
        }
    }
}

#[derive(Deserialize)]
struct SessionRecord {
    access_token: String,
    refresh_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<i64>,
    user: UserRecord,
}
impl SessionRecord {
    fn to_domain(self) -> AuthSession {
        AuthSession {
            user: self.user.to_domain(),
            access_token: Some(self.access_token),
            refresh_token: self.refresh_token,
            token_type: self.token_type,
            expires_in: self.expires_in,
        }
    }
}

/// Sign-up answers with a full session, or with just the user when email
/// confirmation is enabled.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpRecord {
    Session(SessionRecord),
    User(UserRecord),
}
impl SignUpRecord {
    fn to_domain(self) -> AuthSession {
        match self {
            SignUpRecord::Session(session) => session.to_domain(),
            SignUpRecord::User(user) => AuthSession {
                user: user.to_domain(),
                access_token: None,
                refresh_token: None,
                token_type: None,
                expires_in: None,
            },
        }
    }
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for SupabaseAuthAdapter {
    async fn sign_in(&self, email: &str, password: &str) -> PortResult<AuthSession> {
        let req = self
            .client
            .request(Method::POST, &self.client.auth_url("token"), None)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let record: SessionRecord = self.client.send_json(req).await?;
        Ok(record.to_domain())
    }

    async fn sign_up(&self, email: &str, password: &str) -> PortResult<AuthSession> {
        let req = self
            .client
            .request(Method::POST, &self.client.auth_url("signup"), None)
            .json(&json!({ "email": email, "password": password }));
        let record: SignUpRecord = self.client.send_json(req).await?;
        Ok(record.to_domain())
    }

    async fn sign_out(&self, access_token: Option<&str>) -> PortResult<()> {
        // Without a user token there is no session to revoke.
        let Some(token) = access_token else {
            return Ok(());
        };
        let req = self
            .client
            .request(Method::POST, &self.client.auth_url("logout"), Some(token));
        self.client.send(req).await
    }
}
