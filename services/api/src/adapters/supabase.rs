//! services/api/src/adapters/supabase.rs
//!
//! A thin `reqwest` wrapper shared by the Supabase auth and table adapters.
//! It knows the project URL and API key, attaches the headers every call
//! needs, and turns error responses into `PortError`s that keep the
//! backend's own message.

use flipwise_core::ports::{PortError, PortResult, Table};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// The connection to one Supabase project.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    /// Creates a new `SupabaseClient` with a per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    pub fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.as_str())
    }

    /// Starts a request carrying the `apikey` header. The bearer token is the
    /// API key unless a user token is supplied.
    pub fn request(&self, method: Method, url: &str, bearer: Option<&str>) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer.unwrap_or(self.api_key.as_str()))
    }

    /// Sends the request and decodes a JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> PortResult<T> {
        let response = self.execute(req).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to decode response: {}", e)))
    }

    /// Sends the request and discards the body.
    pub async fn send(&self, req: RequestBuilder) -> PortResult<()> {
        self.execute(req).await.map(|_| ())
    }

    async fn execute(&self, req: RequestBuilder) -> PortResult<Response> {
        let response = req
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Supabase responded");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = error_from_body(status, &body);
        warn!(status = status.as_u16(), error = %err, "Supabase request failed");
        Err(err)
    }
}

/// Picks the most specific message out of a GoTrue or PostgREST error body.
fn error_from_body(status: StatusCode, body: &str) -> PortError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized(message),
        StatusCode::NOT_FOUND => PortError::NotFound(message),
        s if s.is_client_error() => PortError::Rejected(message),
        _ => PortError::Unexpected(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_gotrue_msg_field() {
        let err = error_from_body(
            StatusCode::BAD_REQUEST,
            r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        );
        assert_eq!(err, PortError::Rejected("Invalid login credentials".into()));
    }

    #[test]
    fn reads_postgrest_message_field() {
        let err = error_from_body(
            StatusCode::CONFLICT,
            r#"{"code":"23505","details":null,"hint":null,"message":"duplicate key value"}"#,
        );
        assert_eq!(err, PortError::Rejected("duplicate key value".into()));
    }

    #[test]
    fn falls_back_to_raw_text_then_status() {
        assert_eq!(
            error_from_body(StatusCode::BAD_GATEWAY, "upstream down"),
            PortError::Unexpected("upstream down".into())
        );
        assert_eq!(
            error_from_body(StatusCode::UNAUTHORIZED, ""),
            PortError::Unauthorized("401 Unauthorized".into())
        );
    }
}
