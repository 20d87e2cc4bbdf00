//! Shared helpers for driving the router in-process against the in-memory backend.
#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use flipwise_api::adapters::InMemoryBackend;
use flipwise_api::web::{build_router, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub backend: Arc<InMemoryBackend>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let backend = Arc::new(InMemoryBackend::new());
        let router = build_router(Arc::new(AppState::in_memory(backend.clone())));
        Self { backend, router }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request(Method::POST, uri, body, None).await
    }

    pub async fn put(&self, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, body, None).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None, None).await
    }

    /// Registers a user and returns their id.
    pub async fn register(&self, email: &str, username: Option<&str>) -> String {
        let (status, body) = self
            .post(
                "/api/auth/register",
                Some(serde_json::json!({
                    "email": email,
                    "password": "correct-horse",
                    "username": username,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {}", body);
        body["user"]["id"].as_str().unwrap().to_string()
    }

    /// Creates a study set owned by `user_id` and returns its id.
    pub async fn create_set(&self, user_id: &str, title: &str, cards: &[(&str, &str)]) -> String {
        let flashcards: Vec<Value> = cards
            .iter()
            .map(|(front, back)| serde_json::json!({ "front_text": front, "back_text": back }))
            .collect();
        let (status, body) = self
            .post(
                &format!("/api/study-sets?user_id={}", user_id),
                Some(serde_json::json!({
                    "title": title,
                    "description": null,
                    "flashcards": flashcards,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// The stored cards of a set as `(id, front, back)`.
    pub async fn cards(&self, set_id: &str) -> Vec<(String, String, String)> {
        let (status, body) = self.get(&format!("/api/study-sets/{}", set_id)).await;
        assert_eq!(status, StatusCode::OK);
        body["flashcards"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| {
                (
                    c["id"].as_str().unwrap().to_string(),
                    c["front_text"].as_str().unwrap().to_string(),
                    c["back_text"].as_str().unwrap().to_string(),
                )
            })
            .collect()
    }
}
