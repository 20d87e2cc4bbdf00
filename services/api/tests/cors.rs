//! CORS headers as seen by a browser frontend that sends credentials.

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use flipwise_api::adapters::InMemoryBackend;
use flipwise_api::config::CorsOrigins;
use flipwise_api::web::{build_router, cors_layer, AppState};
use std::sync::Arc;
use tower::ServiceExt;

const FRONTEND: &str = "http://localhost:3000";

fn router(origins: &CorsOrigins) -> Router {
    let state = Arc::new(AppState::in_memory(Arc::new(InMemoryBackend::new())));
    build_router(state).layer(cors_layer(origins).unwrap())
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap) {
    let response = router.oneshot(request).await.unwrap();
    (response.status(), response.headers().clone())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn wildcard_mirrors_the_origin_with_credentials() {
    let request = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, FRONTEND)
        .body(Body::empty())
        .unwrap();

    let (status, headers) = send(router(&CorsOrigins::Any), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header_str(&headers, "access-control-allow-origin"), Some(FRONTEND));
    assert_eq!(header_str(&headers, "access-control-allow-credentials"), Some("true"));
}

#[tokio::test]
async fn preflight_allows_authorization_on_put() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/study-sets/abc")
        .header(header::ORIGIN, FRONTEND)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
        .body(Body::empty())
        .unwrap();

    let (status, headers) = send(router(&CorsOrigins::Any), request).await;

    assert!(status.is_success());
    assert_eq!(header_str(&headers, "access-control-allow-origin"), Some(FRONTEND));
    assert_eq!(header_str(&headers, "access-control-allow-credentials"), Some("true"));
    let methods = header_str(&headers, "access-control-allow-methods").unwrap_or_default();
    assert!(methods.contains("PUT"));
    let allowed = header_str(&headers, "access-control-allow-headers")
        .unwrap_or_default()
        .to_ascii_lowercase();
    assert!(allowed.contains("authorization"));
}

#[tokio::test]
async fn listed_origins_reject_strangers() {
    let origins = CorsOrigins::List(vec![FRONTEND.to_string()]);

    let listed = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, FRONTEND)
        .body(Body::empty())
        .unwrap();
    let (_, headers) = send(router(&origins), listed).await;
    assert_eq!(header_str(&headers, "access-control-allow-origin"), Some(FRONTEND));

    let stranger = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "http://evil.example")
        .body(Body::empty())
        .unwrap();
    let (_, headers) = send(router(&origins), stranger).await;
    assert!(headers.get("access-control-allow-origin").is_none());
}
