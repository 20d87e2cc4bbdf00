pub mod auth;
pub mod params;
pub mod profile;
pub mod rest;
pub mod state;
pub mod study_sessions;
pub mod study_sets;

// Re-export what the binaries and tests need to build and exercise the router.
pub use rest::{build_router, cors_layer, ApiDoc, ErrorBody, SuccessResponse};
pub use state::AppState;
