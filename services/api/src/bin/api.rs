//! services/api/src/bin/api.rs

use flipwise_api::{
    adapters::{InMemoryBackend, SupabaseAuthAdapter, SupabaseClient, SupabaseDbAdapter},
    config::{Config, StorageBackend},
    error::ApiError,
    web::{build_router, cors_layer, AppState},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize the Backend Adapters ---
    let app_state = match &config.backend {
        StorageBackend::Supabase { url, anon_key } => {
            info!("Using Supabase project at {}", url);
            let client = SupabaseClient::new(url.clone(), anon_key.clone(), config.backend_timeout)?;
            AppState::new(
                Arc::new(SupabaseAuthAdapter::new(client.clone())),
                Arc::new(SupabaseDbAdapter::new(client)),
            )
        }
        StorageBackend::Memory => {
            warn!("Using the in-memory backend; data will not survive a restart");
            AppState::in_memory(Arc::new(InMemoryBackend::new()))
        }
    };

    // --- 3. Create the Web Router ---
    let app = build_router(Arc::new(app_state)).layer(cors_layer(&config.cors_origins)?);

    // --- 4. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
