mod auth;
mod config;
mod error;
mod handlers;
mod models;
mod naming;
mod path_scheme;
mod repository;
mod services;
mod storage;
#[cfg(test)]
mod test_support;

use axum::{
    extract::{DefaultBodyLimit, State},
    middleware,
    routing::{get, post},
    Router,
};
use config::Config;
use handlers::AppState;
use repository::PgUploadRepository;
use services::{RetrievalService, UploadService};
use std::net::SocketAddr;
use std::sync::Arc;
use storage::{create_storage, LocalStorage};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::auth::decode_key;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine, the environment may already be set
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_uploader=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting media uploader service");
    tracing::info!("Storage type: {:?}", config.storage_type);

    // Connect to database
    let db = sqlx::PgPool::connect(&config.database_url).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .map_err(|e| anyhow::anyhow!("Database migration failed: {}", e))?;
    tracing::info!("Database migrations applied");

    // Initialize storage
    let storage = create_storage(&config)?;
    let uploads_root = Arc::new(LocalStorage::new(config.uploads_root.clone()));

    let default_asset = config.uploads_root.join(&config.default_asset);
    if !tokio::fs::try_exists(&default_asset).await.unwrap_or(false) {
        tracing::warn!(
            path = %default_asset.display(),
            "Default asset is missing, unknown media will fail to serve"
        );
    }

    let repository = Arc::new(PgUploadRepository::new(db));

    // Build application state
    let state = AppState {
        uploads: Arc::new(UploadService::new(
            storage.clone(),
            repository.clone(),
            config.site_name.clone(),
        )),
        retrieval: Arc::new(RetrievalService::new(
            storage,
            repository,
            uploads_root,
            config.default_asset.clone(),
        )),
        public_key: Arc::new(decode_key(&config.jwt_public_key)?),
        config: config.clone(),
    };

    // Build our application with routes
    let app = Router::new()
        .route(
            "/upload",
            // Room for the multipart framing around the file itself
            post(handlers::upload_media)
                .layer(DefaultBodyLimit::max(config.max_upload_bytes + 64 * 1024)),
        )
        .route("/media/:slug", get(handlers::get_media))
        .route("/media/:slug/download", get(handlers::download_media))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            add_public_key_to_state,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Middleware to add the JWT public key to request extensions for the
/// `AuthOwner` extractor
async fn add_public_key_to_state(
    State(state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    request
        .extensions_mut()
        .insert(state.public_key.clone());

    next.run(request).await
}
