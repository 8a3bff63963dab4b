//! TeamUp Backend
//!
//! REST backend for team recruitment postings, with SQLite persistence and Tantivy
//! full-text search over teams and members.

mod api;
mod config;
mod db;
mod errors;
mod models;
mod notify;
mod recruitment;
mod search;
mod service;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use notify::{LogNotifier, Notifier, WebhookNotifier};
use search::SearchIndex;
use service::RecruitmentService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecruitmentService>,
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting TeamUp Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Initialize search index
    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => {
            tracing::info!(
                "Notifications posted to webhook {} (timeout {:?})",
                url,
                config.notify_timeout
            );
            Arc::new(WebhookNotifier::new(url.clone(), config.notify_timeout)?)
        }
        None => {
            tracing::warn!("No TEAMUP_NOTIFY_WEBHOOK_URL configured. Notifications are only logged");
            Arc::new(LogNotifier)
        }
    };

    let service = Arc::new(RecruitmentService::new(
        repo.clone(),
        search.clone(),
        notifier,
    ));

    // Create application state
    let state = AppState {
        service,
        repo,
        search,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Users
        .route("/users", post(api::create_user))
        // Stacks
        .route("/stacks", get(api::list_stacks))
        // Teams
        .route("/teams", post(api::create_team))
        .route("/teams/{id}", get(api::get_team).put(api::update_team))
        // Applications
        .route(
            "/teams/{id}/applications",
            post(api::apply).delete(api::cancel_application),
        )
        .route(
            "/teams/{id}/applications/{member_id}/accept",
            put(api::accept_application),
        )
        .route(
            "/teams/{id}/applications/{member_id}/reject",
            put(api::reject_application),
        )
        // Search
        .route("/search", get(api::search));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
