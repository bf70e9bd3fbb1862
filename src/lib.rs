//! Portfolio site content core.
//!
//! Client side: a typed fetch wrapper for the data service ([`client`]), a query cache with
//! stale-while-revalidate and a mutation executor ([`query`]), the auth context and guard
//! ([`session`]), admin and public views ([`views`]) and the chat assistant ([`chat`]).
//!
//! Server side: a local stand-in for the data service with SQLite persistence ([`api`],
//! [`auth`], [`db`]), used for development and integration tests.

pub mod api;
pub mod auth;
pub mod chat;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod icons;
pub mod models;
pub mod query;
pub mod session;
pub mod views;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let service_key = state.config.service_key.clone();

    // Collection routes; writes check the admin session in their handlers
    let api_routes = Router::new()
        .route(
            "/{collection}",
            get(api::list_records).post(api::create_record),
        )
        .route(
            "/{collection}/{id}",
            get(api::get_record)
                .put(api::update_record)
                .delete(api::delete_record),
        );

    // Account provisioning is reserved for the service key
    let admin_routes = Router::new()
        .route("/users", post(api::create_admin))
        .layer(middleware::from_fn(move |req, next| {
            auth::service_key_layer(service_key.clone(), req, next)
        }));

    let auth_routes = Router::new()
        .route("/login", post(api::login))
        .route("/session", get(api::current_session))
        .route("/logout", post(api::logout))
        .nest("/admin", admin_routes);

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .nest("/auth", auth_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the database and serve the stand-in data service until the listener fails.
pub async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if the service key is not configured
    if config.service_key.is_none() {
        tracing::warn!(
            "No service key configured (SITE_SERVICE_KEY). Admin provisioning is open!"
        );
    }

    let pool = db::init_database(&config.db_path).await?;
    let state = AppState {
        repo: Arc::new(Repository::new(pool)),
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
