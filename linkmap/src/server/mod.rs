//! HTTP transport over the graph engine.

pub mod api;
pub mod auth;
pub mod error;

use crate::config::ServerConfig;
use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use error::ApiError;
use linkmap_core::{AggregationStore, Database, RoleStyles};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    db_path: Arc<PathBuf>,
    /// Process-wide aggregation of live observations.
    pub live: Arc<AggregationStore>,
    pub styles: Arc<RoleStyles>,
}

impl AppState {
    pub fn new(db_path: impl Into<PathBuf>, styles: RoleStyles) -> Self {
        Self {
            db_path: Arc::new(db_path.into()),
            live: Arc::new(AggregationStore::new()),
            styles: Arc::new(styles),
        }
    }

    /// Runs `work` on the blocking pool against a fresh connection.
    pub async fn with_db<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> linkmap_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.db_path.clone();
        let result = tokio::task::spawn_blocking(move || {
            let db = Database::open(&path)?;
            work(&db)
        })
        .await?;
        Ok(result?)
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let values: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(values))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/ping", get(api::ping))
        .route("/api/search", post(api::search))
        .route("/api/graph", post(api::graph_by_url))
        .route("/api/graph/id", post(api::graph_by_id))
        .route("/api/graph/full", get(api::full_graph))
        .route("/api/source", post(api::source_by_url))
        .route("/api/source/id", post(api::source_by_id))
        .route(
            "/api/cards",
            post(api::save_card)
                .get(api::list_cards)
                .delete(api::delete_card),
        )
        .route("/api/cards/recall", post(api::recall_card))
        .route("/api/observations", post(api::observe))
        .route("/api/live", get(api::live))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    // Creates the schema once; request connections only open it
    Database::new(&config.db_path)?;

    let state = AppState::new(config.db_path.clone(), config.styles.clone());
    let app = create_router(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(
        "Serving {} on http://{}",
        config.db_path.display(),
        config.addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Server stopped");
    Ok(())
}
