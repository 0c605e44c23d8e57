//! Browser front end: one page, a JSON endpoint per action.

pub mod error;
pub mod handlers;
pub mod markdown;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::agent::AgentFactory;
use crate::instrumentation::TurnLogger;
use crate::session::SessionStore;

pub const SESSION_COOKIE: &str = "live_search_session";

pub const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub factory: Arc<dyn AgentFactory>,
    pub logger: Option<Arc<TurnLogger>>,
}

impl AppState {
    pub fn new(
        factory: Arc<dyn AgentFactory>,
        logger: Option<TurnLogger>,
        session_timeout: Duration,
    ) -> Self {
        Self {
            sessions: SessionStore::new(session_timeout),
            factory,
            logger: logger.map(Arc::new),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/ask", post(handlers::ask))
        .route("/api/history", get(handlers::history))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
