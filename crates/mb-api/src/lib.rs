//! # mb-api
//!
//! The web routing and orchestration layer for the message board.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{routing::get, Router};
use mb_core::{AppError, BoardName, ThreadService};

/// Which board names the API will serve.
#[derive(Clone, Debug, Default)]
pub struct BoardPolicy {
    /// Empty means any well-formed board name is accepted.
    allowed: Arc<Vec<BoardName>>,
}

impl BoardPolicy {
    pub fn open() -> Self {
        Self::default()
    }

    pub fn allow_only(boards: Vec<BoardName>) -> Self {
        Self { allowed: Arc::new(boards) }
    }

    pub fn check(&self, board: &BoardName) -> Result<(), AppError> {
        if self.allowed.is_empty() || self.allowed.contains(board) {
            Ok(())
        } else {
            Err(AppError::ValidationError(format!("unknown board: {board}")))
        }
    }
}

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: ThreadService,
    pub boards: BoardPolicy,
}

/// Builds the API router.
///
/// Static pages (`/b/{board}/...`) are served by whatever sits in front of
/// this router; only the JSON/text API lives here.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/threads/{board}",
            get(handlers::list_threads)
                .post(handlers::create_thread)
                .put(handlers::report_thread)
                .delete(handlers::delete_thread),
        )
        .route(
            "/api/replies/{board}",
            get(handlers::get_thread)
                .post(handlers::create_reply)
                .put(handlers::report_reply)
                .delete(handlers::delete_reply),
        )
        .route("/healthz", get(handlers::health))
        .fallback(error::not_found)
        .method_not_allowed_fallback(error::not_found)
        .layer(middleware::cors_policy())
        .layer(middleware::trace_layer())
        .with_state(state)
}
