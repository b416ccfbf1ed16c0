//! Route definitions for the REST API.

mod analyze;
mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Invoice extraction
        .route("/analyze", post(analyze::analyze_invoice))
        // Attach state
        .with_state(state)
}

pub use analyze::*;
pub use health::*;
