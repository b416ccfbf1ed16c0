//! billscan-server - REST API server for billscan.
//!
//! Accepts invoice images on `POST /analyze` and answers with the items the
//! vision model extracted.
//!
//! # Example
//!
//! ```ignore
//! use billscan_server::{create_server, AppState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let extractor = VisionInvoiceExtractor::new(ExtractionConfig::from_env()?)?;
//!     let state = AppState::new(Arc::new(extractor), "uploads");
//!     let app = create_server(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod upload;

pub use error::{ApiError, ApiResult};
pub use state::AppState;
pub use upload::{TransientUpload, UploadStore};

use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes();

    routes::create_router(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
