//! apilama-api - HTTP surface of the gateway
//!
//! Maps the fixed capability routes and the generic
//! `/api/{capability}/{operation}` route onto the [`Dispatcher`]. Handlers
//! only extract arguments; every response body is a [`ResponseEnvelope`].
//!
//! # Usage
//!
//! ```ignore
//! use apilama_api::{create_router, AppState};
//!
//! let state = AppState::new(Arc::new(dispatcher), "apilama");
//! let router = create_router(state);
//! ```
//!
//! [`Dispatcher`]: apilama_gateway::Dispatcher
//! [`ResponseEnvelope`]: apilama_core::ResponseEnvelope

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, EnvelopeResponse};
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the gateway router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Gateway health, independent of any backend
        .route("/health", get(handlers::health::gateway_health))
        // File routes
        .route("/api/files", get(handlers::files::list_files))
        .route(
            "/api/file",
            get(handlers::files::read_file)
                .post(handlers::files::create_file)
                .delete(handlers::files::delete_file),
        )
        // Directory routes
        .route("/api/directories", get(handlers::dirs::list_directory))
        .route("/api/directory", post(handlers::dirs::create_directory))
        // Shell routes
        .route("/api/shell/execute", post(handlers::shell::execute_command))
        // Per-capability health and generic dispatch
        .route(
            "/api/{capability}/health",
            get(handlers::health::capability_health),
        )
        .route(
            "/api/{capability}/{operation}",
            post(handlers::dispatch::dispatch_operation),
        )
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
