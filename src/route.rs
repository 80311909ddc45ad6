//! Route definitions for the shortlink API
//!
//! This module configures all HTTP routes and maps them to their respective handlers.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;

use crate::handler::{create_shortlink, get_shortlink_info, redirect};
use crate::middleware::log_requests;
use crate::state::AppState;

/// Creates and configures the Axum application router with all routes
///
/// # Route Definitions
///
/// - `POST /api/shorten` - Creates a new short link
/// - `GET /api/info?shortlink={code}` - Returns metadata of a short link
/// - `GET /api/{shortlink}` - Redirects to the target URL
///
/// The static `/api/info` route takes precedence over the `{shortlink}` capture.
///
/// # Example Usage
///
/// ```no_run
/// # use std::sync::Arc;
/// # use std::time::Duration;
/// # use shortlink::allocator::AllocatorConfig;
/// # use shortlink::route::create_app;
/// # use shortlink::state::AppState;
/// # use shortlink::store::MemoryStore;
/// let state = AppState::new(
///     Arc::new(MemoryStore::new()),
///     AllocatorConfig::default(),
///     Duration::from_secs(2),
/// )
/// .unwrap();
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/shorten", post(create_shortlink))
        .route("/info", get(get_shortlink_info))
        .route("/{shortlink}", get(redirect));

    Router::new()
        .nest("/api", api_routes)
        // Panics turn into 500s inside the logging layer, so they still get logged
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}
