//! HTTP routing
//!
//! One catch-all fallback carries the whole surface; method and path
//! decide behavior inside [`handler`]. The router stack adds request
//! logging and a hard per-request deadline so a stalled client cannot
//! pin a tenant mutex forever.

use std::time::Duration;

use axum::middleware;
use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::middleware::logging::log_requests;
use crate::server::state::AppState;

pub mod handler;

/// Upper bound on any single request, WebDAV transfers included.
const REQUEST_DEADLINE: Duration = Duration::from_secs(60);

/// Assemble the application router around shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(handler::handle_request)
        .layer(middleware::from_fn(log_requests))
        .layer(TimeoutLayer::new(REQUEST_DEADLINE))
        .with_state(state)
}
