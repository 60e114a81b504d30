/**
 * Request Logging
 *
 * One log line per request, emitted before the request is served, in the
 * spirit of a classic access log: remote address, method, path, protocol
 * version and declared body length. The remote address comes from the
 * `ConnectInfo` extension when the listener provides it and degrades to
 * `-` under test harnesses that do not.
 */

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;

pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let content_length = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("0")
        .to_string();

    tracing::info!(
        remote,
        method = %req.method(),
        path = req.uri().path(),
        version = ?req.version(),
        content_length,
        "request"
    );

    next.run(req).await
}
