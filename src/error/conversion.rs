/**
 * Error Conversion
 *
 * Converts `ServerError` values into HTTP responses at the router
 * boundary.
 *
 * # Response Format
 *
 * Error responses are JSON with the following structure:
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 404
 * }
 * ```
 *
 * Unauthorized responses additionally carry the Basic auth challenge so
 * browsers and WebDAV clients know to prompt for credentials.
 */

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::auth::strategy::BASIC_CHALLENGE;
use crate::error::types::ServerError;

/// JSON body attached to every error response
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorBody {
            error: self.message(),
            status: status.as_u16(),
        });

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, BASIC_CHALLENGE)], body).into_response();
        }

        (status, body).into_response()
    }
}
