/**
 * Server Error Types
 *
 * This module defines the errors a request can die with on its way through
 * the router. Each variant maps to exactly one HTTP status class; the
 * mapping lives in `status_code()` and the client-visible text in
 * `message()`.
 *
 * # Opacity Rules
 *
 * Rejections caused by the path pre-checks (`PathRejected`) and by a
 * missing tenant (`UnknownTenant`) both answer with a generic not-found
 * body: a remote client must not be able to tell a forbidden path from an
 * unprovisioned identity's probe. `Filesystem` and `Backup` errors do carry
 * the underlying message - warren is an operator tool and diagnosability
 * from the browser is worth the disclosure.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backup::BackupError;

/// Request-path error taxonomy
///
/// Every fallible step of request handling converts into one of these
/// variants, and the router boundary turns the variant into a response.
///
/// # Usage
///
/// ```rust
/// use warren::error::ServerError;
///
/// fn lookup(identity: &str) -> Result<(), ServerError> {
///     Err(ServerError::UnknownTenant)
/// }
/// ```
#[derive(Debug, Error)]
pub enum ServerError {
    /// Credentials missing or failed verification
    #[error("unauthorized")]
    Unauthorized,

    /// Path referenced the credential store or contained a `..` segment
    #[error("path rejected")]
    PathRejected,

    /// Identity authenticated but no tenant tree is provisioned for it
    #[error("unknown tenant")]
    UnknownTenant,

    /// Resolved path escaped the tenant root
    #[error("path escapes tenant root")]
    PathEscape,

    /// Filesystem operation failed (directory creation, listing, file I/O)
    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    /// Snapshot creation failed; the write that triggered it is aborted
    #[error("backup failed: {0}")]
    Backup(#[from] BackupError),
}

impl ServerError {
    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Unauthorized` - 401 Unauthorized (with challenge header)
    /// - `PathRejected` - 404 Not Found (opaque)
    /// - `UnknownTenant` - 404 Not Found
    /// - `PathEscape` - 400 Bad Request
    /// - `Filesystem` - 500 Internal Server Error
    /// - `Backup` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PathRejected | Self::UnknownTenant => StatusCode::NOT_FOUND,
            Self::PathEscape => StatusCode::BAD_REQUEST,
            Self::Filesystem(_) | Self::Backup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the client-visible message for this error
    ///
    /// Opaque variants return fixed generic text; internal errors return
    /// the underlying message.
    pub fn message(&self) -> String {
        match self {
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::PathRejected | Self::UnknownTenant => "Not found".to_string(),
            Self::PathEscape => "Bad request".to_string(),
            Self::Filesystem(err) => err.to_string(),
            Self::Backup(err) => err.to_string(),
        }
    }
}
