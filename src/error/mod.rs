//! Server Error Module
//!
//! This module defines the error taxonomy for the request path and its
//! conversion to HTTP responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - Error conversion implementations
//! ```
//!
//! # Error Classes
//!
//! - `Unauthorized` - bad or missing credentials; the response carries a
//!   `WWW-Authenticate` challenge and never says whether the identity or
//!   the secret was wrong
//! - `PathRejected` - forbidden filename or traversal segment; answered
//!   with an opaque 404 so nothing about the check leaks
//! - `UnknownTenant` - authenticated identity with no provisioned tree
//! - `PathEscape` - resolved path fell outside the tenant root
//! - `Filesystem` - directory creation, listing, or file I/O failed; the
//!   underlying message is reported (operator tool trade-off)
//! - `Backup` - snapshot creation failed; the triggering write is aborted
//!
//! All variants implement `IntoResponse`, so handlers return
//! `Result<Response, ServerError>` and let the router boundary do the
//! mapping.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::ServerError;
