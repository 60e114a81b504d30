//! Warren - Multi-Tenant Wiki File Server
//!
//! Warren serves one isolated directory tree per authenticated identity,
//! reachable both through WebDAV (so wiki files can save themselves back
//! over HTTP) and through plain directory browsing. Writes are optionally
//! versioned: the previous contents of a document are snapshotted before
//! every overwrite, subject to an age gate, a retention cap, and optional
//! gzip compression.
//!
//! # Overview
//!
//! The crate provides:
//! - Per-tenant request routing with directory isolation
//! - A write-time backup engine (age-gating, rotation, compression)
//! - Per-tenant serialization so concurrent writes cannot interleave
//! - Three authentication modes: none, HTTP Basic, header-prefix
//! - Optional TLS termination via rustls
//!
//! # Module Structure
//!
//! ```text
//! warren/
//! ├── server/     - configuration, startup assembly, shared state
//! ├── routes/     - router construction and the catch-all request flow
//! ├── middleware/ - request logging
//! ├── auth/       - credential store and authentication strategies
//! ├── tenant/     - per-tenant handlers, registry, path guard
//! ├── backup/     - snapshot engine
//! ├── landing     - landing and listing pages
//! └── error/      - error taxonomy and HTTP conversion
//! ```
//!
//! # Concurrency
//!
//! Each tenant owns a `tokio::sync::Mutex` that serializes every request
//! against that tenant's tree, including the backup step, so no reader can
//! observe a file mid-snapshot. Different tenants proceed in parallel. The
//! handler registry is immutable after startup and shared via `Arc`.
//!
//! # Error Handling
//!
//! Fallible operations return `Result` with `thiserror` enums; request-path
//! errors convert to HTTP responses at the router boundary through
//! `ServerError`'s `IntoResponse` implementation.

/// Configuration, startup assembly, shared application state
pub mod server;

/// Router construction and the catch-all request handler
pub mod routes;

/// Request-scoped middleware layers
pub mod middleware;

/// Credential store and authentication strategies
pub mod auth;

/// Per-tenant handlers, registry, and path isolation
pub mod tenant;

/// Write-time snapshot engine
pub mod backup;

/// First-run landing page and directory listings
pub mod landing;

/// Error taxonomy and HTTP conversion
pub mod error;
