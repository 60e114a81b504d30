//! Tenant Module
//!
//! Everything scoped to a single tenant's directory tree lives here.
//!
//! # Module Structure
//!
//! ```text
//! tenant/
//! ├── mod.rs      - Module exports
//! ├── guard.rs    - Path resolution and containment checks
//! ├── handler.rs  - TenantHandler + TenantSession (WebDAV, browse, mutex)
//! └── registry.rs - Immutable identity -> handler lookup
//! ```
//!
//! A request first resolves its tenant in the [`registry`], then acquires a
//! [`handler::TenantSession`] for exclusive access, then validates its path
//! through [`guard`] before any filesystem work happens.

/// Path resolution and containment checks
pub mod guard;

/// Per-tenant WebDAV/browse handler and its serialization session
pub mod handler;

/// Immutable identity lookup
pub mod registry;

// Re-export commonly used types
pub use handler::{ListingEntry, TenantHandler, TenantSession, EMPTY_DOCUMENT};
pub use registry::HandlerRegistry;
