//! Authentication Module
//!
//! Credential storage and the strategies that check requests against it.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs         - Module exports
//! ├── credentials.rs - htpasswd-style store, bcrypt verification, gen helpers
//! └── strategy.rs    - Disabled / Basic / HeaderPrefix strategies
//! ```

/// Credential file parsing, verification, and bootstrap helpers
pub mod credentials;

/// The closed set of authentication strategies
pub mod strategy;

// Re-export commonly used types
pub use credentials::{CredentialError, CredentialStore};
pub use strategy::AuthStrategy;
