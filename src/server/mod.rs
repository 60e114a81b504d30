//! Server assembly
//!
//! ```text
//! server/
//! ├── config.rs  - environment configuration and validation
//! ├── init.rs    - state construction, TLS, listeners
//! └── state.rs   - shared application state
//! ```

pub mod config;
pub mod init;
pub mod state;

pub use config::{AuthMode, Config, ConfigError};
pub use state::AppState;
