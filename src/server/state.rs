/**
 * Application State Management
 *
 * This module defines the shared state handed to every request handler
 * via `Router::with_state`.
 *
 * # Architecture
 *
 * `AppState` is the central container for the per-process services:
 * - The tenant registry (handlers, one per identity)
 * - The authentication strategy
 * - The backup engine (absent when backups are disabled)
 * - The landing page presenter
 *
 * # Thread Safety
 *
 * The state is cloned per request, so every service sits behind an `Arc`.
 * Mutable pieces guard themselves: tenant handlers carry their own mutex,
 * the backup manager its own attempt cache.
 */

use std::sync::Arc;

use crate::auth::AuthStrategy;
use crate::backup::BackupManager;
use crate::landing::LandingPresenter;
use crate::tenant::HandlerRegistry;

#[derive(Clone)]
pub struct AppState {
    /// Per-identity tenant handlers.
    pub registry: Arc<HandlerRegistry>,
    /// How requests are authenticated.
    pub auth: Arc<AuthStrategy>,
    /// Snapshot engine; `None` when backups are disabled.
    pub backups: Option<Arc<BackupManager>>,
    /// Empty-tree welcome page renderer.
    pub landing: Arc<LandingPresenter>,
    /// Credential file name; requests naming it are refused outright.
    pub credential_filename: String,
}

// Manual impl: the tenant registry holds `DavHandler`s, which are not Debug.
impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("auth", &self.auth.mode_name())
            .field("backups_enabled", &self.backups.is_some())
            .field("landing", &self.landing)
            .field("credential_filename", &self.credential_filename)
            .finish_non_exhaustive()
    }
}
