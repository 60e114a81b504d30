/**
 * Tenant Handler and Session
 *
 * A `TenantHandler` owns everything bound to one tenant's directory tree:
 * the WebDAV handler that lets wiki files save themselves back, the browse
 * service for plain directory listings, and the mutex that serializes all
 * access to the tree.
 *
 * # Locking Discipline
 *
 * The mutex is not exposed directly. Callers obtain a `TenantSession`,
 * which holds the guard for its lifetime; every operation that touches the
 * tree (root creation, document materialization, delegation to WebDAV or
 * browse) is a method on the session, so it is impossible to reach the
 * tree without holding the lock. The session is held across the backup
 * step too - no reader can observe a document mid-snapshot.
 *
 * Handlers are built once at startup and never mutated afterwards except
 * through their mutex.
 */

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use dav_server::{localfs::LocalFs, memls::MemLs, DavHandler};
use tokio::sync::{Mutex, MutexGuard};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::error::ServerError;

/// Payload written into newly materialized documents.
pub static EMPTY_DOCUMENT: &[u8] = include_bytes!("../../assets/empty.html");

/// One directory entry, as shown by the browse listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
}

/// One tenant's WebDAV handler, browse service, and serialization mutex.
pub struct TenantHandler {
    name: String,
    root: PathBuf,
    dav: DavHandler,
    browse: ServeDir,
    lock: Mutex<()>,
}

impl TenantHandler {
    /// Build the handler for one tenant rooted at `root`.
    ///
    /// The WebDAV side gets its own in-memory lock system per tenant; the
    /// browse side is a plain directory file server. Neither touches the
    /// filesystem at construction time - the root may not exist yet.
    pub fn new(name: impl Into<String>, root: PathBuf) -> Self {
        let dav = DavHandler::builder()
            .filesystem(LocalFs::new(&root, false, false, false))
            .locksystem(MemLs::new())
            .build_handler();
        let browse = ServeDir::new(&root);

        Self {
            name: name.into(),
            root,
            dav,
            browse,
            lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Acquire this tenant's mutex and return a session through which all
    /// tree operations run. The lock is released when the session drops.
    pub async fn session(&self) -> TenantSession<'_> {
        TenantSession {
            handler: self,
            _guard: self.lock.lock().await,
        }
    }
}

/// Exclusive access to one tenant's tree for the duration of a request.
pub struct TenantSession<'a> {
    handler: &'a TenantHandler,
    _guard: MutexGuard<'a, ()>,
}

impl TenantSession<'_> {
    pub fn name(&self) -> &str {
        self.handler.name()
    }

    pub fn root(&self) -> &Path {
        self.handler.root()
    }

    /// Create the tenant root (mode 0700) if it does not exist yet.
    pub fn ensure_root(&self) -> Result<(), ServerError> {
        if !self.handler.root.exists() {
            create_dir_0700(&self.handler.root)?;
            tracing::debug!(root = %self.handler.root.display(), "created tenant root");
        }
        Ok(())
    }

    /// Materialize `path` from the built-in empty document if it does not
    /// exist. Never overwrites: creation is `create_new`, so a concurrent
    /// or repeated materialization of the same path is a no-op.
    pub fn materialize_document(&self, path: &Path) -> Result<(), ServerError> {
        match open_new_0600(path) {
            Ok(mut file) => {
                tracing::info!(path = %path.display(), "creating document");
                file.write_all(EMPTY_DOCUMENT)?;
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(err) => Err(ServerError::Filesystem(err)),
        }
    }

    /// Whether the tenant root currently contains any entries at all.
    pub fn root_has_entries(&self) -> Result<bool, ServerError> {
        let mut entries = std::fs::read_dir(self.root())?;
        match entries.next() {
            None => Ok(false),
            Some(Ok(_)) => Ok(true),
            Some(Err(err)) => Err(err.into()),
        }
    }

    /// Whether `name` exists as a file directly under the tenant root.
    pub fn document_exists(&self, name: &str) -> bool {
        self.root().join(name).exists()
    }

    /// Entries of a directory inside the tenant tree, sorted by name.
    /// Entries whose metadata cannot be read are skipped.
    pub fn list_entries(&self, dir: &Path) -> Result<Vec<ListingEntry>, ServerError> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            entries.push(ListingEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: file_type.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Delegate a request verbatim to the tenant's WebDAV handler.
    pub async fn serve_document(&self, req: Request<Body>) -> Response {
        self.handler.dav.handle(req).await.map(Body::new)
    }

    /// Delegate a request to the tenant's browse service.
    pub async fn serve_browse(&self, req: Request<Body>) -> Result<Response, ServerError> {
        match self.handler.browse.clone().oneshot(req).await {
            Ok(response) => Ok(response.map(Body::new)),
            Err(err) => Err(ServerError::Filesystem(std::io::Error::other(err.to_string()))),
        }
    }
}

#[cfg(unix)]
fn create_dir_0700(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new().mode(0o700).create(path)
}

#[cfg(not(unix))]
fn create_dir_0700(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir(path)
}

#[cfg(unix)]
fn open_new_0600(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_new_0600(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}
