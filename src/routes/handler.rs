/**
 * Request Router
 *
 * Every request lands here via the catch-all fallback and walks the same
 * sequence:
 *
 * 1. Percent-decode the path; undecodable paths are refused.
 * 2. Screen the decoded path: anything naming the credential file or
 *    containing `..` is answered with an opaque 404 before any routing.
 * 3. Authenticate, yielding the tenant identity.
 * 4. Look up the tenant handler and open a session (tenant mutex held
 *    from here to the end of the request).
 * 5. Resolve the path under the tenant root and require containment.
 * 6. Create the tenant root on first use.
 * 7. `.html` paths take the document branch: materialize on first touch,
 *    snapshot before a PUT overwrites, then hand to WebDAV.
 * 8. Everything else takes the browse branch: directory listing, the
 *    `/index.html` redirect, or the landing page for an empty tree.
 *
 * Routing decisions run on the decoded path; the request itself is
 * delegated untouched, since both WebDAV and the browse service decode
 * for themselves.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;

use crate::error::ServerError;
use crate::landing;
use crate::server::state::AppState;
use crate::tenant::guard;
use crate::tenant::TenantSession;

/// Catch-all entry point; converts routing errors into HTTP responses.
pub async fn handle_request(State(state): State<AppState>, req: Request<Body>) -> Response {
    match route_request(&state, req).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn route_request(state: &AppState, req: Request<Body>) -> Result<Response, ServerError> {
    let path = percent_decode_str(req.uri().path())
        .decode_utf8()
        .map_err(|_| ServerError::PathEscape)?
        .into_owned();

    // Refused before auth: these paths get nothing, not even a 401.
    if path.contains(&state.credential_filename) || path.contains("..") {
        return Err(ServerError::PathRejected);
    }

    let identity = state.auth.verify(req.headers())?;
    let handler = state
        .registry
        .find(&identity)
        .ok_or(ServerError::UnknownTenant)?;

    // Held until the response is built, covering snapshot and write.
    let session = handler.session().await;

    let full_path = guard::resolve(session.root(), &path)?;
    tracing::debug!(tenant = session.name(), path = %full_path.display(), "resolved");

    session.ensure_root()?;

    if path.ends_with(".html") {
        serve_document(state, &session, &path, full_path, req).await
    } else {
        serve_tree(state, &session, &path, &full_path, req).await
    }
}

/// Document branch: WebDAV, with materialization and write-time snapshot.
async fn serve_document(
    state: &AppState,
    session: &TenantSession<'_>,
    path: &str,
    full_path: PathBuf,
    req: Request<Body>,
) -> Result<Response, ServerError> {
    session.materialize_document(&full_path)?;

    if req.method() == Method::PUT {
        if let Some(backups) = &state.backups {
            // The configured dir name joins as a subtree: snapshots stay
            // inside the tenant root even when the name is absolute.
            let dest_base = guard::normalize(
                &session
                    .root()
                    .join(guard::subtree(backups.dir_name()))
                    .join(path.trim_start_matches('/')),
            );
            // A snapshot failure aborts the write.
            Arc::clone(backups).snapshot(full_path, dest_base).await?;
        }
    }

    Ok(session.serve_document(req).await)
}

/// Browse branch: listing, index redirect, file serving, or the landing
/// page when the tree is still empty.
async fn serve_tree(
    state: &AppState,
    session: &TenantSession<'_>,
    path: &str,
    full_path: &Path,
    req: Request<Body>,
) -> Result<Response, ServerError> {
    if session.root_has_entries()? {
        if path == "/" && session.document_exists("index.html") {
            return Ok(redirect_to_index());
        }
        // Directories with an index.html fall through to the file
        // service, which serves the index for them.
        if full_path.is_dir() && !full_path.join("index.html").is_file() {
            let entries = session.list_entries(full_path)?;
            return Ok(landing::render_listing(path, &entries).into_response());
        }
        return session.serve_browse(req).await;
    }

    Ok(state.landing.render(session.name()).into_response())
}

fn redirect_to_index() -> Response {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(header::LOCATION, "/index.html")
        .body(Body::empty())
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
