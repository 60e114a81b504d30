//! Common test utilities
//!
//! Builders for servers under test: a temporary serve root, a `Config`
//! pointing at it, and an `axum_test::TestServer` wrapping the full
//! router. Credential files are written with low-cost bcrypt hashes to
//! keep the suite fast.

#![allow(dead_code)]

use std::path::Path;

use axum::http::{header, HeaderMap, HeaderValue};
use axum_extra::headers::{Authorization, HeaderMapExt};
use axum_test::TestServer;
use tempfile::TempDir;

use warren::backup::BackupSettings;
use warren::routes::build_router;
use warren::server::init::build_state;
use warren::server::{AuthMode, Config};

/// A server under test plus the temporary tree it serves.
pub struct TestSite {
    pub root: TempDir,
    pub server: TestServer,
}

/// Config rooted at `root` with auth, TLS, and backups all off.
pub fn test_config(root: &Path) -> Config {
    Config {
        root: root.to_path_buf(),
        listen: "localhost:8080".to_string(),
        auth_mode: AuthMode::Disabled,
        credential_file: root.join(".htpasswd"),
        tls: None,
        backups: None,
        gen: None,
    }
}

pub fn backup_settings(max_files: usize, min_age_secs: i64) -> BackupSettings {
    BackupSettings {
        dir_name: "backups".to_string(),
        max_files,
        min_age_secs,
        compress: false,
    }
}

/// Spin up a test server over `config`.
pub fn serve(config: &Config) -> TestServer {
    let state = build_state(config).expect("state should build");
    TestServer::new(build_router(state)).expect("test server should start")
}

/// Anonymous site over a fresh empty root.
pub fn anonymous_site() -> TestSite {
    let root = TempDir::new().expect("temp root");
    let server = serve(&test_config(root.path()));
    TestSite { root, server }
}

/// Site with HTTP Basic auth and the given identity/secret pairs.
pub fn basic_auth_site(entries: &[(&str, &str)]) -> TestSite {
    auth_site(AuthMode::Basic, entries)
}

/// Site with header auth and the given identity/secret pairs.
pub fn header_auth_site(entries: &[(&str, &str)]) -> TestSite {
    auth_site(AuthMode::Header, entries)
}

fn auth_site(mode: AuthMode, entries: &[(&str, &str)]) -> TestSite {
    let root = TempDir::new().expect("temp root");
    let mut config = test_config(root.path());
    config.auth_mode = mode;
    write_credentials(&config.credential_file, entries);
    let server = serve(&config);
    TestSite { root, server }
}

/// Write an htpasswd-style credential file. Cost-4 hashes, tests only.
pub fn write_credentials(path: &Path, entries: &[(&str, &str)]) {
    let mut contents = String::from("# test credentials\n");
    for (identity, secret) in entries {
        let hash = bcrypt::hash(secret, 4).expect("hash secret");
        contents.push_str(&format!("{identity}:{hash}\n"));
    }
    std::fs::write(path, contents).expect("write credential file");
}

/// Encodes `identity:secret` as an `Authorization: Basic` header value.
pub fn basic_auth(identity: &str, secret: &str) -> HeaderValue {
    let mut headers = HeaderMap::new();
    headers.typed_insert(Authorization::basic(identity, secret));
    headers
        .remove(header::AUTHORIZATION)
        .expect("authorization header")
}
