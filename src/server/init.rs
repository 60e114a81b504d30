/**
 * Server Initialization
 *
 * This module turns a validated `Config` into a running server.
 *
 * # Initialization Process
 *
 * 1. Load credentials (when auth is enabled) and build one tenant handler
 *    per identity - or a single anonymous handler rooted at the serve
 *    directory when auth is off.
 * 2. Construct the backup engine and landing presenter.
 * 3. Assemble the router around the shared state.
 * 4. Bind and serve: plain HTTP with graceful ctrl-c shutdown, or HTTPS
 *    through rustls when certificate and key are configured.
 *
 * # Error Handling
 *
 * Startup is strict: a missing or unreadable credential file while auth
 * is enabled, bad TLS material, or an unbindable listen address all stop
 * the server before it accepts a request.
 */

use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;

use crate::auth::{AuthStrategy, CredentialStore};
use crate::backup::BackupManager;
use crate::landing::LandingPresenter;
use crate::routes::build_router;
use crate::server::config::{AuthMode, Config, ConfigError, TlsConfig};
use crate::server::state::AppState;
use crate::tenant::HandlerRegistry;

/// Build the shared application state from configuration.
///
/// # Errors
///
/// `ConfigError` when auth is enabled but the credential file is missing
/// or unreadable.
pub fn build_state(config: &Config) -> Result<AppState, ConfigError> {
    let (auth, registry) = match config.auth_mode {
        AuthMode::Disabled => (
            AuthStrategy::Disabled,
            HandlerRegistry::anonymous(&config.root),
        ),
        mode => {
            if !config.credential_file.exists() {
                return Err(ConfigError::CredentialsMissing {
                    path: config.credential_file.display().to_string(),
                });
            }
            let store = Arc::new(CredentialStore::load(&config.credential_file)?);
            let registry = HandlerRegistry::for_identities(&config.root, store.identities());
            let auth = match mode {
                AuthMode::Basic => AuthStrategy::Basic { store },
                _ => AuthStrategy::HeaderPrefix { store },
            };
            tracing::info!("Loaded {} identities", registry.len());
            (auth, registry)
        }
    };

    let backups = config
        .backups
        .clone()
        .map(|settings| Arc::new(BackupManager::new(settings)));

    Ok(AppState {
        registry: Arc::new(registry),
        auth: Arc::new(auth),
        backups,
        landing: Arc::new(LandingPresenter::new(config.base_url())),
        credential_filename: config.credential_filename(),
    })
}

/// Run the server until shutdown.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(&config)?;

    tracing::info!("Serving directory '{}'", config.root.display());
    tracing::info!("Auth mode: {}", state.auth.mode_name());
    match &config.backups {
        Some(b) => tracing::info!(
            "Backups enabled; dir: '{}', max files: {}, min age: {}s, compress: {}",
            b.dir_name,
            b.max_files,
            b.min_age_secs,
            b.compress
        ),
        None => tracing::info!("Backups disabled"),
    }

    let app = build_router(state);
    match &config.tls {
        Some(tls) => {
            let rustls_config = load_tls(tls)?;
            let addr = resolve_listen(&config.listen)?;
            tracing::info!("Listening for HTTPS on '{}'", config.base_url());
            axum_server::bind_rustls(addr, RustlsConfig::from_config(Arc::new(rustls_config)))
                .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                .await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(config.listen.as_str()).await?;
            tracing::info!("Listening for HTTP on '{}'", config.base_url());
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        }
    }

    Ok(())
}

/// Build the rustls server config: TLS 1.2 minimum, preferring the
/// strongest supported NIST curves before x25519.
fn load_tls(tls: &TlsConfig) -> Result<rustls::ServerConfig, Box<dyn std::error::Error>> {
    let mut cert_reader = BufReader::new(File::open(&tls.cert)?);
    let certs = rustls_pemfile::certs(&mut cert_reader).collect::<Result<Vec<_>, _>>()?;

    let mut key_reader = BufReader::new(File::open(&tls.key)?);
    let key = rustls_pemfile::private_key(&mut key_reader)?
        .ok_or("no private key found in key file")?;

    let mut provider = rustls::crypto::ring::default_provider();
    provider.kx_groups = vec![
        rustls::crypto::ring::kx_group::SECP384R1,
        rustls::crypto::ring::kx_group::SECP256R1,
        rustls::crypto::ring::kx_group::X25519,
    ];

    let config = rustls::ServerConfig::builder_with_provider(Arc::new(provider))
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    Ok(config)
}

fn resolve_listen(listen: &str) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    use std::net::ToSocketAddrs;
    listen
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| format!("listen address {listen:?} did not resolve").into())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "ctrl-c handler failed");
        return;
    }
    tracing::info!("Shutting down");
}
