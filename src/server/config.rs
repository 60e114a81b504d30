/**
 * Server Configuration
 *
 * This module loads and validates all server configuration from
 * environment variables (a `.env` file is honored via `dotenv` before
 * this runs).
 *
 * # Configuration Sources
 *
 * Everything is a `WARREN_*` environment variable with a default that
 * matches a bare local deployment: serve the directory next to the
 * executable, listen on `localhost:8080`, no auth, no TLS, no backups.
 * An empty value counts as unset.
 *
 * # Error Handling
 *
 * Unlike optional runtime services, configuration is validated strictly:
 * an unknown auth mode, a malformed number, or a TLS cert without its key
 * is a `ConfigError` and the server refuses to start.
 */

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::backup::BackupSettings;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A path could not be made absolute
    #[error("resolve path {path}: {source}")]
    Path {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// `WARREN_AUTH` holds something other than none/basic/header
    #[error("unknown auth mode {0:?} (expected none, basic or header)")]
    UnknownAuthMode(String),

    /// A numeric variable failed to parse
    #[error("{var}: invalid value {value:?}: {source}")]
    InvalidNumber {
        var: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Exactly one of the TLS cert/key pair was provided
    #[error("TLS requires both WARREN_TLS_CERT and WARREN_TLS_KEY")]
    TlsHalfConfigured,

    /// Gen mode was requested without the entry to add
    #[error("gen mode requires WARREN_GEN_USER and WARREN_GEN_PASS")]
    GenEntryMissing,

    /// Auth is enabled but the credential file does not exist
    #[error("auth enabled but credential file {path} is missing")]
    CredentialsMissing { path: String },

    /// The credential file exists but could not be loaded
    #[error(transparent)]
    Credentials(#[from] crate::auth::CredentialError),
}

/// How requests are authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// No authentication; a single anonymous tenant.
    Disabled,
    /// HTTP Basic against the credential file.
    Basic,
    /// `auth<identity>: <secret>` request headers against the credential file.
    Header,
}

impl AuthMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AuthMode::Disabled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Disabled => "none",
            AuthMode::Basic => "basic",
            AuthMode::Header => "header",
        }
    }
}

impl std::str::FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(AuthMode::Disabled),
            "basic" => Ok(AuthMode::Basic),
            "header" => Ok(AuthMode::Header),
            other => Err(ConfigError::UnknownAuthMode(other.to_string())),
        }
    }
}

/// TLS material locations; both or neither.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// One-shot credential bootstrap request.
#[derive(Debug, Clone)]
pub struct GenEntry {
    pub identity: String,
    pub secret: String,
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding tenant trees (absolute).
    pub root: PathBuf,
    /// `host:port` to listen on.
    pub listen: String,
    pub auth_mode: AuthMode,
    /// Credential file path (absolute).
    pub credential_file: PathBuf,
    pub tls: Option<TlsConfig>,
    /// Backup knobs; `None` disables the engine entirely.
    pub backups: Option<BackupSettings>,
    /// When set, add this entry to the credential file and exit.
    pub gen: Option<GenEntry>,
}

impl Config {
    /// Load configuration from `WARREN_*` environment variables.
    ///
    /// # Errors
    ///
    /// Any validation failure; see [`ConfigError`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let root = match var("WARREN_DIR") {
            Some(dir) => absolute(Path::new(&dir))?,
            None => absolute(&default_root())?,
        };

        let listen = var("WARREN_LISTEN").unwrap_or_else(|| "localhost:8080".to_string());

        let auth_mode = match var("WARREN_AUTH") {
            Some(mode) => mode.parse()?,
            None => AuthMode::Disabled,
        };

        let credential_file = match var("WARREN_HTPASS") {
            Some(path) => absolute(Path::new(&path))?,
            None => root.join(".htpasswd"),
        };

        let tls = match (var("WARREN_TLS_CERT"), var("WARREN_TLS_KEY")) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::TlsHalfConfigured),
        };

        let backups = if bool_var("WARREN_BACKUP") {
            Some(BackupSettings {
                dir_name: var("WARREN_BACKUP_DIR").unwrap_or_else(|| "backups".to_string()),
                max_files: number_var("WARREN_BACKUP_FILES", 10)?,
                min_age_secs: number_var("WARREN_BACKUP_AGE", 60)?,
                compress: bool_var("WARREN_BACKUP_COMPRESS"),
            })
        } else {
            None
        };

        let gen = if bool_var("WARREN_GEN") {
            match (var("WARREN_GEN_USER"), var("WARREN_GEN_PASS")) {
                (Some(identity), Some(secret)) => Some(GenEntry { identity, secret }),
                _ => return Err(ConfigError::GenEntryMissing),
            }
        } else {
            None
        };

        Ok(Self {
            root,
            listen,
            auth_mode,
            credential_file,
            tls,
            backups,
            gen,
        })
    }

    /// Externally reachable base URL, scheme chosen by TLS presence.
    pub fn base_url(&self) -> String {
        if self.tls.is_some() {
            format!("https://{}", self.listen)
        } else {
            format!("http://{}", self.listen)
        }
    }

    /// Bare filename of the credential file, for request-path screening.
    pub fn credential_filename(&self) -> String {
        self.credential_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".htpasswd".to_string())
    }
}

/// Read a variable, treating empty values as unset.
fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn bool_var(name: &str) -> bool {
    var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn number_var<T: std::str::FromStr<Err = std::num::ParseIntError>>(
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(name) {
        Some(value) => value.parse().map_err(|source| ConfigError::InvalidNumber {
            var: name,
            value,
            source,
        }),
        None => Ok(default),
    }
}

/// Directory of the running executable, `.` when that cannot be resolved.
fn default_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    std::path::absolute(path).map_err(|source| ConfigError::Path {
        path: path.display().to_string(),
        source,
    })
}
