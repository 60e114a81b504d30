/**
 * Credential Store
 *
 * Loads and checks the htpasswd-style credential file. The format is one
 * `identity:hash` record per line; `#` comment lines and blank lines are
 * skipped, leading whitespace is trimmed, and everything after the first
 * colon is the bcrypt hash.
 *
 * The store also carries the bootstrap helpers used by gen mode to hash a
 * secret and append a record, so the file format knowledge stays in one
 * place.
 */

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

/// bcrypt cost used when generating new entries.
const GEN_COST: u32 = 11;

/// Errors from loading or extending the credential file
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Reading the credential file failed
    #[error("read credential file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A line was not an `identity:hash` record
    #[error("credential file {path} line {line}: malformed entry")]
    Malformed { path: String, line: usize },

    /// Hashing a new secret failed
    #[error("hash secret: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// Appending a new record failed
    #[error("append to credential file {path}: {source}")]
    Append {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// In-memory identity -> bcrypt hash map, parsed once at startup.
#[derive(Debug, Default)]
pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    /// Load and parse the credential file at `path`.
    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CredentialError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// Parse credential file contents. `origin` names the source in
    /// errors.
    pub fn parse(contents: &str, origin: &str) -> Result<Self, CredentialError> {
        let mut users = HashMap::new();
        for (index, raw) in contents.lines().enumerate() {
            let line = raw.trim_start();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((identity, hash)) = line.split_once(':') else {
                return Err(CredentialError::Malformed {
                    path: origin.to_string(),
                    line: index + 1,
                });
            };
            users.insert(identity.to_string(), hash.to_string());
        }
        Ok(Self { users })
    }

    /// Check a secret against the stored hash for `identity`.
    ///
    /// Unknown identities, wrong secrets, and unparseable stored hashes
    /// all answer `false` - callers cannot tell them apart.
    pub fn verify(&self, identity: &str, secret: &str) -> bool {
        let Some(hash) = self.users.get(identity) else {
            return false;
        };
        bcrypt::verify(secret, hash).unwrap_or(false)
    }

    /// All known identities, in arbitrary order.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// bcrypt-hash a secret for a new credential record.
pub fn hash_secret(secret: &str) -> Result<String, CredentialError> {
    Ok(bcrypt::hash(secret, GEN_COST)?)
}

/// Append an `identity:hash` record, creating the file (mode 0600) if
/// missing.
pub fn append_entry(path: &Path, identity: &str, hash: &str) -> Result<(), CredentialError> {
    let append = |source| CredentialError::Append {
        path: path.display().to_string(),
        source,
    };
    let mut file = open_append_0600(path).map_err(append)?;
    writeln!(file, "{identity}:{hash}").map_err(append)
}

#[cfg(unix)]
fn open_append_0600(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .append(true)
        .create(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_append_0600(path: &Path) -> std::io::Result<std::fs::File> {
    OpenOptions::new().append(true).create(true).open(path)
}
