/**
 * Authentication Strategies
 *
 * The closed set of ways a request can prove an identity, behind one
 * `verify(headers) -> identity` interface so the router never inspects
 * auth headers itself.
 *
 * # Strategies
 *
 * - `Disabled` - every request is the anonymous identity (empty string)
 * - `Basic` - standard HTTP Basic credentials
 * - `HeaderPrefix` - any request header whose name starts with `auth`
 *   carries `identity = remainder of the name, secret = value`; meant for
 *   reverse proxies that inject per-user headers. The first matching
 *   header decides the outcome.
 *
 * Header names arrive lowercased from the HTTP stack, so header-mode
 * identities are matched in lowercase. Failures never reveal whether the
 * identity or the secret was wrong.
 */

use std::sync::Arc;

use axum::http::HeaderMap;
use axum_extra::headers::{authorization::Basic, Authorization, HeaderMapExt};

use crate::auth::credentials::CredentialStore;
use crate::error::ServerError;

/// Challenge attached to every 401 response.
pub const BASIC_CHALLENGE: &str = r#"Basic realm="warren""#;

/// Header-name prefix recognized by the header strategy.
pub const HEADER_PREFIX: &str = "auth";

/// One of the three configured ways to resolve a request's identity.
pub enum AuthStrategy {
    /// No authentication; everything maps to the anonymous tenant.
    Disabled,
    /// HTTP Basic against the credential store.
    Basic { store: Arc<CredentialStore> },
    /// Identity smuggled in a header name, secret in its value.
    HeaderPrefix { store: Arc<CredentialStore> },
}

impl AuthStrategy {
    /// Human-readable mode name for startup logging.
    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::Disabled => "none",
            Self::Basic { .. } => "basic",
            Self::HeaderPrefix { .. } => "header",
        }
    }

    /// Resolve the request's identity or reject it.
    ///
    /// # Errors
    ///
    /// `ServerError::Unauthorized` on missing or failed credentials; the
    /// response conversion attaches the Basic challenge.
    pub fn verify(&self, headers: &HeaderMap) -> Result<String, ServerError> {
        match self {
            Self::Disabled => Ok(String::new()),

            Self::Basic { store } => {
                let Some(Authorization(basic)) = headers.typed_get::<Authorization<Basic>>()
                else {
                    return Err(ServerError::Unauthorized);
                };
                if store.verify(basic.username(), basic.password()) {
                    Ok(basic.username().to_string())
                } else {
                    Err(ServerError::Unauthorized)
                }
            }

            Self::HeaderPrefix { store } => {
                for (name, value) in headers.iter() {
                    let Some(identity) = name.as_str().strip_prefix(HEADER_PREFIX) else {
                        continue;
                    };
                    let Ok(secret) = value.to_str() else {
                        return Err(ServerError::Unauthorized);
                    };
                    return if store.verify(identity, secret) {
                        Ok(identity.to_string())
                    } else {
                        Err(ServerError::Unauthorized)
                    };
                }
                Err(ServerError::Unauthorized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::header::{HeaderName, HeaderValue};

    fn store_with(identity: &str, secret: &str) -> Arc<CredentialStore> {
        let hash = bcrypt::hash(secret, 4).unwrap();
        Arc::new(CredentialStore::parse(&format!("{identity}:{hash}"), "test").unwrap())
    }

    #[test]
    fn test_disabled_yields_anonymous_identity() {
        let strategy = AuthStrategy::Disabled;
        let identity = strategy.verify(&HeaderMap::new()).unwrap();
        assert_eq!(identity, "");
    }

    #[test]
    fn test_basic_accepts_valid_credentials() {
        let strategy = AuthStrategy::Basic {
            store: store_with("alice", "opensesame"),
        };

        let mut headers = HeaderMap::new();
        headers.typed_insert(Authorization::basic("alice", "opensesame"));
        assert_eq!(strategy.verify(&headers).unwrap(), "alice");
    }

    #[test]
    fn test_basic_rejects_wrong_secret_and_missing_header() {
        let strategy = AuthStrategy::Basic {
            store: store_with("alice", "opensesame"),
        };

        let mut headers = HeaderMap::new();
        headers.typed_insert(Authorization::basic("alice", "wrong"));
        assert_matches!(strategy.verify(&headers), Err(ServerError::Unauthorized));
        assert_matches!(
            strategy.verify(&HeaderMap::new()),
            Err(ServerError::Unauthorized)
        );
    }

    #[test]
    fn test_header_prefix_extracts_identity_from_name() {
        let strategy = AuthStrategy::HeaderPrefix {
            store: store_with("alice", "opensesame"),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("authalice"),
            HeaderValue::from_static("opensesame"),
        );
        assert_eq!(strategy.verify(&headers).unwrap(), "alice");
    }

    #[test]
    fn test_header_prefix_first_match_decides() {
        let strategy = AuthStrategy::HeaderPrefix {
            store: store_with("alice", "opensesame"),
        };

        // Wrong secret on the matching header: the strategy does not keep
        // scanning for a better one.
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("authalice"),
            HeaderValue::from_static("wrong"),
        );
        assert_matches!(strategy.verify(&headers), Err(ServerError::Unauthorized));
    }

    #[test]
    fn test_header_prefix_ignores_unrelated_headers() {
        let strategy = AuthStrategy::HeaderPrefix {
            store: store_with("alice", "opensesame"),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-forwarded-for"),
            HeaderValue::from_static("10.0.0.1"),
        );
        assert_matches!(strategy.verify(&headers), Err(ServerError::Unauthorized));
    }

    #[test]
    fn test_header_prefix_swallows_standard_authorization() {
        let strategy = AuthStrategy::HeaderPrefix {
            store: store_with("alice", "opensesame"),
        };

        // "authorization" matches the prefix and strips to "orization",
        // which is not a known identity.
        let mut headers = HeaderMap::new();
        headers.typed_insert(Authorization::basic("alice", "opensesame"));
        assert_matches!(strategy.verify(&headers), Err(ServerError::Unauthorized));
    }
}
