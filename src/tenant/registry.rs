/**
 * Handler Registry
 *
 * The set of all tenant handlers, built once at startup and immutable
 * afterwards. Lookups are a linear scan over identity - tenant counts are
 * operator-scale (an htpasswd file), not internet-scale.
 */

use std::path::Path;

use crate::tenant::handler::TenantHandler;

/// Immutable, insertion-ordered collection of tenant handlers.
///
/// Invariant: at most one handler per identity. Duplicate identities are
/// skipped at construction.
pub struct HandlerRegistry {
    handlers: Vec<TenantHandler>,
}

impl HandlerRegistry {
    /// Build one handler per identity, each rooted at `root/<identity>`.
    pub fn for_identities<I>(root: &Path, identities: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut registry = Self { handlers: Vec::new() };
        for identity in identities {
            let identity = identity.into();
            if registry.find(&identity).is_some() {
                continue;
            }
            let tenant_root = root.join(&identity);
            registry.handlers.push(TenantHandler::new(identity, tenant_root));
        }
        registry
    }

    /// Build the single anonymous tenant, rooted at `root` itself. Used
    /// when authentication is disabled.
    pub fn anonymous(root: &Path) -> Self {
        Self {
            handlers: vec![TenantHandler::new("", root.to_path_buf())],
        }
    }

    /// Look up the handler for an identity.
    pub fn find(&self, identity: &str) -> Option<&TenantHandler> {
        self.handlers.iter().find(|h| h.name() == identity)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
