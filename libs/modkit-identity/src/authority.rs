//! Authority lookup for users whose identity is re-established from a name
//! alone (e.g. after ticket validation).

use std::collections::{BTreeSet, HashMap};

use crate::config::IdentityConfig;
use crate::constants::SYSTEM_USER_NAME;
use crate::identity::Identity;

/// Resolves the authorities granted to a user name.
///
/// Implementations are external collaborators (a directory, a database);
/// this crate only ships the static, configuration-driven one.
pub trait AuthorityResolver: Send + Sync {
    fn authorities_for(&self, user_name: &str) -> BTreeSet<String>;

    /// Build the full identity for `user_name`.
    fn identity_for(&self, user_name: &str) -> Identity {
        Identity::new(user_name, self.authorities_for(user_name))
    }
}

/// Static user-to-authorities mapping.
///
/// Users without a mapping receive the configured default authorities. The
/// system user always resolves to [`Identity::system`].
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorityResolver {
    defaults: BTreeSet<String>,
    mappings: HashMap<String, BTreeSet<String>>,
}

impl StaticAuthorityResolver {
    #[must_use]
    pub fn from_config(cfg: &IdentityConfig) -> Self {
        let mappings = cfg
            .authorities
            .iter()
            .map(|m| (m.user.clone(), m.authorities.iter().cloned().collect()))
            .collect();

        Self {
            defaults: cfg.default_authorities.iter().cloned().collect(),
            mappings,
        }
    }
}

impl AuthorityResolver for StaticAuthorityResolver {
    fn authorities_for(&self, user_name: &str) -> BTreeSet<String> {
        if user_name == SYSTEM_USER_NAME {
            return Identity::system().authorities().clone();
        }
        self.mappings
            .get(user_name)
            .unwrap_or(&self.defaults)
            .clone()
    }
}
