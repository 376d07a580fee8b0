//! Configuration for identity scopes.

use std::path::Path;

use anyhow::Context as _;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ADMIN_USER_NAME, DEFAULT_GUEST_USER_NAME, GROUP_EVERYONE};

/// Section name of [`IdentityConfig`] in the layered configuration.
pub const IDENTITY_SECTION: &str = "identity";

/// Identity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    /// Parse tenant suffixes from user names and qualify admin/guest names.
    pub multi_tenancy_enabled: bool,

    /// Base administrator user name.
    pub default_admin_user_name: String,

    /// Base guest user name.
    pub default_guest_user_name: String,

    /// Authorities granted to users without an explicit mapping.
    pub default_authorities: Vec<String>,

    /// Static user-to-authorities mappings.
    pub authorities: Vec<AuthorityMapping>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            multi_tenancy_enabled: false,
            default_admin_user_name: DEFAULT_ADMIN_USER_NAME.to_owned(),
            default_guest_user_name: DEFAULT_GUEST_USER_NAME.to_owned(),
            default_authorities: vec![GROUP_EVERYONE.to_owned()],
            authorities: Vec::new(),
        }
    }
}

/// Maps a user name to the authorities it is granted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorityMapping {
    pub user: String,
    pub authorities: Vec<String>,
}

impl IdentityConfig {
    /// Extract the `identity` section, falling back to defaults for anything
    /// the providers do not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the section does not deserialize.
    pub fn from_figment(figment: &Figment) -> anyhow::Result<Self> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(figment.focus(IDENTITY_SECTION))
            .extract()
            .context("invalid identity configuration")
    }
}

/// Layered configuration source: optional YAML file, then environment
/// variables with `env_prefix` (`__` separates nested keys, e.g.
/// `APP_TICKETS__VALID_DURATION=30m`).
#[must_use]
pub fn layered_figment(path: Option<&Path>, env_prefix: &str) -> Figment {
    let mut figment = Figment::new();
    if let Some(path) = path {
        figment = figment.merge(Yaml::file(path));
    }
    figment.merge(Env::prefixed(env_prefix).split("__"))
}
