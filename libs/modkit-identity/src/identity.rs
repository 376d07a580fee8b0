use std::collections::BTreeSet;
use std::fmt;

use crate::constants::{ALL_AUTHORITIES, SYSTEM_USER_NAME};

/// `Identity` is an authenticated principal: a user name plus the authorities
/// granted to it.
///
/// Values are immutable once built. Scopes hold them as the "real" identity
/// (who logged in) and the "effective" identity (who permission checks run
/// as), see [`crate::ContextManager`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Identity {
    /// Principal name. May carry a tenant suffix (`alice@acme`).
    name: String,
    /// Granted authorities. `"*"` means unrestricted.
    #[serde(default)]
    authorities: BTreeSet<String>,
}

impl Identity {
    /// Create an identity with the given name and authorities.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            authorities: authorities.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an identity with no authorities.
    #[must_use]
    pub fn user(name: impl Into<String>) -> Self {
        Self::new(name, std::iter::empty::<String>())
    }

    #[must_use]
    pub fn builder(name: impl Into<String>) -> IdentityBuilder {
        IdentityBuilder {
            name: name.into(),
            authorities: BTreeSet::new(),
        }
    }

    /// The internal system principal. Holds every authority.
    #[must_use]
    pub fn system() -> Self {
        Self::new(SYSTEM_USER_NAME, [ALL_AUTHORITIES])
    }

    /// A guest principal. Guests are granted nothing.
    #[must_use]
    pub fn guest(name: impl Into<String>) -> Self {
        Self::user(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn authorities(&self) -> &BTreeSet<String> {
        &self.authorities
    }

    /// Whether this identity was granted `authority`, directly or through
    /// the unrestricted `"*"` authority.
    #[must_use]
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(ALL_AUTHORITIES) || self.authorities.contains(authority)
    }

    #[must_use]
    pub fn is_system(&self) -> bool {
        self.name == SYSTEM_USER_NAME
    }

    /// A name is required for an identity to be placed in a scope.
    pub(crate) fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub struct IdentityBuilder {
    name: String,
    authorities: BTreeSet<String>,
}

impl IdentityBuilder {
    #[must_use]
    pub fn authority(mut self, authority: impl Into<String>) -> Self {
        self.authorities.insert(authority.into());
        self
    }

    #[must_use]
    pub fn authorities<I, S>(mut self, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authorities.extend(authorities.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn build(self) -> Identity {
        Identity {
            name: self.name,
            authorities: self.authorities,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn system_identity_holds_every_authority() {
        let system = Identity::system();

        assert!(system.is_system());
        assert_eq!(system.name(), SYSTEM_USER_NAME);
        assert!(system.has_authority("ROLE_ADMINISTRATOR"));
        assert!(system.has_authority("anything"));
    }

    #[test]
    fn guest_identity_has_no_authorities() {
        let guest = Identity::guest("guest");

        assert!(!guest.is_system());
        assert!(guest.authorities().is_empty());
        assert!(!guest.has_authority("GROUP_EVERYONE"));
    }

    #[test]
    fn builder_collects_authorities() {
        let identity = Identity::builder("alice")
            .authority("ROLE_EDITOR")
            .authorities(["GROUP_EVERYONE", "ROLE_EDITOR"])
            .build();

        assert_eq!(identity.name(), "alice");
        assert_eq!(identity.authorities().len(), 2);
        assert!(identity.has_authority("ROLE_EDITOR"));
        assert!(!identity.has_authority("ROLE_ADMINISTRATOR"));
    }

    #[test]
    fn blank_name_is_invalid() {
        assert!(!Identity::user("").is_valid());
        assert!(!Identity::user("   ").is_valid());
        assert!(Identity::user("bob").is_valid());
    }

    #[test]
    fn identity_serializes_authorities() {
        let identity = Identity::new("alice", ["ROLE_EDITOR"]);

        let json = serde_json::to_string(&identity).unwrap();
        let back: Identity = serde_json::from_str(&json).unwrap();

        assert_eq!(back, identity);
        assert!(json.contains("ROLE_EDITOR"));
    }
}
