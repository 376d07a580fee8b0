//! Tenant domain resolution from user names.
//!
//! Multi-tenant user names carry their tenant as a suffix after
//! [`TENANT_SEPARATOR`] (`alice@acme`). Everything else belongs to
//! [`DEFAULT_TENANT`].

use crate::constants::{DEFAULT_TENANT, TENANT_SEPARATOR};

#[derive(Debug, Clone, Copy, Default)]
pub struct TenantResolver {
    multi_tenancy_enabled: bool,
}

impl TenantResolver {
    #[must_use]
    pub fn new(multi_tenancy_enabled: bool) -> Self {
        Self {
            multi_tenancy_enabled,
        }
    }

    #[must_use]
    pub fn multi_tenancy_enabled(&self) -> bool {
        self.multi_tenancy_enabled
    }

    /// Tenant domain implied by `user_name`.
    ///
    /// Only parsed when multi-tenancy is enabled; a single-tenant deployment
    /// keeps e-mail style names (`alice@example.com`) in the default tenant.
    #[must_use]
    pub fn domain_for(&self, user_name: &str) -> String {
        if !self.multi_tenancy_enabled {
            return DEFAULT_TENANT.to_owned();
        }
        match split_user_name(user_name) {
            (_, Some(domain)) if !is_default(domain) => domain.to_owned(),
            _ => DEFAULT_TENANT.to_owned(),
        }
    }

    /// Qualify `base_name` with `domain` (`admin` + `acme` = `admin@acme`).
    ///
    /// Names stay unqualified in single-tenant mode or for the default tenant.
    #[must_use]
    pub fn qualify(&self, base_name: &str, domain: &str) -> String {
        if self.multi_tenancy_enabled && !is_default(domain) {
            format!("{base_name}{TENANT_SEPARATOR}{domain}")
        } else {
            base_name.to_owned()
        }
    }
}

/// Split `name@domain` on the last separator. Empty suffixes are ignored.
#[must_use]
pub fn split_user_name(user_name: &str) -> (&str, Option<&str>) {
    match user_name.rsplit_once(TENANT_SEPARATOR) {
        Some((base, domain)) if !base.is_empty() && !domain.is_empty() => (base, Some(domain)),
        _ => (user_name, None),
    }
}

#[must_use]
pub fn is_default(domain: &str) -> bool {
    domain.is_empty() || domain == DEFAULT_TENANT
}
