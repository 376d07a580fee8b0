use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::config::IdentityConfig;
use crate::error::IdentityError;
use crate::manager::ContextManager;
use crate::tenant::TenantResolver;

/// Base admin and guest names, fixed at initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultNames {
    pub admin: String,
    pub guest: String,
}

/// `IdentityService` is the process-wide side of identity management.
///
/// It owns the configuration, the tenant resolver and the default
/// admin/guest names, and hands out one [`ContextManager`] per execution
/// scope. The scopes themselves are never shared.
#[derive(Debug)]
pub struct IdentityService {
    config: IdentityConfig,
    resolver: TenantResolver,
    names: OnceLock<DefaultNames>,
}

impl IdentityService {
    /// Create an uninitialized service. Canonical admin/guest name lookups
    /// fail until [`IdentityService::initialize`] runs.
    #[must_use]
    pub fn new(config: IdentityConfig) -> Arc<Self> {
        Arc::new(Self {
            resolver: TenantResolver::new(config.multi_tenancy_enabled),
            config,
            names: OnceLock::new(),
        })
    }

    /// Fix the default admin/guest names. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if a configured default name is blank.
    pub fn initialize(&self) -> Result<(), IdentityError> {
        if self.names.get().is_some() {
            return Ok(());
        }
        let admin = self.config.default_admin_user_name.trim();
        let guest = self.config.default_guest_user_name.trim();
        if admin.is_empty() || guest.is_empty() {
            return Err(IdentityError::illegal_state(
                "default admin and guest user names must not be blank",
            ));
        }
        let names = DefaultNames {
            admin: admin.to_owned(),
            guest: guest.to_owned(),
        };
        if self.names.set(names).is_ok() {
            info!(
                multi_tenancy = self.config.multi_tenancy_enabled,
                "identity service initialized"
            );
        }
        Ok(())
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.names.get().is_some()
    }

    /// Default names, or `IllegalState` before initialization.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if the service has not been initialized.
    pub fn default_names(&self) -> Result<&DefaultNames, IdentityError> {
        self.names
            .get()
            .ok_or_else(|| IdentityError::illegal_state("identity service is not initialized"))
    }

    #[must_use]
    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    #[must_use]
    pub fn tenant_resolver(&self) -> TenantResolver {
        self.resolver
    }

    /// Start a new, empty execution scope.
    #[must_use]
    pub fn scope(self: &Arc<Self>) -> ContextManager {
        ContextManager::new(Arc::clone(self))
    }
}
