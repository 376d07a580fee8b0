use crate::identity::Identity;

/// `IdentityContext` holds the real/effective identity pair of one execution
/// scope.
///
/// The real identity is the one established by authentication. The effective
/// identity is the one permission checks run as; it differs from the real
/// identity while a run-as override is in force. A context is valid only when
/// an effective identity is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityContext {
    real: Option<Identity>,
    effective: Option<Identity>,
}

impl IdentityContext {
    /// Context where both identities are `identity`.
    #[must_use]
    pub fn authenticated(identity: Identity) -> Self {
        Self {
            real: Some(identity.clone()),
            effective: Some(identity),
        }
    }

    #[must_use]
    pub fn real(&self) -> Option<&Identity> {
        self.real.as_ref()
    }

    #[must_use]
    pub fn effective(&self) -> Option<&Identity> {
        self.effective.as_ref()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.effective.is_some()
    }

    /// Whether the effective identity differs from the real one.
    #[must_use]
    pub fn is_run_as(&self) -> bool {
        self.real != self.effective
    }

    pub(crate) fn set_real(&mut self, identity: Identity) {
        self.real = Some(identity);
    }

    pub(crate) fn set_effective(&mut self, identity: Identity) {
        self.effective = Some(identity);
    }
}

/// Tenant domain explicitly associated with a scope.
///
/// Tracked apart from [`IdentityContext`] because it is cleared on its own
/// (e.g. [`crate::ContextManager::clear_tenant`]) and may be set without any
/// identity in force.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantState {
    domain: Option<String>,
}

impl TenantState {
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
        }
    }

    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.domain.is_some()
    }

    pub(crate) fn set(&mut self, domain: impl Into<String>) {
        self.domain = Some(domain.into());
    }

    pub(crate) fn clear(&mut self) {
        self.domain = None;
    }
}

/// Saved `(real, effective, tenant)` triple of a scope.
///
/// Produced by [`crate::ContextManager::snapshot`] and by `push`; restoring it
/// puts the scope back exactly as it was, including "no context".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextSnapshot {
    pub(crate) context: Option<IdentityContext>,
    pub(crate) tenant: TenantState,
}

impl ContextSnapshot {
    #[must_use]
    pub fn real(&self) -> Option<&Identity> {
        self.context.as_ref().and_then(IdentityContext::real)
    }

    #[must_use]
    pub fn effective(&self) -> Option<&Identity> {
        self.context.as_ref().and_then(IdentityContext::effective)
    }

    #[must_use]
    pub fn tenant(&self) -> Option<&str> {
        self.tenant.domain()
    }
}
