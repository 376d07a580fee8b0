//! Per-scope identity state machine.
//!
//! States: no context, authenticated (`real == effective`), and run-as
//! (`real != effective`). `authenticate` enters the authenticated state,
//! `override_identity` moves to run-as, `clear` goes back to no context.
//! `run_scoped`, `run_as_system`, `run_as_tenant` and `push`/`pop` wrap these
//! transitions and always put the previous state back.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, trace};

use crate::constants::{DEFAULT_TENANT, SYSTEM_USER_NAME};
use crate::context::{ContextSnapshot, IdentityContext, TenantState};
use crate::error::IdentityError;
use crate::identity::Identity;
use crate::service::IdentityService;

/// `ContextManager` is the identity state of one execution scope (a request,
/// a job, a task).
///
/// Obtain one from [`IdentityService::scope`] and thread it through the call
/// graph by `&mut`; it is never shared between scopes, so it needs no locks.
#[derive(Debug)]
pub struct ContextManager {
    service: Arc<IdentityService>,
    context: Option<IdentityContext>,
    tenant: TenantState,
    stack: Vec<ContextSnapshot>,
    current_ticket: Option<SecretString>,
}

impl ContextManager {
    #[must_use]
    pub fn new(service: Arc<IdentityService>) -> Self {
        Self {
            service,
            context: None,
            tenant: TenantState::default(),
            stack: Vec::new(),
            current_ticket: None,
        }
    }

    /// Make `identity` both the real and the effective identity of the scope.
    ///
    /// If no tenant is set yet, the tenant implied by the user name is
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailure` if the identity has no name.
    pub fn authenticate(&mut self, identity: Identity) -> Result<Identity, IdentityError> {
        ensure_valid(&identity)?;
        self.ensure_tenant(identity.name());
        self.context = Some(IdentityContext::authenticated(identity.clone()));
        trace!(user = %identity, "scope authenticated");
        Ok(identity)
    }

    /// Replace the effective identity, keeping the real one.
    ///
    /// In a scope with no real identity yet, `identity` also becomes the real
    /// identity: a bare run-as is treated as the scope's login.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailure` if the identity has no name.
    pub fn override_identity(&mut self, identity: Identity) -> Result<Identity, IdentityError> {
        ensure_valid(&identity)?;
        if self.real().is_none() {
            self.ensure_tenant(identity.name());
            let mut ctx = IdentityContext::default();
            ctx.set_real(identity.clone());
            ctx.set_effective(identity.clone());
            self.context = Some(ctx);
            trace!(user = %identity, "run-as bootstrapped the real identity");
        } else if let Some(ctx) = self.context.as_mut() {
            ctx.set_effective(identity.clone());
            trace!(
                real = ctx.real().map(Identity::name),
                effective = %identity,
                "scope run-as"
            );
        }
        Ok(identity)
    }

    #[must_use]
    pub fn real(&self) -> Option<&Identity> {
        self.context.as_ref().and_then(IdentityContext::real)
    }

    #[must_use]
    pub fn effective(&self) -> Option<&Identity> {
        self.context.as_ref().and_then(IdentityContext::effective)
    }

    #[must_use]
    pub fn real_user_name(&self) -> Option<&str> {
        self.real().map(Identity::name)
    }

    #[must_use]
    pub fn effective_user_name(&self) -> Option<&str> {
        self.effective().map(Identity::name)
    }

    /// The effective identity, for code paths that cannot run anonymously.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailure` when no effective identity is in force.
    pub fn require_effective(&self) -> Result<&Identity, IdentityError> {
        self.effective()
            .ok_or_else(|| IdentityError::authentication("no effective identity in scope"))
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.context.as_ref().is_some_and(IdentityContext::is_valid)
    }

    #[must_use]
    pub fn is_run_as_system(&self) -> bool {
        self.effective().is_some_and(Identity::is_system)
    }

    /// Run `work` with `identity` in force and put the previous
    /// `(real, effective, tenant)` back afterwards.
    ///
    /// With no real identity yet, `identity` is authenticated; otherwise it
    /// overrides the effective identity. The previous state is restored when
    /// `work` returns `Ok`, returns `Err`, or panics; errors are returned
    /// unchanged and panics resume unwinding after the restore. The push/pop
    /// stack is put back as it was, so unbalanced pushes or pops inside `work`
    /// do not leak out.
    ///
    /// # Errors
    ///
    /// Returns the error of `work`, or `AuthenticationFailure` (converted into
    /// `E`) if `identity` is invalid.
    pub fn run_scoped<T, E, F>(&mut self, identity: Identity, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<IdentityError>,
    {
        self.with_restore(|scope: &mut Self| -> Result<T, E> {
            if scope.real().is_none() {
                scope.authenticate(identity)?;
            } else {
                scope.override_identity(identity)?;
            }
            work(scope)
        })
    }

    /// [`Self::run_scoped`] as the system identity.
    ///
    /// # Errors
    ///
    /// Returns the error of `work`.
    pub fn run_as_system<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<IdentityError>,
    {
        self.run_scoped(Identity::system(), work)
    }

    /// Run `work` with `domain` as the scope's tenant, then restore the
    /// previous state as [`Self::run_scoped`] does.
    ///
    /// # Errors
    ///
    /// Returns the error of `work`.
    pub fn run_as_tenant<T, E, F>(&mut self, domain: &str, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        self.with_restore(|scope: &mut Self| -> Result<T, E> {
            scope.set_tenant_domain(domain);
            work(scope)
        })
    }

    /// Save the current `(real, effective, tenant)` on the scope's stack.
    pub fn push(&mut self) {
        let snapshot = self.snapshot();
        self.stack.push(snapshot);
        trace!(depth = self.stack.len(), "identity context pushed");
    }

    /// Restore the most recently pushed `(real, effective, tenant)`.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if nothing was pushed.
    pub fn pop(&mut self) -> Result<(), IdentityError> {
        let snapshot = self
            .stack
            .pop()
            .ok_or_else(|| IdentityError::illegal_state("no saved identity context to pop"))?;
        self.restore(snapshot);
        trace!(depth = self.stack.len(), "identity context popped");
        Ok(())
    }

    #[must_use]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Copy of the current `(real, effective, tenant)` triple.
    #[must_use]
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            context: self.context.clone(),
            tenant: self.tenant.clone(),
        }
    }

    /// Put a triple taken by [`Self::snapshot`] back.
    pub fn restore(&mut self, snapshot: ContextSnapshot) {
        self.context = snapshot.context;
        self.tenant = snapshot.tenant;
    }

    /// Drop the identity context, the tenant and the current ticket.
    pub fn clear(&mut self) {
        if let Some(user) = self.real_user_name() {
            debug!(user, "clearing identity context");
        }
        self.context = None;
        self.tenant.clear();
        self.current_ticket = None;
    }

    /// Explicitly set tenant, if any.
    #[must_use]
    pub fn tenant_domain(&self) -> Option<&str> {
        self.tenant.domain()
    }

    pub fn set_tenant_domain(&mut self, domain: impl Into<String>) {
        self.tenant.set(domain);
    }

    pub fn clear_tenant(&mut self) {
        self.tenant.clear();
    }

    /// The scope's tenant: the explicit one, else the one implied by the
    /// effective user, else the default tenant.
    #[must_use]
    pub fn current_domain(&self) -> String {
        if let Some(domain) = self.tenant.domain() {
            return domain.to_owned();
        }
        self.effective_user_name().map_or_else(
            || DEFAULT_TENANT.to_owned(),
            |name| self.service.tenant_resolver().domain_for(name),
        )
    }

    #[must_use]
    pub fn system_user_name(&self) -> &'static str {
        SYSTEM_USER_NAME
    }

    /// Administrator name, qualified with the current tenant in
    /// multi-tenant deployments.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` before the identity service is initialized.
    pub fn admin_user_name(&self) -> Result<String, IdentityError> {
        let names = self.service.default_names()?;
        Ok(self
            .service
            .tenant_resolver()
            .qualify(&names.admin, &self.current_domain()))
    }

    /// Guest name, qualified with the current tenant in multi-tenant
    /// deployments.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` before the identity service is initialized.
    pub fn guest_user_name(&self) -> Result<String, IdentityError> {
        let names = self.service.default_names()?;
        Ok(self
            .service
            .tenant_resolver()
            .qualify(&names.guest, &self.current_domain()))
    }

    /// Ticket associated with this scope by the ticket store.
    #[must_use]
    pub fn current_ticket(&self) -> Option<&SecretString> {
        self.current_ticket.as_ref()
    }

    pub fn set_current_ticket(&mut self, ticket: impl Into<SecretString>) {
        self.current_ticket = Some(ticket.into());
    }

    pub fn clear_current_ticket(&mut self) {
        self.current_ticket = None;
    }

    #[must_use]
    pub fn service(&self) -> &Arc<IdentityService> {
        &self.service
    }

    fn ensure_tenant(&mut self, user_name: &str) {
        if !self.tenant.is_set() {
            let domain = self.service.tenant_resolver().domain_for(user_name);
            self.tenant.set(domain);
        }
    }

    fn with_restore<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.snapshot();
        let saved_stack = self.stack.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(self)));
        self.stack = saved_stack;
        self.restore(saved);
        outcome.unwrap_or_else(|payload| panic::resume_unwind(payload))
    }
}

fn ensure_valid(identity: &Identity) -> Result<(), IdentityError> {
    if identity.is_valid() {
        Ok(())
    } else {
        Err(IdentityError::authentication("identity has no name"))
    }
}
