#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use modkit_identity::constants::DEFAULT_TENANT;
use modkit_identity::{ContextManager, Identity, IdentityConfig, IdentityError, IdentityService};

fn service(multi_tenancy_enabled: bool) -> Arc<IdentityService> {
    let service = IdentityService::new(IdentityConfig {
        multi_tenancy_enabled,
        ..IdentityConfig::default()
    });
    service.initialize().expect("service initializes");
    service
}

fn scope() -> ContextManager {
    service(true).scope()
}

fn names(scope: &ContextManager) -> (Option<&str>, Option<&str>, Option<&str>) {
    (
        scope.real_user_name(),
        scope.effective_user_name(),
        scope.tenant_domain(),
    )
}

#[derive(Debug, PartialEq, Eq)]
enum WorkError {
    Identity(IdentityError),
    Business(&'static str),
}

impl From<IdentityError> for WorkError {
    fn from(e: IdentityError) -> Self {
        Self::Identity(e)
    }
}

#[test]
fn authenticate_sets_real_and_effective() {
    let mut scope = scope();
    let alice = Identity::new("alice", ["ROLE_EDITOR"]);

    let returned = scope.authenticate(alice.clone()).unwrap();

    assert_eq!(returned, alice);
    assert_eq!(scope.real(), Some(&alice));
    assert_eq!(scope.effective(), Some(&alice));
    assert!(scope.is_authenticated());
}

#[test]
fn override_changes_only_effective() {
    let mut scope = scope();
    let alice = Identity::user("alice");
    let bob = Identity::user("bob");
    let carol = Identity::user("carol");

    scope.authenticate(alice.clone()).unwrap();
    scope.override_identity(bob.clone()).unwrap();
    assert_eq!(scope.real(), Some(&alice));
    assert_eq!(scope.effective(), Some(&bob));

    scope.override_identity(carol.clone()).unwrap();
    assert_eq!(scope.real(), Some(&alice));
    assert_eq!(scope.effective(), Some(&carol));
}

#[test]
fn clear_returns_to_no_context() {
    let mut scope = scope();
    scope.authenticate(Identity::user("alice@acme")).unwrap();
    scope.override_identity(Identity::system()).unwrap();

    scope.clear();

    assert_eq!(names(&scope), (None, None, None));
    assert!(!scope.is_authenticated());
}

#[test]
fn run_scoped_restores_after_success() {
    let mut scope = scope();
    scope.authenticate(Identity::user("alice@acme")).unwrap();
    let before = scope.snapshot();

    let seen: Result<String, WorkError> = scope.run_scoped(Identity::user("bob"), |s| {
        assert_eq!(s.real_user_name(), Some("alice@acme"));
        Ok(s.effective_user_name().unwrap().to_owned())
    });

    assert_eq!(seen.unwrap(), "bob");
    assert_eq!(scope.snapshot(), before);
}

#[test]
fn run_scoped_restores_and_propagates_failure() {
    let mut scope = scope();
    scope.authenticate(Identity::user("alice")).unwrap();
    let before = scope.snapshot();

    let result: Result<(), WorkError> = scope.run_scoped(Identity::system(), |s| {
        s.set_tenant_domain("elsewhere");
        s.override_identity(Identity::user("mallory"))?;
        Err(WorkError::Business("boom"))
    });

    assert_eq!(result, Err(WorkError::Business("boom")));
    assert_eq!(scope.snapshot(), before);
}

#[test]
fn run_scoped_in_bare_scope_authenticates_then_leaves_no_context() {
    let mut scope = scope();

    let result: Result<(Option<String>, Option<String>), WorkError> =
        scope.run_scoped(Identity::user("job@acme"), |s| {
            Ok((
                s.real_user_name().map(str::to_owned),
                s.tenant_domain().map(str::to_owned),
            ))
        });

    let (real, tenant) = result.unwrap();
    assert_eq!(real.as_deref(), Some("job@acme"));
    assert_eq!(tenant.as_deref(), Some("acme"));
    assert_eq!(names(&scope), (None, None, None));
}

#[test]
fn run_scoped_rejects_invalid_identity_without_side_effects() {
    let mut scope = scope();
    scope.authenticate(Identity::user("alice")).unwrap();
    let before = scope.snapshot();

    let result: Result<(), WorkError> = scope.run_scoped(Identity::user(""), |_| Ok(()));

    assert!(matches!(
        result,
        Err(WorkError::Identity(IdentityError::AuthenticationFailure(_)))
    ));
    assert_eq!(scope.snapshot(), before);
}

#[test]
fn run_scoped_restores_when_work_panics() {
    let mut scope = scope();
    scope.authenticate(Identity::user("alice")).unwrap();
    let before = scope.snapshot();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let _: Result<(), WorkError> = scope.run_scoped(Identity::system(), |_| {
            panic!("work failed unexpectedly");
        });
    }));

    assert!(outcome.is_err());
    assert_eq!(scope.snapshot(), before);
}

#[test]
fn nested_run_scoped_unwinds_in_order() {
    let mut scope = scope();
    scope.authenticate(Identity::user("alice")).unwrap();

    let result: Result<(), WorkError> = scope.run_scoped(Identity::user("bob"), |outer| {
        outer.run_scoped::<(), WorkError, _>(Identity::user("carol"), |inner| {
            assert_eq!(inner.effective_user_name(), Some("carol"));
            assert_eq!(inner.real_user_name(), Some("alice"));
            Ok(())
        })?;
        assert_eq!(outer.effective_user_name(), Some("bob"));
        Ok(())
    });

    assert!(result.is_ok());
    assert_eq!(scope.effective_user_name(), Some("alice"));
}

#[test]
fn push_pop_restores_pushed_triple() {
    let mut scope = scope();
    scope.authenticate(Identity::user("alice@acme")).unwrap();
    let pushed = scope.snapshot();

    scope.push();
    scope.override_identity(Identity::system()).unwrap();
    scope.set_tenant_domain("other");
    scope.push();
    scope.clear();
    scope.pop().unwrap();
    assert_eq!(scope.effective_user_name(), Some("System"));
    assert_eq!(scope.tenant_domain(), Some("other"));
    scope.pop().unwrap();

    assert_eq!(scope.snapshot(), pushed);
    assert_eq!(scope.stack_depth(), 0);
}

#[test]
fn pop_without_push_is_illegal() {
    let mut scope = scope();

    assert!(matches!(scope.pop(), Err(IdentityError::IllegalState(_))));
}

#[test]
fn snapshot_restores_across_call_frames() {
    let mut scope = scope();
    scope.authenticate(Identity::user("alice")).unwrap();
    let suspended = scope.snapshot();

    scope.clear();
    scope.authenticate(Identity::user("worker")).unwrap();
    scope.restore(suspended.clone());

    assert_eq!(suspended.real().map(Identity::name), Some("alice"));
    assert_eq!(scope.snapshot(), suspended);
}

#[test]
fn run_as_tenant_scopes_the_tenant() {
    let mut scope = scope();
    scope.authenticate(Identity::user("alice@acme")).unwrap();

    let inside: Result<String, WorkError> =
        scope.run_as_tenant("globex", |s| Ok(s.admin_user_name()?));

    assert_eq!(inside.unwrap(), "admin@globex");
    assert_eq!(scope.tenant_domain(), Some("acme"));
}

#[test]
fn canonical_names_follow_tenant_only_in_multi_tenant_mode() {
    let mut mt = service(true).scope();
    mt.authenticate(Identity::user("alice@acme")).unwrap();
    assert_eq!(mt.admin_user_name().unwrap(), "admin@acme");
    assert_eq!(mt.guest_user_name().unwrap(), "guest@acme");

    let mut st = service(false).scope();
    st.authenticate(Identity::user("alice@acme")).unwrap();
    assert_eq!(st.tenant_domain(), Some(DEFAULT_TENANT));
    assert_eq!(st.admin_user_name().unwrap(), "admin");
    assert_eq!(st.guest_user_name().unwrap(), "guest");
}

#[test]
fn canonical_names_before_initialization_are_illegal_state() {
    let service = IdentityService::new(IdentityConfig::default());
    let scope = service.scope();

    assert!(matches!(
        scope.admin_user_name(),
        Err(IdentityError::IllegalState(_))
    ));
    assert!(matches!(
        scope.guest_user_name(),
        Err(IdentityError::IllegalState(_))
    ));
    assert_eq!(scope.system_user_name(), "System");
}

#[test]
fn scopes_are_independent() {
    let service = service(true);
    let mut first = service.scope();
    let mut second = service.scope();

    first.authenticate(Identity::user("alice")).unwrap();
    second.authenticate(Identity::user("bob")).unwrap();
    first.clear();

    assert!(first.real().is_none());
    assert_eq!(second.real_user_name(), Some("bob"));
}
