#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
pub mod authority;
pub mod config;
pub mod constants;
pub mod context;
pub mod diagnostic;
pub mod error;
pub mod identity;
pub mod manager;
pub mod service;
pub mod tenant;

pub use authority::{AuthorityResolver, StaticAuthorityResolver};
pub use config::{AuthorityMapping, IdentityConfig};
pub use context::{ContextSnapshot, IdentityContext, TenantState};
pub use diagnostic::{AuthenticationDiagnostic, DiagnosticStep};
pub use error::IdentityError;
pub use identity::{Identity, IdentityBuilder};
pub use manager::ContextManager;
pub use service::{DefaultNames, IdentityService};
pub use tenant::TenantResolver;
