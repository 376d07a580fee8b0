//! Well-known names shared by identity scopes, tenant resolution and tickets.

/// Name of the internal system principal.
pub const SYSTEM_USER_NAME: &str = "System";

/// Authority granting unrestricted access. Mirrors `["*"]` token scopes.
pub const ALL_AUTHORITIES: &str = "*";

/// Default administrator user name when configuration does not override it.
pub const DEFAULT_ADMIN_USER_NAME: &str = "admin";

/// Default guest user name when configuration does not override it.
pub const DEFAULT_GUEST_USER_NAME: &str = "guest";

/// Tenant domain used when a user name carries no tenant suffix.
pub const DEFAULT_TENANT: &str = "default";

/// Separator between a user name and its tenant domain (`alice@acme`).
pub const TENANT_SEPARATOR: char = '@';

/// Authority every authenticated user is granted by the static resolver.
pub const GROUP_EVERYONE: &str = "GROUP_EVERYONE";
