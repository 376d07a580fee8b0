//! Error types for identity scopes.

use thiserror::Error;

/// Errors raised while establishing or reading an identity scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// A missing or invalid identity was supplied, or an effective identity
    /// was required but none is in force.
    #[error("authentication failure: {0}")]
    AuthenticationFailure(String),

    /// The identity service was used before it was initialized, or a scope
    /// operation was called in a state that does not allow it.
    #[error("illegal state: {0}")]
    IllegalState(String),
}

impl IdentityError {
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::AuthenticationFailure(message.into())
    }

    #[must_use]
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState(message.into())
    }
}
