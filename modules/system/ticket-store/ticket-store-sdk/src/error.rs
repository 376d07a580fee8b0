//! Error types for the ticket store.

use modkit_identity::IdentityError;
use thiserror::Error;

/// Errors that can occur when using the ticket store API.
///
/// Messages never contain the ticket id.
#[derive(Debug, Error)]
pub enum TicketStoreError {
    /// No ticket is stored under the presented id.
    #[error("ticket not found")]
    NotFound,

    /// The ticket exists but is past its expiry instant.
    #[error("ticket expired")]
    Expired,

    /// Establishing the identity behind a ticket failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}
