//! Public API trait for the ticket store.

use std::collections::BTreeSet;

use crate::error::TicketStoreError;
use crate::models::Ticket;

/// Public API of the ticket store.
///
/// Request-handling code issues a ticket at login and later turns an inbound
/// ticket back into a user name:
///
/// ```ignore
/// let ticket = tickets.issue("alice");
/// // ... hand ticket.wire_form() to the client ...
/// let user = tickets.validate(&inbound)?;
/// scope.authenticate(authorities.identity_for(&user))?;
/// ```
///
/// Every method accepting a ticket takes either the wire form
/// (`TICKET_<id>`) or the bare id.
pub trait TicketStoreClient: Send + Sync {
    /// Issue a ticket for `user_name`, or reuse a live one when the store
    /// keeps a single ticket per user.
    fn issue(&self, user_name: &str) -> Ticket;

    /// Resolve a ticket to its user name, renewing sliding-window tickets and
    /// consuming one-off tickets.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no ticket is stored under the id
    /// - `Expired` if the ticket is past its expiry instant
    fn validate(&self, ticket: &str) -> Result<String, TicketStoreError>;

    /// Remove a single ticket. Unknown tickets are ignored.
    fn invalidate(&self, ticket: &str);

    /// Remove every ticket of `user_name`; returns how many were removed.
    fn invalidate_for_user(&self, user_name: &str) -> usize;

    /// Remove expired tickets (`expired_only`) or all tickets; returns how
    /// many were removed.
    fn invalidate_all(&self, expired_only: bool) -> usize;

    /// Number of stored tickets, or only the non-expired ones.
    fn count_active(&self, non_expired_only: bool) -> usize;

    /// Users holding a ticket, or only a non-expired one.
    fn list_users(&self, non_expired_only: bool) -> BTreeSet<String>;
}
