//! Storage contract for issued tickets.

use crate::models::Ticket;

/// Concurrent key-value storage backing the ticket store.
///
/// Keys are bare ticket ids (see [`crate::ticket_key`]). Implementations
/// must be safe for concurrent `get`/`put`/`remove` from many scopes and, for
/// clustered deployments, from many processes. The store performs
/// read-modify-write sequences on top of these calls without any extra
/// locking, so racing renewals or deduplication are resolved by the cache's
/// own last-writer-wins behavior.
pub trait TicketCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Ticket>;

    fn put(&self, key: &str, ticket: Ticket);

    fn remove(&self, key: &str);

    /// Snapshot of the stored keys.
    fn keys(&self) -> Vec<String>;

    fn clear(&self);
}
