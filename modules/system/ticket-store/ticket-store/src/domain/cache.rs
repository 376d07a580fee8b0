use dashmap::DashMap;
use ticket_store_sdk::{Ticket, TicketCache};

/// Process-local [`TicketCache`] over a `DashMap`.
#[derive(Debug, Default)]
pub struct InMemoryTicketCache {
    entries: DashMap<String, Ticket>,
}

impl InMemoryTicketCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TicketCache for InMemoryTicketCache {
    fn get(&self, key: &str) -> Option<Ticket> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: &str, ticket: Ticket) {
        self.entries.insert(key.to_owned(), ticket);
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    fn clear(&self) {
        self.entries.clear();
    }
}
