//! Domain service for the ticket store.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use modkit_identity::ContextManager;
use secrecy::ExposeSecret as _;
use ticket_store_sdk::{
    ExpiryMode, TICKET_PREFIX, Ticket, TicketCache, TicketStoreClient, TicketStoreError,
    ticket_key,
};
use time::OffsetDateTime;
use tracing::{debug, info};

use super::cache::InMemoryTicketCache;
use super::clock::{Clock, SystemClock};
use super::expiry::{Refresh, expiry_after, refresh};
use super::id_generator::TicketIdGenerator;
use crate::config::TicketStoreConfig;

/// Ticket store service.
///
/// Stateless apart from the backing cache: any number of request scopes may
/// share one instance. Read-modify-write sequences (single-ticket reuse,
/// renewal write-back) are not atomic with respect to the cache; concurrent
/// callers may race and the last write wins.
pub struct TicketStore {
    config: TicketStoreConfig,
    cache: Arc<dyn TicketCache>,
    generator: TicketIdGenerator,
    clock: Arc<dyn Clock>,
}

impl TicketStore {
    #[must_use]
    pub fn new(config: TicketStoreConfig, cache: Arc<dyn TicketCache>) -> Self {
        let generator = TicketIdGenerator::from_chain(&config.digest_chain);
        info!(
            expiry_mode = %config.expiry_mode,
            tickets_expire = config.tickets_expire,
            one_off = config.one_off,
            "ticket store created"
        );
        Self {
            config,
            cache,
            generator,
            clock: Arc::new(SystemClock),
        }
    }

    /// Store backed by a process-local cache.
    #[must_use]
    pub fn in_memory(config: TicketStoreConfig) -> Self {
        Self::new(config, Arc::new(InMemoryTicketCache::new()))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_generator(mut self, generator: TicketIdGenerator) -> Self {
        self.generator = generator;
        self
    }

    #[must_use]
    pub fn config(&self) -> &TicketStoreConfig {
        &self.config
    }

    /// The scope's current ticket for `user_name`, in wire form.
    ///
    /// A current ticket that belongs to another user or no longer validates
    /// is dropped from the scope. When there is none and `auto_create` is
    /// set, a ticket is issued and becomes the scope's current ticket.
    #[tracing::instrument(skip_all, fields(user = %user_name))]
    pub fn current_ticket(
        &self,
        scope: &mut ContextManager,
        user_name: &str,
        auto_create: bool,
    ) -> Option<String> {
        let current = scope
            .current_ticket()
            .map(|t| ticket_key(t.expose_secret()).to_owned());

        if let Some(key) = current {
            let owned = self
                .cache
                .get(&key)
                .is_some_and(|t| t.user_name() == user_name);
            if owned && self.validate(&key).is_ok() {
                return Some(format!("{TICKET_PREFIX}{key}"));
            }
            debug!("dropping stale current ticket");
            scope.clear_current_ticket();
        }

        if !auto_create {
            return None;
        }
        let wire = self.issue(user_name).wire_form();
        scope.set_current_ticket(wire.clone());
        Some(wire)
    }

    /// Forget the scope's current ticket. The ticket itself stays valid.
    #[allow(clippy::unused_self)] // part of the store API alongside `current_ticket`
    pub fn clear_current_ticket(&self, scope: &mut ContextManager) {
        scope.clear_current_ticket();
    }

    fn mint(&self, user_name: &str, now: OffsetDateTime) -> Ticket {
        let mode = if self.config.tickets_expire {
            self.config.expiry_mode
        } else {
            ExpiryMode::NeverExpire
        };
        let expires_at = match mode {
            ExpiryMode::NeverExpire => None,
            ExpiryMode::FixedTime | ExpiryMode::Inactivity => {
                Some(expiry_after(now, self.config.valid_duration))
            }
        };
        let id = self
            .generator
            .generate(mode, expires_at.unwrap_or(now), user_name);
        Ticket::new(id, user_name, mode, expires_at, self.config.valid_duration)
    }

    /// A live ticket of `user_name`, renewed if due.
    fn reuse(&self, user_name: &str, now: OffsetDateTime) -> Option<Ticket> {
        self.scan().find_map(|stored| {
            if stored.user_name() != user_name {
                return None;
            }
            match refresh(&stored, now) {
                Refresh::Unchanged => Some(stored),
                Refresh::Renewed(renewed) => {
                    self.cache.put(renewed.id(), renewed.clone());
                    Some(renewed)
                }
                Refresh::Expired => None,
            }
        })
    }

    /// Remove every stored ticket matching `pred`; returns how many were
    /// removed.
    fn remove_where(&self, pred: impl Fn(&Ticket) -> bool) -> usize {
        let mut removed = 0;
        for ticket in self.scan() {
            if pred(&ticket) {
                self.cache.remove(ticket.id());
                removed += 1;
            }
        }
        removed
    }

    /// Stored tickets. Keys removed between listing and reading are skipped.
    fn scan(&self) -> impl Iterator<Item = Ticket> + '_ {
        self.cache
            .keys()
            .into_iter()
            .filter_map(|key| self.cache.get(&key))
    }

    fn live(&self, non_expired_only: bool) -> impl Iterator<Item = Ticket> + '_ {
        let now = self.clock.now();
        self.scan()
            .filter(move |t| !non_expired_only || !t.is_expired_at(now))
    }
}

impl TicketStoreClient for TicketStore {
    #[tracing::instrument(skip_all, fields(user = %user_name))]
    fn issue(&self, user_name: &str) -> Ticket {
        let now = self.clock.now();

        if self.config.use_single_ticket_per_user
            && let Some(existing) = self.reuse(user_name, now)
        {
            debug!("reusing live ticket");
            return existing;
        }

        let ticket = self.mint(user_name, now);
        self.cache.put(ticket.id(), ticket.clone());
        debug!(expiry_mode = %ticket.expiry_mode(), "ticket issued");
        ticket
    }

    fn validate(&self, ticket: &str) -> Result<String, TicketStoreError> {
        let key = ticket_key(ticket);
        let stored = self.cache.get(key).ok_or(TicketStoreError::NotFound)?;
        let user = stored.user_name().to_owned();

        let renewed = match refresh(&stored, self.clock.now()) {
            Refresh::Expired => {
                debug!(user = %user, "rejected expired ticket");
                return Err(TicketStoreError::Expired);
            }
            Refresh::Renewed(renewed) => Some(renewed),
            Refresh::Unchanged => None,
        };

        if self.config.one_off {
            self.cache.remove(key);
            debug!(user = %user, "one-off ticket consumed");
        } else if let Some(renewed) = renewed {
            self.cache.put(key, renewed);
            debug!(user = %user, "ticket renewed");
        }
        Ok(user)
    }

    fn invalidate(&self, ticket: &str) {
        self.cache.remove(ticket_key(ticket));
    }

    #[tracing::instrument(skip_all, fields(user = %user_name))]
    fn invalidate_for_user(&self, user_name: &str) -> usize {
        let removed = self.remove_where(|t| t.user_name() == user_name);
        debug!(removed, "invalidated tickets of user");
        removed
    }

    fn invalidate_all(&self, expired_only: bool) -> usize {
        let removed = if expired_only {
            let now = self.clock.now();
            self.remove_where(|t| t.is_expired_at(now))
        } else {
            let count = self.cache.keys().len();
            self.cache.clear();
            count
        };
        info!(expired_only, removed, "invalidated tickets");
        removed
    }

    fn count_active(&self, non_expired_only: bool) -> usize {
        self.live(non_expired_only).count()
    }

    fn list_users(&self, non_expired_only: bool) -> BTreeSet<String> {
        self.live(non_expired_only)
            .map(|t| t.user_name().to_owned())
            .collect()
    }
}

impl fmt::Debug for TicketStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketStore")
            .field("config", &self.config)
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}
