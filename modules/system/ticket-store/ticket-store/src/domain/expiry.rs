//! Expiry evaluation and sliding-window renewal.

use std::time::Duration;

use ticket_store_sdk::{ExpiryMode, Ticket};
use time::OffsetDateTime;

/// Outcome of checking a ticket at a given instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// Still valid, nothing to store.
    Unchanged,
    /// Still valid; the renewed ticket must replace the stored one.
    Renewed(Ticket),
    Expired,
}

/// Remaining validity below which an inactivity ticket is renewed on use.
#[must_use]
pub fn renewal_threshold(valid_duration: Duration) -> Duration {
    valid_duration / 2
}

/// Expiry instant `valid_duration` after `now`, clamped to the latest
/// representable instant.
#[must_use]
pub fn expiry_after(now: OffsetDateTime, valid_duration: Duration) -> OffsetDateTime {
    let valid = time::Duration::try_from(valid_duration).unwrap_or(time::Duration::MAX);
    now.saturating_add(valid)
}

/// Check `ticket` at `now`.
///
/// Fixed-time tickets are never renewed. Inactivity tickets are renewed to
/// `now + valid_duration` once less than half of the window remains.
#[must_use]
pub fn refresh(ticket: &Ticket, now: OffsetDateTime) -> Refresh {
    let Some(expires_at) = ticket.expires_at() else {
        return Refresh::Unchanged;
    };
    if now >= expires_at {
        return Refresh::Expired;
    }
    match ticket.expiry_mode() {
        ExpiryMode::Inactivity => {
            // `expires_at > now` here, so the conversion only fails on overflow.
            let remaining = Duration::try_from(expires_at - now).unwrap_or(Duration::MAX);
            if remaining < renewal_threshold(ticket.valid_duration()) {
                let expires_at = expiry_after(now, ticket.valid_duration());
                Refresh::Renewed(ticket.with_expires_at(expires_at))
            } else {
                Refresh::Unchanged
            }
        }
        ExpiryMode::FixedTime | ExpiryMode::NeverExpire => Refresh::Unchanged,
    }
}
