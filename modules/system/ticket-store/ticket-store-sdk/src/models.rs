//! Domain models for the ticket store.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Literal prefix of the ticket wire form (`TICKET_<id>`).
pub const TICKET_PREFIX: &str = "TICKET_";

/// Cache key of a ticket given in wire form or as a bare id.
#[must_use]
pub fn ticket_key(ticket: &str) -> &str {
    ticket.strip_prefix(TICKET_PREFIX).unwrap_or(ticket)
}

/// How a ticket expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryMode {
    /// Valid until a fixed instant; never renewed.
    #[serde(alias = "AFTER_FIXED_TIME")]
    FixedTime,
    /// Sliding window: renewed on use once the remaining validity runs low.
    #[default]
    #[serde(alias = "AFTER_INACTIVITY")]
    Inactivity,
    /// Never expires.
    #[serde(alias = "DO_NOT_EXPIRE")]
    NeverExpire,
}

impl ExpiryMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FixedTime => "AFTER_FIXED_TIME",
            Self::Inactivity => "AFTER_INACTIVITY",
            Self::NeverExpire => "DO_NOT_EXPIRE",
        }
    }
}

impl fmt::Display for ExpiryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A session ticket: an opaque id that maps back to a user name until it
/// expires or is invalidated.
///
/// Tickets are immutable. Renewal produces a new value with the same id and
/// a later expiry instant. The id is a bearer capability, so `Debug` never
/// prints it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    id: String,
    user_name: String,
    expiry_mode: ExpiryMode,
    expires_at: Option<OffsetDateTime>,
    valid_duration: Duration,
}

impl Ticket {
    /// Build a ticket.
    ///
    /// A ticket without an expiry instant never expires, and a
    /// `NeverExpire` ticket carries no expiry instant; the mode and the
    /// instant are normalized to agree.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        user_name: impl Into<String>,
        expiry_mode: ExpiryMode,
        expires_at: Option<OffsetDateTime>,
        valid_duration: Duration,
    ) -> Self {
        let (expiry_mode, expires_at) = match (expiry_mode, expires_at) {
            (ExpiryMode::NeverExpire, _) | (_, None) => (ExpiryMode::NeverExpire, None),
            (mode, Some(at)) => (mode, Some(at)),
        };
        Self {
            id: id.into(),
            user_name: user_name.into(),
            expiry_mode,
            expires_at,
            valid_duration,
        }
    }

    /// Bare id, used as the cache key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wire form handed to clients: [`TICKET_PREFIX`] followed by the id.
    #[must_use]
    pub fn wire_form(&self) -> String {
        format!("{TICKET_PREFIX}{}", self.id)
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    #[must_use]
    pub fn expiry_mode(&self) -> ExpiryMode {
        self.expiry_mode
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.expires_at
    }

    #[must_use]
    pub fn valid_duration(&self) -> Duration {
        self.valid_duration
    }

    /// Whether the ticket is past its expiry instant at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Same ticket with a new expiry instant.
    #[must_use]
    pub fn with_expires_at(&self, expires_at: OffsetDateTime) -> Self {
        Self::new(
            self.id.clone(),
            self.user_name.clone(),
            self.expiry_mode,
            Some(expires_at),
            self.valid_duration,
        )
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket")
            .field("id", &"<redacted>")
            .field("user_name", &self.user_name)
            .field("expiry_mode", &self.expiry_mode)
            .field("expires_at", &self.expires_at)
            .field("valid_duration", &self.valid_duration)
            .finish()
    }
}
