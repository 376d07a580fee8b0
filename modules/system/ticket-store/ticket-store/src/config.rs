//! Configuration for the ticket store.

use std::time::Duration;

use anyhow::Context as _;
use figment::Figment;
use figment::providers::Serialized;
use serde::{Deserialize, Serialize};
use ticket_store_sdk::ExpiryMode;

use crate::domain::id_generator::DigestAlgorithm;

/// Section name of [`TicketStoreConfig`] in the layered configuration.
pub const TICKETS_SECTION: &str = "tickets";

/// Longest accepted `valid_duration`: 100 years of 365.25 days, as
/// humantime counts them.
pub const MAX_VALID_DURATION: Duration = Duration::from_secs(100 * 31_557_600);

/// Ticket store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)]
pub struct TicketStoreConfig {
    /// When false, tickets are issued without an expiry instant.
    pub tickets_expire: bool,

    /// Expiry policy of newly issued tickets.
    pub expiry_mode: ExpiryMode,

    /// Lifetime of a ticket, and the sliding window of inactivity tickets.
    /// Humantime syntax (`"1h"`, `"10s"`).
    #[serde(with = "humantime_duration")]
    pub valid_duration: Duration,

    /// Tickets are consumed by their first successful validation.
    pub one_off: bool,

    /// Reuse a live ticket of the user instead of issuing a new one.
    pub use_single_ticket_per_user: bool,

    /// Digest algorithms tried in order when deriving ticket ids. A CRC32
    /// checksum is used when none of them is available.
    pub digest_chain: Vec<DigestAlgorithm>,
}

impl Default for TicketStoreConfig {
    fn default() -> Self {
        Self {
            tickets_expire: true,
            expiry_mode: ExpiryMode::Inactivity,
            valid_duration: Duration::from_secs(60 * 60),
            one_off: false,
            use_single_ticket_per_user: true,
            digest_chain: vec![DigestAlgorithm::Sha256, DigestAlgorithm::Xxh3],
        }
    }
}

impl TicketStoreConfig {
    /// Extract the `tickets` section, falling back to defaults for anything
    /// the providers do not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the section does not deserialize, or if
    /// `valid_duration` is zero or longer than [`MAX_VALID_DURATION`].
    pub fn from_figment(figment: &Figment) -> anyhow::Result<Self> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(figment.focus(TICKETS_SECTION))
            .extract()
            .context("invalid ticket store configuration")?;
        config
            .validate()
            .context("invalid ticket store configuration")?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.valid_duration.is_zero(),
            "valid_duration must be greater than zero"
        );
        anyhow::ensure!(
            self.valid_duration <= MAX_VALID_DURATION,
            "valid_duration must not exceed {}",
            humantime::format_duration(MAX_VALID_DURATION)
        );
        Ok(())
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use figment::providers::{Format, Yaml};

    use super::*;

    #[test]
    fn defaults_apply_without_providers() {
        let cfg = TicketStoreConfig::from_figment(&Figment::new()).unwrap();

        assert!(cfg.tickets_expire);
        assert_eq!(cfg.expiry_mode, ExpiryMode::Inactivity);
        assert_eq!(cfg.valid_duration, Duration::from_secs(3600));
        assert!(!cfg.one_off);
        assert!(cfg.use_single_ticket_per_user);
        assert_eq!(
            cfg.digest_chain,
            vec![DigestAlgorithm::Sha256, DigestAlgorithm::Xxh3]
        );
    }

    #[test]
    fn yaml_section_overrides_defaults() {
        let yaml = r"
tickets:
  expiry_mode: AFTER_FIXED_TIME
  valid_duration: 10s
  one_off: true
  digest_chain: [xxh3]
";
        let figment = Figment::new().merge(Yaml::string(yaml));

        let cfg = TicketStoreConfig::from_figment(&figment).unwrap();

        assert_eq!(cfg.expiry_mode, ExpiryMode::FixedTime);
        assert_eq!(cfg.valid_duration, Duration::from_secs(10));
        assert!(cfg.one_off);
        assert!(cfg.tickets_expire);
        assert_eq!(cfg.digest_chain, vec![DigestAlgorithm::Xxh3]);
    }

    #[test]
    fn serializes_durations_in_humantime_form() {
        let json = serde_json::to_value(TicketStoreConfig::default()).unwrap();

        assert_eq!(json["valid_duration"], "1h");
        assert_eq!(json["expiry_mode"], "inactivity");
        assert_eq!(json["digest_chain"], serde_json::json!(["sha256", "xxh3"]));
    }

    #[test]
    fn invalid_duration_is_rejected() {
        let yaml = "tickets:\n  valid_duration: soon\n";
        let figment = Figment::new().merge(Yaml::string(yaml));

        assert!(TicketStoreConfig::from_figment(&figment).is_err());
    }

    #[test]
    fn zero_duration_is_rejected() {
        let figment = Figment::new().merge(Yaml::string("tickets:\n  valid_duration: 0s\n"));

        let err = TicketStoreConfig::from_figment(&figment).unwrap_err();

        assert!(format!("{err:#}").contains("greater than zero"));
    }

    #[test]
    fn out_of_range_duration_is_rejected() {
        let figment =
            Figment::new().merge(Yaml::string("tickets:\n  valid_duration: 20000years\n"));

        let err = TicketStoreConfig::from_figment(&figment).unwrap_err();

        assert!(format!("{err:#}").contains("must not exceed"));
    }

    #[test]
    fn longest_accepted_duration_loads() {
        let figment = Figment::new().merge(Yaml::string("tickets:\n  valid_duration: 100years\n"));

        let cfg = TicketStoreConfig::from_figment(&figment).unwrap();

        assert_eq!(cfg.valid_duration, MAX_VALID_DURATION);
    }
}
