//! Ticket id derivation.
//!
//! An id is the hex digest of `(expiry mode, expiry-or-issue instant, user
//! name, random UUID)`. Digest providers are tried in configured order; when
//! none is available the id falls back to a CRC32 checksum, so deriving an id
//! never fails.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ticket_store_sdk::ExpiryMode;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

/// Digest algorithms that can appear in the configured chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestAlgorithm {
    Sha256,
    Xxh3,
}

impl DigestAlgorithm {
    #[must_use]
    pub fn provider(self) -> Box<dyn DigestProvider> {
        match self {
            Self::Sha256 => Box::new(Sha256Digest),
            Self::Xxh3 => Box::new(Xxh3Digest),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("digest algorithm '{0}' is not available")]
pub struct DigestUnavailable(pub &'static str);

/// One link of the fallback chain.
pub trait DigestProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Digest of `input`.
    ///
    /// # Errors
    ///
    /// Returns `DigestUnavailable` if the algorithm is not compiled in.
    fn digest(&self, input: &[u8]) -> Result<Vec<u8>, DigestUnavailable>;
}

/// SHA-256, available with the `digest-sha256` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digest;

impl DigestProvider for Sha256Digest {
    fn name(&self) -> &'static str {
        "sha256"
    }

    #[cfg(feature = "digest-sha256")]
    fn digest(&self, input: &[u8]) -> Result<Vec<u8>, DigestUnavailable> {
        use sha2::{Digest as _, Sha256};
        Ok(Sha256::digest(input).to_vec())
    }

    #[cfg(not(feature = "digest-sha256"))]
    fn digest(&self, _input: &[u8]) -> Result<Vec<u8>, DigestUnavailable> {
        Err(DigestUnavailable(self.name()))
    }
}

/// 128-bit XXH3, available with the `digest-xxh3` feature. Not
/// cryptographic; a weaker second choice.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh3Digest;

impl DigestProvider for Xxh3Digest {
    fn name(&self) -> &'static str {
        "xxh3"
    }

    #[cfg(feature = "digest-xxh3")]
    fn digest(&self, input: &[u8]) -> Result<Vec<u8>, DigestUnavailable> {
        Ok(xxhash_rust::xxh3::xxh3_128(input).to_be_bytes().to_vec())
    }

    #[cfg(not(feature = "digest-xxh3"))]
    fn digest(&self, _input: &[u8]) -> Result<Vec<u8>, DigestUnavailable> {
        Err(DigestUnavailable(self.name()))
    }
}

pub struct TicketIdGenerator {
    providers: Vec<Box<dyn DigestProvider>>,
}

impl TicketIdGenerator {
    #[must_use]
    pub fn new(providers: Vec<Box<dyn DigestProvider>>) -> Self {
        Self { providers }
    }

    #[must_use]
    pub fn from_chain(chain: &[DigestAlgorithm]) -> Self {
        Self::new(chain.iter().copied().map(DigestAlgorithm::provider).collect())
    }

    /// Generator that always uses the CRC32 fallback.
    #[must_use]
    pub fn checksum_only() -> Self {
        Self::new(Vec::new())
    }

    /// Derive a fresh id. `instant` is the expiry instant, or the issue
    /// instant for tickets that do not expire.
    #[must_use]
    pub fn generate(&self, mode: ExpiryMode, instant: OffsetDateTime, user_name: &str) -> String {
        let input = format!(
            "{mode}{}{user_name}{}",
            instant.unix_timestamp_nanos(),
            Uuid::new_v4()
        );
        hex::encode(self.digest(input.as_bytes()))
    }

    fn digest(&self, input: &[u8]) -> Vec<u8> {
        for provider in &self.providers {
            match provider.digest(input) {
                Ok(bytes) => return bytes,
                Err(e) => debug!(error = %e, "falling back to next ticket digest"),
            }
        }
        crc32fast::hash(input).to_be_bytes().to_vec()
    }
}

impl fmt::Debug for TicketIdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("TicketIdGenerator")
            .field("providers", &names)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct Unavailable;

    impl DigestProvider for Unavailable {
        fn name(&self) -> &'static str {
            "unavailable"
        }

        fn digest(&self, _input: &[u8]) -> Result<Vec<u8>, DigestUnavailable> {
            Err(DigestUnavailable(self.name()))
        }
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    #[test]
    #[cfg(feature = "digest-sha256")]
    fn sha256_produces_64_hex_chars() {
        let generator = TicketIdGenerator::from_chain(&[DigestAlgorithm::Sha256]);

        let id = generator.generate(ExpiryMode::Inactivity, now(), "alice");

        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    #[cfg(feature = "digest-xxh3")]
    fn unavailable_provider_falls_through_to_next() {
        let providers: Vec<Box<dyn DigestProvider>> =
            vec![Box::new(Unavailable), DigestAlgorithm::Xxh3.provider()];
        let generator = TicketIdGenerator::new(providers);

        let id = generator.generate(ExpiryMode::FixedTime, now(), "alice");

        assert_eq!(id.len(), 32);
    }

    #[test]
    fn final_fallback_is_crc32_hex() {
        let providers: Vec<Box<dyn DigestProvider>> =
            vec![Box::new(Unavailable), Box::new(Unavailable)];
        let generator = TicketIdGenerator::new(providers);

        let id = generator.generate(ExpiryMode::NeverExpire, now(), "alice");

        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ids_are_unique_for_same_metadata() {
        let generator =
            TicketIdGenerator::from_chain(&[DigestAlgorithm::Sha256, DigestAlgorithm::Xxh3]);

        let ids: HashSet<String> = (0..100)
            .map(|_| generator.generate(ExpiryMode::Inactivity, now(), "alice"))
            .collect();

        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn debug_lists_provider_names() {
        let generator = TicketIdGenerator::from_chain(&[DigestAlgorithm::Xxh3]);

        assert_eq!(
            format!("{generator:?}"),
            "TicketIdGenerator { providers: [\"xxh3\"] }"
        );
    }
}
