//! Domain layer for the ticket store.

pub mod cache;
pub mod clock;
pub mod expiry;
pub mod id_generator;
pub mod login;
pub mod service;

pub use cache::InMemoryTicketCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use id_generator::{DigestAlgorithm, DigestProvider, DigestUnavailable, TicketIdGenerator};
pub use login::TicketLogin;
pub use service::TicketStore;
