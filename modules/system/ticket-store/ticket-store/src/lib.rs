//! Ticket Store Module
//!
//! Issues session tickets for authenticated users, turns inbound tickets
//! back into user names, and renews sliding-window tickets on use. Storage
//! is an external [`ticket_store_sdk::TicketCache`]; [`InMemoryTicketCache`]
//! covers single-process deployments.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::TicketStoreConfig;
pub use domain::{
    Clock, DigestAlgorithm, InMemoryTicketCache, ManualClock, SystemClock, TicketIdGenerator,
    TicketLogin, TicketStore,
};
