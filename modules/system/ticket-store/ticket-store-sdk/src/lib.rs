//! Ticket store SDK
//!
//! This crate provides the public API for the `ticket_store` module:
//!
//! - [`TicketStoreClient`] - Public API trait for consumers
//! - [`TicketCache`] - Storage contract the store is built on
//! - [`Ticket`] / [`ExpiryMode`] - Ticket model
//! - [`TicketStoreError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use ticket_store_sdk::TicketStoreClient;
//!
//! let ticket = store.issue("alice");
//! let user = store.validate(&ticket.wire_form())?;
//! ```

pub mod api;
pub mod cache;
pub mod error;
pub mod models;

// Re-export main types at crate root
pub use api::TicketStoreClient;
pub use cache::TicketCache;
pub use error::TicketStoreError;
pub use models::{ExpiryMode, TICKET_PREFIX, Ticket, ticket_key};
