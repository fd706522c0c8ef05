//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **razorpay**: reqwest-backed payment gateway client
//! - **mail**: log-only mail transport
//! - **memory**: process-local resource store, media store and outbox
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod mail;
pub mod memory;
pub mod razorpay;
