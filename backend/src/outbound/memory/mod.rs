//! In-process adapters for local runs and scenario tests.

mod media_store;
mod outbox;
mod resource_store;

pub use media_store::InMemoryMediaStore;
pub use outbox::InMemoryOutbox;
pub use resource_store::{InMemoryResourceStore, StoreCounts};
