//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and behind the `test-support` feature.

mod clock;
mod marketplace;

pub use clock::FixedClock;
pub use marketplace::{
    Marketplace, SeededCourse, TEST_PAYMENT_SECRET, seeded_at, signed_confirmation, verifier,
};
