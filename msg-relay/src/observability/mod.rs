//! Structured logging vocabulary.
//!
//! Library code only emits `tracing` events using these names; installing a subscriber is left
//! to binaries and tests.

pub mod events;
pub mod fields;
