//! Deterministic in-process fixtures for authorization tests.
//!
//! Every fixture counts the calls it receives so tests can assert on
//! lookup and verification traffic, not just outcomes.

pub mod fixtures;

pub use fixtures::{FakeInstallationStore, FakeTokenVerifier, LegacyInstallationStore};
