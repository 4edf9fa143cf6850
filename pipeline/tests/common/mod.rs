//! Common test utilities and infrastructure
//!
//! Shared fixtures and an in-memory platform fake used across the pipeline
//! integration test suites.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::{FakePlatform, TestHelpers};
