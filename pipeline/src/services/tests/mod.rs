//! Tests for the collaborator clients
//!
//! Both clients are exercised against a local wiremock server standing in for
//! the remote service.

pub mod openai_classifier;
