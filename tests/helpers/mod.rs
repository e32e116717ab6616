//! Shared helpers for the integration tests.

pub mod definition_fixtures;
pub mod diagnostic_helpers;
pub mod model_helpers;
