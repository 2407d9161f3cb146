//! Shared test utilities for integration tests
//!
//! Provides a mock feature service, a fast configuration and event helpers.

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod events;
pub mod service;

pub use config::*;
pub use events::*;
pub use service::*;
