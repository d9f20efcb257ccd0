//! Shared utilities for the banter relay.
//!
//! Holds the pieces both the server and its tests need: a clock abstraction
//! so timestamps can be pinned in tests, and tracing setup for binaries.

pub mod logger;
pub mod time;
