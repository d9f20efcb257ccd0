//! Real-time WebSocket message relay.
//!
//! Clients connect over WebSocket, submit text messages, and receive every
//! message submitted by any connected client in the order the server
//! observes them. Messages are persisted to a store so a newly joining
//! client is shown prior history first.
//!
//! The moving parts: a [`registry::ConnectionRegistry`] tracks live
//! connections, every session feeds one [`dispatcher`] task through the
//! distribution queue, and persistence runs fire-and-forget beside the
//! broadcast path.

pub mod dispatcher;
pub mod domain;
pub mod handler;
pub mod registry;
pub mod state;
pub mod store;
pub mod wire;

mod runner;
mod signal;

pub use runner::{build_app, run_server};
