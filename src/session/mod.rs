//! Live voice session management
//!
//! This module provides the `SessionController` abstraction that manages:
//! - Microphone capture and wire encoding on the send path
//! - The duplex agent connection and inbound event dispatch
//! - Gapless playback and barge-in flushing on the receive path
//! - Transcript turn collection
//! - Deterministic, idempotent teardown of every owned resource

mod config;
mod controller;
mod stats;

pub use config::{AgentEndpoint, SessionConfig};
pub use controller::{SessionController, SessionState};
pub use stats::SessionStats;
