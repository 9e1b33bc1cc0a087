//! Duplex link to the remote conversational agent
//!
//! This module owns the network half of a live session:
//! - `messages`: the closed tagged unions for both wire directions
//! - `duplex`: the WebSocket client, its handle, and the event channel the
//!   session controller consumes

pub mod duplex;
pub mod messages;

pub use duplex::{
    ClientEvent, ConnectionState, ConnectionStateCell, DuplexConnector, DuplexHandle, Outbound,
    WsConnector,
};
pub use messages::{ClientMessage, ServerEvent};
