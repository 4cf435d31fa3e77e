//! Network transport layer for trackgate.
//!
//! Provides the device-facing TCP server: accept loop, one task per
//! connection, codec wiring and idle-timeout handling. Everything above
//! the socket — dispatch rules, events, sinks — lives in
//! `trackgate-session`; everything below — framing, decoding, response
//! sealing — in `trackgate-protocol`.

mod server;

pub use server::{TcpServerConfig, TcpServerError, TrackerServer};
