//! Per-connection session: reader loop, dispatch, heartbeat, teardown.

pub mod connection;
pub mod heartbeat;

pub use connection::Session;
