//! Numeric error codes carried by `ERROR` responses.
//!
//! The ranges are per-verb: 5xxx login, 6xxx broadcast, 7xxx/8xxx heartbeat,
//! 9xxx list, 10xxx private messages, 11xxx RPS, 13xxx file transfer.

pub const NAME_TAKEN: u16 = 5000;
pub const NAME_INVALID: u16 = 5001;
pub const ALREADY_LOGGED_IN: u16 = 5002;

pub const BROADCAST_UNAUTHENTICATED: u16 = 6000;

/// Reason carried by `HANGUP` when a PONG never arrived.
pub const HEARTBEAT_EXPIRED: u16 = 7000;
/// Code carried by `PONG_ERROR` for a PONG the server never asked for.
pub const UNEXPECTED_PONG: u16 = 8000;

pub const LIST_UNAUTHENTICATED: u16 = 9000;

pub const PRIVATE_UNAUTHENTICATED: u16 = 10001;
pub const PRIVATE_UNKNOWN_RECEIVER: u16 = 10002;
pub const PRIVATE_SELF: u16 = 10003;

pub const RPS_UNAUTHENTICATED: u16 = 11001;
pub const RPS_UNKNOWN_OPPONENT: u16 = 11002;
pub const RPS_SELF: u16 = 11003;
pub const RPS_GAME_ONGOING: u16 = 11004;
pub const RPS_NO_GAME: u16 = 11005;

pub const TRANSFER_UNAUTHENTICATED: u16 = 13000;
pub const TRANSFER_UNKNOWN_RECEIVER: u16 = 13001;
pub const TRANSFER_SELF: u16 = 13002;
