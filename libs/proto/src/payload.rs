//! Typed JSON payloads, one per verb that carries data.
//!
//! Success responses omit `code`; error responses carry it. Fields that are
//! conditionally present use `Option` + `skip_serializing_if`, with one
//! deliberate exception: `RpsResult::winner` serializes as `null` on a tie.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::rps::Move;

// ---------------------------------------------------------------------------
// Shared shapes
// ---------------------------------------------------------------------------

/// Closed status vocabulary of the `*_RESP` payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Error,
    Accept,
    Decline,
}

/// Empty object body (`{}`): PING, PONG, BYE, LIST_REQ, RPS_READY,
/// RPS_INVITE_DECLINED, UNKNOWN_COMMAND, PARSE_ERROR.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Empty {}

/// Generic `{status, code?}` response body: ENTER_RESP, BROADCAST_RESP,
/// BYE_RESP, PRIVATE_MSG_RESP, RPS_MOVE_RESP, FILE_TRANSFER_RESP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResp {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl StatusResp {
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            code: None,
        }
    }

    pub fn error(code: u16) -> Self {
        Self {
            status: Status::Error,
            code: Some(code),
        }
    }

    /// `{"status":"DECLINE"}`, forwarded to a transfer's sender.
    pub fn declined() -> Self {
        Self {
            status: Status::Decline,
            code: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Session & presence
// ---------------------------------------------------------------------------

/// Server greeting, sent once per connection before any client frame.
#[derive(Debug, Serialize, Deserialize)]
pub struct Ready {
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Enter {
    pub username: String,
}

/// Body of JOINED and LEFT events.
#[derive(Debug, Serialize, Deserialize)]
pub struct Presence {
    pub username: String,
}

/// `{"reason":7000}`, sent before the server closes an unresponsive session.
#[derive(Debug, Serialize, Deserialize)]
pub struct Hangup {
    pub reason: u16,
}

/// `{"code":8000}`: a PONG arrived while no PING was outstanding.
#[derive(Debug, Serialize, Deserialize)]
pub struct PongError {
    pub code: u16,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct BroadcastReq {
    pub message: String,
}

/// Fanned out to every named session except the author.
#[derive(Debug, Serialize, Deserialize)]
pub struct Broadcast {
    pub username: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResp {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<String>>,
}

impl ListResp {
    pub fn ok(clients: Vec<String>) -> Self {
        Self {
            status: Status::Ok,
            code: None,
            clients: Some(clients),
        }
    }

    pub fn error(code: u16) -> Self {
        Self {
            status: Status::Error,
            code: Some(code),
            clients: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrivateMsgReq {
    pub receiver: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrivateMsg {
    pub sender: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Rock-Paper-Scissors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct RpsStartReq {
    pub receiver: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpsStartResp {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// One half of the pair already occupying the table (code 11004 only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player2: Option<String>,
}

impl RpsStartResp {
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            code: None,
            player1: None,
            player2: None,
        }
    }

    pub fn error(code: u16) -> Self {
        Self {
            status: Status::Error,
            code: Some(code),
            player1: None,
            player2: None,
        }
    }

    pub fn conflict(code: u16, player1: String, player2: String) -> Self {
        Self {
            status: Status::Error,
            code: Some(code),
            player1: Some(player1),
            player2: Some(player2),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpsInvite {
    pub sender: String,
}

/// Receiver's answer to an invite: ACCEPT or DECLINE.
#[derive(Debug, Serialize, Deserialize)]
pub struct RpsInviteResp {
    pub status: Status,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpsMoveReq {
    pub choice: Move,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpsResult {
    /// `null` on a tie; always serialized.
    pub winner: Option<String>,
    pub choices: HashMap<String, Move>,
}

// ---------------------------------------------------------------------------
// File transfer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTransferReq {
    pub sender: String,
    pub receiver: String,
    pub filename: String,
    pub checksum: String,
}

/// Which end of the byte relay a peer is, as tagged in the 37-byte
/// auxiliary-port header and in `FILE_TRANSFER_READY.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferRole {
    #[serde(rename = "s")]
    Sender,
    #[serde(rename = "r")]
    Receiver,
}

impl TransferRole {
    /// The single header byte following the UUID on the auxiliary port.
    pub const fn as_byte(self) -> u8 {
        match self {
            TransferRole::Sender => b's',
            TransferRole::Receiver => b'r',
        }
    }

    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b's' => Some(TransferRole::Sender),
            b'r' => Some(TransferRole::Receiver),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileTransferReady {
    pub uuid: String,
    #[serde(rename = "type")]
    pub role: TransferRole,
    pub checksum: String,
    pub filename: String,
}
