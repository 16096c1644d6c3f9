//! The closed verb vocabulary of the control channel.

use std::fmt;

/// Every verb that can lead a control frame, in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Ready,
    Enter,
    EnterResp,
    BroadcastReq,
    BroadcastResp,
    Broadcast,
    Joined,
    Left,
    Bye,
    ByeResp,
    UnknownCommand,
    Ping,
    Pong,
    PongError,
    ParseError,
    Hangup,
    ListReq,
    ListResp,
    PrivateMsgReq,
    PrivateMsgResp,
    PrivateMsg,
    RpsStartReq,
    RpsStartResp,
    RpsInvite,
    RpsInviteResp,
    RpsInviteDeclined,
    RpsReady,
    RpsMoveReq,
    RpsMoveResp,
    RpsResult,
    FileTransferReq,
    FileTransferResp,
    FileTransferReady,
}

impl Command {
    /// The exact wire spelling of this verb.
    pub const fn as_str(self) -> &'static str {
        match self {
            Command::Ready => "READY",
            Command::Enter => "ENTER",
            Command::EnterResp => "ENTER_RESP",
            Command::BroadcastReq => "BROADCAST_REQ",
            Command::BroadcastResp => "BROADCAST_RESP",
            Command::Broadcast => "BROADCAST",
            Command::Joined => "JOINED",
            Command::Left => "LEFT",
            Command::Bye => "BYE",
            Command::ByeResp => "BYE_RESP",
            Command::UnknownCommand => "UNKNOWN_COMMAND",
            Command::Ping => "PING",
            Command::Pong => "PONG",
            Command::PongError => "PONG_ERROR",
            Command::ParseError => "PARSE_ERROR",
            Command::Hangup => "HANGUP",
            Command::ListReq => "LIST_REQ",
            Command::ListResp => "LIST_RESP",
            Command::PrivateMsgReq => "PRIVATE_MSG_REQ",
            Command::PrivateMsgResp => "PRIVATE_MSG_RESP",
            Command::PrivateMsg => "PRIVATE_MSG",
            Command::RpsStartReq => "RPS_START_REQ",
            Command::RpsStartResp => "RPS_START_RESP",
            Command::RpsInvite => "RPS_INVITE",
            Command::RpsInviteResp => "RPS_INVITE_RESP",
            Command::RpsInviteDeclined => "RPS_INVITE_DECLINED",
            Command::RpsReady => "RPS_READY",
            Command::RpsMoveReq => "RPS_MOVE_REQ",
            Command::RpsMoveResp => "RPS_MOVE_RESP",
            Command::RpsResult => "RPS_RESULT",
            Command::FileTransferReq => "FILE_TRANSFER_REQ",
            Command::FileTransferResp => "FILE_TRANSFER_RESP",
            Command::FileTransferReady => "FILE_TRANSFER_READY",
        }
    }

    /// Parses a leading frame token. Returns `None` for anything outside the
    /// closed set; the caller decides how to report it.
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "READY" => Command::Ready,
            "ENTER" => Command::Enter,
            "ENTER_RESP" => Command::EnterResp,
            "BROADCAST_REQ" => Command::BroadcastReq,
            "BROADCAST_RESP" => Command::BroadcastResp,
            "BROADCAST" => Command::Broadcast,
            "JOINED" => Command::Joined,
            "LEFT" => Command::Left,
            "BYE" => Command::Bye,
            "BYE_RESP" => Command::ByeResp,
            "UNKNOWN_COMMAND" => Command::UnknownCommand,
            "PING" => Command::Ping,
            "PONG" => Command::Pong,
            "PONG_ERROR" => Command::PongError,
            "PARSE_ERROR" => Command::ParseError,
            "HANGUP" => Command::Hangup,
            "LIST_REQ" => Command::ListReq,
            "LIST_RESP" => Command::ListResp,
            "PRIVATE_MSG_REQ" => Command::PrivateMsgReq,
            "PRIVATE_MSG_RESP" => Command::PrivateMsgResp,
            "PRIVATE_MSG" => Command::PrivateMsg,
            "RPS_START_REQ" => Command::RpsStartReq,
            "RPS_START_RESP" => Command::RpsStartResp,
            "RPS_INVITE" => Command::RpsInvite,
            "RPS_INVITE_RESP" => Command::RpsInviteResp,
            "RPS_INVITE_DECLINED" => Command::RpsInviteDeclined,
            "RPS_READY" => Command::RpsReady,
            "RPS_MOVE_REQ" => Command::RpsMoveReq,
            "RPS_MOVE_RESP" => Command::RpsMoveResp,
            "RPS_RESULT" => Command::RpsResult,
            "FILE_TRANSFER_REQ" => Command::FileTransferReq,
            "FILE_TRANSFER_RESP" => Command::FileTransferResp,
            "FILE_TRANSFER_READY" => Command::FileTransferReady,
            _ => return None,
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_verb() {
        let all = [
            Command::Ready,
            Command::Enter,
            Command::EnterResp,
            Command::BroadcastReq,
            Command::BroadcastResp,
            Command::Broadcast,
            Command::Joined,
            Command::Left,
            Command::Bye,
            Command::ByeResp,
            Command::UnknownCommand,
            Command::Ping,
            Command::Pong,
            Command::PongError,
            Command::ParseError,
            Command::Hangup,
            Command::ListReq,
            Command::ListResp,
            Command::PrivateMsgReq,
            Command::PrivateMsgResp,
            Command::PrivateMsg,
            Command::RpsStartReq,
            Command::RpsStartResp,
            Command::RpsInvite,
            Command::RpsInviteResp,
            Command::RpsInviteDeclined,
            Command::RpsReady,
            Command::RpsMoveReq,
            Command::RpsMoveResp,
            Command::RpsResult,
            Command::FileTransferReq,
            Command::FileTransferResp,
            Command::FileTransferReady,
        ];
        for cmd in all {
            assert_eq!(Command::from_token(cmd.as_str()), Some(cmd));
        }
    }

    #[test]
    fn rejects_unknown_and_lowercase_tokens() {
        assert_eq!(Command::from_token("MSG"), None);
        assert_eq!(Command::from_token("enter"), None);
        assert_eq!(Command::from_token(""), None);
    }
}
