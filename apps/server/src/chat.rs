//! Chat routing: BROADCAST, LIST, and PRIVATE_MSG.

use parley_proto::payload::{
    Broadcast, BroadcastReq, ListResp, PrivateMsg, PrivateMsgReq, StatusResp,
};
use parley_proto::{codes, encode, Command};

use crate::session::Session;

impl Session {
    /// Fan the message out to every other named session; the author only
    /// gets the acknowledgement.
    pub(crate) fn handle_broadcast(&self, req: BroadcastReq) {
        let Some(username) = self.username() else {
            self.send(
                Command::BroadcastResp,
                &StatusResp::error(codes::BROADCAST_UNAUTHENTICATED),
            );
            return;
        };

        let event = encode(
            Command::Broadcast,
            &Broadcast {
                username: username.to_string(),
                message: req.message,
            },
        );
        self.state.registry.broadcast_except(username, &event);
        self.send(Command::BroadcastResp, &StatusResp::ok());
    }

    /// Snapshot of every named session, requester included.
    pub(crate) fn handle_list(&self) {
        if self.username().is_none() {
            self.send(
                Command::ListResp,
                &ListResp::error(codes::LIST_UNAUTHENTICATED),
            );
            return;
        }
        self.send(
            Command::ListResp,
            &ListResp::ok(self.state.registry.usernames()),
        );
    }

    pub(crate) fn handle_private_msg(&self, req: PrivateMsgReq) {
        let Some(username) = self.username() else {
            self.send(
                Command::PrivateMsgResp,
                &StatusResp::error(codes::PRIVATE_UNAUTHENTICATED),
            );
            return;
        };
        if req.receiver == username {
            self.send(
                Command::PrivateMsgResp,
                &StatusResp::error(codes::PRIVATE_SELF),
            );
            return;
        }

        let message = encode(
            Command::PrivateMsg,
            &PrivateMsg {
                sender: username.to_string(),
                message: req.message,
            },
        );
        if self.state.registry.send_to(&req.receiver, message) {
            self.send(Command::PrivateMsgResp, &StatusResp::ok());
        } else {
            self.send(
                Command::PrivateMsgResp,
                &StatusResp::error(codes::PRIVATE_UNKNOWN_RECEIVER),
            );
        }
    }
}
