//! Control-port half of file transfers: the pending-request list and the
//! minted rendezvous contexts the relay completes.
//!
//! The server never sees file bytes here; it validates requests, mints a
//! transfer UUID on ACCEPT, and tells both peers to meet on the auxiliary
//! port.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::net::TcpStream;
use uuid::Uuid;

use parley_proto::payload::{
    FileTransferReady, FileTransferReq, Status, StatusResp, TransferRole,
};
use parley_proto::{codes, encode, Command};

use crate::session::Session;

/// One FILE_TRANSFER_REQ the receiver has not answered yet. Matched by
/// receiver, oldest first. The response wire carries no other key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransfer {
    pub sender: String,
    pub receiver: String,
    pub filename: String,
    pub checksum: String,
}

#[derive(Default)]
struct Slots {
    sender: Option<TcpStream>,
    receiver: Option<TcpStream>,
    /// Both halves arrived and the copy task owns the streams now.
    launched: bool,
}

/// Rendezvous record for one transfer UUID. The first half-session to reach
/// the relay parks its stream here; the second takes both and runs the copy.
pub struct TransferContext {
    created_at: Instant,
    slots: Mutex<Slots>,
}

/// What [`TransferContext::bind`] did with an arriving half-session.
pub enum BindOutcome {
    /// First half: the socket now lives in the context.
    Parked,
    /// Second half: both streams handed out; the caller runs the copy.
    Ready {
        sender: TcpStream,
        receiver: TcpStream,
    },
    /// That role is already bound, or the copy already started. The
    /// arriving socket is dropped.
    Rejected,
}

impl TransferContext {
    fn new() -> Self {
        Self {
            created_at: Instant::now(),
            slots: Mutex::new(Slots::default()),
        }
    }

    /// Binds an arriving stream to its role slot. Exactly one sender and one
    /// receiver are accepted per context, in either order.
    pub fn bind(&self, role: TransferRole, stream: TcpStream) -> BindOutcome {
        let mut slots = self.slots.lock();
        if slots.launched {
            return BindOutcome::Rejected;
        }
        let slot = match role {
            TransferRole::Sender => &mut slots.sender,
            TransferRole::Receiver => &mut slots.receiver,
        };
        if slot.is_some() {
            return BindOutcome::Rejected;
        }
        *slot = Some(stream);

        match (slots.sender.take(), slots.receiver.take()) {
            (Some(sender), Some(receiver)) => {
                slots.launched = true;
                BindOutcome::Ready { sender, receiver }
            }
            (sender, receiver) => {
                slots.sender = sender;
                slots.receiver = receiver;
                BindOutcome::Parked
            }
        }
    }

    fn expired(&self, ttl: Duration) -> bool {
        !self.slots.lock().launched && self.created_at.elapsed() > ttl
    }
}

/// Broker state: the ordered pending list and the ongoing-transfer map.
pub struct TransferBroker {
    pending: Mutex<Vec<PendingTransfer>>,
    ongoing: DashMap<String, Arc<TransferContext>>,
}

impl TransferBroker {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            ongoing: DashMap::new(),
        }
    }

    pub fn add_pending(&self, transfer: PendingTransfer) {
        self.pending.lock().push(transfer);
    }

    /// Pops the oldest pending entry addressed to `receiver`.
    pub fn take_pending_for(&self, receiver: &str) -> Option<PendingTransfer> {
        let mut pending = self.pending.lock();
        let index = pending.iter().position(|t| t.receiver == receiver)?;
        Some(pending.remove(index))
    }

    /// Drops every pending entry addressed to a receiver that disconnected.
    pub fn drop_pending_for_receiver(&self, receiver: &str) {
        self.pending.lock().retain(|t| t.receiver != receiver);
    }

    /// Mints an empty context under a fresh canonical UUID.
    pub fn mint(&self) -> String {
        let uuid = Uuid::new_v4().to_string();
        self.ongoing
            .insert(uuid.clone(), Arc::new(TransferContext::new()));
        uuid
    }

    pub fn context(&self, uuid: &str) -> Option<Arc<TransferContext>> {
        self.ongoing.get(uuid).map(|ctx| ctx.value().clone())
    }

    /// Forgets a context once its bytes have been copied (or the copy
    /// failed; either way the UUID is spent).
    pub fn finish(&self, uuid: &str) {
        self.ongoing.remove(uuid);
    }

    /// Removes contexts whose peers never both arrived within `ttl`,
    /// closing any parked socket. Returns how many were dropped.
    pub fn sweep_expired(&self, ttl: Duration) -> usize {
        let before = self.ongoing.len();
        self.ongoing.retain(|_, ctx| !ctx.expired(ttl));
        before - self.ongoing.len()
    }
}

impl Session {
    pub(crate) fn handle_file_transfer_req(&self, req: FileTransferReq) {
        let Some(username) = self.username() else {
            self.send(
                Command::FileTransferResp,
                &StatusResp::error(codes::TRANSFER_UNAUTHENTICATED),
            );
            return;
        };
        if req.receiver == username {
            self.send(
                Command::FileTransferResp,
                &StatusResp::error(codes::TRANSFER_SELF),
            );
            return;
        }
        if !self.state.registry.contains(&req.receiver) {
            self.send(
                Command::FileTransferResp,
                &StatusResp::error(codes::TRANSFER_UNKNOWN_RECEIVER),
            );
            return;
        }

        // The session's authenticated name is authoritative; the payload's
        // `sender` field is not trusted.
        let transfer = PendingTransfer {
            sender: username.to_string(),
            receiver: req.receiver.clone(),
            filename: req.filename.clone(),
            checksum: req.checksum.clone(),
        };
        self.state.transfers.add_pending(transfer.clone());

        self.send(Command::FileTransferResp, &StatusResp::ok());
        self.state.registry.send_to(
            &req.receiver,
            encode(
                Command::FileTransferReq,
                &FileTransferReq {
                    sender: transfer.sender,
                    receiver: transfer.receiver,
                    filename: transfer.filename,
                    checksum: transfer.checksum,
                },
            ),
        );
    }

    pub(crate) fn handle_file_transfer_resp(&self, resp: StatusResp) {
        let Some(username) = self.username() else {
            tracing::debug!("FILE_TRANSFER_RESP from anonymous session ignored");
            return;
        };
        let Some(pending) = self.state.transfers.take_pending_for(username) else {
            tracing::debug!(username, "FILE_TRANSFER_RESP without a pending request");
            return;
        };

        match resp.status {
            Status::Accept => {
                if !self.state.registry.contains(&pending.sender) {
                    tracing::debug!(
                        sender = %pending.sender,
                        "transfer accepted but the sender is gone"
                    );
                    return;
                }
                let uuid = self.state.transfers.mint();
                self.state.registry.send_to(
                    &pending.sender,
                    encode(
                        Command::FileTransferReady,
                        &FileTransferReady {
                            uuid: uuid.clone(),
                            role: TransferRole::Sender,
                            checksum: pending.checksum.clone(),
                            filename: pending.filename.clone(),
                        },
                    ),
                );
                self.send(
                    Command::FileTransferReady,
                    &FileTransferReady {
                        uuid,
                        role: TransferRole::Receiver,
                        checksum: pending.checksum,
                        filename: pending.filename,
                    },
                );
            }
            Status::Decline => {
                self.state
                    .registry
                    .send_to(&pending.sender, encode(Command::FileTransferResp, &StatusResp::declined()));
            }
            _ => {
                tracing::debug!(username, status = ?resp.status, "unhandled transfer response");
            }
        }
    }
}
