//! Auxiliary-port byte relay.
//!
//! Each peer of an accepted transfer opens a fresh TCP connection here and
//! writes a 37-byte header: the 36 ASCII bytes of the transfer UUID plus one
//! role byte (`'s'` or `'r'`). Halves may arrive in either order; the second
//! arrival streams the sender's remaining bytes straight into the receiver's
//! socket. Nothing is buffered beyond the copy window and the server never
//! inspects the bytes.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time;

use parley_proto::payload::TransferRole;

use crate::transfer::broker::BindOutcome;
use crate::AppState;

const UUID_LEN: usize = 36;
const HEADER_LEN: usize = UUID_LEN + 1;

/// Why a relay connection was closed without (or mid-) copy. All of these
/// tear down the offending socket only; the control session is untouched.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("relay header is not a canonical UUID")]
    MalformedUuid,
    #[error("unknown relay role byte {0:#04x}")]
    UnknownRole(u8),
    #[error("no transfer context for {0}")]
    UnknownTransfer(String),
    #[error("role already bound for {0}")]
    DuplicateRole(String),
}

/// Accept loop for the auxiliary port. One task per connection.
pub async fn run(state: AppState, listener: TcpListener) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle(state, stream).await {
                        tracing::debug!(error = %e, %peer, "relay connection closed");
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "relay accept failed");
            }
        }
    }
}

/// Handles one half-session: header, rendezvous, and (for the second
/// arrival) the copy itself.
async fn handle(state: AppState, mut stream: TcpStream) -> Result<(), RelayError> {
    let mut header = [0u8; HEADER_LEN];
    time::timeout(state.config.relay_ttl, stream.read_exact(&mut header))
        .await
        .map_err(|_| io::Error::from(io::ErrorKind::TimedOut))??;

    let uuid = std::str::from_utf8(&header[..UUID_LEN]).map_err(|_| RelayError::MalformedUuid)?;
    uuid::Uuid::try_parse(uuid).map_err(|_| RelayError::MalformedUuid)?;
    let role_byte = header[UUID_LEN];
    let role = TransferRole::from_byte(role_byte).ok_or(RelayError::UnknownRole(role_byte))?;

    let Some(context) = state.transfers.context(uuid) else {
        return Err(RelayError::UnknownTransfer(uuid.to_string()));
    };

    match context.bind(role, stream) {
        // First half parked; the other half's task will run the copy.
        BindOutcome::Parked => Ok(()),
        BindOutcome::Rejected => Err(RelayError::DuplicateRole(uuid.to_string())),
        BindOutcome::Ready {
            mut sender,
            mut receiver,
        } => {
            let copied = tokio::io::copy(&mut sender, &mut receiver).await;
            state.transfers.finish(uuid);
            let copied = copied?;
            // Propagate the sender's EOF so the receiver stops reading.
            receiver.shutdown().await?;
            tracing::debug!(uuid, bytes = copied, "relay transfer complete");
            Ok(())
        }
    }
}
