//! Per-connection session task.
//!
//! Each accepted control connection runs one instance of [`handle`]: greet
//! with READY, loop over inbound lines with `select!` (reader, ping timer,
//! pong deadline), dispatch frames, and tear the session down when the loop
//! exits for any reason. A dedicated writer task owns the write half and
//! drains the session's outbound channel, so frames never interleave.

use std::net::SocketAddr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use parley_proto::payload::{Empty, Enter, Hangup, PongError, Presence, Ready, StatusResp};
use parley_proto::{codes, decode, encode, Command};

use crate::registry::Outbound;
use crate::session::heartbeat::{Heartbeat, PongOutcome, TickAction};
use crate::AppState;

/// Per-session state shared by the command handlers in `chat`, `rps`, and
/// `transfer::broker`.
pub struct Session {
    pub(crate) state: AppState,
    pub(crate) outbound: Outbound,
    username: Option<String>,
}

impl Session {
    /// The authenticated username, once ENTER has succeeded.
    pub(crate) fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn is_named(&self) -> bool {
        self.username.is_some()
    }

    /// Queues one frame on this session's own socket.
    pub(crate) fn send<T: Serialize>(&self, command: Command, payload: &T) {
        self.outbound.send(encode(command, payload));
    }
}

/// Whether the reader loop keeps going after a frame.
enum Flow {
    Continue,
    Disconnect,
}

/// Drives one control connection from accept to close.
pub async fn handle(state: AppState, stream: TcpStream, peer: SocketAddr) {
    let (read_half, write_half) = stream.into_split();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(write_loop(write_half, rx));

    let mut session = Session {
        state,
        outbound: Outbound::new(tx),
        username: None,
    };

    session.send(
        Command::Ready,
        &Ready {
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    );

    run(&mut session, read_half, peer).await;
    teardown(&mut session);
    tracing::debug!(%peer, "session closed");
}

/// The session event loop: inbound lines, ping ticks, pong deadline.
async fn run(session: &mut Session, read_half: OwnedReadHalf, peer: SocketAddr) {
    let mut lines = BufReader::new(read_half).lines();

    let ping_interval = session.state.config.ping_interval;
    let pong_timeout = session.state.config.pong_timeout;
    let mut ping_timer = time::interval_at(Instant::now() + ping_interval, ping_interval);
    ping_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut heartbeat = Heartbeat::new();
    // Only meaningful while `heartbeat.awaiting_pong()`; the select arm is
    // disabled otherwise.
    let mut pong_deadline = Instant::now();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        let was_named = session.is_named();
                        match dispatch(session, &mut heartbeat, &line) {
                            Flow::Continue => {}
                            Flow::Disconnect => break,
                        }
                        // The first PING fires one interval after login.
                        if !was_named && session.is_named() {
                            ping_timer.reset();
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!(error = %e, %peer, "control read error");
                        break;
                    }
                }
            }

            _ = ping_timer.tick(), if session.is_named() => {
                match heartbeat.on_tick() {
                    TickAction::Ping => {
                        session.send(Command::Ping, &Empty {});
                        pong_deadline = Instant::now() + pong_timeout;
                    }
                    TickAction::Hangup => {
                        hang_up(session);
                        break;
                    }
                }
            }

            _ = time::sleep_until(pong_deadline), if heartbeat.awaiting_pong() => {
                hang_up(session);
                break;
            }
        }
    }
}

/// Routes one framed line to its handler. Codec failures answer
/// UNKNOWN_COMMAND, payload JSON failures answer PARSE_ERROR; both keep the
/// session open.
fn dispatch(session: &mut Session, heartbeat: &mut Heartbeat, line: &str) -> Flow {
    let (command, payload) = match decode(line) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(error = %e, "unframeable line");
            session.send(Command::UnknownCommand, &Empty {});
            return Flow::Continue;
        }
    };

    match command {
        Command::Enter => {
            if let Some(req) = parse::<Enter>(session, payload) {
                session.handle_enter(req);
            }
        }
        Command::Bye => return session.handle_bye(),
        Command::Pong => match heartbeat.on_pong() {
            PongOutcome::Acknowledged => {}
            PongOutcome::Unexpected => {
                tracing::debug!(username = ?session.username(), "unexpected PONG");
                session.send(
                    Command::PongError,
                    &PongError {
                        code: codes::UNEXPECTED_PONG,
                    },
                );
            }
        },
        Command::BroadcastReq => {
            if let Some(req) = parse(session, payload) {
                session.handle_broadcast(req);
            }
        }
        Command::ListReq => session.handle_list(),
        Command::PrivateMsgReq => {
            if let Some(req) = parse(session, payload) {
                session.handle_private_msg(req);
            }
        }
        Command::RpsStartReq => {
            if let Some(req) = parse(session, payload) {
                session.handle_rps_start(req);
            }
        }
        Command::RpsInviteResp => {
            if let Some(resp) = parse(session, payload) {
                session.handle_rps_invite_resp(resp);
            }
        }
        Command::RpsMoveReq => {
            if let Some(req) = parse(session, payload) {
                session.handle_rps_move(req);
            }
        }
        Command::FileTransferReq => {
            if let Some(req) = parse(session, payload) {
                session.handle_file_transfer_req(req);
            }
        }
        Command::FileTransferResp => {
            if let Some(resp) = parse(session, payload) {
                session.handle_file_transfer_resp(resp);
            }
        }
        // Server-to-client verbs are not valid inbound.
        _ => session.send(Command::UnknownCommand, &Empty {}),
    }
    Flow::Continue
}

/// Parses a JSON payload, replying PARSE_ERROR and yielding `None` when it
/// does not match the verb's shape.
fn parse<T: DeserializeOwned>(session: &Session, payload: &str) -> Option<T> {
    match serde_json::from_str(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "payload parse failed");
            session.send(Command::ParseError, &Empty {});
            None
        }
    }
}

impl Session {
    fn handle_enter(&mut self, req: Enter) {
        if self.username.is_some() {
            self.send(
                Command::EnterResp,
                &StatusResp::error(codes::ALREADY_LOGGED_IN),
            );
            return;
        }
        if !parley_proto::is_valid_username(&req.username) {
            self.send(Command::EnterResp, &StatusResp::error(codes::NAME_INVALID));
            return;
        }
        if !self
            .state
            .registry
            .claim(&req.username, self.outbound.clone())
        {
            self.send(Command::EnterResp, &StatusResp::error(codes::NAME_TAKEN));
            return;
        }

        self.username = Some(req.username.clone());
        self.send(Command::EnterResp, &StatusResp::ok());
        let joined = encode(
            Command::Joined,
            &Presence {
                username: req.username.clone(),
            },
        );
        self.state.registry.broadcast_except(&req.username, &joined);
        tracing::info!(username = %req.username, "client logged in");
    }

    fn handle_bye(&mut self) -> Flow {
        self.send(Command::ByeResp, &StatusResp::ok());
        Flow::Disconnect
    }
}

fn hang_up(session: &Session) {
    tracing::info!(username = ?session.username(), "heartbeat expired, hanging up");
    session.send(
        Command::Hangup,
        &Hangup {
            reason: codes::HEARTBEAT_EXPIRED,
        },
    );
}

/// Atomic cleanup after the reader loop exits, whatever the reason: release
/// the name, announce LEFT, dissolve any RPS pair, drop pending transfers
/// addressed to this session. Relays already running on the auxiliary port
/// are left alone.
fn teardown(session: &mut Session) {
    let Some(username) = session.username.take() else {
        return;
    };

    session.state.registry.release(&username);
    let left = encode(
        Command::Left,
        &Presence {
            username: username.clone(),
        },
    );
    session.state.registry.broadcast_except(&username, &left);

    if let Some(opponent) = session.state.games.dissolve(&username) {
        session
            .state
            .registry
            .send_to(&opponent, encode(Command::RpsInviteDeclined, &Empty {}));
    }

    session.state.transfers.drop_pending_for_receiver(&username);
    tracing::info!(username = %username, "client disconnected");
}

/// Sole writer on the socket: drains the outbound queue, appends the line
/// terminator, and half-closes on the way out.
async fn write_loop(mut write_half: OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(mut frame) = rx.recv().await {
        frame.push('\n');
        if write_half.write_all(frame.as_bytes()).await.is_err() {
            break;
        }
    }
    let _ = write_half.shutdown().await;
}
