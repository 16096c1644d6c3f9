//! Cross-session Rock-Paper-Scissors coordination.
//!
//! The pairing map is symmetric (`pair[a] = b ⇔ pair[b] = a`) and installed
//! at invite time, so a pending invite already occupies both seats for
//! conflict purposes. One mutex guards the pairing map and the move buffer
//! together, keeping the two-key updates atomic.

use std::collections::HashMap;

use parking_lot::Mutex;

use parley_proto::payload::{
    Empty, RpsInvite, RpsInviteResp, RpsMoveReq, RpsResult, RpsStartReq, RpsStartResp, Status,
    StatusResp,
};
use parley_proto::rps::{self, Move};
use parley_proto::{codes, encode, Command};

use crate::session::Session;

/// A resolved game, ready to be announced to both players.
#[derive(Debug)]
pub struct GameResult {
    /// `None` on a tie.
    pub winner: Option<String>,
    pub choices: HashMap<String, Move>,
    pub players: (String, String),
}

/// What `record_move` did with a player's choice.
#[derive(Debug)]
pub enum MoveOutcome {
    /// The player is not seated at any table.
    NotPlaying,
    /// Recorded; the opponent has not moved yet.
    Recorded,
    /// Both moves are in: the game resolved and both seats cleared.
    Resolved(GameResult),
}

#[derive(Default)]
struct Tables {
    pairs: HashMap<String, String>,
    moves: HashMap<String, Move>,
}

/// Owner of the pairing map and move buffer.
pub struct GameCoordinator {
    tables: Mutex<Tables>,
}

impl GameCoordinator {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Installs the symmetric pair `inviter ↔ invitee` unless either is
    /// already seated; on conflict, returns the occupying pair.
    pub fn invite(&self, inviter: &str, invitee: &str) -> Result<(), (String, String)> {
        let mut tables = self.tables.lock();
        for name in [inviter, invitee] {
            if let Some(opponent) = tables.pairs.get(name) {
                return Err((name.to_string(), opponent.clone()));
            }
        }
        tables.pairs.insert(inviter.to_string(), invitee.to_string());
        tables.pairs.insert(invitee.to_string(), inviter.to_string());
        Ok(())
    }

    /// The seated opponent of `name`, if any.
    pub fn opponent_of(&self, name: &str) -> Option<String> {
        self.tables.lock().pairs.get(name).cloned()
    }

    /// Clears the pair containing `name` along with any buffered moves.
    /// Returns the former opponent so the caller can notify them.
    pub fn dissolve(&self, name: &str) -> Option<String> {
        let mut tables = self.tables.lock();
        let opponent = tables.pairs.remove(name)?;
        tables.pairs.remove(&opponent);
        tables.moves.remove(name);
        tables.moves.remove(&opponent);
        Some(opponent)
    }

    /// Buffers a move; when the opponent's move is already in, resolves the
    /// game and dissolves the pair in the same critical section.
    pub fn record_move(&self, name: &str, choice: Move) -> MoveOutcome {
        let mut tables = self.tables.lock();
        let Some(opponent) = tables.pairs.get(name).cloned() else {
            return MoveOutcome::NotPlaying;
        };

        tables.moves.insert(name.to_string(), choice);
        let Some(&opponent_move) = tables.moves.get(&opponent) else {
            return MoveOutcome::Recorded;
        };

        tables.moves.remove(name);
        tables.moves.remove(&opponent);
        tables.pairs.remove(name);
        tables.pairs.remove(&opponent);

        let winner = rps::winner((name, choice), (&opponent, opponent_move)).map(str::to_string);
        MoveOutcome::Resolved(GameResult {
            winner,
            choices: HashMap::from([
                (name.to_string(), choice),
                (opponent.clone(), opponent_move),
            ]),
            players: (name.to_string(), opponent),
        })
    }
}

impl Session {
    pub(crate) fn handle_rps_start(&self, req: RpsStartReq) {
        let Some(username) = self.username() else {
            self.send(
                Command::RpsStartResp,
                &RpsStartResp::error(codes::RPS_UNAUTHENTICATED),
            );
            return;
        };
        if req.receiver == username {
            self.send(Command::RpsStartResp, &RpsStartResp::error(codes::RPS_SELF));
            return;
        }
        if !self.state.registry.contains(&req.receiver) {
            self.send(
                Command::RpsStartResp,
                &RpsStartResp::error(codes::RPS_UNKNOWN_OPPONENT),
            );
            return;
        }

        match self.state.games.invite(username, &req.receiver) {
            Ok(()) => {
                self.send(Command::RpsStartResp, &RpsStartResp::ok());
                self.state.registry.send_to(
                    &req.receiver,
                    encode(
                        Command::RpsInvite,
                        &RpsInvite {
                            sender: username.to_string(),
                        },
                    ),
                );
            }
            Err((player1, player2)) => {
                self.send(
                    Command::RpsStartResp,
                    &RpsStartResp::conflict(codes::RPS_GAME_ONGOING, player1, player2),
                );
            }
        }
    }

    pub(crate) fn handle_rps_invite_resp(&self, resp: RpsInviteResp) {
        let Some(username) = self.username() else {
            tracing::debug!("RPS_INVITE_RESP from anonymous session ignored");
            return;
        };
        let Some(opponent) = self.state.games.opponent_of(username) else {
            tracing::debug!(username, "RPS_INVITE_RESP without a pending invite");
            return;
        };

        match resp.status {
            Status::Accept => {
                let ready = encode(Command::RpsReady, &Empty {});
                self.send(Command::RpsReady, &Empty {});
                self.state.registry.send_to(&opponent, ready);
            }
            Status::Decline => {
                self.state.games.dissolve(username);
                let declined = encode(Command::RpsInviteDeclined, &Empty {});
                self.send(Command::RpsInviteDeclined, &Empty {});
                self.state.registry.send_to(&opponent, declined);
            }
            _ => {
                tracing::debug!(username, status = ?resp.status, "unhandled invite response");
            }
        }
    }

    pub(crate) fn handle_rps_move(&self, req: RpsMoveReq) {
        // Anonymous sessions are never seated, so they fall out as NotPlaying.
        let username = self.username().unwrap_or_default();
        match self.state.games.record_move(username, req.choice) {
            MoveOutcome::NotPlaying => {
                self.send(Command::RpsMoveResp, &StatusResp::error(codes::RPS_NO_GAME));
            }
            MoveOutcome::Recorded => {
                self.send(Command::RpsMoveResp, &StatusResp::ok());
            }
            MoveOutcome::Resolved(result) => {
                self.send(Command::RpsMoveResp, &StatusResp::ok());
                let frame = encode(
                    Command::RpsResult,
                    &RpsResult {
                        winner: result.winner,
                        choices: result.choices,
                    },
                );
                let (player1, player2) = result.players;
                self.state.registry.send_to(&player1, frame.clone());
                self.state.registry.send_to(&player2, frame);
            }
        }
    }
}
