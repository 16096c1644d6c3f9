//! Process-wide registry of named sessions.
//!
//! Keys are usernames; a session appears here only between a successful
//! ENTER and its teardown. All cross-session traffic goes through this map:
//! senders queue frames on the target's [`Outbound`] handle and never touch
//! the target's socket directly.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;

/// Write handle for one session's socket. Frames queued here are drained by
/// the session's writer task, the only writer on that socket.
#[derive(Clone)]
pub struct Outbound {
    tx: mpsc::UnboundedSender<String>,
}

impl Outbound {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }

    /// Queues one frame. A send failure means the peer is already tearing
    /// down; the frame is dropped with it.
    pub fn send(&self, frame: String) {
        let _ = self.tx.send(frame);
    }
}

/// Shared mapping `username → session`, unique keys, concurrent-safe.
pub struct ClientRegistry {
    sessions: DashMap<String, Outbound>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Atomically claims `username` for a session. Returns `false` when the
    /// name is already taken; exactly one of two concurrent claims wins.
    pub fn claim(&self, username: &str, outbound: Outbound) -> bool {
        match self.sessions.entry(username.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(outbound);
                true
            }
        }
    }

    /// Removes a name on logout or disconnect.
    pub fn release(&self, username: &str) {
        self.sessions.remove(username);
    }

    pub fn contains(&self, username: &str) -> bool {
        self.sessions.contains_key(username)
    }

    /// Queues a frame for one named session. Returns `false` if the name is
    /// not registered.
    pub fn send_to(&self, username: &str, frame: String) -> bool {
        match self.sessions.get(username) {
            Some(session) => {
                session.send(frame);
                true
            }
            None => false,
        }
    }

    /// Queues a frame for every named session except `exclude`.
    pub fn broadcast_except(&self, exclude: &str, frame: &str) {
        for session in self.sessions.iter() {
            if session.key() != exclude {
                session.value().send(frame.to_string());
            }
        }
    }

    /// Snapshot of every currently named session.
    pub fn usernames(&self) -> Vec<String> {
        self.sessions.iter().map(|s| s.key().clone()).collect()
    }
}
