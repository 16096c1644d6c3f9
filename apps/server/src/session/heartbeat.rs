//! Per-session PING/PONG liveness state.
//!
//! The timers themselves (the ping interval and the armed pong deadline)
//! live in the connection loop; this is the state machine they drive. At
//! most one PING is ever outstanding.

/// What the connection loop must do after a ping-interval tick.
#[derive(Debug, PartialEq, Eq)]
pub enum TickAction {
    /// Send a PING and arm the pong deadline.
    Ping,
    /// The previous PING was never answered: HANGUP and evict.
    Hangup,
}

/// Outcome of an inbound PONG.
#[derive(Debug, PartialEq, Eq)]
pub enum PongOutcome {
    /// Cleared the outstanding PING.
    Acknowledged,
    /// No PING was outstanding: reply PONG_ERROR, keep the session alive.
    Unexpected,
}

#[derive(Debug, Default)]
pub struct Heartbeat {
    awaiting_pong: bool,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a PING is outstanding (and the pong deadline armed).
    pub fn awaiting_pong(&self) -> bool {
        self.awaiting_pong
    }

    pub fn on_tick(&mut self) -> TickAction {
        if self.awaiting_pong {
            TickAction::Hangup
        } else {
            self.awaiting_pong = true;
            TickAction::Ping
        }
    }

    pub fn on_pong(&mut self) -> PongOutcome {
        if self.awaiting_pong {
            self.awaiting_pong = false;
            PongOutcome::Acknowledged
        } else {
            PongOutcome::Unexpected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answered_pings_keep_the_session_alive() {
        let mut hb = Heartbeat::new();
        for _ in 0..3 {
            assert_eq!(hb.on_tick(), TickAction::Ping);
            assert!(hb.awaiting_pong());
            assert_eq!(hb.on_pong(), PongOutcome::Acknowledged);
            assert!(!hb.awaiting_pong());
        }
    }

    #[test]
    fn unanswered_ping_hangs_up_on_the_next_tick() {
        let mut hb = Heartbeat::new();
        assert_eq!(hb.on_tick(), TickAction::Ping);
        assert_eq!(hb.on_tick(), TickAction::Hangup);
    }

    #[test]
    fn pong_without_ping_is_unexpected_but_not_fatal() {
        let mut hb = Heartbeat::new();
        assert_eq!(hb.on_pong(), PongOutcome::Unexpected);
        // The session stays alive and the next tick pings normally.
        assert_eq!(hb.on_tick(), TickAction::Ping);
    }

    #[test]
    fn duplicate_pong_is_unexpected() {
        let mut hb = Heartbeat::new();
        hb.on_tick();
        assert_eq!(hb.on_pong(), PongOutcome::Acknowledged);
        assert_eq!(hb.on_pong(), PongOutcome::Unexpected);
    }
}
