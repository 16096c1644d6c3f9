//! Rock-Paper-Scissors move algebra.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A player's move, spelled the way the wire spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    #[serde(rename = "/r")]
    Rock,
    #[serde(rename = "/p")]
    Paper,
    #[serde(rename = "/s")]
    Scissors,
}

impl Move {
    /// Whether `self` wins against `other`. Equal moves tie and beat nothing.
    pub fn beats(self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors)
                | (Move::Scissors, Move::Paper)
                | (Move::Paper, Move::Rock)
        )
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        })
    }
}

/// Resolves a finished game: the winning player's name, or `None` on a tie.
pub fn winner<'a>(a: (&'a str, Move), b: (&'a str, Move)) -> Option<&'a str> {
    if a.1 == b.1 {
        None
    } else if a.1.beats(b.1) {
        Some(a.0)
    } else {
        Some(b.0)
    }
}
