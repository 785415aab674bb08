use serde::{Deserialize, Serialize};

use super::bracket::Bracket;

/// A player taking part in one scheduling attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub player_id: String,
    pub needed: u32,
}

impl Participant {
    pub fn new(player_id: impl Into<String>, needed: u32) -> Self {
        Self {
            player_id: player_id.into(),
            needed,
        }
    }
}

/// How a candidate slot relates to the current player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// The current player's own slot
    Own,
    /// Slot already taken by an earlier placement
    Used,
    /// Candidate has all the matches it needs
    Past,
    /// Pair quota is used up; the slot stays open for someone else
    Prior,
    /// Playable
    Valid,
}

/// Result of the last randomize call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    #[default]
    NoError,
    /// Attempt failed; call randomize again for a fresh draw
    ReRandomize,
    /// Feasibility check failed
    NotReady,
    /// Supplied candidate sequence does not match the entries
    InvalidCandidates,
}

impl ErrorCode {
    pub fn is_ok(self) -> bool {
        self == ErrorCode::NoError
    }
}

/// One randomize call as recorded in the diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub code: ErrorCode,
    /// Attempt number since the last success or clear, starting at 1
    pub retries: u32,
}

/// Completed brackets by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrktCounts {
    pub full: usize,
    pub one_bye: usize,
}

impl BrktCounts {
    /// Counts full brackets, split by whether the bye holds a seat
    pub fn tally(brackets: &[Bracket], bye_id: &str) -> Self {
        brackets
            .iter()
            .filter(|b| b.is_full())
            .fold(Self::default(), |mut counts, bracket| {
                if bracket.contains(bye_id) {
                    counts.one_bye += 1;
                } else {
                    counts.full += 1;
                }
                counts
            })
    }

    pub fn total(&self) -> usize {
        self.full + self.one_bye
    }
}

/// One match moving between brackets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub players: Vec<String>,
    pub from: usize,
    pub to: usize,
}

/// Moves that free `host` for a new match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub host: usize,
    pub moves: Vec<Move>,
}
