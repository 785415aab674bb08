//! Error types for entry validation, configuration and bracket scheduling.

use thiserror::Error;

/// Reasons a batch of entry rows is rejected.
///
/// Any one of these invalidates the whole batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntryError {
    /// Row has an empty player id
    #[error("row {row}: player id is empty")]
    EmptyPlayerId { row: usize },

    /// Requested bracket count has a fractional part or is not a number
    #[error("player {player_id}: bracket count {value} is not a whole number")]
    CountNotInteger { player_id: String, value: f64 },

    /// Requested bracket count outside `1..=max`
    #[error("player {player_id}: bracket count {count} is outside 1..={max}")]
    CountOutOfRange {
        player_id: String,
        count: i64,
        max: u32,
    },

    /// No registration timestamp
    #[error("player {player_id}: registration time is missing")]
    MissingTimestamp { player_id: String },

    /// Registration timestamp could not be parsed
    #[error("player {player_id}: registration time {value:?} is not a valid timestamp")]
    InvalidTimestamp { player_id: String, value: String },

    /// Registration timestamp outside the configured window
    #[error("player {player_id}: registration time {value} is outside the accepted range")]
    TimestampOutOfRange { player_id: String, value: String },

    /// Same player listed twice
    #[error("player {0} is listed more than once")]
    DuplicatePlayer(String),

    /// Player id collides with the bye filler id
    #[error("player id {0:?} is reserved for byes")]
    ReservedPlayerId(String),
}

/// Errors raised while loading rows from disk
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read entries: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read entries: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Matches are head-to-head
    #[error("players per match must be 2, got {0}")]
    UnsupportedMatchSize(usize),

    #[error("rounds must be between 1 and {max}, got {rounds}")]
    InvalidRounds { rounds: u32, max: u32 },

    #[error("max brackets per player must be at least 1")]
    InvalidEntryCeiling,

    #[error("registration window is empty")]
    EmptyRegistrationWindow,

    #[error("bye id must not be empty")]
    EmptyByeId,

    /// Environment variable or CLI value could not be parsed
    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: String, value: String },
}

/// Misuse of a [`Bracket`](crate::schedule::Bracket)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    #[error("match must have {expected} players, got {got}")]
    WrongMatchSize { expected: usize, got: usize },

    #[error("bracket is full")]
    Full,

    #[error("player {0} is already in this bracket")]
    DuplicatePlayer(String),

    #[error("player {0} is not in this bracket")]
    NotInBracket(String),
}

/// Why a scheduling attempt was abandoned
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleFailure {
    /// Candidate sequence ran out before the player found enough opponents
    #[error("no opponent left for {player}")]
    NoOpponent { player: String },

    /// No bracket could host the match, even after relocation
    #[error("no bracket has room for {player} vs {opponent}")]
    NoBracket { player: String, opponent: String },

    /// Supplied candidate sequence does not match the entry counts
    #[error("candidate sequence does not match the bracket entries")]
    InvalidCandidates,

    /// Brackets left unfilled after every player finished
    #[error("brackets were left unfilled")]
    Incomplete,

    /// Internal container misuse
    #[error(transparent)]
    Bracket(#[from] BracketError),
}
