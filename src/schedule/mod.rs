pub mod bracket;
pub mod candidates;
pub mod matcher;
pub mod move_chain;
pub mod types;
pub mod usage;

pub use bracket::Bracket;
pub use candidates::{CandidateSource, FixedCandidates, RandomCandidates};
pub use matcher::{participants, MatchScheduler};
pub use types::{AttemptRecord, BrktCounts, ErrorCode, Participant};
