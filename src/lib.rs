//! Bracket matching: turns per-player bracket entries into randomized
//! single-elimination brackets.
//!
//! Entries flow through validation ([`parser`]), demand totals
//! ([`demand`]), a go/no-go check ([`feasibility`]) and finally match
//! placement ([`schedule`]). [`BracketList`] ties the steps together.

pub mod bracket_list;
pub mod config;
pub mod demand;
pub mod display;
pub mod error;
pub mod feasibility;
pub mod parser;
pub mod schedule;

pub use bracket_list::BracketList;
pub use config::{BracketConfig, RunConfig, RunOverrides};
pub use demand::DemandTotals;
pub use error::{BracketError, ConfigError, EntryError, LoadError, ScheduleFailure};
pub use parser::{EntryRow, PlayerEntry};
pub use schedule::{
    AttemptRecord, Bracket, BrktCounts, CandidateSource, ErrorCode, FixedCandidates,
    RandomCandidates,
};
