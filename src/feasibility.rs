//! Go / no-go check before a randomize attempt.

use crate::demand::DemandTotals;
use crate::error::EntryError;
use crate::parser::PlayerEntry;

pub const NOT_ENOUGH_PLAYERS: &str = "Not enough players for brackets";
pub const ENTRIES_NOT_ASSIGNED: &str = "Not all entries assigned to brackets. Adjust entries";

/// Outcome of the feasibility check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feasibility {
    Ready,
    Blocked(String),
}

impl Feasibility {
    pub fn is_ready(&self) -> bool {
        matches!(self, Feasibility::Ready)
    }

    /// Empty when ready
    pub fn message(&self) -> &str {
        match self {
            Feasibility::Ready => "",
            Feasibility::Blocked(message) => message,
        }
    }
}

/// Decides whether the current entries and totals can be scheduled
pub fn check(
    entries: &[PlayerEntry],
    totals: &DemandTotals,
    floor_triggered: bool,
    players_per_brkt: usize,
    entry_error: Option<&EntryError>,
) -> Feasibility {
    if let Some(err) = entry_error {
        return Feasibility::Blocked(format!("Invalid bracket entries: {err}"));
    }
    if floor_triggered || entries.is_empty() {
        return Feasibility::Blocked(NOT_ENOUGH_PLAYERS.to_string());
    }

    let needed: usize = entries.iter().map(|e| e.needed as usize).sum();
    if totals.is_empty() || needed != totals.entry_capacity(players_per_brkt) {
        return Feasibility::Blocked(ENTRIES_NOT_ASSIGNED.to_string());
    }

    Feasibility::Ready
}
