//! Bracket demand: how many full and one-bye brackets the entries fill.
//!
//! A full bracket holds `players_per_brkt` real players; a one-bye bracket
//! holds one fewer and the bye fills the last seat. Outlying requests are
//! trimmed until the pool of players can support every bracket.

use serde::{Deserialize, Serialize};
use std::iter;

use crate::parser::{sort_by_demand, PlayerEntry};

/// Brackets of each kind needed for the current demand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandTotals {
    pub full_count: usize,
    pub one_bye_count: usize,
}

impl DemandTotals {
    /// Splits `entry_total` real entries into the fewest brackets that carry
    /// at most one bye each. `None` when no such split exists.
    pub fn for_entry_total(entry_total: usize, players_per_brkt: usize) -> Option<Self> {
        if entry_total == 0 || players_per_brkt == 0 {
            return None;
        }
        let brackets = entry_total.div_ceil(players_per_brkt);
        let one_bye_count = brackets * players_per_brkt - entry_total;
        if one_bye_count > brackets {
            return None;
        }
        Some(Self {
            full_count: brackets - one_bye_count,
            one_bye_count,
        })
    }

    pub fn total_brackets(&self) -> usize {
        self.full_count + self.one_bye_count
    }

    pub fn is_empty(&self) -> bool {
        self.total_brackets() == 0
    }

    /// Real-player seats these brackets hold
    pub fn entry_capacity(&self, players_per_brkt: usize) -> usize {
        self.full_count * players_per_brkt + self.one_bye_count * players_per_brkt.saturating_sub(1)
    }
}

/// Result of a demand calculation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Demand {
    /// Entries with `needed` trimmed, in demand order
    pub entries: Vec<PlayerEntry>,
    pub totals: DemandTotals,
    /// Too few distinct players for any bracket
    pub floor_triggered: bool,
}

impl Demand {
    /// Entries dropped by trimming
    pub fn trimmed(&self) -> u32 {
        self.entries.iter().map(|e| e.requested - e.needed).sum()
    }
}

fn entry_total(entries: &[PlayerEntry]) -> usize {
    entries.iter().map(|e| e.needed as usize).sum()
}

/// Gale-Ryser check: can each player sit in `needed` distinct brackets
/// when brackets hold `players_per_brkt` (full) or one fewer (one-bye)
/// real players?
fn is_realizable(entries: &[PlayerEntry], totals: &DemandTotals, players_per_brkt: usize) -> bool {
    let sizes = iter::repeat(players_per_brkt)
        .take(totals.full_count)
        .chain(iter::repeat(players_per_brkt - 1).take(totals.one_bye_count));

    let mut seats = 0;
    for (k, size) in sizes.enumerate() {
        seats += size;
        let supply: usize = entries.iter().map(|e| (e.needed as usize).min(k + 1)).sum();
        if seats > supply {
            return false;
        }
    }
    seats == entry_total(entries)
}

/// Drops one entry from the top requester; the latest registrant loses ties
fn trim_one(entries: &mut [PlayerEntry]) {
    if let Some(top) = entries
        .iter_mut()
        .filter(|e| e.needed > 0)
        .max_by_key(|e| (e.needed, e.registered_at))
    {
        top.needed -= 1;
    }
}

/// Computes bracket totals and trims requests the pool cannot support.
///
/// `needed` is reset from `requested` first, so repeated calls on the same
/// entries give the same answer.
pub fn calc_demand(entries: &[PlayerEntry], players_per_brkt: usize) -> Demand {
    let mut entries = entries.to_vec();
    for entry in &mut entries {
        entry.needed = entry.requested;
    }
    sort_by_demand(&mut entries);

    if players_per_brkt == 0 || entries.len() < players_per_brkt.saturating_sub(1).max(1) {
        return Demand {
            entries,
            totals: DemandTotals::default(),
            floor_triggered: true,
        };
    }

    // Nobody plays more brackets than the raw demand could fill
    let ceiling = (entry_total(&entries) / players_per_brkt).max(1) as u32;
    for entry in &mut entries {
        entry.needed = entry.needed.min(ceiling);
    }

    let totals = loop {
        let total = entry_total(&entries);
        if total == 0 {
            break DemandTotals::default();
        }

        let supported = DemandTotals::for_entry_total(total, players_per_brkt).filter(|totals| {
            let most = entries.iter().map(|e| e.needed as usize).max().unwrap_or(0);
            most <= totals.total_brackets() && is_realizable(&entries, totals, players_per_brkt)
        });
        if let Some(totals) = supported {
            break totals;
        }
        trim_one(&mut entries);
    };

    sort_by_demand(&mut entries);
    Demand {
        entries,
        totals,
        floor_triggered: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    const PLAYERS_PER_BRKT: usize = 8;

    fn entries(counts: &[u32]) -> Vec<PlayerEntry> {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let mut entries: Vec<PlayerEntry> = counts
            .iter()
            .enumerate()
            .map(|(i, &count)| PlayerEntry {
                player_id: format!("p{i}"),
                requested: count,
                needed: count,
                registered_at: start + Duration::minutes(i as i64),
            })
            .collect();
        sort_by_demand(&mut entries);
        entries
    }

    fn totals(counts: &[u32]) -> (usize, usize) {
        let demand = calc_demand(&entries(counts), PLAYERS_PER_BRKT);
        (demand.totals.full_count, demand.totals.one_bye_count)
    }

    #[test]
    fn test_for_entry_total() {
        assert_eq!(
            DemandTotals::for_entry_total(100, 8),
            Some(DemandTotals { full_count: 9, one_bye_count: 4 })
        );
        assert_eq!(
            DemandTotals::for_entry_total(21, 8),
            Some(DemandTotals { full_count: 0, one_bye_count: 3 })
        );
        // 18 would need six byes across three brackets
        assert_eq!(DemandTotals::for_entry_total(18, 8), None);
        assert_eq!(DemandTotals::for_entry_total(0, 8), None);
    }

    #[test]
    fn test_eight_players_seven_each() {
        assert_eq!(totals(&[7; 8]), (7, 0));
    }

    #[test]
    fn test_seven_players_share_every_bracket() {
        let demand = calc_demand(&entries(&[10, 8, 6, 7, 6, 4, 6]), PLAYERS_PER_BRKT);
        assert_eq!(demand.totals, DemandTotals { full_count: 0, one_bye_count: 4 });
        assert!(demand.entries.iter().all(|e| e.needed == 4));
        assert_eq!(demand.trimmed(), 47 - 28);
    }

    #[test]
    fn test_eight_players_uneven_requests() {
        let demand = calc_demand(&entries(&[10, 8, 6, 7, 6, 4, 6, 6]), PLAYERS_PER_BRKT);
        assert_eq!(demand.totals, DemandTotals { full_count: 4, one_bye_count: 2 });
        let needed: Vec<u32> = demand.entries.iter().map(|e| e.needed).collect();
        assert_eq!(needed, vec![6, 6, 6, 6, 6, 6, 6, 4]);
    }

    #[test]
    fn test_ten_players_ten_each() {
        assert_eq!(totals(&[10; 10]), (9, 4));
    }

    #[test]
    fn test_single_entries() {
        assert_eq!(totals(&[1; 18]), (2, 0));
        assert_eq!(totals(&[1; 21]), (0, 3));
    }

    #[test]
    fn test_single_entries_trim_latest_registrants() {
        let demand = calc_demand(&entries(&[1; 18]), PLAYERS_PER_BRKT);
        let dropped: Vec<&str> = demand
            .entries
            .iter()
            .filter(|e| e.needed == 0)
            .map(|e| e.player_id.as_str())
            .collect();
        assert_eq!(dropped, vec!["p16", "p17"]);
    }

    #[test]
    fn test_floor_with_too_few_players() {
        let demand = calc_demand(&entries(&[5; 6]), PLAYERS_PER_BRKT);
        assert!(demand.floor_triggered);
        assert!(demand.totals.is_empty());

        let demand = calc_demand(&[], PLAYERS_PER_BRKT);
        assert!(demand.floor_triggered);
    }

    #[test]
    fn test_recalculation_is_idempotent() {
        let first = calc_demand(&entries(&[10, 8, 6, 7, 6, 4, 6, 6]), PLAYERS_PER_BRKT);
        let second = calc_demand(&first.entries, PLAYERS_PER_BRKT);
        assert_eq!(first, second);
    }

    #[test]
    fn test_totals_hold_every_needed_entry() {
        for counts in [&[3u32, 3, 3, 3, 3, 3, 3, 3, 2][..], &[9, 1, 1, 1, 1, 1, 1, 1], &[2; 11]] {
            let demand = calc_demand(&entries(counts), PLAYERS_PER_BRKT);
            let needed: usize = demand.entries.iter().map(|e| e.needed as usize).sum();
            assert_eq!(needed, demand.totals.entry_capacity(PLAYERS_PER_BRKT));
            let brackets = demand.totals.total_brackets() as u32;
            assert!(demand.entries.iter().all(|e| e.needed <= brackets));
        }
    }
}
