//! The bracket list: entries in, brackets out.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::config::BracketConfig;
use crate::demand::{calc_demand, DemandTotals};
use crate::error::{EntryError, ScheduleFailure};
use crate::feasibility::{check, Feasibility};
use crate::parser::{build_entries, EntryRow, PlayerEntry};
use crate::schedule::{
    participants, AttemptRecord, Bracket, BrktCounts, CandidateSource, ErrorCode,
    MatchScheduler, RandomCandidates,
};

/// What the randomize calls have reported since the last success or clear
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ScheduleDiagnostics {
    attempts: Vec<AttemptRecord>,
    error_code: ErrorCode,
    error_message: String,
}

/// Owns the entries, the demand totals and the finished brackets for one
/// bracket pool.
///
/// `randomize` makes a single attempt. When it returns
/// [`ErrorCode::ReRandomize`] the caller decides whether to try again.
#[derive(Debug, Clone)]
pub struct BracketList {
    config: BracketConfig,
    scheduler: MatchScheduler,
    entries: Vec<PlayerEntry>,
    totals: DemandTotals,
    floor_triggered: bool,
    entry_error: Option<EntryError>,
    brackets: Vec<Bracket>,
    brkt_counts: BrktCounts,
    diagnostics: ScheduleDiagnostics,
}

impl BracketList {
    pub fn new(config: BracketConfig) -> Self {
        let scheduler = MatchScheduler::new(&config);
        Self {
            config,
            scheduler,
            entries: Vec::new(),
            totals: DemandTotals::default(),
            floor_triggered: false,
            entry_error: None,
            brackets: Vec::new(),
            brkt_counts: BrktCounts::default(),
            diagnostics: ScheduleDiagnostics::default(),
        }
    }

    /// Replaces the entry list. A bad batch leaves the list empty.
    pub fn add_brkt_entries(&mut self, rows: &[EntryRow]) {
        match build_entries(rows, &self.config) {
            Ok(entries) => {
                self.entries = entries;
                self.entry_error = None;
            }
            Err(err) => {
                warn!(
                    "{}: rejected {} entry rows: {}",
                    self.config.label(),
                    rows.len(),
                    err
                );
                self.entries.clear();
                self.entry_error = Some(err);
            }
        }
    }

    /// Takes the rows as the new entry list and works out how many brackets
    /// of each kind they fill
    pub fn calc_total_brkts(&mut self, rows: &[EntryRow]) -> DemandTotals {
        self.add_brkt_entries(rows);

        if self.entry_error.is_some() {
            self.totals = DemandTotals::default();
            self.floor_triggered = false;
            return self.totals;
        }

        let demand = calc_demand(&self.entries, self.config.players_per_brkt());
        let trimmed = demand.trimmed();
        self.entries = demand.entries;
        self.totals = demand.totals;
        self.floor_triggered = demand.floor_triggered;

        info!(
            "{}: {} players, {} full and {} one-bye brackets ({} entries trimmed)",
            self.config.label(),
            self.entries.len(),
            self.totals.full_count,
            self.totals.one_bye_count,
            trimmed
        );
        self.totals
    }

    fn feasibility(&self) -> Feasibility {
        check(
            &self.entries,
            &self.totals,
            self.floor_triggered,
            self.config.players_per_brkt(),
            self.entry_error.as_ref(),
        )
    }

    /// True when the entries can be scheduled. Otherwise `error_message`
    /// says why.
    pub fn can_randomize(&mut self) -> bool {
        let feasibility = self.feasibility();
        let ready = feasibility.is_ready();
        self.diagnostics.error_code = if ready {
            ErrorCode::NoError
        } else {
            ErrorCode::NotReady
        };
        self.diagnostics.error_message = feasibility.message().to_string();
        ready
    }

    /// One attempt with a fresh random draw
    pub fn randomize(&mut self) -> ErrorCode {
        self.randomize_with(&mut RandomCandidates::new())
    }

    /// One attempt drawing candidates from `source`
    pub fn randomize_with(&mut self, source: &mut dyn CandidateSource) -> ErrorCode {
        self.brackets.clear();
        self.brkt_counts = BrktCounts::default();

        if !self.can_randomize() {
            let message = self.diagnostics.error_message.clone();
            self.record(ErrorCode::NotReady, message);
            return ErrorCode::NotReady;
        }

        let order = participants(
            &self.entries,
            self.totals.one_bye_count,
            self.scheduler.bye_id(),
        );
        let brkt_counts = &mut self.brkt_counts;
        let outcome = self.scheduler.schedule_with_progress(
            &order,
            self.totals.total_brackets(),
            source,
            &mut |counts| *brkt_counts = counts,
        );
        match outcome {
            Ok(brackets) => {
                self.brackets = brackets;
                info!(
                    "{}: placed {} brackets after {} attempt(s)",
                    self.config.label(),
                    self.brackets.len(),
                    self.pending_attempts() + 1
                );
                self.record(ErrorCode::NoError, String::new());
                ErrorCode::NoError
            }
            Err(ScheduleFailure::InvalidCandidates) => {
                let message = ScheduleFailure::InvalidCandidates.to_string();
                self.record(ErrorCode::InvalidCandidates, message);
                ErrorCode::InvalidCandidates
            }
            Err(failure) => {
                warn!(
                    "{}: attempt failed with {} of {} brackets complete: {}",
                    self.config.label(),
                    self.brkt_counts.total(),
                    self.totals.total_brackets(),
                    failure
                );
                self.record(ErrorCode::ReRandomize, format!("{failure}; randomize again"));
                ErrorCode::ReRandomize
            }
        }
    }

    /// Failed attempts since the last success or clear
    fn pending_attempts(&self) -> u32 {
        self.diagnostics
            .attempts
            .iter()
            .rev()
            .take_while(|record| !record.code.is_ok())
            .count() as u32
    }

    fn record(&mut self, code: ErrorCode, message: String) {
        let retries = self.pending_attempts() + 1;
        self.diagnostics.attempts.push(AttemptRecord { code, retries });
        self.diagnostics.error_code = code;
        self.diagnostics.error_message = message;
    }

    /// Drops brackets, totals, diagnostics and any entry error. Entries are
    /// kept.
    pub fn clear(&mut self) {
        self.entry_error = None;
        self.brackets.clear();
        self.brkt_counts = BrktCounts::default();
        self.totals = DemandTotals::default();
        self.floor_triggered = false;
        self.diagnostics = ScheduleDiagnostics::default();
    }

    /// How often each pair of players meets across the brackets
    pub fn pair_counts(&self) -> BTreeMap<(String, String), usize> {
        let mut counts = BTreeMap::new();
        for bracket in &self.brackets {
            for group in bracket.matches() {
                for (i, a) in group.iter().enumerate() {
                    for b in &group[i + 1..] {
                        let key = if a <= b {
                            (a.clone(), b.clone())
                        } else {
                            (b.clone(), a.clone())
                        };
                        *counts.entry(key).or_insert(0) += 1;
                    }
                }
            }
        }
        counts
    }

    pub fn config(&self) -> &BracketConfig {
        &self.config
    }

    pub fn label(&self) -> &str {
        self.config.label()
    }

    /// Rounds per bracket
    pub fn games(&self) -> u32 {
        self.config.rounds()
    }

    pub fn players_per_match(&self) -> usize {
        self.config.players_per_match()
    }

    pub fn players_per_brkt(&self) -> usize {
        self.config.players_per_brkt()
    }

    pub fn full_count(&self) -> usize {
        self.totals.full_count
    }

    pub fn one_bye_count(&self) -> usize {
        self.totals.one_bye_count
    }

    pub fn totals(&self) -> DemandTotals {
        self.totals
    }

    pub fn brkt_counts(&self) -> BrktCounts {
        self.brkt_counts
    }

    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }

    pub fn brkt_entries(&self) -> &[PlayerEntry] {
        &self.entries
    }

    pub fn entry_error(&self) -> Option<&EntryError> {
        self.entry_error.as_ref()
    }

    pub fn error_code(&self) -> ErrorCode {
        self.diagnostics.error_code
    }

    pub fn error_message(&self) -> &str {
        &self.diagnostics.error_message
    }

    pub fn randomize_errors(&self) -> &[AttemptRecord] {
        &self.diagnostics.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feasibility::{ENTRIES_NOT_ASSIGNED, NOT_ENOUGH_PLAYERS};
    use crate::schedule::FixedCandidates;

    fn rows(count: usize, each: f64) -> Vec<EntryRow> {
        (0..count)
            .map(|i| {
                let at = format!("2024-05-01T10:{:02}:00Z", i);
                EntryRow::new(format!("p{i}"), each, Some(at.as_str()))
            })
            .collect()
    }

    #[test]
    fn test_new_list_is_empty() {
        let mut list = BracketList::new(BracketConfig::default());
        assert_eq!(list.games(), 3);
        assert_eq!(list.players_per_brkt(), 8);
        assert!(list.brackets().is_empty());
        assert!(!list.can_randomize());
        assert_eq!(list.error_message(), NOT_ENOUGH_PLAYERS);
    }

    #[test]
    fn test_bad_row_rejects_batch() {
        let mut list = BracketList::new(BracketConfig::default());
        let mut batch = rows(16, 2.0);
        batch[5].registered_at = None;

        assert_eq!(list.calc_total_brkts(&batch), DemandTotals::default());
        assert!(list.brkt_entries().is_empty());
        assert!(matches!(list.entry_error(), Some(EntryError::MissingTimestamp { .. })));
        assert!(!list.can_randomize());
        assert!(list.error_message().starts_with("Invalid bracket entries"));
    }

    #[test]
    fn test_entries_replaced_without_totals() {
        let mut list = BracketList::new(BracketConfig::default());
        list.calc_total_brkts(&rows(16, 1.0));
        list.add_brkt_entries(&rows(16, 2.0));
        assert!(!list.can_randomize());
        assert_eq!(list.error_message(), ENTRIES_NOT_ASSIGNED);
        assert_eq!(list.randomize(), ErrorCode::NotReady);
        assert_eq!(
            list.randomize_errors(),
            &[AttemptRecord { code: ErrorCode::NotReady, retries: 1 }]
        );
    }

    #[test]
    fn test_fixed_draw_and_clear() {
        let mut list = BracketList::new(BracketConfig::default());
        list.calc_total_brkts(&rows(16, 1.0));
        let sequence: Vec<String> = list
            .brkt_entries()
            .iter()
            .map(|e| e.player_id.clone())
            .collect();

        assert_eq!(list.randomize_with(&mut FixedCandidates::new(sequence)), ErrorCode::NoError);
        assert_eq!(list.brackets().len(), 2);
        assert_eq!(list.brkt_counts(), BrktCounts { full: 2, one_bye: 0 });
        assert_eq!(list.error_message(), "");
        assert_eq!(list.pair_counts().len(), 8);
        assert!(list.pair_counts().values().all(|&n| n == 1));

        list.clear();
        assert!(list.brackets().is_empty());
        assert!(list.randomize_errors().is_empty());
        assert_eq!(list.full_count(), 0);
        assert_eq!(list.brkt_entries().len(), 16);
    }

    #[test]
    fn test_clear_forgets_rejected_batch() {
        let mut list = BracketList::new(BracketConfig::default());
        let mut batch = rows(16, 2.0);
        batch[3].num_brackets = 0.0;
        list.calc_total_brkts(&batch);
        assert!(list.entry_error().is_some());

        list.clear();
        assert!(list.entry_error().is_none());
        assert!(!list.can_randomize());
        assert_eq!(list.error_message(), NOT_ENOUGH_PLAYERS);
    }

    #[test]
    fn test_failed_draw_keeps_partial_tally() {
        let mut list = BracketList::new(BracketConfig::default());
        list.calc_total_brkts(&rows(8, 7.0));

        let failed = (0..500).any(|seed| {
            list.randomize_with(&mut RandomCandidates::seeded(seed)) == ErrorCode::ReRandomize
        });
        assert!(failed);
        assert!(list.brackets().is_empty());
        assert!(list.brkt_counts().total() < list.full_count());
        assert_eq!(list.brkt_counts().one_bye, 0);
    }

    #[test]
    fn test_bad_sequence_reports_invalid_candidates() {
        let mut list = BracketList::new(BracketConfig::default());
        list.calc_total_brkts(&rows(16, 1.0));
        let code = list.randomize_with(&mut FixedCandidates::new(["p0", "p1"]));
        assert_eq!(code, ErrorCode::InvalidCandidates);
        assert!(list.brackets().is_empty());
        assert_eq!(list.randomize_errors()[0].retries, 1);
    }
}
