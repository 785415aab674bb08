use std::collections::HashMap;

use log::{debug, warn};

use crate::config::BracketConfig;
use crate::error::ScheduleFailure;
use crate::parser::PlayerEntry;
use super::bracket::Bracket;
use super::candidates::{entry_pool, is_permutation_of, CandidateSource};
use super::move_chain::{apply_relocation, find_host_chain, find_swap};
use super::types::{BrktCounts, CandidateKind, Participant};
use super::usage::{OpponentQuota, UsageIndex};

/// Builds the outer-loop order: entries by `needed` descending, with the bye
/// sorted in by its count after real players of the same count. Entries
/// trimmed to zero are left out.
pub fn participants(
    entries: &[PlayerEntry],
    one_bye_count: usize,
    bye_id: &str,
) -> Vec<Participant> {
    let mut order: Vec<Participant> = entries
        .iter()
        .filter(|e| e.needed > 0)
        .map(|e| Participant::new(e.player_id.clone(), e.needed))
        .collect();
    order.sort_by(|a, b| b.needed.cmp(&a.needed));

    if one_bye_count > 0 {
        let bye_needed = one_bye_count as u32;
        let at = order
            .iter()
            .position(|p| p.needed < bye_needed)
            .unwrap_or(order.len());
        order.insert(at, Participant::new(bye_id, bye_needed));
    }
    order
}

/// Randomized match placement.
///
/// Every match pairs the current player with a candidate drawn from the
/// entry pool; the match goes into a bracket neither player is in yet,
/// relocating earlier matches when no such bracket has room.
#[derive(Debug, Clone)]
pub struct MatchScheduler {
    players_per_match: usize,
    players_per_brkt: usize,
    bye_id: String,
    max_chain_depth: u32,
}

impl MatchScheduler {
    pub fn new(config: &BracketConfig) -> Self {
        Self {
            players_per_match: config.players_per_match(),
            players_per_brkt: config.players_per_brkt(),
            bye_id: config.bye_id().to_string(),
            max_chain_depth: config.max_chain_depth(),
        }
    }

    pub fn bye_id(&self) -> &str {
        &self.bye_id
    }

    /// Runs one attempt. Nothing from a failed attempt survives it.
    pub fn schedule(
        &self,
        participants: &[Participant],
        total_brackets: usize,
        source: &mut dyn CandidateSource,
    ) -> Result<Vec<Bracket>, ScheduleFailure> {
        self.schedule_with_progress(participants, total_brackets, source, &mut |_| {})
    }

    /// Like [`schedule`](Self::schedule), calling `progress` whenever the
    /// tally of completed brackets changes
    pub fn schedule_with_progress(
        &self,
        participants: &[Participant],
        total_brackets: usize,
        source: &mut dyn CandidateSource,
        progress: &mut dyn FnMut(BrktCounts),
    ) -> Result<Vec<Bracket>, ScheduleFailure> {
        self.run(participants, total_brackets, source, progress)?.finish()
    }

    fn run<'a>(
        &'a self,
        participants: &'a [Participant],
        total_brackets: usize,
        source: &mut dyn CandidateSource,
        progress: &mut dyn FnMut(BrktCounts),
    ) -> Result<Attempt<'a>, ScheduleFailure> {
        let pool = entry_pool(participants.iter().map(|p| (p.player_id.as_str(), p.needed)));
        let sequence = source.candidate_sequence(&pool);
        if !is_permutation_of(&sequence, &pool) {
            warn!(
                "Candidate sequence of {} slots does not match the {} entries",
                sequence.len(),
                pool.len()
            );
            return Err(ScheduleFailure::InvalidCandidates);
        }

        debug!(
            "Scheduling {} participants into {} brackets",
            participants.len(),
            total_brackets
        );
        let mut attempt = Attempt::new(self, participants, total_brackets, sequence);
        for current in participants {
            attempt.fill(current, source, progress)?;
        }
        Ok(attempt)
    }
}

/// State of a single attempt
struct Attempt<'a> {
    scheduler: &'a MatchScheduler,
    participants: &'a [Participant],
    brackets: Vec<Bracket>,
    usage: UsageIndex,
    needed: HashMap<&'a str, u32>,
    placed: HashMap<&'a str, u32>,
    sequence: Vec<String>,
    consumed: Vec<bool>,
    /// Quota each current player started its turn with, in turn order
    #[cfg(test)]
    opening_quotas: Vec<(&'a str, OpponentQuota)>,
    counts: BrktCounts,
}

impl<'a> Attempt<'a> {
    fn new(
        scheduler: &'a MatchScheduler,
        participants: &'a [Participant],
        total_brackets: usize,
        sequence: Vec<String>,
    ) -> Self {
        let brackets = (0..total_brackets)
            .map(|_| Bracket::new(scheduler.players_per_match, scheduler.players_per_brkt))
            .collect();
        let needed = participants
            .iter()
            .map(|p| (p.player_id.as_str(), p.needed))
            .collect();
        let placed = participants.iter().map(|p| (p.player_id.as_str(), 0)).collect();
        let consumed = vec![false; sequence.len()];

        Self {
            scheduler,
            participants,
            brackets,
            usage: UsageIndex::new(),
            needed,
            placed,
            sequence,
            consumed,
            #[cfg(test)]
            opening_quotas: Vec::new(),
            counts: BrktCounts::default(),
        }
    }

    fn remaining(&self, player_id: &str) -> u32 {
        let needed = self.needed.get(player_id).copied().unwrap_or(0);
        let placed = self.placed.get(player_id).copied().unwrap_or(0);
        needed.saturating_sub(placed)
    }

    fn classify(&self, current: &str, slot: usize, quota: &OpponentQuota) -> CandidateKind {
        let candidate = self.sequence[slot].as_str();
        if candidate == current {
            CandidateKind::Own
        } else if self.consumed[slot] {
            CandidateKind::Used
        } else if self.remaining(candidate) == 0 {
            CandidateKind::Past
        } else if !quota.allows(candidate) {
            CandidateKind::Prior
        } else {
            CandidateKind::Valid
        }
    }

    /// Gives `current` all the matches it still needs
    fn fill(
        &mut self,
        current: &'a Participant,
        source: &mut dyn CandidateSource,
        progress: &mut dyn FnMut(BrktCounts),
    ) -> Result<(), ScheduleFailure> {
        let id = current.player_id.as_str();
        if self.remaining(id) == 0 {
            return Ok(());
        }

        let participants = self.participants;
        let others: Vec<(&str, u32)> = participants
            .iter()
            .filter(|p| p.player_id != id)
            .map(|p| (p.player_id.as_str(), self.remaining(&p.player_id)))
            .filter(|&(_, rem)| rem > 0)
            .collect();
        let mut quota = OpponentQuota::build(
            id,
            self.remaining(id),
            &others,
            &self.scheduler.bye_id,
            self.brackets.len() as u32,
        );
        #[cfg(test)]
        self.opening_quotas.push((id, quota.clone()));

        // Scan from the first open slot
        let start = self
            .consumed
            .iter()
            .position(|used| !used)
            .unwrap_or(self.sequence.len());

        for slot in start..self.sequence.len() {
            if self.remaining(id) == 0 {
                break;
            }
            match self.classify(id, slot, &quota) {
                CandidateKind::Own | CandidateKind::Past => self.consumed[slot] = true,
                CandidateKind::Used | CandidateKind::Prior => {}
                CandidateKind::Valid => {
                    self.consumed[slot] = true;
                    let opponent = self.sequence[slot].clone();
                    quota.consume(&opponent);
                    self.place(id, &opponent, source)?;
                    self.report(progress);
                }
            }
        }

        if self.remaining(id) > 0 {
            debug!("{} is still {} match(es) short", id, self.remaining(id));
            return Err(ScheduleFailure::NoOpponent {
                player: id.to_string(),
            });
        }
        Ok(())
    }

    fn place(
        &mut self,
        current: &str,
        opponent: &str,
        source: &mut dyn CandidateSource,
    ) -> Result<(), ScheduleFailure> {
        let mut open = self.usage.available(current, &self.brackets);
        source.order_brackets(&mut open);

        let free = open.into_iter().find(|&i| !self.usage.uses(opponent, i));
        let host = match free {
            Some(host) => host,
            None => self.repair(current, opponent, source)?,
        };

        self.brackets[host].add_match(&[current.to_string(), opponent.to_string()])?;
        for player in [current, opponent] {
            self.usage.record(player, host);
            if let Some(count) = self.placed.get_mut(player) {
                *count += 1;
            }
        }
        Ok(())
    }

    fn report(&mut self, progress: &mut dyn FnMut(BrktCounts)) {
        let counts = BrktCounts::tally(&self.brackets, &self.scheduler.bye_id);
        if counts != self.counts {
            self.counts = counts;
            progress(counts);
        }
    }

    /// No bracket has room for both players: swap, mirrored swap, then a move chain
    fn repair(
        &mut self,
        current: &str,
        opponent: &str,
        source: &mut dyn CandidateSource,
    ) -> Result<usize, ScheduleFailure> {
        let max_depth = self.scheduler.max_chain_depth;
        let plan = find_swap(current, opponent, &self.brackets, &self.usage)
            .or_else(|| find_swap(opponent, current, &self.brackets, &self.usage))
            .or_else(|| {
                let mut hosts: Vec<usize> = (0..self.brackets.len()).collect();
                source.order_brackets(&mut hosts);
                find_host_chain(current, opponent, &hosts, &self.brackets, &self.usage, max_depth)
            });

        let Some(plan) = plan else {
            debug!("No relocation frees a bracket for {} vs {}", current, opponent);
            return Err(ScheduleFailure::NoBracket {
                player: current.to_string(),
                opponent: opponent.to_string(),
            });
        };

        debug!(
            "Moving {} match(es) to free bracket {} for {} vs {}",
            plan.moves.len(),
            plan.host,
            current,
            opponent
        );
        apply_relocation(&plan, &mut self.brackets, &mut self.usage)?;
        Ok(plan.host)
    }

    fn finish(self) -> Result<Vec<Bracket>, ScheduleFailure> {
        let short = self
            .participants
            .iter()
            .find(|p| self.remaining(&p.player_id) > 0);
        if let Some(participant) = short {
            return Err(ScheduleFailure::NoOpponent {
                player: participant.player_id.clone(),
            });
        }
        if !self.brackets.iter().all(Bracket::is_full) {
            return Err(ScheduleFailure::Incomplete);
        }
        Ok(self.brackets)
    }
}
