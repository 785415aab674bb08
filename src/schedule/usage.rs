use std::collections::{BTreeSet, HashMap};

use super::bracket::Bracket;

/// Which brackets each player already sits in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageIndex {
    by_player: HashMap<String, BTreeSet<usize>>,
}

impl UsageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, player_id: &str, bracket: usize) {
        self.by_player
            .entry(player_id.to_string())
            .or_default()
            .insert(bracket);
    }

    pub fn release(&mut self, player_id: &str, bracket: usize) {
        if let Some(indices) = self.by_player.get_mut(player_id) {
            indices.remove(&bracket);
        }
    }

    pub fn uses(&self, player_id: &str, bracket: usize) -> bool {
        self.by_player
            .get(player_id)
            .is_some_and(|indices| indices.contains(&bracket))
    }

    /// Bracket indices the player sits in, ascending
    pub fn indices_of(&self, player_id: &str) -> Vec<usize> {
        self.by_player
            .get(player_id)
            .map(|indices| indices.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Brackets with room for a match that the player is not in yet
    pub fn available(&self, player_id: &str, brackets: &[Bracket]) -> Vec<usize> {
        brackets
            .iter()
            .enumerate()
            .filter(|(i, bracket)| bracket.has_room() && !self.uses(player_id, *i))
            .map(|(i, _)| i)
            .collect()
    }
}

/// How many more times the current player may meet each opponent.
///
/// Meetings are shared out in proportion to the opponents' remaining demand
/// so nobody is drawn against the same player over and over. The bye does
/// not count as a genuine opponent: it is handed out one per player where
/// the numbers allow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpponentQuota {
    remaining: HashMap<String, u32>,
}

fn div_ceil(a: u64, b: u64) -> u64 {
    if b == 0 {
        0
    } else {
        a.div_ceil(b)
    }
}

impl OpponentQuota {
    /// Builds the quota for `current`, who still needs `current_remaining`
    /// matches, against every unfinished player in `others`.
    pub fn build(
        current: &str,
        current_remaining: u32,
        others: &[(&str, u32)],
        bye_id: &str,
        total_brackets: u32,
    ) -> Self {
        let current_is_bye = current == bye_id;
        let real_others: Vec<(&str, u32)> = others
            .iter()
            .copied()
            .filter(|&(id, rem)| id != bye_id && id != current && rem > 0)
            .collect();
        let real_demand: u64 = real_others.iter().map(|&(_, rem)| u64::from(rem)).sum();
        let unfinished_real = real_others.len() as u64 + u64::from(!current_is_bye);
        let bye_remaining = if current_is_bye {
            u64::from(current_remaining)
        } else {
            others
                .iter()
                .find(|&&(id, _)| id == bye_id)
                .map_or(0, |&(_, rem)| u64::from(rem))
        };
        let bye_share = div_ceil(bye_remaining, unfinished_real).max(1);

        let mut remaining = HashMap::new();
        if current_is_bye {
            for &(id, rem) in &real_others {
                remaining.insert(id.to_string(), (u64::from(rem).min(bye_share)) as u32);
            }
            return Self { remaining };
        }

        for &(id, rem) in &real_others {
            let fair = div_ceil(u64::from(current_remaining) * u64::from(rem), real_demand);
            let cap = rem.min(total_brackets).max(1);
            remaining.insert(id.to_string(), (fair as u32).clamp(1, cap));
        }
        if bye_remaining > 0 {
            let share = u64::from(current_remaining).min(bye_share);
            remaining.insert(bye_id.to_string(), share as u32);
        }
        Self { remaining }
    }

    pub fn allows(&self, opponent: &str) -> bool {
        self.get(opponent) > 0
    }

    pub fn get(&self, opponent: &str) -> u32 {
        self.remaining.get(opponent).copied().unwrap_or(0)
    }

    /// Uses up one meeting; the entry is cleared when it reaches zero
    pub fn consume(&mut self, opponent: &str) {
        if let Some(left) = self.remaining.get_mut(opponent) {
            *left = left.saturating_sub(1);
            if *left == 0 {
                self.remaining.remove(opponent);
            }
        }
    }
}
