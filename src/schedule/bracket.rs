use serde::{Deserialize, Serialize};

use crate::error::BracketError;

/// One single-elimination bracket.
///
/// Players are stored in seat order and always added a whole match at a
/// time, so seats `[k * players_per_match, (k + 1) * players_per_match)` form
/// match `k`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    players: Vec<String>,
    players_per_match: usize,
    capacity: usize,
}

impl Bracket {
    pub fn new(players_per_match: usize, capacity: usize) -> Self {
        Self {
            players: Vec::with_capacity(capacity),
            players_per_match,
            capacity,
        }
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity
    }

    /// Room for one more match
    pub fn has_room(&self) -> bool {
        self.players.len() + self.players_per_match <= self.capacity
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p == player_id)
    }

    pub fn position_of(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p == player_id)
    }

    /// Appends a match
    pub fn add_match(&mut self, players: &[String]) -> Result<(), BracketError> {
        if players.len() != self.players_per_match {
            return Err(BracketError::WrongMatchSize {
                expected: self.players_per_match,
                got: players.len(),
            });
        }
        if !self.has_room() {
            return Err(BracketError::Full);
        }
        for (i, player) in players.iter().enumerate() {
            if self.contains(player) || players[..i].contains(player) {
                return Err(BracketError::DuplicatePlayer(player.clone()));
            }
        }

        self.players.extend(players.iter().cloned());
        Ok(())
    }

    /// The match holding seat `position`
    pub fn match_containing(&self, position: usize) -> Option<&[String]> {
        if position >= self.players.len() {
            return None;
        }
        let start = position - position % self.players_per_match;
        Some(&self.players[start..start + self.players_per_match])
    }

    /// The match `player_id` plays in this bracket
    pub fn match_of(&self, player_id: &str) -> Option<&[String]> {
        self.position_of(player_id)
            .and_then(|position| self.match_containing(position))
    }

    /// Takes out the match `player_id` plays in; later matches shift down a
    /// group so matches stay contiguous.
    pub fn remove_match_of(&mut self, player_id: &str) -> Result<Vec<String>, BracketError> {
        let position = self
            .position_of(player_id)
            .ok_or_else(|| BracketError::NotInBracket(player_id.to_string()))?;
        let start = position - position % self.players_per_match;
        Ok(self
            .players
            .drain(start..start + self.players_per_match)
            .collect())
    }

    pub fn matches(&self) -> impl Iterator<Item = &[String]> {
        self.players.chunks(self.players_per_match)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_match_until_full() {
        let mut bracket = Bracket::new(2, 4);
        assert!(bracket.is_empty());
        bracket.add_match(&ids(&["amy", "bob"])).unwrap();
        assert!(bracket.has_room());
        bracket.add_match(&ids(&["cal", "dee"])).unwrap();
        assert!(bracket.is_full());
        assert_eq!(bracket.add_match(&ids(&["eve", "fay"])), Err(BracketError::Full));
        assert_eq!(bracket.matches().count(), 2);
    }

    #[test]
    fn test_add_match_rejects_bad_matches() {
        let mut bracket = Bracket::new(2, 8);
        assert_eq!(
            bracket.add_match(&ids(&["amy"])),
            Err(BracketError::WrongMatchSize { expected: 2, got: 1 })
        );
        assert_eq!(
            bracket.add_match(&ids(&["amy", "amy"])),
            Err(BracketError::DuplicatePlayer("amy".to_string()))
        );
        bracket.add_match(&ids(&["amy", "bob"])).unwrap();
        assert_eq!(
            bracket.add_match(&ids(&["cal", "bob"])),
            Err(BracketError::DuplicatePlayer("bob".to_string()))
        );
        assert_eq!(bracket.len(), 2);
    }

    #[test]
    fn test_match_containing_finds_opponent() {
        let mut bracket = Bracket::new(2, 8);
        bracket.add_match(&ids(&["amy", "bob"])).unwrap();
        bracket.add_match(&ids(&["cal", "dee"])).unwrap();

        assert_eq!(bracket.match_containing(3), Some(&ids(&["cal", "dee"])[..]));
        assert_eq!(bracket.match_containing(0), Some(&ids(&["amy", "bob"])[..]));
        assert_eq!(bracket.match_containing(4), None);
        assert_eq!(bracket.match_of("bob"), Some(&ids(&["amy", "bob"])[..]));
    }

    #[test]
    fn test_remove_match_keeps_groups_contiguous() {
        let mut bracket = Bracket::new(2, 8);
        bracket.add_match(&ids(&["amy", "bob"])).unwrap();
        bracket.add_match(&ids(&["cal", "dee"])).unwrap();
        bracket.add_match(&ids(&["eve", "fay"])).unwrap();

        assert_eq!(bracket.remove_match_of("dee").unwrap(), ids(&["cal", "dee"]));
        let matches: Vec<&[String]> = bracket.matches().collect();
        assert_eq!(matches, vec![&ids(&["amy", "bob"])[..], &ids(&["eve", "fay"])[..]]);
        assert_eq!(
            bracket.remove_match_of("dee"),
            Err(BracketError::NotInBracket("dee".to_string()))
        );
    }
}
