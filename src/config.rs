//! Bracket and run configuration.
//!
//! `BracketConfig` fixes the shape of every bracket for the lifetime of a
//! [`BracketList`](crate::BracketList). `RunConfig` gathers what the CLI needs,
//! read from the environment and overridden by command line flags.

use chrono::{DateTime, TimeZone, Utc};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Default ceiling on brackets one player may buy
pub const DEFAULT_MAX_BRACKETS_PER_PLAYER: u32 = 99;
/// Default id used for the bye filler entry
pub const DEFAULT_BYE_ID: &str = "BYE";
/// Default depth of the relocation chain search
pub const DEFAULT_MAX_CHAIN_DEPTH: u32 = 2;
/// Largest supported number of rounds (64-player brackets)
pub const MAX_ROUNDS: u32 = 6;

/// Shape of the brackets and the limits applied to entries
#[derive(Debug, Clone, PartialEq)]
pub struct BracketConfig {
    label: String,
    players_per_match: usize,
    rounds: u32,
    players_per_brkt: usize,
    max_brackets_per_player: u32,
    registered_after: DateTime<Utc>,
    registered_before: DateTime<Utc>,
    bye_id: String,
    max_chain_depth: u32,
}

impl BracketConfig {
    /// Creates a configuration; `players_per_brkt` is derived as
    /// `players_per_match ^ rounds`.
    pub fn new(
        label: impl Into<String>,
        players_per_match: usize,
        rounds: u32,
    ) -> Result<Self, ConfigError> {
        if players_per_match != 2 {
            return Err(ConfigError::UnsupportedMatchSize(players_per_match));
        }
        if rounds == 0 || rounds > MAX_ROUNDS {
            return Err(ConfigError::InvalidRounds {
                rounds,
                max: MAX_ROUNDS,
            });
        }

        Ok(Self {
            label: label.into(),
            players_per_match,
            rounds,
            players_per_brkt: players_per_match.pow(rounds),
            max_brackets_per_player: DEFAULT_MAX_BRACKETS_PER_PLAYER,
            registered_after: default_registered_after(),
            registered_before: default_registered_before(),
            bye_id: DEFAULT_BYE_ID.to_string(),
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
        })
    }

    /// Sets the ceiling on a single player's requested bracket count
    pub fn with_max_brackets_per_player(mut self, max: u32) -> Result<Self, ConfigError> {
        if max == 0 {
            return Err(ConfigError::InvalidEntryCeiling);
        }
        self.max_brackets_per_player = max;
        Ok(self)
    }

    /// Sets the accepted registration window (inclusive on both ends)
    pub fn with_registration_window(
        mut self,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> Result<Self, ConfigError> {
        if after > before {
            return Err(ConfigError::EmptyRegistrationWindow);
        }
        self.registered_after = after;
        self.registered_before = before;
        Ok(self)
    }

    /// Sets the id written into brackets for the bye filler
    pub fn with_bye_id(mut self, bye_id: impl Into<String>) -> Result<Self, ConfigError> {
        let bye_id = bye_id.into();
        if bye_id.trim().is_empty() {
            return Err(ConfigError::EmptyByeId);
        }
        self.bye_id = bye_id;
        Ok(self)
    }

    /// Sets how many nested relocations the conflict repair may chain.
    /// Zero limits repair to the single swap.
    pub fn with_max_chain_depth(mut self, depth: u32) -> Self {
        self.max_chain_depth = depth;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn players_per_match(&self) -> usize {
        self.players_per_match
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn players_per_brkt(&self) -> usize {
        self.players_per_brkt
    }

    pub fn max_brackets_per_player(&self) -> u32 {
        self.max_brackets_per_player
    }

    pub fn registered_after(&self) -> DateTime<Utc> {
        self.registered_after
    }

    pub fn registered_before(&self) -> DateTime<Utc> {
        self.registered_before
    }

    pub fn bye_id(&self) -> &str {
        &self.bye_id
    }

    pub fn max_chain_depth(&self) -> u32 {
        self.max_chain_depth
    }
}

impl Default for BracketConfig {
    /// Head-to-head matches, three rounds (8-player brackets)
    fn default() -> Self {
        Self {
            label: "Brackets".to_string(),
            players_per_match: 2,
            rounds: 3,
            players_per_brkt: 8,
            max_brackets_per_player: DEFAULT_MAX_BRACKETS_PER_PLAYER,
            registered_after: default_registered_after(),
            registered_before: default_registered_before(),
            bye_id: DEFAULT_BYE_ID.to_string(),
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
        }
    }
}

fn default_registered_after() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn default_registered_before() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2200, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Values given on the command line; they win over the environment
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub label: Option<String>,
    pub players_per_match: Option<usize>,
    pub rounds: Option<u32>,
    pub max_attempts: Option<u32>,
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
    pub json_output: Option<PathBuf>,
}

/// Everything one CLI run needs
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Bracket shape and entry limits
    pub bracket: BracketConfig,
    /// How many times the caller re-invokes `randomize` before giving up
    pub max_attempts: u32,
    /// Seed for a reproducible draw
    pub seed: Option<u64>,
    /// Plain text schedule file
    pub output: Option<PathBuf>,
    /// JSON schedule file
    pub json_output: Option<PathBuf>,
}

impl RunConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but invalid, or the resulting
    /// bracket shape is unsupported
    pub fn from_env(overrides: RunOverrides) -> Result<Self, ConfigError> {
        let label = overrides
            .label
            .or_else(|| std::env::var("BRKT_LABEL").ok())
            .unwrap_or_else(|| "Brackets".to_string());

        let players_per_match = match overrides.players_per_match {
            Some(n) => n,
            None => parse_env_var("BRKT_PLAYERS_PER_MATCH", 2)?,
        };
        let rounds = match overrides.rounds {
            Some(n) => n,
            None => parse_env_var("BRKT_ROUNDS", 3)?,
        };
        let max_entries = parse_env_var("BRKT_MAX_ENTRIES", DEFAULT_MAX_BRACKETS_PER_PLAYER)?;
        let chain_depth = parse_env_var("BRKT_CHAIN_DEPTH", DEFAULT_MAX_CHAIN_DEPTH)?;

        let bracket = BracketConfig::new(label, players_per_match, rounds)?
            .with_max_brackets_per_player(max_entries)?
            .with_max_chain_depth(chain_depth);

        let max_attempts = match overrides.max_attempts {
            Some(n) => n,
            None => parse_env_var("BRKT_MAX_ATTEMPTS", 100)?,
        };

        Ok(RunConfig {
            bracket,
            max_attempts: max_attempts.max(1),
            seed: overrides.seed,
            output: overrides.output,
            json_output: overrides.json_output,
        })
    }
}

/// Reads `key` from the environment, `default` when unset
fn parse_env_var<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: key.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_players_per_brkt_is_derived() {
        let config = BracketConfig::new("Scratch", 2, 3).unwrap();
        assert_eq!(config.players_per_brkt(), 8);

        let config = BracketConfig::new("Scratch", 2, 4).unwrap();
        assert_eq!(config.players_per_brkt(), 16);
    }

    #[test]
    fn test_default_matches_three_round_config() {
        let built = BracketConfig::new("Brackets", 2, 3).unwrap();
        assert_eq!(BracketConfig::default(), built);
    }

    #[test]
    fn test_rejects_unsupported_shapes() {
        assert_eq!(
            BracketConfig::new("x", 3, 2),
            Err(ConfigError::UnsupportedMatchSize(3))
        );
        assert!(matches!(
            BracketConfig::new("x", 2, 0),
            Err(ConfigError::InvalidRounds { rounds: 0, .. })
        ));
        assert!(matches!(
            BracketConfig::new("x", 2, MAX_ROUNDS + 1),
            Err(ConfigError::InvalidRounds { .. })
        ));
    }

    #[test]
    fn test_builder_validation() {
        let config = BracketConfig::default();
        assert_eq!(
            config.clone().with_max_brackets_per_player(0),
            Err(ConfigError::InvalidEntryCeiling)
        );
        assert_eq!(config.clone().with_bye_id("  "), Err(ConfigError::EmptyByeId));

        let later = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            config.clone().with_registration_window(later, earlier),
            Err(ConfigError::EmptyRegistrationWindow)
        );

        let config = config
            .with_registration_window(earlier, later)
            .unwrap()
            .with_bye_id("Bye")
            .unwrap()
            .with_max_chain_depth(0);
        assert_eq!(config.registered_after(), earlier);
        assert_eq!(config.bye_id(), "Bye");
        assert_eq!(config.max_chain_depth(), 0);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            var: "BRKT_ROUNDS".to_string(),
            value: "three".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value \"three\" for BRKT_ROUNDS");
    }
}
