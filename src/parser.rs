use chrono::{DateTime, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::BracketConfig;
use crate::error::{EntryError, LoadError};

/// A raw entry row as it arrives from a form, an API body or a CSV file.
///
/// Nothing is trusted yet: the count may be fractional or negative and the
/// timestamp may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRow {
    pub player_id: String,
    pub num_brackets: f64,
    #[serde(default)]
    pub registered_at: Option<String>,
}

impl EntryRow {
    pub fn new(
        player_id: impl Into<String>,
        num_brackets: f64,
        registered_at: Option<&str>,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            num_brackets,
            registered_at: registered_at.map(str::to_string),
        }
    }
}

/// A validated player entry.
///
/// `requested` is what the player bought, `needed` is what the demand
/// calculation lets them play after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub player_id: String,
    pub requested: u32,
    pub needed: u32,
    pub registered_at: DateTime<Utc>,
}

/// Parses a registration time: RFC 3339, or `YYYY-MM-DD HH:MM:SS` taken as UTC
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Validates a single row
fn parse_row(
    index: usize,
    row: &EntryRow,
    config: &BracketConfig,
) -> Result<PlayerEntry, EntryError> {
    let player_id = row.player_id.trim();
    if player_id.is_empty() {
        return Err(EntryError::EmptyPlayerId { row: index });
    }
    if player_id == config.bye_id() {
        return Err(EntryError::ReservedPlayerId(player_id.to_string()));
    }

    let value = row.num_brackets;
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(EntryError::CountNotInteger {
            player_id: player_id.to_string(),
            value,
        });
    }
    let count = value as i64;
    let max = config.max_brackets_per_player();
    if count < 1 || count > i64::from(max) {
        return Err(EntryError::CountOutOfRange {
            player_id: player_id.to_string(),
            count,
            max,
        });
    }

    let raw_time = row
        .registered_at
        .as_deref()
        .ok_or_else(|| EntryError::MissingTimestamp {
            player_id: player_id.to_string(),
        })?;
    let registered_at = parse_timestamp(raw_time).ok_or_else(|| EntryError::InvalidTimestamp {
        player_id: player_id.to_string(),
        value: raw_time.to_string(),
    })?;
    if registered_at < config.registered_after() || registered_at > config.registered_before() {
        return Err(EntryError::TimestampOutOfRange {
            player_id: player_id.to_string(),
            value: registered_at.to_rfc3339(),
        });
    }

    Ok(PlayerEntry {
        player_id: player_id.to_string(),
        requested: count as u32,
        needed: count as u32,
        registered_at,
    })
}

/// Sorts entries by demand, largest first; earlier registrants win ties
pub fn sort_by_demand(entries: &mut [PlayerEntry]) {
    entries.sort_by(|a, b| {
        b.needed
            .cmp(&a.needed)
            .then_with(|| a.registered_at.cmp(&b.registered_at))
    });
}

/// Validates a batch of rows into the ordered demand list.
///
/// The batch is all-or-nothing: the first bad row rejects it.
pub fn build_entries(
    rows: &[EntryRow],
    config: &BracketConfig,
) -> Result<Vec<PlayerEntry>, EntryError> {
    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let entry = parse_row(index, row, config)?;
        if !seen.insert(entry.player_id.clone()) {
            return Err(EntryError::DuplicatePlayer(entry.player_id));
        }
        entries.push(entry);
    }

    sort_by_demand(&mut entries);
    Ok(entries)
}

/// Loads entry rows from a CSV file with the header
/// `player_id,num_brackets,registered_at`
pub fn load_entry_rows<P: AsRef<Path>>(csv_path: P) -> Result<Vec<EntryRow>, LoadError> {
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)?;

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: EntryRow = result?;
        rows.push(row);
    }
    Ok(rows)
}
