use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::bracket_list::BracketList;
use crate::schedule::Bracket;

/// Formats a match as `a vs b`
pub fn format_match(players: &[String]) -> String {
    players.join(" vs ")
}

/// One bracket on a single line: `Bracket N: a vs b, c vs d, ...`
pub fn format_bracket(number: usize, bracket: &Bracket) -> String {
    let matches: Vec<String> = bracket.matches().map(format_match).collect();
    format!("Bracket {}: {}", number, matches.join(", "))
}

/// Writes the brackets to a file in the format:
/// `** label **` followed by one line per bracket
pub fn write_brackets_to_file<P: AsRef<Path>>(
    label: &str,
    brackets: &[Bracket],
    filename: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::create(filename)?;

    writeln!(file, "** {} **", label)?;
    for (i, bracket) in brackets.iter().enumerate() {
        writeln!(file, "{}", format_bracket(i + 1, bracket))?;
    }

    Ok(())
}

#[derive(Serialize)]
struct BracketExport<'a> {
    label: &'a str,
    players_per_brkt: usize,
    full_count: usize,
    one_bye_count: usize,
    brackets: Vec<&'a [String]>,
}

/// Writes the finished brackets as JSON
pub fn write_brackets_json<P: AsRef<Path>>(
    list: &BracketList,
    filename: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let export = BracketExport {
        label: list.label(),
        players_per_brkt: list.players_per_brkt(),
        full_count: list.brkt_counts().full,
        one_bye_count: list.brkt_counts().one_bye,
        brackets: list.brackets().iter().map(Bracket::players).collect(),
    };

    let writer = BufWriter::new(File::create(filename)?);
    serde_json::to_writer_pretty(writer, &export)?;
    Ok(())
}

/// Prints the totals, any trimmed entries and the brackets
pub fn print_brackets(list: &BracketList) {
    println!("\n=== {} ===", list.label());
    let totals = list.totals();
    println!(
        "Brackets: {} ({} full, {} with a bye, {} players each)",
        totals.total_brackets(),
        totals.full_count,
        totals.one_bye_count,
        list.players_per_brkt()
    );

    let trimmed: Vec<_> = list
        .brkt_entries()
        .iter()
        .filter(|e| e.needed < e.requested)
        .collect();
    if !trimmed.is_empty() {
        println!("⚠️  Trimmed entries ({}):", trimmed.len());
        for entry in trimmed {
            println!(
                "  - {}: requested {}, playing {}",
                entry.player_id, entry.requested, entry.needed
            );
        }
    }

    println!();
    for (i, bracket) in list.brackets().iter().enumerate() {
        println!("  {}", format_bracket(i + 1, bracket));
    }

    let repeats: Vec<_> = list
        .pair_counts()
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .collect();
    if !repeats.is_empty() {
        println!("\nRepeat pairings:");
        for ((a, b), count) in repeats {
            println!("  {} vs {}: {} times", a, b, count);
        }
    }
}
