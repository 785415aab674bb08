use std::path::PathBuf;

use log::{info, warn};
use pico_args::Arguments;

use bracket_matcher::config::{RunConfig, RunOverrides};
use bracket_matcher::display::{print_brackets, write_brackets_json, write_brackets_to_file};
use bracket_matcher::parser::load_entry_rows;
use bracket_matcher::{BracketList, ErrorCode, RandomCandidates};

const HELP: &str = "\
Draw randomized single-elimination brackets from player entries

USAGE:
  bracket-matcher <ENTRIES.csv> [OPTIONS]

ARGS:
  <ENTRIES.csv>                CSV with header player_id,num_brackets,registered_at

OPTIONS:
  --label              NAME    Name shown on the output  [default: env BRKT_LABEL or Brackets]
  --players-per-match  N       Players per match         [default: env BRKT_PLAYERS_PER_MATCH or 2]
  --rounds             N       Rounds per bracket        [default: env BRKT_ROUNDS or 3]
  --max-attempts       N       Draws before giving up    [default: env BRKT_MAX_ATTEMPTS or 100]
  --seed               N       Seed for a reproducible draw
  --out                FILE    Write the brackets as text
  --json               FILE    Write the brackets as JSON

FLAGS:
  -h, --help                   Print help information

ENVIRONMENT:
  BRKT_MAX_ENTRIES             Most brackets one player may enter [default: 99]
  BRKT_CHAIN_DEPTH             Match moves allowed per repair     [default: 2]
  RUST_LOG                     Log filter                         [default: info]
  (A .env file in the working directory is read too)
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let overrides = RunOverrides {
        label: pargs.opt_value_from_str("--label")?,
        players_per_match: pargs.opt_value_from_str("--players-per-match")?,
        rounds: pargs.opt_value_from_str("--rounds")?,
        max_attempts: pargs.opt_value_from_str("--max-attempts")?,
        seed: pargs.opt_value_from_str("--seed")?,
        output: pargs.opt_value_from_str("--out")?,
        json_output: pargs.opt_value_from_str("--json")?,
    };
    let csv_path: PathBuf = pargs.free_from_str()?;

    let unused = pargs.finish();
    if !unused.is_empty() {
        warn!("Ignoring unused arguments: {:?}", unused);
    }

    let config = RunConfig::from_env(overrides)?;

    println!("Loading entries from {}...", csv_path.display());
    let rows = load_entry_rows(&csv_path)?;
    println!("Loaded {} entry rows", rows.len());

    let mut list = BracketList::new(config.bracket.clone());
    list.calc_total_brkts(&rows);
    if !list.can_randomize() {
        return Err(list.error_message().to_string().into());
    }

    // The list makes one attempt per call; retrying is up to us
    let mut code = ErrorCode::ReRandomize;
    for attempt in 0..config.max_attempts {
        code = match config.seed {
            Some(seed) => list.randomize_with(&mut RandomCandidates::seeded(
                seed.wrapping_add(u64::from(attempt)),
            )),
            None => list.randomize(),
        };
        if code != ErrorCode::ReRandomize {
            break;
        }
    }
    if !code.is_ok() {
        return Err(format!(
            "no valid draw after {} attempts: {}",
            config.max_attempts,
            list.error_message()
        )
        .into());
    }
    info!("Draw finished after {} attempt(s)", list.randomize_errors().len());

    print_brackets(&list);

    if let Some(path) = &config.output {
        write_brackets_to_file(list.label(), list.brackets(), path)?;
        println!("Brackets saved to {}", path.display());
    }
    if let Some(path) = &config.json_output {
        write_brackets_json(&list, path)?;
        println!("JSON saved to {}", path.display());
    }

    Ok(())
}
