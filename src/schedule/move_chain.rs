use std::collections::HashSet;

use crate::error::BracketError;
use super::bracket::Bracket;
use super::types::{Move, Relocation};
use super::usage::UsageIndex;

/// Plans the single swap that makes room for `current` vs `opponent` when no
/// bracket has room for both.
///
/// Looks for a bracket where `current` already plays someone who can move
/// elsewhere and where `opponent` is absent. That old match moves to a
/// bracket open to both of its players and the new match takes its place.
pub fn find_swap(
    current: &str,
    opponent: &str,
    brackets: &[Bracket],
    usage: &UsageIndex,
) -> Option<Relocation> {
    let current_open = usage.available(current, brackets);

    for from in usage.indices_of(current) {
        // The opponent must be able to sit in the freed bracket
        if usage.uses(opponent, from) {
            continue;
        }
        let Some(group) = brackets.get(from).and_then(|b| b.match_of(current)) else {
            continue;
        };

        let mut targets = current_open.clone();
        let mut partners_can_move = true;
        for partner in group.iter().filter(|p| p.as_str() != current) {
            let partner_open = usage.available(partner, brackets);
            if partner_open.is_empty() {
                partners_can_move = false;
                break;
            }
            targets.retain(|to| partner_open.contains(to));
        }
        if !partners_can_move {
            continue;
        }

        if let Some(&to) = targets.first() {
            return Some(Relocation {
                host: from,
                moves: vec![Move {
                    players: group.to_vec(),
                    from,
                    to,
                }],
            });
        }
    }

    None
}

/// Tries to find a chain of moves that takes `players` out of bracket
/// `from`, with depth limit.
///
/// The first move is this match's; each later move clears room in the
/// bracket the previous one moves into.
pub fn find_move_chain(
    players: &[String],
    from: usize,
    brackets: &[Bracket],
    usage: &UsageIndex,
    depth: u32,
    max_depth: u32,
    visited: &mut HashSet<usize>,
) -> Option<Vec<Move>> {
    if depth > max_depth {
        return None;
    }

    let open_to_all = |to: usize| players.iter().all(|p| !usage.uses(p, to));

    // Try to find a bracket with room first
    for (to, bracket) in brackets.iter().enumerate() {
        if to != from && !visited.contains(&to) && bracket.has_room() && open_to_all(to) {
            return Some(vec![Move {
                players: players.to_vec(),
                from,
                to,
            }]);
        }
    }

    if depth == max_depth {
        return None;
    }

    // No room anywhere; try to clear a full bracket by moving one of its matches
    for (to, bracket) in brackets.iter().enumerate() {
        if to == from || visited.contains(&to) || bracket.has_room() || !open_to_all(to) {
            continue;
        }

        visited.insert(to);
        for blocking in bracket.matches() {
            if let Some(mut sub_chain) = find_move_chain(
                blocking,
                to,
                brackets,
                usage,
                depth + 1,
                max_depth,
                visited,
            ) {
                sub_chain.insert(
                    0,
                    Move {
                        players: players.to_vec(),
                        from,
                        to,
                    },
                );
                return Some(sub_chain);
            }
        }
        visited.remove(&to);
    }

    None
}

/// Looks for a host bracket that a chain of moves can open for `current`
/// vs `opponent`. Hosts are tried in the given order.
pub fn find_host_chain(
    current: &str,
    opponent: &str,
    hosts: &[usize],
    brackets: &[Bracket],
    usage: &UsageIndex,
    max_depth: u32,
) -> Option<Relocation> {
    if max_depth == 0 {
        return None;
    }

    for &host in hosts {
        let Some(bracket) = brackets.get(host) else {
            continue;
        };
        let seated = (usage.uses(current, host), usage.uses(opponent, host));
        let evictable: Vec<&[String]> = match seated {
            (true, true) => continue,
            (true, false) => bracket.match_of(current).into_iter().collect(),
            (false, true) => bracket.match_of(opponent).into_iter().collect(),
            (false, false) if !bracket.has_room() => bracket.matches().collect(),
            (false, false) => {
                return Some(Relocation {
                    host,
                    moves: Vec::new(),
                })
            }
        };

        for players in evictable {
            let mut visited = HashSet::from([host]);
            if let Some(moves) =
                find_move_chain(players, host, brackets, usage, 1, max_depth, &mut visited)
            {
                return Some(Relocation { host, moves });
            }
        }
    }

    None
}

/// Applies a relocation's moves.
/// Moves must be applied in REVERSE order so each one lands in a bracket the
/// next deeper move has already cleared.
pub fn apply_relocation(
    relocation: &Relocation,
    brackets: &mut [Bracket],
    usage: &mut UsageIndex,
) -> Result<(), BracketError> {
    for mv in relocation.moves.iter().rev() {
        let Some(lead) = mv.players.first() else {
            continue;
        };
        let taken = brackets[mv.from].remove_match_of(lead)?;
        if taken != mv.players {
            // Put it back; the plan is stale
            brackets[mv.from].add_match(&taken)?;
            return Err(BracketError::NotInBracket(lead.clone()));
        }
        for player in &taken {
            usage.release(player, mv.from);
        }
        brackets[mv.to].add_match(&taken)?;
        for player in &taken {
            usage.record(player, mv.to);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Builds brackets of capacity 4 (two matches) from lists of matches
    fn layout(matches: &[&[[&str; 2]]]) -> (Vec<Bracket>, UsageIndex) {
        let mut brackets = Vec::new();
        let mut usage = UsageIndex::new();
        for (i, bracket_matches) in matches.iter().enumerate() {
            let mut bracket = Bracket::new(2, 4);
            for pair in bracket_matches.iter() {
                bracket.add_match(&ids(pair)).unwrap();
                for player in pair {
                    usage.record(player, i);
                }
            }
            brackets.push(bracket);
        }
        (brackets, usage)
    }

    #[test]
    fn test_find_swap_moves_current_players_match() {
        let (mut brackets, mut usage) = layout(&[&[["p", "r"]], &[["q", "x"]]]);
        // p can only go to bracket 1, where q already is
        assert_eq!(usage.available("p", &brackets), vec![1]);

        let plan = find_swap("p", "q", &brackets, &usage).unwrap();
        assert_eq!(
            plan,
            Relocation {
                host: 0,
                moves: vec![Move { players: ids(&["p", "r"]), from: 0, to: 1 }],
            }
        );

        apply_relocation(&plan, &mut brackets, &mut usage).unwrap();
        brackets[0].add_match(&ids(&["p", "q"])).unwrap();
        assert_eq!(brackets[0].players(), &ids(&["p", "q"])[..]);
        assert_eq!(brackets[1].players(), &ids(&["q", "x", "p", "r"])[..]);
        assert_eq!(usage.indices_of("r"), vec![1]);
        assert_eq!(usage.indices_of("p"), vec![1]);
    }

    #[test]
    fn test_find_swap_none_when_partner_is_stuck() {
        let (brackets, usage) = layout(&[
            &[["p", "r"], ["a", "b"]],
            &[["q", "s"], ["c", "d"]],
            &[["q", "r"]],
        ]);
        assert_eq!(find_swap("p", "q", &brackets, &usage), None);
        assert_eq!(find_swap("q", "p", &brackets, &usage), None);
    }

    #[test]
    fn test_host_chain_clears_a_full_bracket() {
        let (mut brackets, mut usage) = layout(&[
            &[["p", "r"], ["a", "b"]],
            &[["q", "s"], ["c", "d"]],
            &[["q", "r"]],
        ]);

        let plan = find_host_chain("p", "q", &[0, 1, 2], &brackets, &usage, 2).unwrap();
        assert_eq!(plan.host, 0);
        assert_eq!(
            plan.moves,
            vec![
                Move { players: ids(&["p", "r"]), from: 0, to: 1 },
                Move { players: ids(&["c", "d"]), from: 1, to: 2 },
            ]
        );

        apply_relocation(&plan, &mut brackets, &mut usage).unwrap();
        brackets[plan.host].add_match(&ids(&["p", "q"])).unwrap();
        assert_eq!(brackets[0].players(), &ids(&["a", "b", "p", "q"])[..]);
        assert_eq!(brackets[1].players(), &ids(&["q", "s", "p", "r"])[..]);
        assert_eq!(brackets[2].players(), &ids(&["q", "r", "c", "d"])[..]);
        assert!(usage.uses("c", 2) && !usage.uses("c", 1));
    }

    #[test]
    fn test_host_chain_respects_depth() {
        let (brackets, usage) = layout(&[
            &[["p", "r"], ["a", "b"]],
            &[["q", "s"], ["c", "d"]],
            &[["q", "r"]],
        ]);
        assert_eq!(find_host_chain("p", "q", &[0, 1, 2], &brackets, &usage, 1), None);
        assert_eq!(find_host_chain("p", "q", &[0, 1, 2], &brackets, &usage, 0), None);
    }

    #[test]
    fn test_apply_rejects_stale_plan() {
        let (mut brackets, mut usage) = layout(&[&[["p", "r"]], &[]]);
        let plan = Relocation {
            host: 0,
            moves: vec![Move { players: ids(&["p", "x"]), from: 0, to: 1 }],
        };
        assert!(apply_relocation(&plan, &mut brackets, &mut usage).is_err());
        assert_eq!(brackets[0].players(), &ids(&["p", "r"])[..]);
    }
}
