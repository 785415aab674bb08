//! Sources of randomness for a scheduling attempt.
//!
//! The scheduler never draws random numbers itself; everything goes through
//! a [`CandidateSource`], so an attempt can be replayed exactly.

use rand::rngs::{StdRng, ThreadRng};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Supplies the opponent candidate order and the bracket try order
pub trait CandidateSource {
    /// Orders the entry pool: one slot per entry, so a player needing three
    /// brackets appears three times.
    fn candidate_sequence(&mut self, pool: &[String]) -> Vec<String>;

    /// Orders the bracket indices tried when placing a match
    fn order_brackets(&mut self, indices: &mut [usize]);
}

/// Shuffles everything with an RNG
#[derive(Debug, Clone)]
pub struct RandomCandidates<R: Rng = ThreadRng> {
    rng: R,
}

impl RandomCandidates<ThreadRng> {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for RandomCandidates<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomCandidates<StdRng> {
    /// Reproducible draws
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> CandidateSource for RandomCandidates<R> {
    fn candidate_sequence(&mut self, pool: &[String]) -> Vec<String> {
        let mut sequence = pool.to_vec();
        sequence.shuffle(&mut self.rng);
        sequence
    }

    fn order_brackets(&mut self, indices: &mut [usize]) {
        indices.shuffle(&mut self.rng);
    }
}

/// A caller-supplied candidate sequence; brackets are tried in index order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedCandidates {
    sequence: Vec<String>,
}

impl FixedCandidates {
    pub fn new<I, S>(sequence: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sequence: sequence.into_iter().map(Into::into).collect(),
        }
    }
}

impl CandidateSource for FixedCandidates {
    fn candidate_sequence(&mut self, _pool: &[String]) -> Vec<String> {
        self.sequence.clone()
    }

    fn order_brackets(&mut self, _indices: &mut [usize]) {}
}

/// Expands `(player, needed)` pairs into one slot per entry
pub fn entry_pool<'a, I>(participants: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, u32)>,
{
    participants
        .into_iter()
        .flat_map(|(id, needed)| std::iter::repeat(id.to_string()).take(needed as usize))
        .collect()
}

/// True when `sequence` holds exactly the slots of `pool`, in any order
pub fn is_permutation_of(sequence: &[String], pool: &[String]) -> bool {
    if sequence.len() != pool.len() {
        return false;
    }
    let mut a: Vec<&String> = sequence.iter().collect();
    let mut b: Vec<&String> = pool.iter().collect();
    a.sort();
    b.sort();
    a == b
}
