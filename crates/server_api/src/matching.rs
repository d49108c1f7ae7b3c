use rand::{seq::SliceRandom, Rng};

/// Smallest pool that can produce a match.
pub const MIN_CANDIDATES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    InsufficientCandidates,
    Matched(String),
}

impl MatchOutcome {
    pub fn into_match(self) -> Option<String> {
        match self {
            Self::Matched(candidate) => Some(candidate),
            Self::InsufficientCandidates => None,
        }
    }
}

/// Draws one candidate uniformly from the whole pool.
///
/// Nobody is excluded, so a requester who is part of the pool can draw
/// themselves. Every call is an independent draw.
pub fn select_match(candidates: &[String]) -> MatchOutcome {
    select_match_with(candidates, &mut rand::thread_rng())
}

pub fn select_match_with<R: Rng + ?Sized>(candidates: &[String], rng: &mut R) -> MatchOutcome {
    if candidates.len() < MIN_CANDIDATES {
        return MatchOutcome::InsufficientCandidates;
    }
    match candidates.choose(rng) {
        Some(candidate) => MatchOutcome::Matched(candidate.clone()),
        None => MatchOutcome::InsufficientCandidates,
    }
}
