//! Instant-runoff resolution for ranked-choice polls.
//!
//! The resolver walks `RoundStart -> CountVotes -> CheckMajority ->
//! { Winner | Eliminate -> RoundStart }` until a strict majority emerges or
//! a single option remains. Every round is recorded as it completes, so the
//! returned sequence is the full audit trail of the computation.

use crate::models::{OptionId, Poll, RoundResult};
use log::debug;
use std::collections::{BTreeMap, HashSet};

/// Terminal state of an instant-runoff computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrvOutcome {
    pub winner: Option<OptionId>,
    pub rounds: Vec<RoundResult>,
}

/// Runs the elimination rounds over the given rankings.
///
/// Rankings reaching this point have passed validation (no duplicates, no
/// unknown options), so the resolver never fails; an undecidable election
/// reports `winner: None` rather than an error. Re-running on identical
/// input always yields identical rounds:
/// - the fewest-votes option is eliminated each round;
/// - an elimination tie goes to the option with the lower cumulative vote
///   total across all prior rounds;
/// - a remaining tie is broken by declaration order, eliminating the
///   latest-declared option first.
pub fn resolve(poll: &Poll, rankings: &[Vec<OptionId>]) -> IrvOutcome {
    let mut eliminated: HashSet<OptionId> = HashSet::new();
    // Vote totals accumulated over completed rounds, first elimination tie-break.
    let mut prior_totals: BTreeMap<OptionId, u64> = BTreeMap::new();
    let mut rounds: Vec<RoundResult> = Vec::new();

    loop {
        let round_number = rounds.len() as u32 + 1;

        // CountVotes: each non-exhausted ballot votes for its highest-ranked
        // surviving option.
        let mut counts: BTreeMap<OptionId, u64> = poll
            .options
            .iter()
            .filter(|option| !eliminated.contains(&option.id))
            .map(|option| (option.id.clone(), 0))
            .collect();
        let mut exhausted: u64 = 0;
        for ranking in rankings {
            match ranking.iter().find(|option| counts.contains_key(*option)) {
                Some(top) => {
                    if let Some(count) = counts.get_mut(top) {
                        *count += 1;
                    }
                }
                None => exhausted += 1,
            }
        }
        let active_total: u64 = counts.values().sum();
        debug!(
            "irv round {}: active={} exhausted={} counts={:?}",
            round_number, active_total, exhausted, counts
        );

        if active_total == 0 {
            // An empty election in round one produces no rounds at all.
            // Later on it means every remaining ballot exhausted at once;
            // the exhaustion point is recorded and reported, not an error.
            if round_number > 1 {
                rounds.push(RoundResult {
                    round_number,
                    vote_counts: counts,
                    eliminated: None,
                    exhausted_ballots: exhausted,
                });
            }
            return IrvOutcome {
                winner: None,
                rounds,
            };
        }

        // CheckMajority: strictly more than half of the non-exhausted
        // ballots wins. Exhausted ballots left the denominator for good.
        // A sole surviving option holds all active votes and wins here too.
        let majority = counts
            .iter()
            .find(|(_, count)| **count * 2 > active_total)
            .map(|(option, _)| option.clone());
        if let Some(winner) = majority {
            debug!("irv round {}: majority winner {}", round_number, winner);
            rounds.push(RoundResult {
                round_number,
                vote_counts: counts,
                eliminated: None,
                exhausted_ballots: exhausted,
            });
            return IrvOutcome {
                winner: Some(winner),
                rounds,
            };
        }

        // Eliminate: fewest votes this round goes out.
        let Some(loser) = select_loser(poll, &counts, &prior_totals) else {
            // Unreachable with a non-zero active count; bail out rather
            // than loop forever if it ever happens.
            return IrvOutcome {
                winner: None,
                rounds,
            };
        };
        debug!("irv round {}: eliminating {}", round_number, loser);
        for (option, &count) in &counts {
            *prior_totals.entry(option.clone()).or_insert(0) += count;
        }
        eliminated.insert(loser.clone());
        rounds.push(RoundResult {
            round_number,
            vote_counts: counts,
            eliminated: Some(loser),
            exhausted_ballots: exhausted,
        });
    }
}

fn select_loser(
    poll: &Poll,
    counts: &BTreeMap<OptionId, u64>,
    prior_totals: &BTreeMap<OptionId, u64>,
) -> Option<OptionId> {
    let min_count = counts.values().min().copied()?;
    let mut tied: Vec<&OptionId> = counts
        .iter()
        .filter(|(_, count)| **count == min_count)
        .map(|(option, _)| option)
        .collect();

    if tied.len() > 1 {
        let min_prior = tied
            .iter()
            .map(|option| prior_totals.get(*option).copied().unwrap_or(0))
            .min()
            .unwrap_or(0);
        tied.retain(|option| prior_totals.get(*option).copied().unwrap_or(0) == min_prior);
    }

    // Reverse declaration order: the latest-declared tied option is
    // eliminated first, matching how reference tabulators apply a
    // candidate-order tie-break to loser selection.
    tied.into_iter()
        .max_by_key(|option| poll.option_index(option).unwrap_or(usize::MAX))
        .cloned()
}
