pub mod approval;
pub mod quadratic;
pub mod range;
pub mod ranked;
pub mod single_choice;

use crate::models::{OptionId, Poll, TallyResult, TiePolicy, VotingMethod};
use crate::validator::ValidBallot;
use std::collections::{BTreeMap, HashMap};

/// Tallies a frozen snapshot of validated ballots for one poll.
///
/// Dispatches on the poll's voting method. The slice order is the
/// submission order; it only matters for the `FirstSubmitted` tie policy.
/// Callers must pass a snapshot, not a live collection, so that repeated
/// calls over the same input produce identical results.
pub fn tally(poll: &Poll, ballots: &[ValidBallot]) -> TallyResult {
    match poll.method {
        VotingMethod::SingleChoice => single_choice::tally(poll, ballots),
        VotingMethod::Approval => approval::tally(poll, ballots),
        VotingMethod::Range => range::tally(poll, ballots),
        VotingMethod::Quadratic => quadratic::tally(poll, ballots),
        VotingMethod::RankedChoice => ranked::tally(poll, ballots),
    }
}

/// Zeroed per-option scores covering every declared option, so options
/// nobody voted for still appear in the result.
pub(crate) fn baseline_scores(poll: &Poll) -> BTreeMap<OptionId, i64> {
    poll.options
        .iter()
        .map(|option| (option.id.clone(), 0))
        .collect()
}

/// Builds the result for the four single-pass methods: highest score wins,
/// ties resolved by the poll's tie policy.
pub(crate) fn finish_single_pass(
    poll: &Poll,
    scores: BTreeMap<OptionId, i64>,
    first_support: HashMap<OptionId, usize>,
    ballot_count: u64,
) -> TallyResult {
    let winner = pick_winner(poll, &scores, &first_support, ballot_count);
    TallyResult {
        method: poll.method,
        winner,
        per_option_score: scores,
        rounds: Vec::new(),
        ballot_count,
    }
}

fn pick_winner(
    poll: &Poll,
    scores: &BTreeMap<OptionId, i64>,
    first_support: &HashMap<OptionId, usize>,
    ballot_count: u64,
) -> Option<OptionId> {
    if ballot_count == 0 {
        return None;
    }
    let best = scores.values().max().copied()?;
    let tied: Vec<&OptionId> = scores
        .iter()
        .filter(|(_, score)| **score == best)
        .map(|(option, _)| option)
        .collect();
    if let [only] = tied.as_slice() {
        return Some((*only).clone());
    }

    match poll.tie_policy {
        TiePolicy::None => None,
        // BTreeMap iteration already sorts by id.
        TiePolicy::Lexicographic => tied.first().map(|option| (*option).clone()),
        // The tied option backed by the earliest ballot wins; options no
        // ballot ever supported sort last, then declaration order decides.
        TiePolicy::FirstSubmitted => tied
            .into_iter()
            .min_by_key(|option| {
                (
                    first_support.get(*option).copied().unwrap_or(usize::MAX),
                    poll.option_index(option).unwrap_or(usize::MAX),
                )
            })
            .cloned(),
    }
}
