use crate::irv;
use crate::models::{Ballot, OptionId, Poll, TallyResult, VotingMethod};
use crate::validator::ValidBallot;

/// Ranked-choice tallying delegates entirely to the instant-runoff
/// resolver; ranking order only resolves globally once every ballot is
/// known, so there is no incremental aggregation for this method.
pub fn tally(poll: &Poll, ballots: &[ValidBallot]) -> TallyResult {
    let rankings: Vec<Vec<OptionId>> = ballots
        .iter()
        .filter_map(|valid| match valid.ballot() {
            Ballot::RankedChoice { ranking } => Some(ranking.clone()),
            _ => None,
        })
        .collect();

    let outcome = irv::resolve(poll, &rankings);

    // The final round's counts become the per-option breakdown; options
    // eliminated earlier report zero, the rounds trail has their history.
    let mut per_option_score = super::baseline_scores(poll);
    if let Some(last) = outcome.rounds.last() {
        for (option, &count) in &last.vote_counts {
            if let Some(score) = per_option_score.get_mut(option) {
                *score = count as i64;
            }
        }
    }

    TallyResult {
        method: VotingMethod::RankedChoice,
        winner: outcome.winner,
        per_option_score,
        rounds: outcome.rounds,
        ballot_count: rankings.len() as u64,
    }
}
