use crate::models::{Ballot, OptionId, Poll, TallyResult};
use crate::validator::ValidBallot;
use std::collections::HashMap;

/// Sums scores per option. Options a ballot leaves unscored contribute the
/// range minimum, so every ballot adds the same baseline to every option;
/// there is no separate "no opinion" sentinel in this design.
pub fn tally(poll: &Poll, ballots: &[ValidBallot]) -> TallyResult {
    let bounds = poll.score_bounds();
    let mut scores = super::baseline_scores(poll);
    let mut first_support: HashMap<OptionId, usize> = HashMap::new();
    let mut counted: u64 = 0;

    for (index, valid) in ballots.iter().enumerate() {
        let Ballot::Range {
            scores: ballot_scores,
        } = valid.ballot()
        else {
            continue;
        };
        counted += 1;
        for option in &poll.options {
            let score = ballot_scores.get(&option.id).copied().unwrap_or(bounds.min);
            if let Some(total) = scores.get_mut(&option.id) {
                *total += score;
            }
            if score > bounds.min {
                first_support.entry(option.id.clone()).or_insert(index);
            }
        }
    }

    super::finish_single_pass(poll, scores, first_support, counted)
}
