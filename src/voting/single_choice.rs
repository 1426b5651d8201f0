use crate::models::{Ballot, OptionId, Poll, TallyResult};
use crate::validator::ValidBallot;
use std::collections::HashMap;

/// Counts one vote per ballot for its selected option.
pub fn tally(poll: &Poll, ballots: &[ValidBallot]) -> TallyResult {
    let mut scores = super::baseline_scores(poll);
    let mut first_support: HashMap<OptionId, usize> = HashMap::new();
    let mut counted: u64 = 0;

    for (index, valid) in ballots.iter().enumerate() {
        let Ballot::SingleChoice { selected } = valid.ballot() else {
            continue;
        };
        counted += 1;
        if let Some(score) = scores.get_mut(selected) {
            *score += 1;
            first_support.entry(selected.clone()).or_insert(index);
        }
    }

    super::finish_single_pass(poll, scores, first_support, counted)
}
