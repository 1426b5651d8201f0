use crate::models::{Ballot, OptionId, Poll, TallyResult};
use crate::validator::ValidBallot;
use std::collections::HashMap;

/// Counts approvals per option independently; a ballot contributes one
/// increment to every option it approves.
pub fn tally(poll: &Poll, ballots: &[ValidBallot]) -> TallyResult {
    let mut scores = super::baseline_scores(poll);
    let mut first_support: HashMap<OptionId, usize> = HashMap::new();
    let mut counted: u64 = 0;

    for (index, valid) in ballots.iter().enumerate() {
        let Ballot::Approval { selected } = valid.ballot() else {
            continue;
        };
        counted += 1;
        for option in selected {
            if let Some(score) = scores.get_mut(option) {
                *score += 1;
                first_support.entry(option.clone()).or_insert(index);
            }
        }
    }

    super::finish_single_pass(poll, scores, first_support, counted)
}
