use crate::models::{Ballot, OptionId, Poll, TallyResult};
use crate::validator::ValidBallot;
use std::collections::HashMap;

/// Sums signed allocations per option. The square of an allocation is only
/// the cost charged against the ballot's credit budget at validation time;
/// the tally weight is the allocation itself, so negative allocations
/// (where the poll permits them) count against an option.
pub fn tally(poll: &Poll, ballots: &[ValidBallot]) -> TallyResult {
    let mut scores = super::baseline_scores(poll);
    let mut first_support: HashMap<OptionId, usize> = HashMap::new();
    let mut counted: u64 = 0;

    for (index, valid) in ballots.iter().enumerate() {
        let Ballot::Quadratic { allocations } = valid.ballot() else {
            continue;
        };
        counted += 1;
        for (option, &allocation) in allocations {
            if allocation == 0 {
                continue;
            }
            if let Some(total) = scores.get_mut(option) {
                *total += allocation;
            }
            if allocation > 0 {
                first_support.entry(option.clone()).or_insert(index);
            }
        }
    }

    super::finish_single_pass(poll, scores, first_support, counted)
}
