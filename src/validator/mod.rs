use crate::models::{Ballot, OptionId, Poll, VotingMethod};
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

/// Caller-correctable ballot defects. Always returned, never panicked, so
/// the API layer can surface per-field feedback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("ballot is a {ballot:?} ballot but the poll uses {poll:?}")]
    MethodMismatch {
        poll: VotingMethod,
        ballot: VotingMethod,
    },

    #[error("option {0} is not part of this poll")]
    UnknownOption(OptionId),

    #[error("expected between {min} and {max} selections, got {got}")]
    InvalidSelectionCount { got: usize, min: usize, max: usize },

    #[error("score {score} for option {option} is outside the allowed range {min}..={max}")]
    ScoreOutOfRange {
        option: OptionId,
        score: i64,
        min: i64,
        max: i64,
    },

    #[error("allocation cost {cost} exceeds the credit budget {budget}")]
    BudgetExceeded { cost: i64, budget: i64 },

    #[error("negative allocation for option {0} is not allowed in this poll")]
    NegativeNotAllowed(OptionId),

    #[error("option {0} appears more than once in the ranking")]
    DuplicateRanking(OptionId),
}

/// A ballot that has passed validation against its poll.
///
/// The only way to obtain one is [`validate`], which is what lets the tally
/// engine accept ballots without re-checking them: a ballot referencing an
/// unknown option cannot reach `tally()` through the public API. There is
/// deliberately no `Deserialize` impl; a storage layer rehydrating ballots
/// re-validates them on the way back in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidBallot {
    ballot: Ballot,
}

impl ValidBallot {
    pub fn ballot(&self) -> &Ballot {
        &self.ballot
    }

    pub fn into_ballot(self) -> Ballot {
        self.ballot
    }
}

/// Checks a ballot against its poll's method and configuration.
///
/// Pure function, no side effects. Checks run in a fixed order and stop at
/// the first failure: method match, option references, then method-specific
/// shape rules.
pub fn validate(poll: &Poll, ballot: Ballot) -> Result<ValidBallot, ValidationError> {
    if ballot.method() != poll.method {
        return Err(ValidationError::MethodMismatch {
            poll: poll.method,
            ballot: ballot.method(),
        });
    }

    check_option_references(poll, &ballot)?;

    match &ballot {
        // Exactly one selection is guaranteed by the ballot shape.
        Ballot::SingleChoice { .. } => {}

        Ballot::Approval { selected } => {
            let min = poll.min_selections.unwrap_or(0);
            let max = poll.max_selections.unwrap_or(poll.options.len());
            if selected.len() < min || selected.len() > max {
                return Err(ValidationError::InvalidSelectionCount {
                    got: selected.len(),
                    min,
                    max,
                });
            }
        }

        Ballot::Range { scores } => {
            let bounds = poll.score_bounds();
            for (option, &score) in scores {
                if score < bounds.min || score > bounds.max {
                    return Err(ValidationError::ScoreOutOfRange {
                        option: option.clone(),
                        score,
                        min: bounds.min,
                        max: bounds.max,
                    });
                }
            }
        }

        Ballot::Quadratic { allocations } => {
            let budget = poll.quadratic_budget();
            // Cost arithmetic in i128 so large allocations cannot wrap.
            let cost: i128 = allocations
                .values()
                .map(|&a| (a as i128) * (a as i128))
                .sum();
            if cost > budget as i128 {
                return Err(ValidationError::BudgetExceeded {
                    cost: cost.try_into().unwrap_or(i64::MAX),
                    budget,
                });
            }
            if !poll.allow_negative_voting {
                if let Some((option, _)) = allocations.iter().find(|(_, a)| **a < 0) {
                    return Err(ValidationError::NegativeNotAllowed(option.clone()));
                }
            }
        }

        Ballot::RankedChoice { ranking } => {
            // No duplicates; together with the reference check above this
            // also bounds the ranking length by the option count.
            let mut seen: BTreeSet<&OptionId> = BTreeSet::new();
            for option in ranking {
                if !seen.insert(option) {
                    return Err(ValidationError::DuplicateRanking(option.clone()));
                }
            }
        }
    }

    Ok(ValidBallot { ballot })
}

fn check_option_references(poll: &Poll, ballot: &Ballot) -> Result<(), ValidationError> {
    let mut referenced: Vec<&OptionId> = Vec::new();
    match ballot {
        Ballot::SingleChoice { selected } => referenced.push(selected),
        Ballot::Approval { selected } => referenced.extend(selected.iter()),
        Ballot::Range { scores } => referenced.extend(scores.keys()),
        Ballot::Quadratic { allocations } => referenced.extend(allocations.keys()),
        Ballot::RankedChoice { ranking } => referenced.extend(ranking.iter()),
    }
    for option in referenced {
        if !poll.has_option(option) {
            return Err(ValidationError::UnknownOption(option.clone()));
        }
    }
    Ok(())
}
