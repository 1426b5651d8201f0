use crate::models::{Ballot, OptionId, Poll, PollId, TallyResult, VoterId, VotingMethod};
use crate::validator::{self, ValidBallot, ValidationError};
use crate::voting;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("voting has ended for poll {0}")]
    PollClosed(PollId),
}

/// A validated, deduplicated ballot as stored per `(poll, voter)` pair.
/// This is what the storage collaborator persists on acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceptedBallot {
    pub voter_id: VoterId,
    pub ballot: ValidBallot,
    pub submitted_at: DateTime<Utc>,
}

/// Outcome of a successful submission, carrying the ballot for the
/// storage layer. `Replaced` signals that a prior ballot from the same
/// voter was swapped out rather than a new one appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Receipt {
    Accepted(AcceptedBallot),
    Replaced(AcceptedBallot),
}

impl Receipt {
    pub fn ballot(&self) -> &AcceptedBallot {
        match self {
            Receipt::Accepted(ballot) | Receipt::Replaced(ballot) => ballot,
        }
    }
}

#[derive(Debug)]
struct PollState {
    method: VotingMethod,
    /// Voters in first-submission order; replacement keeps the original slot.
    order: Vec<VoterId>,
    ballots: HashMap<VoterId, AcceptedBallot>,
    /// Incremental per-option aggregate for the single-pass methods.
    /// Stays zeroed for RankedChoice, which only resolves at read time.
    running: BTreeMap<OptionId, i64>,
}

impl PollState {
    fn new(poll: &Poll) -> Self {
        Self {
            method: poll.method,
            order: Vec::new(),
            ballots: HashMap::new(),
            running: poll
                .options
                .iter()
                .map(|option| (option.id.clone(), 0))
                .collect(),
        }
    }
}

/// Orchestrates validate -> deduplicate -> aggregate for every submission.
///
/// State is an arena keyed by poll id, so polls tally independently. The
/// processor itself is synchronous; callers running concurrent submissions
/// for the same poll must serialize them (per-poll critical section or a
/// compare-and-swap on the stored ballot) so that the last write wins —
/// that guarantee belongs to the orchestration layer, not this engine.
#[derive(Debug, Default)]
pub struct VoteProcessor {
    polls: HashMap<PollId, PollState>,
}

impl VoteProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and records one ballot for `(poll, voter)`.
    ///
    /// A resubmission replaces the voter's prior ballot atomically: the old
    /// contribution is reversed and the new one applied in the same logical
    /// step, so no observer of this processor sees the voter missing.
    pub fn submit(
        &mut self,
        poll: &Poll,
        voter_id: &str,
        ballot: Ballot,
    ) -> Result<Receipt, ProcessorError> {
        if !poll.is_open {
            debug!("rejecting ballot from {} for closed poll {}", voter_id, poll.id);
            return Err(ProcessorError::PollClosed(poll.id.clone()));
        }

        let valid = validator::validate(poll, ballot)?;

        let state = self
            .polls
            .entry(poll.id.clone())
            .or_insert_with(|| PollState::new(poll));
        let accepted = AcceptedBallot {
            voter_id: voter_id.to_string(),
            ballot: valid,
            submitted_at: Utc::now(),
        };

        match state.ballots.insert(voter_id.to_string(), accepted.clone()) {
            Some(previous) => {
                apply(poll, &mut state.running, previous.ballot.ballot(), -1);
                apply(poll, &mut state.running, accepted.ballot.ballot(), 1);
                info!("voter {} replaced their ballot in poll {}", voter_id, poll.id);
                Ok(Receipt::Replaced(accepted))
            }
            None => {
                state.order.push(voter_id.to_string());
                apply(poll, &mut state.running, accepted.ballot.ballot(), 1);
                debug!("voter {} cast a ballot in poll {}", voter_id, poll.id);
                Ok(Receipt::Accepted(accepted))
            }
        }
    }

    /// The accepted ballots in submission order — the frozen snapshot to
    /// hand to [`voting::tally`].
    pub fn snapshot(&self, poll_id: &str) -> Vec<ValidBallot> {
        self.polls
            .get(poll_id)
            .map(|state| {
                state
                    .order
                    .iter()
                    .filter_map(|voter| state.ballots.get(voter))
                    .map(|accepted| accepted.ballot.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Tallies the poll over the current snapshot.
    pub fn results(&self, poll: &Poll) -> TallyResult {
        voting::tally(poll, &self.snapshot(&poll.id))
    }

    /// The incremental aggregate for single-pass methods. None for
    /// RankedChoice polls (IRV has no meaningful per-ballot aggregate) and
    /// for polls with no accepted ballots yet.
    pub fn running_totals(&self, poll_id: &str) -> Option<&BTreeMap<OptionId, i64>> {
        let state = self.polls.get(poll_id)?;
        if state.method == VotingMethod::RankedChoice {
            return None;
        }
        Some(&state.running)
    }

    pub fn voter_ballot(&self, poll_id: &str, voter_id: &str) -> Option<&AcceptedBallot> {
        self.polls.get(poll_id)?.ballots.get(voter_id)
    }

    pub fn has_voted(&self, poll_id: &str, voter_id: &str) -> bool {
        self.voter_ballot(poll_id, voter_id).is_some()
    }

    pub fn ballot_count(&self, poll_id: &str) -> usize {
        self.polls
            .get(poll_id)
            .map(|state| state.ballots.len())
            .unwrap_or(0)
    }
}

/// Adds (`sign = 1`) or reverses (`sign = -1`) one ballot's contribution
/// to the running aggregate.
fn apply(poll: &Poll, running: &mut BTreeMap<OptionId, i64>, ballot: &Ballot, sign: i64) {
    match ballot {
        Ballot::SingleChoice { selected } => {
            if let Some(total) = running.get_mut(selected) {
                *total += sign;
            }
        }
        Ballot::Approval { selected } => {
            for option in selected {
                if let Some(total) = running.get_mut(option) {
                    *total += sign;
                }
            }
        }
        Ballot::Range { scores } => {
            let bounds = poll.score_bounds();
            for option in &poll.options {
                let score = scores.get(&option.id).copied().unwrap_or(bounds.min);
                if let Some(total) = running.get_mut(&option.id) {
                    *total += sign * score;
                }
            }
        }
        Ballot::Quadratic { allocations } => {
            for (option, &allocation) in allocations {
                if let Some(total) = running.get_mut(option) {
                    *total += sign * allocation;
                }
            }
        }
        // Deferred to read time; see `running_totals`.
        Ballot::RankedChoice { .. } => {}
    }
}
