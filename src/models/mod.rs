use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

pub type PollId = String;
pub type OptionId = String;
pub type VoterId = String;

/// Score range applied when a Range poll does not configure one.
pub const DEFAULT_SCORE_RANGE: ScoreRange = ScoreRange { min: 0, max: 10 };

/// Credit budget applied when a Quadratic poll does not configure one.
pub const DEFAULT_CREDIT_BUDGET: i64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: PollId,
    pub question: String,
    pub options: Vec<PollOption>,
    pub method: VotingMethod,
    /// Minimum number of selections for Approval polls. Unrestricted if None.
    pub min_selections: Option<usize>,
    /// Maximum number of selections for Approval polls. Unrestricted if None.
    pub max_selections: Option<usize>,
    /// Allowed score interval for Range polls.
    pub score_range: Option<ScoreRange>,
    /// Credit budget for Quadratic polls (a ballot's cost is its sum of squared allocations).
    pub credit_budget: Option<i64>,
    /// Whether Quadratic ballots may allocate negative votes to an option.
    pub allow_negative_voting: bool,
    pub tie_policy: TiePolicy,
    pub created_at: DateTime<Utc>,
    pub is_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    pub id: OptionId,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VotingMethod {
    SingleChoice,
    Approval,
    Range,
    Quadratic,
    RankedChoice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: i64,
    pub max: i64,
}

/// Deterministic rule for resolving a tie at the top of a single-pass tally.
/// The IRV resolver has its own elimination tie-break and does not use this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TiePolicy {
    /// The tied option first supported by the earliest submitted ballot wins.
    FirstSubmitted,
    /// The tied option with the smallest id wins.
    Lexicographic,
    /// Ties are not resolved; the tally reports no winner.
    None,
}

/// One voter's submission, shaped by the poll's voting method.
///
/// A ballot that does not match its poll's method is rejected by the
/// validator's exhaustive match, not by runtime shape probing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "data")]
pub enum Ballot {
    SingleChoice {
        selected: OptionId,
    },
    Approval {
        selected: BTreeSet<OptionId>,
    },
    Range {
        /// Scores per option. Unscored options implicitly score the range minimum.
        scores: BTreeMap<OptionId, i64>,
    },
    Quadratic {
        /// Signed vote allocations per option. The budget is charged allocation².
        allocations: BTreeMap<OptionId, i64>,
    },
    RankedChoice {
        /// Preference order, best first. Partial rankings are permitted.
        ranking: Vec<OptionId>,
    },
}

impl Ballot {
    pub fn method(&self) -> VotingMethod {
        match self {
            Ballot::SingleChoice { .. } => VotingMethod::SingleChoice,
            Ballot::Approval { .. } => VotingMethod::Approval,
            Ballot::Range { .. } => VotingMethod::Range,
            Ballot::Quadratic { .. } => VotingMethod::Quadratic,
            Ballot::RankedChoice { .. } => VotingMethod::RankedChoice,
        }
    }
}

/// Outcome of tallying one poll. Derived data: recomputing over the same
/// ballot snapshot yields an identical result, so it is safe to cache or
/// serialize as-is. `rounds` is populated only for RankedChoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    pub method: VotingMethod,
    pub winner: Option<OptionId>,
    pub per_option_score: BTreeMap<OptionId, i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rounds: Vec<RoundResult>,
    pub ballot_count: u64,
}

/// One round of an instant-runoff computation. Immutable once recorded;
/// the ordered sequence of rounds is the full audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round_number: u32,
    /// First-preference counts for the options still standing this round.
    pub vote_counts: BTreeMap<OptionId, u64>,
    pub eliminated: Option<OptionId>,
    /// Ballots whose entire ranking has been eliminated as of this round.
    pub exhausted_ballots: u64,
}

impl Poll {
    pub fn new(question: String, options: Vec<String>, method: VotingMethod) -> Self {
        let options = options
            .into_iter()
            .map(|text| PollOption {
                id: Uuid::new_v4().to_string(),
                text,
            })
            .collect();

        Self {
            id: Uuid::new_v4().to_string(),
            question,
            options,
            method,
            min_selections: None,
            max_selections: None,
            score_range: None,
            credit_budget: None,
            allow_negative_voting: false,
            tie_policy: TiePolicy::FirstSubmitted,
            created_at: Utc::now(),
            is_open: true,
        }
    }

    pub fn has_option(&self, option_id: &str) -> bool {
        self.options.iter().any(|option| option.id == option_id)
    }

    /// Position of an option in the poll's declaration order.
    pub fn option_index(&self, option_id: &str) -> Option<usize> {
        self.options.iter().position(|option| option.id == option_id)
    }

    pub fn score_bounds(&self) -> ScoreRange {
        self.score_range.unwrap_or(DEFAULT_SCORE_RANGE)
    }

    pub fn quadratic_budget(&self) -> i64 {
        self.credit_budget.unwrap_or(DEFAULT_CREDIT_BUDGET)
    }
}
