//! End-to-end scenarios driven through the public API: submit ballots via
//! the processor, tally over the snapshot, inspect the result.

use std::collections::{BTreeMap, BTreeSet};

use trusty_tally::{
    audit, tally, validate, Ballot, Poll, ProcessorError, ScoreRange, ValidationError,
    VoteProcessor, VotingMethod,
};

fn make_poll(method: VotingMethod, option_ids: &[&str]) -> Poll {
    let mut poll = Poll::new(
        "test poll".to_string(),
        option_ids.iter().map(|id| id.to_string()).collect(),
        method,
    );
    for (option, id) in poll.options.iter_mut().zip(option_ids) {
        option.id = id.to_string();
    }
    poll
}

#[test]
fn single_choice_counts_and_picks_the_majority() {
    let poll = make_poll(VotingMethod::SingleChoice, &["a", "b", "c"]);
    let mut processor = VoteProcessor::new();
    for (voter, pick) in [("v1", "a"), ("v2", "a"), ("v3", "b")] {
        processor
            .submit(
                &poll,
                voter,
                Ballot::SingleChoice {
                    selected: pick.to_string(),
                },
            )
            .unwrap();
    }

    let result = processor.results(&poll);
    assert_eq!(result.winner, Some("a".to_string()));
    assert_eq!(result.per_option_score["a"], 2);
    assert_eq!(result.per_option_score["b"], 1);
    assert_eq!(result.per_option_score["c"], 0);
}

#[test]
fn ranked_choice_runs_a_full_runoff() {
    let _ = env_logger::builder().is_test(true).try_init();
    let poll = make_poll(VotingMethod::RankedChoice, &["a", "b", "c"]);
    let mut processor = VoteProcessor::new();
    let rankings: &[&[&str]] = &[&["a", "b"], &["b", "c"], &["c", "a"], &["a"]];
    for (index, ranking) in rankings.iter().enumerate() {
        processor
            .submit(
                &poll,
                &format!("v{index}"),
                Ballot::RankedChoice {
                    ranking: ranking.iter().map(|id| id.to_string()).collect(),
                },
            )
            .unwrap();
    }

    let result = processor.results(&poll);
    // Round 1 splits a:2 b:1 c:1 with no strict majority of 4, so at
    // least one elimination round must follow.
    assert!(result.rounds.len() >= 2);
    let winner = result.winner.clone().expect("runoff must conclude");
    let last = result.rounds.last().unwrap();
    let active: u64 = last.vote_counts.values().sum();
    assert!(last.vote_counts[&winner] * 2 > active);
}

#[test]
fn quadratic_budget_is_enforced_at_the_boundary() {
    let mut poll = make_poll(VotingMethod::Quadratic, &["a", "b"]);
    poll.credit_budget = Some(9);

    let spend_all = Ballot::Quadratic {
        allocations: BTreeMap::from([("a".to_string(), 3)]),
    };
    assert!(validate(&poll, spend_all).is_ok());

    let split = Ballot::Quadratic {
        allocations: BTreeMap::from([("a".to_string(), 2), ("b".to_string(), 2)]),
    };
    assert!(validate(&poll, split).is_ok());

    let over = Ballot::Quadratic {
        allocations: BTreeMap::from([("a".to_string(), 4)]),
    };
    assert_eq!(
        validate(&poll, over),
        Err(ValidationError::BudgetExceeded { cost: 16, budget: 9 })
    );
}

#[test]
fn range_unscored_option_scores_the_minimum() {
    let mut poll = make_poll(VotingMethod::Range, &["a", "b"]);
    poll.score_range = Some(ScoreRange { min: 0, max: 10 });
    let mut processor = VoteProcessor::new();
    processor
        .submit(
            &poll,
            "v1",
            Ballot::Range {
                scores: BTreeMap::from([("a".to_string(), 10)]),
            },
        )
        .unwrap();

    let result = processor.results(&poll);
    assert_eq!(result.per_option_score["a"], 10);
    assert_eq!(result.per_option_score["b"], 0);
}

#[test]
fn approval_minimum_selection_rule() {
    let mut poll = make_poll(VotingMethod::Approval, &["a", "b"]);
    poll.min_selections = Some(1);
    let mut processor = VoteProcessor::new();

    let err = processor
        .submit(
            &poll,
            "v1",
            Ballot::Approval {
                selected: BTreeSet::new(),
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ProcessorError::Invalid(ValidationError::InvalidSelectionCount { got: 0, .. })
    ));
}

#[test]
fn resubmission_counts_only_the_replacement() {
    let poll = make_poll(VotingMethod::SingleChoice, &["a", "b"]);
    let mut processor = VoteProcessor::new();
    processor
        .submit(
            &poll,
            "v1",
            Ballot::SingleChoice {
                selected: "a".to_string(),
            },
        )
        .unwrap();
    processor
        .submit(
            &poll,
            "v1",
            Ballot::SingleChoice {
                selected: "b".to_string(),
            },
        )
        .unwrap();

    let result = processor.results(&poll);
    assert_eq!(result.ballot_count, 1);
    assert_eq!(result.per_option_score["a"], 0);
    assert_eq!(result.per_option_score["b"], 1);
}

#[test]
fn closed_poll_rejects_valid_ballots_too() {
    let mut poll = make_poll(VotingMethod::SingleChoice, &["a", "b"]);
    poll.is_open = false;
    let mut processor = VoteProcessor::new();

    let err = processor
        .submit(
            &poll,
            "v1",
            Ballot::SingleChoice {
                selected: "a".to_string(),
            },
        )
        .unwrap_err();
    assert_eq!(err, ProcessorError::PollClosed(poll.id.clone()));
}

#[test]
fn repeated_tally_is_bit_identical() {
    let poll = make_poll(VotingMethod::RankedChoice, &["a", "b", "c"]);
    let mut processor = VoteProcessor::new();
    let rankings: &[&[&str]] = &[&["a", "b"], &["b", "c"], &["c", "a"], &["b"]];
    for (index, ranking) in rankings.iter().enumerate() {
        processor
            .submit(
                &poll,
                &format!("v{index}"),
                Ballot::RankedChoice {
                    ranking: ranking.iter().map(|id| id.to_string()).collect(),
                },
            )
            .unwrap();
    }

    let snapshot = processor.snapshot(&poll.id);
    let first = tally(&poll, &snapshot);
    let second = tally(&poll, &snapshot);
    assert_eq!(first, second);
    // Identical down to the serialized bytes, rounds included.
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn certificates_survive_a_recount() {
    let poll = make_poll(VotingMethod::Approval, &["a", "b", "c"]);
    let mut processor = VoteProcessor::new();
    for (voter, picks) in [("v1", vec!["a", "b"]), ("v2", vec!["b"]), ("v3", vec!["c"])] {
        processor
            .submit(
                &poll,
                voter,
                Ballot::Approval {
                    selected: picks.into_iter().map(String::from).collect(),
                },
            )
            .unwrap();
    }

    let snapshot = processor.snapshot(&poll.id);
    let result = tally(&poll, &snapshot);
    let certificate = audit::certify(&poll, &snapshot, &result);
    assert!(audit::verify(&poll, &snapshot, &certificate));
}
