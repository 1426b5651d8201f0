//! Reproducible-tally certificates.
//!
//! A certificate pins the exact ballot snapshot and the result computed
//! from it with content digests, so an independent recount can verify a
//! published outcome by recomputing both and comparing hashes.

use crate::models::{Poll, PollId, TallyResult, VotingMethod};
use crate::validator::ValidBallot;
use crate::voting;
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyCertificate {
    pub poll_id: PollId,
    pub method: VotingMethod,
    pub ballot_count: u64,
    /// Digest of the canonical input: poll id, method and the ballot
    /// snapshot in submission order.
    pub input_digest: String,
    /// Digest of the canonical serialized result.
    pub result_digest: String,
    pub computed_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct CanonicalInput<'a> {
    poll_id: &'a str,
    method: VotingMethod,
    ballots: &'a [ValidBallot],
}

/// Digest over the ballot snapshot. Per-option maps in ballots are ordered
/// maps, so the serialization is canonical without extra sorting.
pub fn ballot_digest(poll: &Poll, ballots: &[ValidBallot]) -> String {
    let input = CanonicalInput {
        poll_id: &poll.id,
        method: poll.method,
        ballots,
    };
    sha256::digest(serde_json::to_string(&input).unwrap_or_default())
}

/// Digest over a tally result.
pub fn result_digest(result: &TallyResult) -> String {
    sha256::digest(serde_json::to_string(result).unwrap_or_default())
}

/// Issues a certificate binding a ballot snapshot to its computed result.
pub fn certify(poll: &Poll, ballots: &[ValidBallot], result: &TallyResult) -> TallyCertificate {
    TallyCertificate {
        poll_id: poll.id.clone(),
        method: poll.method,
        ballot_count: ballots.len() as u64,
        input_digest: ballot_digest(poll, ballots),
        result_digest: result_digest(result),
        computed_at: Utc::now(),
    }
}

/// Recomputes the tally over the snapshot and checks both digests against
/// the certificate. A false return means the snapshot or the published
/// result does not match what was certified.
pub fn verify(poll: &Poll, ballots: &[ValidBallot], certificate: &TallyCertificate) -> bool {
    if certificate.input_digest != ballot_digest(poll, ballots) {
        info!("certificate input digest mismatch for poll {}", poll.id);
        return false;
    }
    let recomputed = voting::tally(poll, ballots);
    if certificate.result_digest != result_digest(&recomputed) {
        info!("certificate result digest mismatch for poll {}", poll.id);
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ballot, VotingMethod};
    use crate::validator::validate;

    fn poll() -> Poll {
        let mut poll = Poll::new(
            "certified?".to_string(),
            vec!["a".to_string(), "b".to_string()],
            VotingMethod::SingleChoice,
        );
        for (option, id) in poll.options.iter_mut().zip(["a", "b"]) {
            option.id = id.to_string();
        }
        poll
    }

    fn ballots(poll: &Poll, picks: &[&str]) -> Vec<ValidBallot> {
        picks
            .iter()
            .map(|pick| {
                validate(
                    poll,
                    Ballot::SingleChoice {
                        selected: pick.to_string(),
                    },
                )
                .expect("test ballot must validate")
            })
            .collect()
    }

    #[test]
    fn certify_then_verify_round_trips() {
        let poll = poll();
        let snapshot = ballots(&poll, &["a", "a", "b"]);
        let result = voting::tally(&poll, &snapshot);
        let certificate = certify(&poll, &snapshot, &result);

        assert_eq!(certificate.ballot_count, 3);
        assert!(verify(&poll, &snapshot, &certificate));
    }

    #[test]
    fn tampered_snapshot_fails_verification() {
        let poll = poll();
        let snapshot = ballots(&poll, &["a", "a", "b"]);
        let result = voting::tally(&poll, &snapshot);
        let certificate = certify(&poll, &snapshot, &result);

        let tampered = ballots(&poll, &["b", "b", "b"]);
        assert!(!verify(&poll, &tampered, &certificate));
    }

    #[test]
    fn digests_are_stable_across_recomputation() {
        let poll = poll();
        let snapshot = ballots(&poll, &["b", "a"]);
        let first = result_digest(&voting::tally(&poll, &snapshot));
        let second = result_digest(&voting::tally(&poll, &snapshot));
        assert_eq!(first, second);
    }
}
