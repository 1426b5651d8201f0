//! Vote tallying engine: converts a poll's raw ballots into a winner (or
//! ranked outcome) for one of five voting methods, with per-method ballot
//! validation in front of every tally.
//!
//! The crate is a pure computation library. Accounts, poll CRUD, storage,
//! delivery and rendering are external collaborators: they hand in a
//! [`models::Poll`] and ballots, and get back validation verdicts and a
//! [`models::TallyResult`]. Tallying works over a frozen snapshot the
//! caller supplies, so results are reproducible and safe to cache.

pub mod audit;
pub mod irv;
pub mod models;
pub mod processor;
pub mod validator;
pub mod voting;

pub use models::{
    Ballot, OptionId, Poll, PollId, PollOption, RoundResult, ScoreRange, TallyResult, TiePolicy,
    VoterId, VotingMethod,
};
pub use processor::{AcceptedBallot, ProcessorError, Receipt, VoteProcessor};
pub use validator::{validate, ValidBallot, ValidationError};
pub use voting::tally;
