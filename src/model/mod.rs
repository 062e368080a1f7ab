//! Entity types for sessions, options, tokens, and votes.

mod id;
mod option;
mod session;
mod submission;
mod token;
mod vote;

pub use id::{OptionId, SessionId, VoterId};
pub use option::{BallotOption, BallotOptionCore};
pub use session::{
    slugify, Session, SessionCore, SessionKind, SessionState, SessionView, VoteBounds,
    DEFAULT_MAX_TIER, DEFAULT_MIN_VOTES,
};
pub use submission::{TierEntry, VoteSubmission};
pub use token::{generate_token, generate_tokens, NewToken, Token, TOKEN_ALPHABET};
pub use vote::{CliqueVote, Vote, Voter};
