//! Repository interface for the shared session/token/vote store.
//!
//! Each trait method is one atomic unit with respect to concurrent calls.
//! In particular `record_approval_vote` and `record_clique_vote` perform the
//! token read-check-write and the vote insertion indivisibly: the token's
//! `used` flag is the sole concurrency guard against double voting, so a
//! backend must serialize conflicting writes to the same token.

mod memory;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    BallotOption, NewToken, OptionId, Session, SessionCore, SessionId, TierEntry, Token,
    VoteBounds, VoterId,
};

pub use memory::MemoryStore;

/// Vote count for one option (approval tally).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionTally {
    pub option_id: OptionId,
    pub label: String,
    pub votes: u64,
}

/// One clique vote row joined with its option label, as fed to the weight
/// derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliqueBallotRow {
    pub token: String,
    pub label: String,
    pub order: u32,
}

pub trait Store: Send + Sync {
    /// Insert a new session, assigning its ID. Fails with `BadRequest` if
    /// the slug is already taken.
    fn insert_session(&self, session: SessionCore) -> Result<Session>;

    /// Look up a session by slug. Fails with `NotFound` if absent.
    fn session_by_slug(&self, slug: &str) -> Result<Session>;

    /// Update the selection bounds. Atomic; fails with `BadRequest` on
    /// invalid bounds and with `InvalidState` unless the session is still
    /// `Initiated`.
    fn set_bounds(&self, id: SessionId, bounds: VoteBounds) -> Result<()>;

    /// Persist options and minted tokens and move the session from
    /// `Initiated` to `Configured`, all in one atomic unit. Fails with
    /// `InvalidState` if the session already left `Initiated`, and with
    /// `BadRequest` (persisting nothing) if any token value in the batch
    /// collides with an existing token or with another batch member.
    fn configure_session(
        &self,
        id: SessionId,
        labels: Vec<String>,
        tokens: Vec<NewToken>,
    ) -> Result<(Vec<BallotOption>, Vec<Token>)>;

    /// Move the session from `Configured` to `Finished`. Atomic; fails with
    /// `InvalidState` in any other state.
    fn close_session(&self, id: SessionId) -> Result<()>;

    /// All options of a session, in insertion order.
    fn options(&self, id: SessionId) -> Result<Vec<BallotOption>>;

    /// All tokens of a session, in insertion order.
    fn tokens(&self, id: SessionId) -> Result<Vec<Token>>;

    /// Look up a token by value; `None` if absent.
    fn token(&self, value: &str) -> Result<Option<Token>>;

    /// Redeem a token for an approval vote: verify the session is still
    /// `Configured` and the token belongs to it and is unused, create an
    /// anonymous voter row, insert one vote row per option, and mark the
    /// token used — all in one atomic unit. Fails with `InvalidState` if a
    /// concurrent close finished the session first, or with
    /// `InvalidOrUsedToken` if the token check fails, including when a
    /// concurrent admission won the race; either way nothing is persisted.
    fn record_approval_vote(
        &self,
        session_id: SessionId,
        token: &str,
        option_ids: &[OptionId],
    ) -> Result<VoterId>;

    /// Redeem a token for a clique vote: same atomic contract as
    /// [`Store::record_approval_vote`], inserting tiered rows keyed by the
    /// raw token instead of an anonymous voter.
    fn record_clique_vote(
        &self,
        session_id: SessionId,
        token: &str,
        entries: &[TierEntry],
    ) -> Result<()>;

    /// Per-option vote counts for a session, including zero-vote options,
    /// sorted by votes descending then label ascending.
    fn approval_tally(&self, id: SessionId) -> Result<Vec<OptionTally>>;

    /// All clique vote rows of a session joined with their option labels,
    /// sorted by token then label.
    fn clique_rows(&self, id: SessionId) -> Result<Vec<CliqueBallotRow>>;
}
