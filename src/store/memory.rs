//! In-process arena store: every entity table lives behind one `RwLock`, so
//! each trait method is trivially one atomic unit.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use chrono::Utc;

use crate::error::{Error, Result};
use crate::model::{
    BallotOption, BallotOptionCore, CliqueVote, NewToken, OptionId, Session, SessionCore,
    SessionId, SessionState, TierEntry, Token, Vote, VoteBounds, Voter, VoterId,
};

use super::{CliqueBallotRow, OptionTally, Store};

#[derive(Default)]
struct Inner {
    sessions: BTreeMap<SessionId, Session>,
    slugs: HashMap<String, SessionId>,
    options: BTreeMap<OptionId, BallotOption>,
    tokens: HashMap<String, Token>,
    voters: BTreeMap<VoterId, Voter>,
    votes: Vec<Vote>,
    clique_votes: Vec<CliqueVote>,
    next_session_id: u32,
    next_option_id: u32,
    next_voter_id: u32,
}

impl Inner {
    fn session(&self, id: SessionId) -> Result<&Session> {
        self.sessions
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("No session with ID {id}")))
    }

    /// Verify the token exists, belongs to the session, and is unused, then
    /// flip its `used` flag. Callers hold the write lock, so check and flip
    /// are indivisible.
    fn redeem_token(&mut self, session_id: SessionId, value: &str) -> Result<()> {
        let token = self
            .tokens
            .get_mut(value)
            .filter(|t| t.session_id == session_id && !t.used)
            .ok_or(Error::InvalidOrUsedToken)?;
        token.used = true;
        Ok(())
    }
}

/// The arena-backed [`Store`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Store for MemoryStore {
    fn insert_session(&self, session: SessionCore) -> Result<Session> {
        let mut inner = self.write();
        if inner.slugs.contains_key(&session.slug) {
            return Err(Error::BadRequest(format!(
                "A session with slug `{}` already exists",
                session.slug
            )));
        }
        inner.next_session_id += 1;
        let id = SessionId(inner.next_session_id);
        let session = Session { id, session };
        inner.slugs.insert(session.slug.clone(), id);
        inner.sessions.insert(id, session.clone());
        Ok(session)
    }

    fn session_by_slug(&self, slug: &str) -> Result<Session> {
        let inner = self.read();
        inner
            .slugs
            .get(slug)
            .and_then(|id| inner.sessions.get(id))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("No session with slug `{slug}`")))
    }

    fn set_bounds(&self, id: SessionId, bounds: VoteBounds) -> Result<()> {
        bounds.validate()?;
        let mut inner = self.write();
        inner.session(id)?.expect_state(SessionState::Initiated, "update_bounds")?;
        let session = inner.sessions.get_mut(&id).unwrap(); // Checked above.
        session.session.bounds = bounds;
        Ok(())
    }

    fn configure_session(
        &self,
        id: SessionId,
        labels: Vec<String>,
        tokens: Vec<NewToken>,
    ) -> Result<(Vec<BallotOption>, Vec<Token>)> {
        let mut inner = self.write();
        inner.session(id)?.expect_state(SessionState::Initiated, "configure")?;

        // Reject the whole batch up front: a collision (with an existing
        // token or within the batch) must not leave partial state behind.
        let mut batch = std::collections::HashSet::with_capacity(tokens.len());
        for minted in &tokens {
            if inner.tokens.contains_key(&minted.value) || !batch.insert(&minted.value) {
                return Err(Error::BadRequest(format!(
                    "Token `{}` already exists",
                    minted.value
                )));
            }
        }

        let mut new_options = Vec::with_capacity(labels.len());
        for label in labels {
            inner.next_option_id += 1;
            let option = BallotOption {
                id: OptionId(inner.next_option_id),
                option: BallotOptionCore::new(id, label),
            };
            inner.options.insert(option.id, option.clone());
            new_options.push(option);
        }

        let mut new_tokens = Vec::with_capacity(tokens.len());
        for minted in tokens {
            let token = Token {
                value: minted.value,
                session_id: id,
                used: false,
                binding: minted.binding,
                created_at: Utc::now(),
            };
            inner.tokens.insert(token.value.clone(), token.clone());
            new_tokens.push(token);
        }

        let session = inner.sessions.get_mut(&id).unwrap(); // Checked above.
        session.session.state = SessionState::Configured;
        Ok((new_options, new_tokens))
    }

    fn close_session(&self, id: SessionId) -> Result<()> {
        let mut inner = self.write();
        inner.session(id)?.expect_state(SessionState::Configured, "close")?;
        let session = inner.sessions.get_mut(&id).unwrap(); // Checked above.
        session.session.state = SessionState::Finished;
        Ok(())
    }

    fn options(&self, id: SessionId) -> Result<Vec<BallotOption>> {
        let inner = self.read();
        inner.session(id)?;
        Ok(inner
            .options
            .values()
            .filter(|o| o.session_id == id)
            .cloned()
            .collect())
    }

    fn tokens(&self, id: SessionId) -> Result<Vec<Token>> {
        let inner = self.read();
        inner.session(id)?;
        let mut tokens: Vec<Token> = inner
            .tokens
            .values()
            .filter(|t| t.session_id == id)
            .cloned()
            .collect();
        tokens.sort_by(|a, b| a.value.cmp(&b.value));
        Ok(tokens)
    }

    fn token(&self, value: &str) -> Result<Option<Token>> {
        Ok(self.read().tokens.get(value).cloned())
    }

    fn record_approval_vote(
        &self,
        session_id: SessionId,
        token: &str,
        option_ids: &[OptionId],
    ) -> Result<VoterId> {
        let mut inner = self.write();
        inner
            .session(session_id)?
            .expect_state(SessionState::Configured, "vote")?;
        inner.redeem_token(session_id, token)?;

        inner.next_voter_id += 1;
        let voter_id = VoterId(inner.next_voter_id);
        inner.voters.insert(
            voter_id,
            Voter {
                id: voter_id,
                session_id,
                created_at: Utc::now(),
            },
        );
        for &option_id in option_ids {
            inner.votes.push(Vote { voter_id, option_id });
        }
        Ok(voter_id)
    }

    fn record_clique_vote(
        &self,
        session_id: SessionId,
        token: &str,
        entries: &[TierEntry],
    ) -> Result<()> {
        let mut inner = self.write();
        inner
            .session(session_id)?
            .expect_state(SessionState::Configured, "vote")?;
        inner.redeem_token(session_id, token)?;

        for entry in entries {
            inner.clique_votes.push(CliqueVote {
                token: token.to_string(),
                option_id: entry.option_id,
                order: entry.tier,
            });
        }
        Ok(())
    }

    fn approval_tally(&self, id: SessionId) -> Result<Vec<OptionTally>> {
        let inner = self.read();
        inner.session(id)?;
        let mut tallies: Vec<OptionTally> = inner
            .options
            .values()
            .filter(|o| o.session_id == id)
            .map(|option| OptionTally {
                option_id: option.id,
                label: option.label.clone(),
                votes: inner
                    .votes
                    .iter()
                    .filter(|v| v.option_id == option.id)
                    .count() as u64,
            })
            .collect();
        tallies.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.label.cmp(&b.label)));
        Ok(tallies)
    }

    fn clique_rows(&self, id: SessionId) -> Result<Vec<CliqueBallotRow>> {
        let inner = self.read();
        inner.session(id)?;
        let mut rows: Vec<CliqueBallotRow> = inner
            .clique_votes
            .iter()
            .filter_map(|vote| {
                let option = inner
                    .options
                    .get(&vote.option_id)
                    .filter(|o| o.session_id == id)?;
                Some(CliqueBallotRow {
                    token: vote.token.clone(),
                    label: option.label.clone(),
                    order: vote.order,
                })
            })
            .collect();
        rows.sort_by(|a, b| a.token.cmp(&b.token).then_with(|| a.label.cmp(&b.label)));
        Ok(rows)
    }
}
