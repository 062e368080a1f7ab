use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::id::SessionId;

/// Default minimum number of selections per submission when the organizer
/// left the lower bound unset.
pub const DEFAULT_MIN_VOTES: u32 = 2;

/// Default strongest preference tier for clique sessions.
pub const DEFAULT_MAX_TIER: u32 = 3;

/// How votes are cast and tallied in a session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// Select a subset of options; tallied by raw count.
    Approval,
    /// Rank options into weighted tiers; resolved via mutual-preference
    /// graph analysis.
    Clique,
}

/// States in the session lifecycle.
///
/// Transitions only ever move forwards: `Initiated` → `Configured` →
/// `Finished`. No state is skipped and nothing moves backwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Under construction, accepting options and bounds.
    Initiated,
    /// Frozen configuration, accepting votes.
    Configured,
    /// Terminal, read-only results.
    Finished,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initiated => "initiated",
            Self::Configured => "configured",
            Self::Finished => "finished",
        }
    }
}

/// Selection-count bounds supplied by the organizer.
///
/// `None` or zero means unbounded on that side; the effective lower bound
/// then defaults to [`DEFAULT_MIN_VOTES`] and the effective upper bound to
/// the session's option count.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteBounds {
    pub min_votes: Option<u32>,
    pub max_votes: Option<u32>,
}

impl VoteBounds {
    pub fn new(min_votes: impl Into<Option<u32>>, max_votes: impl Into<Option<u32>>) -> Self {
        Self {
            min_votes: min_votes.into(),
            max_votes: max_votes.into(),
        }
    }

    /// Enforce `min <= max` whenever both bounds are set and nonzero.
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_votes, self.max_votes) {
            if min > 0 && max > 0 && min > max {
                return Err(Error::BadRequest(format!(
                    "minimum votes ({min}) cannot exceed maximum votes ({max})"
                )));
            }
        }
        Ok(())
    }
}

/// Core session data, as handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCore {
    /// Human-shareable identifier, unique across sessions.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Argon2-encoded organizer password hash.
    pub password_hash: String,
    pub kind: SessionKind,
    pub state: SessionState,
    #[serde(flatten)]
    pub bounds: VoteBounds,
    /// Strongest preference tier accepted in clique submissions.
    pub max_tier: u32,
    pub created_at: DateTime<Utc>,
}

impl SessionCore {
    pub fn new(name: String, slug: String, password_hash: String, kind: SessionKind) -> Self {
        Self {
            slug,
            name,
            password_hash,
            kind,
            state: SessionState::Initiated,
            bounds: VoteBounds::default(),
            max_tier: DEFAULT_MAX_TIER,
            created_at: Utc::now(),
        }
    }

    /// Check whether the given organizer password is correct.
    pub fn verify_password(&self, password: &str) -> bool {
        crate::crypto::password::verify(&self.password_hash, password)
    }

    /// Effective lower selection bound.
    pub fn effective_min(&self) -> u32 {
        match self.bounds.min_votes {
            Some(min) if min > 0 => min,
            _ => DEFAULT_MIN_VOTES,
        }
    }

    /// Effective upper selection bound, given the session's option count.
    pub fn effective_max(&self, option_count: usize) -> u32 {
        match self.bounds.max_votes {
            Some(max) if max > 0 => max,
            _ => option_count as u32,
        }
    }

    /// Fail with [`Error::InvalidState`] unless the session is in the
    /// expected state for the given operation.
    pub fn expect_state(&self, expected: SessionState, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation,
                state: self.state.as_str(),
            })
        }
    }
}

/// A session from the store, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    #[serde(flatten)]
    pub session: SessionCore,
}

impl Deref for Session {
    type Target = SessionCore;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

/// Public metadata view of a session. Never exposes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: SessionId,
    pub slug: String,
    pub name: String,
    pub kind: SessionKind,
    pub state: SessionState,
    #[serde(flatten)]
    pub bounds: VoteBounds,
    pub max_tier: u32,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            slug: session.slug.clone(),
            name: session.name.clone(),
            kind: session.kind,
            state: session.state,
            bounds: session.bounds,
            max_tier: session.max_tier,
        }
    }
}

/// Derive a URL-safe slug from a session name: lowercase, runs of
/// non-alphanumerics collapsed to single hyphens, no leading or trailing
/// hyphen.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
