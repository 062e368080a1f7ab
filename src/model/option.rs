use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{OptionId, SessionId};

/// Core ballot option data: a labeled choice belonging to one session.
///
/// Options are only ever created while the session is `Initiated` and are
/// immutable once the session is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotOptionCore {
    pub session_id: SessionId,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

impl BallotOptionCore {
    pub fn new(session_id: SessionId, label: String) -> Self {
        Self {
            session_id,
            label,
            created_at: Utc::now(),
        }
    }
}

/// A ballot option from the store, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotOption {
    pub id: OptionId,
    #[serde(flatten)]
    pub option: BallotOptionCore,
}

impl Deref for BallotOption {
    type Target = BallotOptionCore;

    fn deref(&self) -> &Self::Target {
        &self.option
    }
}
