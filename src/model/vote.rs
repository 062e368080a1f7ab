use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{OptionId, SessionId, VoterId};

/// An anonymous voter row (approval mode). Exists only to group the options
/// one accepted submission selected; carries no identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub id: VoterId,
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
}

/// A single approval-mode vote: one voter chose one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter_id: VoterId,
    pub option_id: OptionId,
}

/// A single clique-mode vote: a token placed an option into a tier.
///
/// `order = 0` means unranked/excluded; higher values denote stronger
/// preference tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliqueVote {
    pub token: String,
    pub option_id: OptionId,
    pub order: u32,
}
