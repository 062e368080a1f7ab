use serde::{Deserialize, Serialize};

use super::id::OptionId;

/// One option placed into a preference tier (clique mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierEntry {
    pub option_id: OptionId,
    /// 0 = unranked/excluded; higher = stronger preference.
    pub tier: u32,
}

/// A vote submission, validated at the boundary before entering the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum VoteSubmission {
    /// Approval mode: the selected option IDs.
    Approval { option_ids: Vec<OptionId> },
    /// Clique mode: options assigned to preference tiers.
    Tiered { entries: Vec<TierEntry> },
}

impl VoteSubmission {
    /// Number of selections that count towards the min/max bounds:
    /// every selected option in approval mode, only nonzero-tier options in
    /// clique mode.
    pub fn selection_count(&self) -> usize {
        match self {
            Self::Approval { option_ids } => option_ids.len(),
            Self::Tiered { entries } => entries.iter().filter(|e| e.tier > 0).count(),
        }
    }

    /// All option IDs referenced by this submission.
    pub fn option_ids(&self) -> Vec<OptionId> {
        match self {
            Self::Approval { option_ids } => option_ids.clone(),
            Self::Tiered { entries } => entries.iter().map(|e| e.option_id).collect(),
        }
    }
}
