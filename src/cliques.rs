//! Clique resolution: turns weighted mutual nominations into the largest
//! mutual group plus ranked exclusion lists.
//!
//! The resolution is an exact combinatorial search. Every subset of
//! participants of size ≥ 2 is examined; a subset qualifies as a clique iff
//! every pair within it nominated each other with weight > 0 in both
//! directions (edge existence, not magnitude). Among qualifying subsets the
//! winner is the largest, ties broken by total internal weight, then by
//! lexicographically smallest sorted label set. Exponential in participant
//! count, which is fine for the tens-of-participants sessions this engine
//! serves.
//!
//! This is a pure computation over an in-memory snapshot: callers snapshot
//! first, compute second.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One nomination: the nominated participant and the tier-derived weight
/// (0 = unranked).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nomination {
    pub label: String,
    pub weight: u64,
}

impl Nomination {
    pub fn new(label: impl Into<String>, weight: u64) -> Self {
        Self {
            label: label.into(),
            weight,
        }
    }
}

/// Nominations keyed by voter: raw token before unmasking, participant label
/// after. Ordered so resolution input is deterministic.
pub type Votes = BTreeMap<String, Vec<Nomination>>;

/// The winning clique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutualGroup {
    /// Member labels, sorted ascending.
    pub labels: Vec<String>,
    /// Sum of nomination weights over all ordered member pairs.
    pub weight: u64,
}

/// A participant left out of the mutual group, with the nominations they
/// received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedLabel {
    pub label: String,
    pub votes_count: u32,
    pub weight: u64,
}

/// The full clique resolution report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cliques {
    pub largest_mutual_group: MutualGroup,
    /// Excluded participants ranked by nominations received from mutual
    /// group members only.
    pub excluded_labels_mutual: Vec<ExcludedLabel>,
    /// Excluded participants ranked by nominations received from everyone.
    pub excluded_labels_all: Vec<ExcludedLabel>,
}

/// Resolve the vote map into the largest mutual group and exclusion lists.
///
/// Empty input yields the empty report shape, not an error.
pub fn resolve(votes: &Votes) -> Cliques {
    if votes.is_empty() {
        return Cliques::default();
    }

    // Per voter: nominated label -> weight. BTreeMaps keep every later
    // iteration deterministic.
    let mut selection: BTreeMap<&str, BTreeMap<&str, u64>> = BTreeMap::new();
    for (voter, nominations) in votes {
        let choices = selection.entry(voter).or_default();
        for nomination in nominations {
            choices.insert(&nomination.label, nomination.weight);
        }
    }

    // Edges require weight > 0; an unranked (weight 0) pair is not an edge.
    let edges: BTreeMap<&str, BTreeSet<&str>> = selection
        .iter()
        .map(|(&voter, choices)| {
            let nominated = choices
                .iter()
                .filter(|(_, &weight)| weight > 0)
                .map(|(&label, _)| label)
                .collect();
            (voter, nominated)
        })
        .collect();

    let participants: Vec<&str> = selection.keys().copied().collect();
    let best = find_largest_clique(&participants, &edges, &selection);

    let (group_labels, group_weight) = match &best {
        Some((labels, weight)) => (labels.clone(), *weight),
        None => (Vec::new(), 0),
    };
    let members: BTreeSet<&str> = group_labels.iter().copied().collect();

    let excluded_labels_mutual = received_nominations(&selection, &members, true);
    let excluded_labels_all = received_nominations(&selection, &members, false);

    Cliques {
        largest_mutual_group: MutualGroup {
            labels: group_labels.iter().map(|s| s.to_string()).collect(),
            weight: group_weight,
        },
        excluded_labels_mutual,
        excluded_labels_all,
    }
}

/// Exhaustively enumerate subsets of size ≥ 2 and keep the best clique by
/// (size, weight, lexicographically smallest label set).
fn find_largest_clique<'a>(
    participants: &[&'a str],
    edges: &BTreeMap<&'a str, BTreeSet<&'a str>>,
    selection: &BTreeMap<&'a str, BTreeMap<&'a str, u64>>,
) -> Option<(Vec<&'a str>, u64)> {
    let mut best: Option<(Vec<&'a str>, u64)> = None;
    let mut subset: Vec<&'a str> = Vec::with_capacity(participants.len());

    for size in 2..=participants.len() {
        enumerate_subsets(participants, size, 0, &mut subset, &mut |candidate| {
            if !is_clique(candidate, edges) {
                return;
            }
            let weight = clique_weight(candidate, selection);
            let better = match &best {
                None => true,
                Some((labels, best_weight)) => {
                    candidate.len() > labels.len()
                        || (candidate.len() == labels.len()
                            && (weight > *best_weight
                                || (weight == *best_weight
                                    && candidate < labels.as_slice())))
                }
            };
            if better {
                best = Some((candidate.to_vec(), weight));
            }
        });
    }
    best
}

/// Visit every `size`-element subset of `items[start..]` in lexicographic
/// order, reusing `current` as scratch space.
fn enumerate_subsets<'a>(
    items: &[&'a str],
    size: usize,
    start: usize,
    current: &mut Vec<&'a str>,
    visit: &mut impl FnMut(&[&'a str]),
) {
    if current.len() == size {
        visit(current);
        return;
    }
    // Not enough items left to complete the subset.
    let needed = size - current.len();
    for i in start..=items.len().saturating_sub(needed) {
        current.push(items[i]);
        enumerate_subsets(items, size, i + 1, current, visit);
        current.pop();
    }
}

fn is_clique(subset: &[&str], edges: &BTreeMap<&str, BTreeSet<&str>>) -> bool {
    for (i, a) in subset.iter().enumerate() {
        for b in &subset[i + 1..] {
            let forward = edges.get(a).is_some_and(|n| n.contains(b));
            let backward = edges.get(b).is_some_and(|n| n.contains(a));
            if !forward || !backward {
                return false;
            }
        }
    }
    true
}

fn clique_weight(subset: &[&str], selection: &BTreeMap<&str, BTreeMap<&str, u64>>) -> u64 {
    let mut weight = 0;
    for a in subset {
        for b in subset {
            if a != b {
                weight += selection
                    .get(a)
                    .and_then(|choices| choices.get(b))
                    .copied()
                    .unwrap_or(0);
            }
        }
    }
    weight
}

/// Count and weigh the nominations each excluded participant received,
/// either from mutual group members only or from everyone. Sorted by weight
/// descending, ties by label ascending.
fn received_nominations(
    selection: &BTreeMap<&str, BTreeMap<&str, u64>>,
    members: &BTreeSet<&str>,
    from_members_only: bool,
) -> Vec<ExcludedLabel> {
    let mut tallies: BTreeMap<&str, (u32, u64)> = selection
        .keys()
        .filter(|voter| !members.contains(*voter))
        .map(|&voter| (voter, (0, 0)))
        .collect();

    for (voter, choices) in selection {
        if from_members_only && !members.contains(voter) {
            continue;
        }
        for (&nominated, &weight) in choices {
            if let Some((count, total)) = tallies.get_mut(nominated) {
                *count += 1;
                *total += weight;
            }
        }
    }

    let mut excluded: Vec<ExcludedLabel> = tallies
        .into_iter()
        .map(|(label, (votes_count, weight))| ExcludedLabel {
            label: label.to_string(),
            votes_count,
            weight,
        })
        .collect();
    excluded.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.label.cmp(&b.label)));
    excluded
}
