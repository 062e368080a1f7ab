//! Vote admission rules: every precondition is checked, in order, before
//! anything is written. The caller commits the prepared submission through
//! one atomic store operation afterwards, and the store re-checks the token
//! inside that unit, so a racing admission can still only win once.

use std::collections::HashSet;

use log::debug;

use crate::error::{Error, Result};
use crate::model::{
    BallotOption, Session, SessionKind, SessionState, Token, VoteSubmission,
};

/// Validate a submission against the session it targets.
///
/// Rejection causes, checked in order:
/// 1. session not accepting votes — [`Error::SessionNotOpen`];
/// 2. token missing, foreign, or spent — [`Error::InvalidOrUsedToken`];
/// 3. option outside the session's option set — [`Error::InvalidOption`];
/// 4. selection count outside the min/max bounds — [`Error::BoundsViolation`];
/// 5. tier outside `0..=max_tier` (clique only) — [`Error::InvalidTier`].
pub fn validate(
    session: &Session,
    token: Option<&Token>,
    options: &[BallotOption],
    submission: &VoteSubmission,
) -> Result<()> {
    if session.state != SessionState::Configured {
        debug!("rejecting vote for {}: session not open", session.slug);
        return Err(Error::SessionNotOpen);
    }

    let mode_matches = matches!(
        (session.kind, submission),
        (SessionKind::Approval, VoteSubmission::Approval { .. })
            | (SessionKind::Clique, VoteSubmission::Tiered { .. })
    );
    if !mode_matches {
        return Err(Error::BadRequest(
            "Submission mode does not match the session type".to_string(),
        ));
    }

    match token {
        Some(token) if token.session_id == session.id && !token.used => {}
        _ => {
            debug!("rejecting vote for {}: invalid or used token", session.slug);
            return Err(Error::InvalidOrUsedToken);
        }
    }

    let valid_ids: HashSet<_> = options.iter().map(|o| o.id).collect();
    if !submission.option_ids().iter().all(|id| valid_ids.contains(id)) {
        return Err(Error::InvalidOption);
    }

    let submitted = submission.selection_count();
    let min = session.effective_min();
    let max = session.effective_max(options.len());
    if (submitted as u32) < min || (submitted as u32) > max {
        return Err(Error::BoundsViolation { submitted, min, max });
    }

    if let VoteSubmission::Tiered { entries } = submission {
        for entry in entries {
            if entry.tier > session.max_tier {
                return Err(Error::InvalidTier {
                    tier: entry.tier,
                    max_tier: session.max_tier,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::{
        BallotOptionCore, OptionId, SessionCore, SessionId, TierEntry, VoteBounds,
    };

    fn session(kind: SessionKind, state: SessionState, bounds: VoteBounds) -> Session {
        let mut core = match kind {
            SessionKind::Approval => SessionCore::example(),
            SessionKind::Clique => SessionCore::clique_example(),
        };
        core.state = state;
        core.bounds = bounds;
        Session {
            id: SessionId(1),
            session: core,
        }
    }

    fn options(session_id: SessionId, count: u32) -> Vec<BallotOption> {
        (1..=count)
            .map(|i| BallotOption {
                id: OptionId(i),
                option: BallotOptionCore::new(session_id, format!("Option {i}")),
            })
            .collect()
    }

    fn token(session_id: SessionId, used: bool) -> Token {
        Token {
            value: "ABCD-EFGH-JKMN".to_string(),
            session_id,
            used,
            binding: None,
            created_at: Utc::now(),
        }
    }

    fn approval(ids: &[u32]) -> VoteSubmission {
        VoteSubmission::Approval {
            option_ids: ids.iter().map(|&i| OptionId(i)).collect(),
        }
    }

    #[test]
    fn rejects_unopened_sessions_first() {
        for state in [SessionState::Initiated, SessionState::Finished] {
            let session = session(SessionKind::Approval, state, VoteBounds::default());
            // Even with a bad token, the state error wins.
            let err = validate(&session, None, &[], &approval(&[1, 2])).unwrap_err();
            assert!(matches!(err, Error::SessionNotOpen));
        }
    }

    #[test]
    fn rejects_missing_used_and_foreign_tokens() {
        let session = session(
            SessionKind::Approval,
            SessionState::Configured,
            VoteBounds::default(),
        );
        let options = options(session.id, 3);
        let submission = approval(&[1, 2]);

        let err = validate(&session, None, &options, &submission).unwrap_err();
        assert!(matches!(err, Error::InvalidOrUsedToken));

        let spent = token(session.id, true);
        let err = validate(&session, Some(&spent), &options, &submission).unwrap_err();
        assert!(matches!(err, Error::InvalidOrUsedToken));

        let foreign = token(SessionId(99), false);
        let err = validate(&session, Some(&foreign), &options, &submission).unwrap_err();
        assert!(matches!(err, Error::InvalidOrUsedToken));
    }

    #[test]
    fn rejects_foreign_options() {
        let session = session(
            SessionKind::Approval,
            SessionState::Configured,
            VoteBounds::default(),
        );
        let options = options(session.id, 3);
        let token = token(session.id, false);
        let err = validate(&session, Some(&token), &options, &approval(&[1, 42])).unwrap_err();
        assert!(matches!(err, Error::InvalidOption));
    }

    #[test]
    fn bounds_edges_are_inclusive() {
        let session = session(
            SessionKind::Approval,
            SessionState::Configured,
            VoteBounds::new(2, 3),
        );
        let options = options(session.id, 4);
        let token = token(session.id, false);

        let err = validate(&session, Some(&token), &options, &approval(&[1])).unwrap_err();
        assert!(matches!(
            err,
            Error::BoundsViolation { submitted: 1, min: 2, max: 3 }
        ));

        assert!(validate(&session, Some(&token), &options, &approval(&[1, 2])).is_ok());
        assert!(validate(&session, Some(&token), &options, &approval(&[1, 2, 3])).is_ok());

        let err =
            validate(&session, Some(&token), &options, &approval(&[1, 2, 3, 4])).unwrap_err();
        assert!(matches!(err, Error::BoundsViolation { submitted: 4, .. }));
    }

    #[test]
    fn default_bounds_cap_at_option_count() {
        let session = session(
            SessionKind::Approval,
            SessionState::Configured,
            VoteBounds::default(),
        );
        let options = options(session.id, 3);
        let token = token(session.id, false);
        assert!(validate(&session, Some(&token), &options, &approval(&[1, 2, 3])).is_ok());
        let err = validate(&session, Some(&token), &options, &approval(&[1])).unwrap_err();
        assert!(matches!(err, Error::BoundsViolation { min: 2, max: 3, .. }));
    }

    #[test]
    fn clique_counts_only_ranked_options() {
        let session = session(
            SessionKind::Clique,
            SessionState::Configured,
            VoteBounds::default(),
        );
        let options = options(session.id, 3);
        let token = token(session.id, false);

        // Three entries but only one ranked: below the default minimum of 2.
        let submission = VoteSubmission::Tiered {
            entries: vec![
                TierEntry { option_id: OptionId(1), tier: 1 },
                TierEntry { option_id: OptionId(2), tier: 0 },
                TierEntry { option_id: OptionId(3), tier: 0 },
            ],
        };
        let err = validate(&session, Some(&token), &options, &submission).unwrap_err();
        assert!(matches!(err, Error::BoundsViolation { submitted: 1, .. }));

        let submission = VoteSubmission::Tiered {
            entries: vec![
                TierEntry { option_id: OptionId(1), tier: 1 },
                TierEntry { option_id: OptionId(2), tier: 2 },
                TierEntry { option_id: OptionId(3), tier: 0 },
            ],
        };
        assert!(validate(&session, Some(&token), &options, &submission).is_ok());
    }

    #[test]
    fn tiers_outside_range_rejected() {
        let session = session(
            SessionKind::Clique,
            SessionState::Configured,
            VoteBounds::default(),
        );
        let options = options(session.id, 3);
        let token = token(session.id, false);

        let submission = VoteSubmission::Tiered {
            entries: vec![
                TierEntry { option_id: OptionId(1), tier: 1 },
                TierEntry { option_id: OptionId(2), tier: 4 },
            ],
        };
        let err = validate(&session, Some(&token), &options, &submission).unwrap_err();
        assert!(matches!(err, Error::InvalidTier { tier: 4, max_tier: 3 }));
    }

    #[test]
    fn mode_mismatch_rejected() {
        let session = session(
            SessionKind::Clique,
            SessionState::Configured,
            VoteBounds::default(),
        );
        let options = options(session.id, 3);
        let token = token(session.id, false);
        let err = validate(&session, Some(&token), &options, &approval(&[1, 2])).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }
}
