//! Boundary operations of the ballot engine, exposed to whatever transport
//! the host wires up. Organizer-facing mutations require verified admin
//! claims scoped to the target session.

use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::admission;
use crate::cliques::{self, Cliques, Nomination, Votes};
use crate::config::Config;
use crate::crypto::{cipher, password, AdminClaims, TokenBinding};
use crate::error::{Error, Result};
use crate::model::{
    generate_tokens, slugify, BallotOption, NewToken, Session, SessionCore, SessionKind,
    SessionState, SessionView, Token, VoteBounds, VoteSubmission, VoterId,
};
use crate::store::{OptionTally, Store};

/// What a successful admission hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmitReceipt {
    /// Approval mode: the anonymous voter row grouping the selection.
    Approval { voter_id: VoterId },
    /// Clique mode: the tiered rows were recorded against the token.
    Recorded,
}

/// The anonymous ballot engine, generic over its backing store.
pub struct Engine<S> {
    store: S,
    config: Config,
}

impl<S: Store> Engine<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// Create a session in the `Initiated` state. The slug is derived from
    /// the name; the organizer password is stored as an Argon2 hash only.
    pub fn create_session(
        &self,
        name: &str,
        organizer_password: &str,
        kind: SessionKind,
    ) -> Result<SessionView> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(Error::BadRequest(
                "Session name must contain at least one alphanumeric character".to_string(),
            ));
        }
        let password_hash = password::hash(organizer_password)?;
        let session = self.store.insert_session(SessionCore::new(
            name.to_string(),
            slug,
            password_hash,
            kind,
        ))?;
        info!("created {:?} session `{}`", kind, session.slug);
        Ok(SessionView::from(&session))
    }

    /// Public session metadata.
    pub fn session(&self, slug: &str) -> Result<SessionView> {
        Ok(SessionView::from(&self.store.session_by_slug(slug)?))
    }

    /// Exchange the organizer password for a signed admin token scoped to
    /// this session.
    pub fn authenticate(&self, slug: &str, organizer_password: &str) -> Result<String> {
        let session = self.store.session_by_slug(slug)?;
        if !session.verify_password(organizer_password) {
            return Err(Error::Unauthorized("Invalid password".to_string()));
        }
        debug!("organizer authenticated for `{}`", session.slug);
        AdminClaims::new(session.slug.clone(), self.config.auth_ttl())
            .sign(self.config.jwt_secret())
    }

    /// Verify an admin token's signature, expiry, and session scope.
    pub fn verify_admin(&self, token: &str, slug: &str) -> Result<AdminClaims> {
        let claims = AdminClaims::verify(token, self.config.jwt_secret())?;
        if claims.session_slug() != slug {
            return Err(Error::Unauthorized(
                "Token is not valid for this session".to_string(),
            ));
        }
        Ok(claims)
    }

    fn authorized_session(&self, claims: &AdminClaims, slug: &str) -> Result<Session> {
        let session = self.store.session_by_slug(slug)?;
        if claims.session_slug() != session.slug {
            return Err(Error::Unauthorized(
                "Token is not valid for this session".to_string(),
            ));
        }
        Ok(session)
    }

    /// Update the selection bounds. Legal only while the session is still
    /// `Initiated`; bounds are frozen once configured.
    pub fn update_bounds(
        &self,
        claims: &AdminClaims,
        slug: &str,
        bounds: VoteBounds,
    ) -> Result<()> {
        let session = self.authorized_session(claims, slug)?;
        bounds.validate()?;
        self.store.set_bounds(session.id, bounds)
    }

    fn check_labels(labels: &[String]) -> Result<()> {
        if labels.len() < 2 {
            return Err(Error::BadRequest(
                "Number of options must be at least 2".to_string(),
            ));
        }
        if labels.iter().any(|l| l.trim().is_empty()) {
            return Err(Error::BadRequest(
                "Option labels must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Configure an approval session: persist the options, mint one plain
    /// token per intended voter, and open the session for voting, all in one
    /// atomic unit.
    pub fn configure_approval(
        &self,
        claims: &AdminClaims,
        slug: &str,
        labels: Vec<String>,
        voter_count: usize,
    ) -> Result<(Vec<BallotOption>, Vec<Token>)> {
        let session = self.authorized_session(claims, slug)?;
        if session.kind != SessionKind::Approval {
            return Err(Error::BadRequest(
                "Session type must be approval".to_string(),
            ));
        }
        Self::check_labels(&labels)?;
        if voter_count == 0 {
            return Err(Error::BadRequest(
                "At least one voting token must be minted".to_string(),
            ));
        }

        let tokens = generate_tokens(voter_count)
            .into_iter()
            .map(NewToken::plain)
            .collect();
        let configured = self.store.configure_session(session.id, labels, tokens)?;
        info!(
            "configured `{}` with {} options and {} tokens",
            session.slug,
            configured.0.len(),
            configured.1.len()
        );
        Ok(configured)
    }

    /// Configure a clique session: one token per participant label, each
    /// encrypted-bound to its label under the organizer password so the
    /// store alone cannot reveal who holds which token.
    pub fn configure_clique(
        &self,
        claims: &AdminClaims,
        slug: &str,
        labels: Vec<String>,
        organizer_password: &str,
    ) -> Result<(Vec<BallotOption>, Vec<Token>)> {
        let session = self.authorized_session(claims, slug)?;
        if session.kind != SessionKind::Clique {
            return Err(Error::BadRequest("Session type must be clique".to_string()));
        }
        Self::check_labels(&labels)?;
        let mut unique = labels.clone();
        unique.sort();
        unique.dedup();
        if unique.len() != labels.len() {
            return Err(Error::BadRequest(
                "Participant labels must be distinct".to_string(),
            ));
        }
        // The password is about to key the token bindings; make sure it is
        // the real organizer password and not just a typo alongside valid
        // claims, or the bindings would be undecryptable later.
        if !session.verify_password(organizer_password) {
            return Err(Error::Unauthorized("Invalid password".to_string()));
        }

        let values = generate_tokens(labels.len());
        let tokens = values
            .iter()
            .zip(&labels)
            .map(|(value, label)| {
                NewToken::bound(
                    value.clone(),
                    cipher::bind(value, label, organizer_password, self.config.kdf_iterations()),
                )
            })
            .collect();
        let configured = self.store.configure_session(session.id, labels, tokens)?;
        info!(
            "configured `{}` with {} bound tokens",
            session.slug,
            configured.1.len()
        );
        Ok(configured)
    }

    /// Organizer's token listing.
    pub fn tokens(&self, claims: &AdminClaims, slug: &str) -> Result<Vec<Token>> {
        let session = self.authorized_session(claims, slug)?;
        self.store.tokens(session.id)
    }

    /// Check a token and return the session's options for the voting form.
    /// Read-only; the token is only consumed by [`Engine::admit_vote`].
    pub fn redeem_token(&self, slug: &str, token_value: &str) -> Result<Vec<BallotOption>> {
        let session = self.store.session_by_slug(slug)?;
        if session.state != SessionState::Configured {
            return Err(Error::SessionNotOpen);
        }
        match self.store.token(token_value)? {
            Some(token) if token.session_id == session.id && !token.used => {}
            _ => return Err(Error::InvalidOrUsedToken),
        }
        self.store.options(session.id)
    }

    /// Admit a vote: validate every precondition, then commit the rows and
    /// the token's `used` flag in one atomic store operation. Nothing is
    /// persisted on any failure.
    pub fn admit_vote(
        &self,
        slug: &str,
        token_value: &str,
        submission: &VoteSubmission,
    ) -> Result<AdmitReceipt> {
        let session = self.store.session_by_slug(slug)?;
        let options = self.store.options(session.id)?;
        let token = self.store.token(token_value)?;
        admission::validate(&session, token.as_ref(), &options, submission)?;

        match submission {
            VoteSubmission::Approval { option_ids } => {
                let voter_id =
                    self.store
                        .record_approval_vote(session.id, token_value, option_ids)?;
                info!("admitted approval vote in `{}`", session.slug);
                Ok(AdmitReceipt::Approval { voter_id })
            }
            VoteSubmission::Tiered { entries } => {
                self.store
                    .record_clique_vote(session.id, token_value, entries)?;
                info!("admitted clique vote in `{}`", session.slug);
                Ok(AdmitReceipt::Recorded)
            }
        }
    }

    /// Close a session for voting. Legal only from `Configured`.
    pub fn close_session(&self, claims: &AdminClaims, slug: &str) -> Result<()> {
        let session = self.authorized_session(claims, slug)?;
        self.store.close_session(session.id)?;
        info!("closed session `{}`", session.slug);
        Ok(())
    }

    /// Approval tallies. Legal only once the session is `Finished`.
    pub fn approval_results(&self, slug: &str) -> Result<Vec<OptionTally>> {
        let session = self.store.session_by_slug(slug)?;
        session.expect_state(SessionState::Finished, "results")?;
        if session.kind != SessionKind::Approval {
            return Err(Error::BadRequest(
                "Session type must be approval".to_string(),
            ));
        }
        self.store.approval_tally(session.id)
    }

    /// Raw clique votes keyed by token, with tier orders mapped to weights
    /// (`0` stays 0, otherwise `max_tier - order + 1`). Read-only and legal
    /// whenever votes exist.
    pub fn clique_votes(&self, slug: &str) -> Result<Votes> {
        let session = self.store.session_by_slug(slug)?;
        self.clique_votes_for(&session)
    }

    fn clique_votes_for(&self, session: &Session) -> Result<Votes> {
        if session.kind != SessionKind::Clique {
            return Err(Error::BadRequest("Session type must be clique".to_string()));
        }
        let mut votes = Votes::new();
        for row in self.store.clique_rows(session.id)? {
            if row.order > session.max_tier {
                // Rows are validated at admission; out-of-range data means
                // the store was tampered with.
                return Err(Error::InvalidTier {
                    tier: row.order,
                    max_tier: session.max_tier,
                });
            }
            let weight = if row.order == 0 {
                0
            } else {
                u64::from(session.max_tier - row.order + 1)
            };
            votes
                .entry(row.token)
                .or_insert_with(Vec::new)
                .push(Nomination::new(row.label, weight));
        }
        Ok(votes)
    }

    /// Decrypt the token/label bindings and re-key the vote map by
    /// participant label. A voted token without a binding is an
    /// unrecoverable input error ([`Error::UnknownToken`]), never silently
    /// dropped; a wrong password surfaces as [`Error::Decryption`].
    pub fn unmask_votes(
        &self,
        claims: &AdminClaims,
        slug: &str,
        organizer_password: &str,
    ) -> Result<Votes> {
        let session = self.authorized_session(claims, slug)?;
        let token_votes = self.clique_votes_for(&session)?;

        let tokens = self.store.tokens(session.id)?;
        let bindings: HashMap<&str, &TokenBinding> = tokens
            .iter()
            .filter_map(|t| t.binding.as_ref().map(|b| (t.value.as_str(), b)))
            .collect();

        let mut unmasked = Votes::new();
        for (token_value, nominations) in token_votes {
            let binding = bindings
                .get(token_value.as_str())
                .ok_or_else(|| Error::UnknownToken(token_value.clone()))?;
            let plaintext =
                cipher::reveal(binding, organizer_password, self.config.kdf_iterations())?;
            let (revealed_token, label) = plaintext.split_once(':').ok_or(Error::Decryption)?;
            if revealed_token != token_value {
                return Err(Error::Decryption);
            }
            unmasked.insert(label.to_string(), nominations);
        }
        Ok(unmasked)
    }

    /// Unmask the session's clique votes and resolve them into the mutual
    /// group report. Conventionally called by the organizer after closing.
    pub fn clique_results(
        &self,
        claims: &AdminClaims,
        slug: &str,
        organizer_password: &str,
    ) -> Result<Cliques> {
        let votes = self.unmask_votes(claims, slug, organizer_password)?;
        Ok(cliques::resolve(&votes))
    }
}
