use argon2::Error as Argon2Error;
use jsonwebtoken::errors::Error as JwtError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong inside the ballot engine.
///
/// Validation failures are detected before any mutation, so an `Err` from an
/// engine operation means nothing was persisted. `Decryption` is deliberately
/// a separate variant from `NotFound`: callers must be able to tell a wrong
/// password or corrupted ciphertext apart from a missing record.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Operation `{operation}` is not allowed while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    #[error("Session is not in voting state")]
    SessionNotOpen,
    #[error("Invalid or already used token")]
    InvalidOrUsedToken,
    #[error("Invalid option selected")]
    InvalidOption,
    #[error("You must select at least {min} and at most {max} options (selected {submitted})")]
    BoundsViolation {
        submitted: usize,
        min: u32,
        max: u32,
    },
    #[error("Invalid tier {tier}; tiers must be between 0 and {max_tier}")]
    InvalidTier { tier: u32, max_tier: u32 },
    #[error("Decryption failed: incorrect password or corrupted data")]
    Decryption,
    #[error("Token `{0}` has votes but no recorded identity binding")]
    UnknownToken(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
}
