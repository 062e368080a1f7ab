//! Cryptographic adapters: the token cipher, organizer password hashing,
//! and admin capability tokens.

pub mod cipher;
pub mod claims;
pub mod password;

pub use cipher::TokenBinding;
pub use claims::AdminClaims;
