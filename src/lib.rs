//! Anonymous, token-gated voting sessions.
//!
//! An organizer creates a session, configures its options, and hands out
//! one-time voting tokens. Votes are stored with no link back to the person
//! who cast them; in clique mode each token is additionally encrypted-bound
//! to a participant label under the organizer password, so only someone
//! holding that password can reconcile votes with identities.
//!
//! [`engine::Engine`] is the entry point: construct it over a [`store::Store`]
//! (the crate ships [`store::MemoryStore`]) with a [`config::Config`] and
//! drive the session lifecycle through its methods. The host application
//! supplies the transport layer.

pub mod admission;
pub mod cliques;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod model;
pub mod store;

pub use config::Config;
pub use engine::{AdmitReceipt, Engine};
pub use error::{Error, Result};
pub use store::{MemoryStore, Store};
