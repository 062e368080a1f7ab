use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::crypto::cipher::TokenBinding;

use super::id::SessionId;

/// Token symbol alphabet, excluding visually confusable characters
/// (no 0/O, no 1/I/L).
pub const TOKEN_ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";

/// Characters per token group.
const GROUP_LEN: usize = 4;
/// Groups per token.
const GROUPS: usize = 3;

/// A one-time voting credential belonging to one session.
///
/// The token value itself is the primary key. For clique sessions the token
/// additionally carries an encrypted binding to the participant label it was
/// issued for; the raw value/label pair is never stored in plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub value: String,
    pub session_id: SessionId,
    pub used: bool,
    pub binding: Option<TokenBinding>,
    pub created_at: DateTime<Utc>,
}

/// A freshly minted token, before the store attaches it to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewToken {
    pub value: String,
    pub binding: Option<TokenBinding>,
}

impl NewToken {
    pub fn plain(value: String) -> Self {
        Self {
            value,
            binding: None,
        }
    }

    pub fn bound(value: String, binding: TokenBinding) -> Self {
        Self {
            value,
            binding: Some(binding),
        }
    }
}

fn token_group(rng: &mut impl Rng) -> String {
    (0..GROUP_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// Generate a single human-shareable voting token, formatted
/// `XXXX-XXXX-XXXX` over [`TOKEN_ALPHABET`].
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    (0..GROUPS)
        .map(|_| token_group(&mut rng))
        .collect::<Vec<_>>()
        .join("-")
}

/// Generate `count` pairwise-distinct voting tokens, retrying on collision
/// until the requested number of distinct values exists.
pub fn generate_tokens(count: usize) -> Vec<String> {
    let mut tokens = HashSet::with_capacity(count);
    while tokens.len() < count {
        tokens.insert(generate_token());
    }
    tokens.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_token_format(token: &str) {
        let groups: Vec<&str> = token.split('-').collect();
        assert_eq!(groups.len(), GROUPS, "token {token} has wrong group count");
        for group in groups {
            assert_eq!(group.len(), GROUP_LEN, "token {token} has wrong group length");
            for c in group.bytes() {
                assert!(
                    TOKEN_ALPHABET.contains(&c),
                    "token {token} contains {} outside the alphabet",
                    c as char
                );
            }
        }
    }

    #[test]
    fn token_format() {
        for _ in 0..100 {
            assert_token_format(&generate_token());
        }
    }

    #[test]
    fn tokens_are_distinct() {
        let tokens = generate_tokens(500);
        assert_eq!(tokens.len(), 500);
        let unique: HashSet<&String> = tokens.iter().collect();
        assert_eq!(unique.len(), 500);
        for token in &tokens {
            assert_token_format(token);
        }
    }

    #[test]
    fn no_confusable_characters() {
        for c in b"0O1IL" {
            assert!(!TOKEN_ALPHABET.contains(c));
        }
        assert_eq!(TOKEN_ALPHABET.len(), 31);
    }
}
