//! Organizer password hashing.

use rand::RngCore;

use crate::error::Result;

/// Hash a password with Argon2 and a random salt, producing an encoded hash
/// string that embeds all parameters.
pub fn hash(password: &str) -> Result<String> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    Ok(argon2::hash_encoded(
        password.as_bytes(),
        &salt,
        &argon2::Config::default(),
    )?)
}

/// Check a password against an encoded hash. A malformed hash counts as a
/// failed verification rather than an error.
pub fn verify(encoded_hash: &str, password: &str) -> bool {
    argon2::verify_encoded(encoded_hash, password.as_bytes()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let encoded = hash("hunter2").unwrap();
        assert!(verify(&encoded, "hunter2"));
        assert!(!verify(&encoded, "hunter3"));
    }

    #[test]
    fn malformed_hash_fails_closed() {
        assert!(!verify("not a hash", "hunter2"));
    }

    #[test]
    fn salts_differ() {
        assert_ne!(hash("hunter2").unwrap(), hash("hunter2").unwrap());
    }
}
