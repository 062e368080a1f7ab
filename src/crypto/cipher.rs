//! Token cipher adapter: binds a voting token to a participant label and
//! encrypts the pair under the organizer's password, so the raw store never
//! reveals which participant owns which token. Only someone holding the
//! organizer's password can unmask the binding.
//!
//! Key derivation is PBKDF2-HMAC-SHA256 over a fresh random salt; encryption
//! is AES-256-GCM with a fresh random IV, so tampered ciphertext fails
//! authentication rather than decrypting to garbage.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use data_encoding::BASE64;
use hmac::Hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{Error, Result};

/// PBKDF2 salt length in bytes.
const SALT_LEN: usize = 16;
/// AES-GCM standard IV length in bytes.
const IV_LEN: usize = 12;
/// Derived key length in bytes (AES-256).
const KEY_LEN: usize = 32;

/// The encrypted token/label pair, all fields base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBinding {
    pub ciphertext: String,
    pub iv: String,
    pub salt: String,
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, iterations, &mut key)
        .expect("HMAC accepts keys of any length");
    key
}

/// Encrypt `"<token>:<label>"` under the organizer's password.
pub fn bind(token: &str, label: &str, password: &str, iterations: u32) -> TokenBinding {
    let mut rng = rand::thread_rng();
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    let mut iv = [0u8; IV_LEN];
    rng.fill_bytes(&mut iv);

    let key = derive_key(password, &salt, iterations);
    let cipher = Aes256Gcm::new_from_slice(&key).unwrap(); // Key length is fixed.

    let plaintext = format!("{token}:{label}");
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
        .unwrap(); // Infallible for in-memory buffers.

    TokenBinding {
        ciphertext: BASE64.encode(&ciphertext),
        iv: BASE64.encode(&iv),
        salt: BASE64.encode(&salt),
    }
}

/// Decrypt a binding back to its `"<token>:<label>"` plaintext.
///
/// Fails with [`Error::Decryption`] when the password is wrong or the data
/// is corrupted (authentication-tag mismatch); this is deliberately distinct
/// from any not-found error.
pub fn reveal(binding: &TokenBinding, password: &str, iterations: u32) -> Result<String> {
    let ciphertext = BASE64
        .decode(binding.ciphertext.as_bytes())
        .map_err(|_| Error::Decryption)?;
    let iv = BASE64
        .decode(binding.iv.as_bytes())
        .map_err(|_| Error::Decryption)?;
    let salt = BASE64
        .decode(binding.salt.as_bytes())
        .map_err(|_| Error::Decryption)?;
    if iv.len() != IV_LEN {
        return Err(Error::Decryption);
    }

    let key = derive_key(password, &salt, iterations);
    let cipher = Aes256Gcm::new_from_slice(&key).unwrap(); // Key length is fixed.

    let plaintext = cipher
        .decrypt(Nonce::from_slice(&iv), ciphertext.as_slice())
        .map_err(|_| Error::Decryption)?;
    String::from_utf8(plaintext).map_err(|_| Error::Decryption)
}
