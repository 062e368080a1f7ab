use chrono::Duration;
use serde::Deserialize;

/// Minimum PBKDF2 iteration count for the token cipher; configured values
/// below this are clamped up.
pub const MIN_KDF_ITERATIONS: u32 = 100_000;

fn default_auth_ttl() -> u32 {
    86_400 // 24 hours
}

fn default_kdf_iterations() -> u32 {
    MIN_KDF_ITERATIONS
}

/// Engine configuration. Hosts deserialize this from their own config layer
/// (environment, figment, toml) and hand it to [`Engine::new`].
///
/// [`Engine::new`]: crate::engine::Engine::new
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // secrets
    jwt_secret: String,
    // non-secrets
    #[serde(default = "default_auth_ttl")]
    auth_ttl: u32,
    #[serde(default = "default_kdf_iterations")]
    kdf_iterations: u32,
}

impl Config {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            auth_ttl: default_auth_ttl(),
            kdf_iterations: default_kdf_iterations(),
        }
    }

    /// Secret key used to sign admin JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Valid lifetime of an admin token.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// PBKDF2 iteration count for token bindings, never below
    /// [`MIN_KDF_ITERATIONS`].
    pub fn kdf_iterations(&self) -> u32 {
        self.kdf_iterations.max(MIN_KDF_ITERATIONS)
    }
}
