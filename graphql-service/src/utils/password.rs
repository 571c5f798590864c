use std::sync::OnceLock;

use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};

static DUMMY_HASH: OnceLock<Option<PasswordHashString>> = OnceLock::new();

/// Plaintext password. `Debug` is redacted so it never reaches the logs.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Argon2 PHC string as stored in `authentication_providers.provider_password`
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash with Argon2id at the crate defaults (19 MiB, t=2, p=1) and a random salt.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(PasswordHashString::new(password_hash))
}

/// Constant-time check of `password` against a stored PHC string.
pub fn verify_password(
    password: &Password,
    password_hash: &PasswordHashString,
) -> Result<(), anyhow::Error> {
    let parsed_hash = PasswordHash::new(password_hash.as_str())
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;

    Argon2::default()
        .verify_password(password.as_str().as_bytes(), &parsed_hash)
        .map_err(|_| anyhow::anyhow!("Password verification failed"))
}

/// Hash of a random password nobody knows, computed on first use.
fn dummy_hash() -> Option<&'static PasswordHashString> {
    DUMMY_HASH
        .get_or_init(|| {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            hash_password(&Password::new(hex::encode(bytes))).ok()
        })
        .as_ref()
}

/// Burn one Argon2 verification for a sign-in with no stored hash, so an
/// unknown email takes as long as a wrong password. Always fails.
pub fn verify_without_account(password: &Password) -> Result<(), anyhow::Error> {
    match dummy_hash() {
        Some(hash) => {
            let _ = verify_password(password, hash);
        }
        None => tracing::warn!("Dummy password hash unavailable"),
    }
    Err(anyhow::anyhow!("Password verification failed"))
}
