//! Password hashing collaborator used by registration and login.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use eyre::eyre;

pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> eyre::Result<String>;

    /// Whether `password` matches a hash produced by [`CredentialHasher::hash`].
    fn verify(&self, password: &str, hash: &str) -> eyre::Result<bool>;
}

/// Argon2id with a random salt per password, stored in PHC string form.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> eyre::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| eyre!("cannot hash password: {e}"))
    }

    fn verify(&self, password: &str, hash: &str) -> eyre::Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| eyre!("malformed password hash: {e}"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// Reversible stand-in that keeps tests fast.
#[cfg(test)]
pub(crate) struct PlainHasher;

#[cfg(test)]
impl CredentialHasher for PlainHasher {
    fn hash(&self, password: &str) -> eyre::Result<String> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> eyre::Result<bool> {
        Ok(hash.strip_prefix("plain:") == Some(password))
    }
}
