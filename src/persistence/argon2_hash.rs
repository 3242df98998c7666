use crate::domain;
use anyhow::anyhow;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Argon2id password hashing with a random per-password salt. The salt and
/// algorithm parameters travel inside the PHC-format hash string, so
/// verification needs no extra stored state.
pub struct Argon2PasswordScheme;

impl domain::auth::driven_ports::PasswordScheme for Argon2PasswordScheme {
    fn hash_password(&self, plain_password: &str) -> Result<String, anyhow::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain_password.as_bytes(), &salt)
            .map_err(|hash_error| anyhow!("failed to hash a password: {hash_error}"))?;

        Ok(hash.to_string())
    }

    fn verify_password(
        &self,
        plain_password: &str,
        stored_hash: &str,
    ) -> Result<bool, anyhow::Error> {
        let parsed_hash = PasswordHash::new(stored_hash)
            .map_err(|parse_error| anyhow!("stored password hash was unreadable: {parse_error}"))?;

        match Argon2::default().verify_password(plain_password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(verify_error) => Err(anyhow!("failed to verify a password: {verify_error}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::driven_ports::PasswordScheme;

    #[test]
    fn accepts_the_original_password_and_rejects_others() {
        let scheme = Argon2PasswordScheme;
        let hash = scheme
            .hash_password("hunter22")
            .expect("hashing should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert_ne!("hunter22", hash);
        assert!(scheme
            .verify_password("hunter22", &hash)
            .expect("verification should succeed"));
        assert!(!scheme
            .verify_password("hunter23", &hash)
            .expect("verification should succeed"));
    }

    #[test]
    fn salts_make_repeated_hashes_differ() {
        let scheme = Argon2PasswordScheme;
        let first = scheme
            .hash_password("hunter22")
            .expect("hashing should succeed");
        let second = scheme
            .hash_password("hunter22")
            .expect("hashing should succeed");

        assert_ne!(first, second);
    }
}
