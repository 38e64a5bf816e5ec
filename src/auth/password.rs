use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::warn;

fn argon2() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// Argon2id PHC string for a user or pending-signup password.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    argon2()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("hash password: {e}"))
}

/// `Ok(false)` on a wrong password. A stored value that is not a PHC
/// string is an error, not a mismatch.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        warn!(error = %e, "stored password is not a PHC hash");
        anyhow::anyhow!("parse stored password: {e}")
    })?;
    match argon2().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("verify password: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted_argon2id() {
        let a = hash_password("gula-darah-1").unwrap();
        let b = hash_password("gula-darah-1").unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);
        assert!(verify_password("gula-darah-1", &a).unwrap());
        assert!(verify_password("gula-darah-1", &b).unwrap());
    }

    #[test]
    fn wrong_password_is_a_mismatch() {
        let hash = hash_password("gula-darah-1").unwrap();
        assert!(!verify_password("gula-darah-2", &hash).unwrap());
    }

    #[test]
    fn plaintext_in_the_store_is_an_error() {
        assert!(verify_password("pw123456", "pw123456").is_err());
    }
}
