//! Argon2id password hashing in PHC string format.

use anyhow::{anyhow, Result};
use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use once_cell::sync::Lazy;
use uuid::Uuid;

/// Stored hashes starting with this marker never match any input.
pub const UNUSABLE_PASSWORD_PREFIX: char = '!';

pub fn hash_password(raw: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

pub fn make_unusable_password() -> String {
    format!("{UNUSABLE_PASSWORD_PREFIX}{}", Uuid::new_v4().simple())
}

pub fn has_usable_password(encoded: &str) -> bool {
    !encoded.starts_with(UNUSABLE_PASSWORD_PREFIX)
}

/// Hash checked on login misses so an unknown email costs the same Argon2 work
/// as a wrong password.
static DUMMY_HASH: Lazy<String> =
    Lazy::new(|| hash_password("careerpath-timing-equalizer").unwrap_or_default());

/// Runs a verification that always fails.
pub fn verify_dummy_password(raw: &str) -> bool {
    verify_password(raw, &DUMMY_HASH);
    false
}

/// Returns false for unusable or unparseable hashes rather than erroring.
pub fn verify_password(raw: &str, encoded: &str) -> bool {
    if !has_usable_password(encoded) {
        return false;
    }
    match PasswordHash::new(encoded) {
        Ok(parsed) => Argon2::default()
            .verify_password(raw.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verifies_only_the_original() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_unusable_password_never_matches() {
        let marker = make_unusable_password();
        assert!(!has_usable_password(&marker));
        assert!(!verify_password("", &marker));
        assert!(!verify_password(&marker, &marker));
    }

    #[test]
    fn test_dummy_hash_is_real_argon2() {
        assert!(DUMMY_HASH.starts_with("$argon2id$"));
        assert!(!verify_dummy_password("careerpath-timing-equalizer"));
    }

    #[test]
    fn test_malformed_hash_does_not_match() {
        assert!(!verify_password("secret", "not-a-phc-string"));
    }
}
