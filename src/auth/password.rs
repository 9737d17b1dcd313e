use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(password_hash)
}

/// Only PHC-formatted hashes are accepted. A stored value that is not a hash
/// never matches, even if it equals the submitted password.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("mytpass123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("mytpass123", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_plaintext_stored_value_never_matches() {
        assert!(!verify_password("mytpass123", "mytpass123"));
        assert!(!verify_password("", ""));
    }
}
