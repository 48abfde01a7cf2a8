use rand::RngCore;
use sha2::{Digest, Sha256};

/// Stored password format: `salt$hex(sha256(salt || password))`.
pub fn hash_password(password: &str) -> String {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = hex::encode(salt_bytes);
    format!("{}${}", salt, digest(&salt, password))
}

pub fn verify_password(stored: &str, password: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digest(salt, password) == expected,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Mint a fresh bearer token: 32 random bytes, hex-encoded.
pub fn mint_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Only the token's digest is persisted; a leaked sessions table cannot be
/// replayed as bearer tokens.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let stored = hash_password("hunter2");
        assert!(verify_password(&stored, "hunter2"));
        assert!(!verify_password(&stored, "hunter3"));
    }

    #[test]
    fn test_same_password_different_salts() {
        assert_ne!(hash_password("hunter2"), hash_password("hunter2"));
    }

    #[test]
    fn test_malformed_stored_hash_never_verifies() {
        assert!(!verify_password("not-a-valid-record", "anything"));
    }

    #[test]
    fn test_token_and_hash_shapes() {
        let token = mint_token();
        assert_eq!(token.len(), 64);
        assert_ne!(hash_token(&token), token);
        assert_eq!(hash_token(&token), hash_token(&token));
    }
}
