//! SHA-256 hashing for secrets that must never be persisted in the clear.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest of `secret` after stripping surrounding whitespace.
///
/// A token pasted with a trailing newline hashes the same as the bare token.
pub fn hash_secret(secret: &str) -> String {
    let mut h = Sha256::new();
    h.update(secret.trim().as_bytes());
    hex::encode(h.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            hash_secret("test-token"),
            "4c5dc9b7708905f77f5e5d16316b5dfb425e68cb326dcd55a860e90a7707031e"
        );
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(hash_secret("test-token\n"), hash_secret("test-token"));
        assert_eq!(hash_secret("  test-token "), hash_secret("test-token"));
    }

    #[test]
    fn different_tokens_differ() {
        assert_ne!(hash_secret("test-token"), hash_secret("test-token-2"));
    }
}
