//! Constant-time token comparison (§7).
//!
//! Every authentication-token comparison in the workspace (the gateway's
//! HTTP bearer-token check, the admin token check) goes through this
//! function rather than `==`, so that timing does not leak how much of a
//! guessed token was correct.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hash a token once at startup so later comparisons never touch the raw
/// secret's length directly — only the fixed-length digest.
pub fn hash_token(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

/// Compare a caller-supplied token against a pre-hashed expected digest in
/// constant time. Unequal-length inputs cannot occur here (both are
/// SHA-256 digests), so there is no length-based short-circuit to leak.
pub fn tokens_match(provided: &str, expected_hash: &[u8; 32]) -> bool {
    let provided_hash: [u8; 32] = Sha256::digest(provided.as_bytes()).into();
    bool::from(provided_hash.ct_eq(expected_hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_token_succeeds() {
        let hash = hash_token("s3cr3t");
        assert!(tokens_match("s3cr3t", &hash));
    }

    #[test]
    fn wrong_token_fails() {
        let hash = hash_token("s3cr3t");
        assert!(!tokens_match("wrong", &hash));
    }

    #[test]
    fn empty_token_fails_against_nonempty_hash() {
        let hash = hash_token("s3cr3t");
        assert!(!tokens_match("", &hash));
    }
}
