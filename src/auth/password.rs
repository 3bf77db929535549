//! One-way salted password hashing.
//!
//! PBKDF2-SHA256 producing self-describing PHC strings: the salt and round
//! count travel inside the hash, so no separate salt storage exists. The
//! round count is the cost knob; tests run it low, production runs it high.

use pbkdf2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Params, Pbkdf2,
};

use anyhow::Result;

/// Output length of the derived key in bytes.
const OUTPUT_LEN: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct Hasher {
    rounds: u32,
}

impl Hasher {
    pub fn new(rounds: u32) -> Self {
        Self { rounds }
    }

    /// Hash a plaintext password. A fresh random salt is generated per call,
    /// so hashing the same input twice yields different strings.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let params = Params {
            rounds: self.rounds,
            output_length: OUTPUT_LEN,
        };
        let hash = Pbkdf2
            .hash_password_customized(plaintext.as_bytes(), None, None, params, &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
        Ok(hash.to_string())
    }

    /// Verify a plaintext password against a stored PHC string.
    /// Comparison is constant-time; a malformed hash yields `false`,
    /// never an error.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Pbkdf2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low round count: these exercise correctness, not cost.
    fn hasher() -> Hasher {
        Hasher::new(1_000)
    }

    #[test]
    fn hash_then_verify_round_trip() {
        let h = hasher();
        let hash = h.hash("secret1").unwrap();
        assert!(h.verify("secret1", &hash));
    }

    #[test]
    fn wrong_password_fails_verification() {
        let h = hasher();
        let hash = h.hash("secret1").unwrap();
        assert!(!h.verify("secret2", &hash));
        assert!(!h.verify("", &hash));
    }

    #[test]
    fn same_input_hashes_differently() {
        let h = hasher();
        let a = h.hash("secret1").unwrap();
        let b = h.hash("secret1").unwrap();
        assert_ne!(a, b);
        assert!(h.verify("secret1", &a));
        assert!(h.verify("secret1", &b));
    }

    #[test]
    fn malformed_hash_returns_false() {
        let h = hasher();
        assert!(!h.verify("secret1", ""));
        assert!(!h.verify("secret1", "not-a-phc-string"));
        assert!(!h.verify("secret1", "$pbkdf2-sha256$truncated"));
    }

    #[test]
    fn hash_is_self_describing() {
        let h = hasher();
        let hash = h.hash("secret1").unwrap();
        assert!(hash.starts_with("$pbkdf2-sha256$"));
        // A hasher with a different round count still verifies: the round
        // count is read from the hash, not the verifier.
        let other = Hasher::new(2_000);
        assert!(other.verify("secret1", &hash));
    }
}
