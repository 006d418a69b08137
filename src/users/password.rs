use tracing::error;

/// bcrypt work factor applied when no other cost is configured.
pub const DEFAULT_HASH_COST: u32 = 10;
pub const MIN_HASH_COST: u32 = 4;
pub const MAX_HASH_COST: u32 = 31;

pub fn hash_password(plain: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, cost).map_err(|e| {
        error!(error = %e, "bcrypt hash error");
        e
    })
}

pub fn verify_password(plain: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(plain, hash).map_err(|e| {
        error!(error = %e, "bcrypt verify error");
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password, MIN_HASH_COST).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn hash_uses_configured_cost() {
        let hash = hash_password("whatever-secret", DEFAULT_HASH_COST).expect("hash");
        assert!(hash.starts_with("$2b$10$"), "unexpected prefix in {hash}");
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("correct-horse", MIN_HASH_COST).expect("hash a");
        let b = hash_password("correct-horse", MIN_HASH_COST).expect("hash b");
        assert_ne!(a, b);
        assert!(verify_password("correct-horse", &a).expect("verify a"));
        assert!(verify_password("correct-horse", &b).expect("verify b"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password, MIN_HASH_COST).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
