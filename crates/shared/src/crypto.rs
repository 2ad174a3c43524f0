//! Hashing helpers used to derive database lock keys.

use sha2::{Digest, Sha256};

/// Derives a stable 64-bit key for `pg_advisory_xact_lock` from a namespace and value.
///
/// The namespace keeps keys for different identity fields apart, so a phone
/// number and a national ID with the same digits never contend.
pub fn advisory_lock_key(namespace: &str, value: &str) -> i64 {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update([0u8]);
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisory_lock_key_deterministic() {
        let a = advisory_lock_key("national_id", "1234567890123456");
        let b = advisory_lock_key("national_id", "1234567890123456");
        assert_eq!(a, b);
    }

    #[test]
    fn test_advisory_lock_key_differs_by_value() {
        let a = advisory_lock_key("email", "a@x.com");
        let b = advisory_lock_key("email", "b@x.com");
        assert_ne!(a, b);
    }

    #[test]
    fn test_advisory_lock_key_differs_by_namespace() {
        let a = advisory_lock_key("phone", "0812345678901");
        let b = advisory_lock_key("national_id", "0812345678901");
        assert_ne!(a, b);
    }

    #[test]
    fn test_advisory_lock_key_namespace_boundary() {
        // "ab" + "c" must not collide with "a" + "bc"
        assert_ne!(advisory_lock_key("ab", "c"), advisory_lock_key("a", "bc"));
    }
}
