//! Request fingerprints for guarded operations without a payload hash of
//! their own.

use sha2::{Digest, Sha256};

/// Computes the hex SHA-256 of `parts`, each terminated by a newline.
#[must_use]
pub fn fingerprint(operation: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    hasher.update(b"\n");
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = fingerprint("approve", &["r1", "c1"]);
        assert_eq!(a, fingerprint("approve", &["r1", "c1"]));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_separates_parts() {
        assert_ne!(
            fingerprint("approve", &["ab", "c"]),
            fingerprint("approve", &["a", "bc"])
        );
        assert_ne!(
            fingerprint("approve", &["r1"]),
            fingerprint("reject", &["r1"])
        );
    }
}
