//! Request fingerprints.
//!
//! The fingerprint identifies the business content of a posting request.
//! The caller identity is not part of it: the same key re-sent by another
//! operator with the same entries is still the same journal.

use sha2::{Digest, Sha256};

use crate::ledger::types::ResolvedEntry;

/// Computes the hex SHA-256 fingerprint of a posting request.
///
/// Amounts are normalized, so `100` and `100.00` hash identically.
#[must_use]
pub fn request_hash(currency: &str, source: &str, entries: &[ResolvedEntry]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("currency={}\n", currency.trim().to_uppercase()));
    hasher.update(format!("source={}\n", source.trim()));

    for entry in entries {
        hasher.update(format!(
            "{}|{}|{}|{}|{}|{}\n",
            entry.line_no,
            entry.account_id,
            entry.dc,
            entry.amount.normalize(),
            entry.currency,
            entry.memo.as_deref().unwrap_or_default(),
        ));
    }

    format!("{:x}", hasher.finalize())
}
