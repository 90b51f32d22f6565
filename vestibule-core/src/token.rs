//! Capability tokens for admitted users.
//!
//! A token is the lower-hex SHA-256 digest of `user-queue-<queue>-<id>`.
//! It is unkeyed and never expires: possession stands in for proceed-set
//! membership, so the gateway can wave through repeat visitors without a
//! store round-trip. The scheme's security rests on queue names and user
//! ids not being guessable by unauthorized parties.

use sha2::{Digest, Sha256};

/// Compute the admission token for a `(queue, user)` pair.
///
/// Pure and deterministic: equal inputs always yield the identical string.
pub fn generate(queue: &str, user_id: u64) -> String {
    let input = format!("user-queue-{queue}-{user_id}");
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(digest)
}

/// True iff `token` matches the expected token for `(queue, user)`,
/// compared case-insensitively. Purely computational; the proceed set is
/// never consulted.
pub fn verify(queue: &str, user_id: u64, token: &str) -> bool {
    generate(queue, user_id).eq_ignore_ascii_case(token)
}
