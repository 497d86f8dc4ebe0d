// Digest conventions shared by the ledger and the consensus engine.
//
// INVARIANTS:
// 1. digest is total and deterministic: same input, same output
// 2. output length is fixed (64 hex characters) regardless of input length
// 3. block_hash concatenates its inputs in one fixed order everywhere

use sha3::{Digest, Sha3_256};

/// Predecessor hash of the first block in a chain.
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// SHA3-256 digest of an input string, hex-encoded.
pub fn digest(input: &str) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash of a block's identifying fields.
///
/// Both the hash-chain ledger and the consensus engine compute block hashes
/// through this function, so a proposal's hash and the finalized block's
/// hash always agree. The field order is fixed: number, data, prev_hash,
/// validator.
pub fn block_hash(number: u64, data: &str, prev_hash: &str, validator: &str) -> String {
    digest(&format!("{}{}{}{}", number, data, prev_hash, validator))
}
