// Block structure and signature validity derivation.
//
// INVARIANTS:
// 1. `hash` is always the digest of the block's current identifying fields
// 2. Validity is derived by comparing `signed_hash` to `hash`; it is never
//    stored, so it can never go stale after a mutation
// 3. A signature covers the block's own content plus the hash of its
//    immediate predecessor at signing time, nothing downstream

use std::fmt;

use serde::{Deserialize, Serialize};

use ledgersim_crypto::block_hash;

use crate::transaction::Transaction;

/// Signature status of a block relative to its current hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    /// The block has never been signed.
    Unsigned,
    /// The signed hash matches the current hash.
    Valid,
    /// The block was signed, but its content or chain position changed since.
    Invalid,
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validity::Unsigned => write!(f, "unsigned"),
            Validity::Valid => write!(f, "valid"),
            Validity::Invalid => write!(f, "invalid"),
        }
    }
}

/// A block in the simulated chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, 1-based
    pub number: u64,

    /// Opaque payload (typically an encoded transaction list)
    pub data: String,

    /// Hash of the predecessor, or the genesis sentinel for block 1
    pub prev_hash: String,

    /// Digest of number, data, prev_hash and validator
    pub hash: String,

    /// Hash value last signed by the validator; may be stale
    pub signed_hash: Option<String>,

    /// Identity of the block's proposer/signer
    pub validator: String,

    /// Number of approving votes at finalization
    pub attestations: u32,

    /// Whether the block was accepted through consensus
    pub finalized: bool,

    /// Set when a malicious-stake majority captured the approving vote
    pub malicious: bool,

    /// Transactions carried by the block
    pub transactions: Vec<Transaction>,

    /// Approving stake share at finalization, as a percentage
    pub consensus_percentage: Option<f64>,
}

impl Block {
    /// Create an unsigned block with its hash computed from the given fields.
    pub fn new(
        number: u64,
        data: impl Into<String>,
        prev_hash: impl Into<String>,
        validator: impl Into<String>,
    ) -> Self {
        let data = data.into();
        let prev_hash = prev_hash.into();
        let validator = validator.into();
        let hash = block_hash(number, &data, &prev_hash, &validator);

        Block {
            number,
            data,
            prev_hash,
            hash,
            signed_hash: None,
            validator,
            attestations: 0,
            finalized: false,
            malicious: false,
            transactions: Vec::new(),
            consensus_percentage: None,
        }
    }

    /// Recompute `hash` from the block's current fields.
    pub fn recompute_hash(&mut self) {
        self.hash = block_hash(self.number, &self.data, &self.prev_hash, &self.validator);
    }

    /// Sign the block: recompute the hash and record it as the signed value.
    ///
    /// The signature only covers this block. Descendants keep whatever
    /// `signed_hash` they had before.
    pub fn sign(&mut self) {
        self.recompute_hash();
        self.signed_hash = Some(self.hash.clone());
    }

    /// Derive the block's validity. Pure, callable at any time.
    pub fn validity(&self) -> Validity {
        match &self.signed_hash {
            None => Validity::Unsigned,
            Some(signed) if *signed == self.hash => Validity::Valid,
            Some(_) => Validity::Invalid,
        }
    }
}

/// Presentation snapshot of a block with its validity computed.
#[derive(Debug, Clone, Serialize)]
pub struct BlockView {
    pub number: u64,
    pub data: String,
    pub prev_hash: String,
    pub hash: String,
    pub signed_hash: Option<String>,
    pub validator: String,
    pub attestations: u32,
    pub finalized: bool,
    pub malicious: bool,
    pub consensus_percentage: Option<f64>,
    pub validity: Validity,
}

impl From<&Block> for BlockView {
    fn from(block: &Block) -> Self {
        BlockView {
            number: block.number,
            data: block.data.clone(),
            prev_hash: block.prev_hash.clone(),
            hash: block.hash.clone(),
            signed_hash: block.signed_hash.clone(),
            validator: block.validator.clone(),
            attestations: block.attestations,
            finalized: block.finalized,
            malicious: block.malicious,
            consensus_percentage: block.consensus_percentage,
            validity: block.validity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgersim_crypto::GENESIS_HASH;

    #[test]
    fn new_block_is_unsigned() {
        let block = Block::new(1, "payload", GENESIS_HASH, "val-1");
        assert_eq!(block.validity(), Validity::Unsigned);
        assert!(block.signed_hash.is_none());
    }

    #[test]
    fn signing_makes_block_valid() {
        let mut block = Block::new(1, "payload", GENESIS_HASH, "val-1");
        block.sign();
        assert_eq!(block.validity(), Validity::Valid);
        assert_eq!(block.signed_hash.as_deref(), Some(block.hash.as_str()));
    }

    #[test]
    fn editing_after_signing_invalidates() {
        let mut block = Block::new(1, "payload", GENESIS_HASH, "val-1");
        block.sign();

        block.data = "tampered".to_string();
        block.recompute_hash();
        assert_eq!(block.validity(), Validity::Invalid);
    }

    #[test]
    fn hash_tracks_current_fields() {
        let mut block = Block::new(1, "payload", GENESIS_HASH, "val-1");
        let original = block.hash.clone();

        block.data = "other".to_string();
        block.recompute_hash();
        assert_ne!(block.hash, original);

        block.data = "payload".to_string();
        block.recompute_hash();
        assert_eq!(block.hash, original);
    }

    #[test]
    fn view_carries_derived_validity() {
        let mut block = Block::new(1, "payload", GENESIS_HASH, "val-1");
        block.sign();
        let view = BlockView::from(&block);
        assert_eq!(view.validity, Validity::Valid);
    }

    #[test]
    fn validity_display() {
        assert_eq!(Validity::Unsigned.to_string(), "unsigned");
        assert_eq!(Validity::Valid.to_string(), "valid");
        assert_eq!(Validity::Invalid.to_string(), "invalid");
    }
}
