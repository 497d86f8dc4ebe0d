// Hash-chain ledger with explicit cascade recomputation.
//
// INVARIANTS:
// 1. Every block's prev_hash equals its predecessor's current hash after any
//    mutation completes (block 1 carries the genesis sentinel)
// 2. An edit never touches any signed_hash: only an explicit sign operation
//    can mark a block trusted again, and it signs only the targeted block
// 3. A mutation runs its full cascade before the ledger accepts another
//    operation; validity reads after that are authoritative

use log::info;
use serde::Serialize;
use thiserror::Error;

use ledgersim_crypto::GENESIS_HASH;

use crate::block::{Block, BlockView, Validity};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("block index {index} out of range for chain of length {len}")]
    BlockIndexOutOfRange { index: usize, len: usize },

    #[error("appended block does not extend the tail: expected prev hash {expected}, got {got}")]
    PrevHashMismatch { expected: String, got: String },
}

/// Ordered sequence of blocks whose hashes and validity are kept consistent
/// with their current contents.
#[derive(Debug, Clone, Default)]
pub struct HashChainLedger {
    blocks: Vec<Block>,
}

impl HashChainLedger {
    pub fn new() -> Self {
        HashChainLedger { blocks: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Hash of the chain tail, or the genesis sentinel for an empty chain.
    pub fn tail_hash(&self) -> String {
        self.blocks
            .last()
            .map(|b| b.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string())
    }

    /// Number the next block will carry (1-based).
    pub fn next_number(&self) -> u64 {
        self.blocks.len() as u64 + 1
    }

    /// Replace the payload of the block at `index` and cascade the change.
    ///
    /// The edited block keeps its existing prev_hash; every subsequent block
    /// is relinked to its predecessor's new hash and rehashed. No signed_hash
    /// is touched, so a signed-then-edited block reads as invalid until it is
    /// explicitly re-signed.
    pub fn edit_block_data(
        &mut self,
        index: usize,
        new_data: impl Into<String>,
    ) -> Result<(), LedgerError> {
        self.check_index(index)?;

        self.blocks[index].data = new_data.into();
        self.recompute_from(index);

        info!(
            "block {} edited, cascade updated blocks {}..{}",
            self.blocks[index].number,
            index + 1,
            self.blocks.len()
        );
        Ok(())
    }

    /// Sign the block at `index`, then propagate corrected hashes downstream.
    ///
    /// Only the targeted block's signed_hash is set. Descendants are relinked
    /// and rehashed but keep their old signatures, so they read as unsigned
    /// or invalid unless their signed hash happens to still match.
    pub fn sign_block(&mut self, index: usize) -> Result<(), LedgerError> {
        self.check_index(index)?;

        self.blocks[index].sign();
        self.recompute_from(index + 1);

        info!("block {} signed", self.blocks[index].number);
        Ok(())
    }

    /// Append a block finalized by consensus. It must extend the tail.
    pub fn append_finalized(&mut self, block: Block) -> Result<(), LedgerError> {
        let expected = self.tail_hash();
        if block.prev_hash != expected {
            return Err(LedgerError::PrevHashMismatch {
                expected,
                got: block.prev_hash,
            });
        }

        info!("block {} appended to ledger", block.number);
        self.blocks.push(block);
        Ok(())
    }

    /// Derived validity of the block at `index`.
    pub fn validity_of(&self, index: usize) -> Option<Validity> {
        self.blocks.get(index).map(Block::validity)
    }

    /// Presentation snapshot: every block with its validity computed.
    pub fn snapshot(&self) -> Vec<BlockView> {
        self.blocks.iter().map(BlockView::from).collect()
    }

    /// Walk the chain and report linkage and validity diagnostics.
    pub fn verify_chain(&self) -> ChainReport {
        let mut report = ChainReport {
            length: self.blocks.len(),
            linked: true,
            broken_at: None,
            valid: 0,
            invalid: 0,
            unsigned: 0,
        };

        for (i, block) in self.blocks.iter().enumerate() {
            let expected_prev = if i == 0 {
                GENESIS_HASH
            } else {
                self.blocks[i - 1].hash.as_str()
            };
            if report.linked && block.prev_hash != expected_prev {
                report.linked = false;
                report.broken_at = Some(i);
            }

            match block.validity() {
                Validity::Valid => report.valid += 1,
                Validity::Invalid => report.invalid += 1,
                Validity::Unsigned => report.unsigned += 1,
            }
        }

        report
    }

    /// Relink and rehash every block from `index` to the tail, in order.
    ///
    /// Block 1 keeps the genesis sentinel; every later block in the range
    /// takes its predecessor's current hash before rehashing, so one call
    /// settles the whole suffix.
    fn recompute_from(&mut self, index: usize) {
        for i in index..self.blocks.len() {
            if i > 0 {
                self.blocks[i].prev_hash = self.blocks[i - 1].hash.clone();
            }
            self.blocks[i].recompute_hash();
        }
    }

    fn check_index(&self, index: usize) -> Result<(), LedgerError> {
        if index >= self.blocks.len() {
            return Err(LedgerError::BlockIndexOutOfRange {
                index,
                len: self.blocks.len(),
            });
        }
        Ok(())
    }
}

/// Diagnostic summary produced by [`HashChainLedger::verify_chain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub length: usize,
    pub linked: bool,
    pub broken_at: Option<usize>,
    pub valid: usize,
    pub invalid: usize,
    pub unsigned: usize,
}
