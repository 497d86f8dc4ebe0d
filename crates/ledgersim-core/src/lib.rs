// === Chain data structures ===
pub mod block;
pub mod transaction;

// === Ledger logic ===
pub mod ledger;

// === Re-exports for broader ecosystem access ===
pub use block::{Block, BlockView, Validity};
pub use ledger::{ChainReport, HashChainLedger, LedgerError};
pub use transaction::Transaction;
