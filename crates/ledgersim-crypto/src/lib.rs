pub mod hashing;

pub use hashing::{block_hash, digest, GENESIS_HASH};
