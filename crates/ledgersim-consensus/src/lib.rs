// === Validator registry (staking side) ===
pub mod validator;

// === Voting and proposer selection ===
pub mod proposer;
pub mod vote;

// === The consensus engine ===
pub mod engine;

// === Re-exports for broader ecosystem access ===
pub use engine::{
    ConsensusConfig, ConsensusEngine, ConsensusError, FinalitySummary, Proposal, ProposalView,
    RejectionKind, RejectionSummary, Resolution, VoteOutcome,
};
pub use proposer::{select_proposer, slot_fraction};
pub use validator::{RegistryError, Validator, ValidatorRegistry};
pub use vote::{Vote, VoteChoice, VoteTally};
