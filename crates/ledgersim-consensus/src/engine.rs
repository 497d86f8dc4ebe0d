// Proof-of-Stake consensus engine: propose -> vote -> resolve.
//
// INVARIANTS:
// 1. At most one proposal is pending at any time
// 2. Each active validator casts at most one vote per proposal
// 3. Resolution runs only once every currently-active validator has voted;
//    partial-quorum finalization is not permitted
// 4. A rejected operation commits no partial state
// 5. All validator ledger views converge on the identical block sequence

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ledgersim_core::transaction::encode_payload;
use ledgersim_core::{Block, BlockView, HashChainLedger, Transaction};
use ledgersim_crypto::block_hash;

use crate::proposer::select_proposer;
use crate::validator::ValidatorRegistry;
use crate::vote::{Vote, VoteChoice, VoteTally};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("a proposal for block {0} is already pending")]
    ProposalAlreadyPending(u64),

    #[error("a proposal needs at least one transaction")]
    EmptyTransactions,

    #[error("no proposal is pending")]
    NoPendingProposal,

    #[error("unknown validator {0}")]
    UnknownValidator(String),

    #[error("validator {0} is not active")]
    InactiveValidator(String),

    #[error("validator {0} has already voted on this proposal")]
    DuplicateVote(String),

    #[error("no active validators")]
    NoActiveValidators,
}

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Fraction of total active stake that must approve to finalize.
    pub finalization_threshold: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig {
            finalization_threshold: 2.0 / 3.0,
        }
    }
}

/// A block candidate under vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub block_number: u64,
    pub proposer: String,
    pub transactions: Vec<Transaction>,
    pub data: String,
    pub prev_hash: String,
    pub hash: String,
    pub attestations: Vec<Vote>,
    pub timestamp: DateTime<Utc>,
}

/// Presentation snapshot of the pending proposal with its live tally.
#[derive(Debug, Clone, Serialize)]
pub struct ProposalView {
    pub block_number: u64,
    pub proposer: String,
    pub data: String,
    pub prev_hash: String,
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    pub votes: Vec<Vote>,
    pub tally: VoteTally,
}

/// How a proposal left the pending state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Resolution {
    Finalized(FinalitySummary),
    Rejected(RejectionSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalitySummary {
    pub block_number: u64,
    pub hash: String,
    pub yes_stake: f64,
    pub total_stake: f64,
    pub required_stake: f64,
    pub consensus_percentage: f64,
    pub approvals: usize,
    /// A malicious-stake majority captured the approving vote
    pub malicious_capture: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// The proposal simply failed the stake threshold.
    Ordinary,
    /// Malicious stake drove the rejection (observability only).
    MaliciousStakeDriven,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectionSummary {
    pub block_number: u64,
    pub yes_stake: f64,
    pub no_stake: f64,
    pub total_stake: f64,
    pub required_stake: f64,
    pub kind: RejectionKind,
}

/// Result of recording one vote.
#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome {
    pub vote: Vote,
    /// Present when this vote completed participation and resolved the
    /// proposal.
    pub resolution: Option<Resolution>,
}

/// Runs proposals through the voting lifecycle and appends finalized blocks
/// to the canonical ledger and every validator's view.
///
/// The engine reads validator stake, activity and malicious flags from the
/// registry passed into each call; it never mutates the registry.
pub struct ConsensusEngine {
    config: ConsensusConfig,
    chain: HashChainLedger,
    validator_ledgers: HashMap<String, Vec<Block>>,
    pending: Option<Proposal>,
}

impl ConsensusEngine {
    pub fn new() -> Self {
        Self::with_config(ConsensusConfig::default())
    }

    pub fn with_config(config: ConsensusConfig) -> Self {
        ConsensusEngine {
            config,
            chain: HashChainLedger::new(),
            validator_ledgers: HashMap::new(),
            pending: None,
        }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// The canonical ledger of finalized blocks.
    pub fn chain(&self) -> &HashChainLedger {
        &self.chain
    }

    /// Ordered block list with computed validity, for presentation.
    pub fn chain_snapshot(&self) -> Vec<BlockView> {
        self.chain.snapshot()
    }

    /// A validator's individual ledger view.
    pub fn validator_view(&self, name: &str) -> Option<&[Block]> {
        self.validator_ledgers.get(name).map(Vec::as_slice)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending proposal with its live vote tally, if any.
    pub fn pending_proposal(&self) -> Option<ProposalView> {
        self.pending.as_ref().map(|p| ProposalView {
            block_number: p.block_number,
            proposer: p.proposer.clone(),
            data: p.data.clone(),
            prev_hash: p.prev_hash.clone(),
            hash: p.hash.clone(),
            timestamp: p.timestamp,
            votes: p.attestations.clone(),
            tally: VoteTally::from_votes(&p.attestations),
        })
    }

    /// Who the stake-weighted selection would pick for the next slot.
    pub fn proposer_preview(&self, registry: &ValidatorRegistry) -> Result<String, ConsensusError> {
        select_proposer(self.chain.next_number(), registry).map(|v| v.name.clone())
    }

    /// Open a proposal for the next block and start voting.
    ///
    /// The proposer is either the explicit override or the stake-weighted
    /// selection seeded by the slot (the next block number).
    pub fn propose(
        &mut self,
        transactions: Vec<Transaction>,
        proposer_override: Option<&str>,
        registry: &ValidatorRegistry,
    ) -> Result<&Proposal, ConsensusError> {
        if let Some(pending) = &self.pending {
            return Err(ConsensusError::ProposalAlreadyPending(pending.block_number));
        }
        if transactions.is_empty() {
            return Err(ConsensusError::EmptyTransactions);
        }

        let block_number = self.chain.next_number();
        let proposer = match proposer_override {
            Some(name) => {
                let validator = registry
                    .get(name)
                    .ok_or_else(|| ConsensusError::UnknownValidator(name.to_string()))?;
                if !validator.active {
                    return Err(ConsensusError::InactiveValidator(name.to_string()));
                }
                validator.name.clone()
            }
            None => select_proposer(block_number, registry)?.name.clone(),
        };

        let prev_hash = self.chain.tail_hash();
        let data = encode_payload(&transactions);
        let hash = block_hash(block_number, &data, &prev_hash, &proposer);

        info!(
            "proposal opened: block {} by {} ({} transactions)",
            block_number,
            proposer,
            transactions.len()
        );

        let proposal = Proposal {
            block_number,
            proposer,
            transactions,
            data,
            prev_hash,
            hash,
            attestations: Vec::new(),
            timestamp: Utc::now(),
        };

        Ok(&*self.pending.insert(proposal))
    }

    /// Record one validator's vote, resolving the proposal once every active
    /// validator has voted.
    ///
    /// A duplicate vote is rejected as a whole: the existing tally is not
    /// altered. Stake and the malicious flag are snapshotted at cast time.
    pub fn cast_vote(
        &mut self,
        validator_name: &str,
        choice: VoteChoice,
        registry: &ValidatorRegistry,
    ) -> Result<VoteOutcome, ConsensusError> {
        if self.pending.is_none() {
            return Err(ConsensusError::NoPendingProposal);
        }

        let voter = registry
            .get(validator_name)
            .ok_or_else(|| ConsensusError::UnknownValidator(validator_name.to_string()))?;
        if !voter.active {
            return Err(ConsensusError::InactiveValidator(validator_name.to_string()));
        }

        let vote = Vote {
            validator_name: voter.name.clone(),
            stake: voter.stake,
            malicious: voter.malicious,
            choice,
        };

        let Some(pending) = self.pending.as_mut() else {
            return Err(ConsensusError::NoPendingProposal);
        };
        if pending
            .attestations
            .iter()
            .any(|v| v.validator_name == validator_name)
        {
            return Err(ConsensusError::DuplicateVote(validator_name.to_string()));
        }
        pending.attestations.push(vote.clone());

        info!(
            "vote recorded: {} {} with stake {}",
            vote.validator_name, vote.choice, vote.stake
        );

        let resolution = if self.all_active_voted(registry) {
            self.pending.take().map(|p| self.resolve(p, registry))
        } else {
            None
        };

        Ok(VoteOutcome { vote, resolution })
    }

    /// True once every currently-active validator has a recorded vote.
    ///
    /// The active set is read live: deactivating a validator mid-vote
    /// shrinks the participation requirement for the in-flight proposal.
    fn all_active_voted(&self, registry: &ValidatorRegistry) -> bool {
        let Some(pending) = &self.pending else {
            return false;
        };
        let active = registry.active();
        !active.is_empty()
            && active.iter().all(|v| {
                pending
                    .attestations
                    .iter()
                    .any(|vote| vote.validator_name == v.name)
            })
    }

    fn resolve(&mut self, proposal: Proposal, registry: &ValidatorRegistry) -> Resolution {
        let tally = VoteTally::from_votes(&proposal.attestations);
        let total_stake = registry.total_active_stake();
        let required_stake = total_stake * self.config.finalization_threshold;

        if tally.approve_stake >= required_stake {
            self.finalize(proposal, &tally, total_stake, required_stake, registry)
        } else {
            Self::reject(&proposal, &tally, total_stake, required_stake, registry)
        }
    }

    fn finalize(
        &mut self,
        proposal: Proposal,
        tally: &VoteTally,
        total_stake: f64,
        required_stake: f64,
        registry: &ValidatorRegistry,
    ) -> Resolution {
        // Capture heuristic, intentionally approximate: a malicious proposer
        // rides along with the approving stake whenever anyone approved, on
        // both sides of the comparison.
        let mut malicious_yes = tally.malicious_approve_stake;
        let mut counted_yes = tally.approve_stake;
        if tally.approve_count > 0 {
            if let Some(proposer) = registry.get(&proposal.proposer) {
                if proposer.malicious {
                    malicious_yes += proposer.stake;
                    counted_yes += proposer.stake;
                }
            }
        }
        let captured = malicious_yes > counted_yes / 2.0;

        let consensus_percentage = if total_stake > 0.0 {
            tally.approve_stake / total_stake * 100.0
        } else {
            0.0
        };

        let mut block = Block::new(
            proposal.block_number,
            proposal.data,
            proposal.prev_hash,
            proposal.proposer,
        );
        block.transactions = proposal.transactions;
        block.attestations = tally.approve_count as u32;
        block.finalized = true;
        block.malicious = captured;
        block.consensus_percentage = Some(consensus_percentage);
        block.sign();

        let summary = FinalitySummary {
            block_number: block.number,
            hash: block.hash.clone(),
            yes_stake: tally.approve_stake,
            total_stake,
            required_stake,
            consensus_percentage,
            approvals: tally.approve_count,
            malicious_capture: captured,
        };

        if let Err(err) = self.chain.append_finalized(block) {
            warn!("finalized block could not be appended: {err}");
            return Resolution::Finalized(summary);
        }
        self.sync_validator_ledgers(registry);

        if captured {
            warn!(
                "block {} finalized under malicious capture ({:.1}% approving stake)",
                summary.block_number, consensus_percentage
            );
        } else {
            info!(
                "block {} finalized ({:.1}% approving stake)",
                summary.block_number, consensus_percentage
            );
        }

        Resolution::Finalized(summary)
    }

    fn reject(
        proposal: &Proposal,
        tally: &VoteTally,
        total_stake: f64,
        required_stake: f64,
        registry: &ValidatorRegistry,
    ) -> Resolution {
        let honest_stake: f64 = registry
            .active()
            .iter()
            .filter(|v| !v.malicious)
            .map(|v| v.stake)
            .sum();
        let malicious_driven = tally.malicious_reject_stake > tally.reject_stake / 2.0
            && tally.malicious_reject_stake > honest_stake / 2.0;

        let kind = if malicious_driven {
            RejectionKind::MaliciousStakeDriven
        } else {
            RejectionKind::Ordinary
        };

        warn!(
            "block {} rejected: {:.1} of {:.1} required stake approved ({:?})",
            proposal.block_number, tally.approve_stake, required_stake, kind
        );

        Resolution::Rejected(RejectionSummary {
            block_number: proposal.block_number,
            yes_stake: tally.approve_stake,
            no_stake: tally.reject_stake,
            total_stake,
            required_stake,
            kind,
        })
    }

    /// Bring every validator's ledger view up to the canonical chain.
    ///
    /// Views extend by copying missing tail blocks, so a validator
    /// registered after earlier finalizations still converges on the full
    /// sequence.
    fn sync_validator_ledgers(&mut self, registry: &ValidatorRegistry) {
        for validator in registry.all() {
            let view = self
                .validator_ledgers
                .entry(validator.name.clone())
                .or_default();
            let missing = &self.chain.blocks()[view.len()..];
            view.extend(missing.iter().cloned());
        }
    }
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ValidatorRegistry;
    use ledgersim_crypto::GENESIS_HASH;

    fn three_validators() -> ValidatorRegistry {
        let mut registry = ValidatorRegistry::new();
        registry.register("alice").unwrap();
        registry.register("bob").unwrap();
        registry.register("carol").unwrap();
        registry
    }

    fn txs() -> Vec<Transaction> {
        vec![Transaction::new("alice", "bob", 1.0)]
    }

    #[test]
    fn propose_requires_transactions() {
        let mut engine = ConsensusEngine::new();
        let registry = three_validators();

        let err = engine.propose(Vec::new(), None, &registry).unwrap_err();
        assert_eq!(err, ConsensusError::EmptyTransactions);
        assert!(!engine.has_pending());
    }

    #[test]
    fn only_one_proposal_may_be_pending() {
        let mut engine = ConsensusEngine::new();
        let registry = three_validators();

        let first_hash = engine
            .propose(txs(), Some("alice"), &registry)
            .unwrap()
            .hash
            .clone();
        let err = engine.propose(txs(), Some("bob"), &registry).unwrap_err();

        assert_eq!(err, ConsensusError::ProposalAlreadyPending(1));
        // The original proposal is untouched.
        assert_eq!(engine.pending_proposal().unwrap().hash, first_hash);
    }

    #[test]
    fn first_proposal_links_to_genesis_sentinel() {
        let mut engine = ConsensusEngine::new();
        let registry = three_validators();

        let proposal = engine.propose(txs(), Some("alice"), &registry).unwrap();
        assert_eq!(proposal.block_number, 1);
        assert_eq!(proposal.prev_hash, GENESIS_HASH);
    }

    #[test]
    fn override_proposer_must_be_known_and_active() {
        let mut engine = ConsensusEngine::new();
        let mut registry = three_validators();
        registry.deactivate("carol").unwrap();

        assert_eq!(
            engine.propose(txs(), Some("ghost"), &registry).unwrap_err(),
            ConsensusError::UnknownValidator("ghost".to_string())
        );
        assert_eq!(
            engine.propose(txs(), Some("carol"), &registry).unwrap_err(),
            ConsensusError::InactiveValidator("carol".to_string())
        );
    }

    #[test]
    fn two_thirds_stake_finalizes() {
        let mut engine = ConsensusEngine::new();
        let registry = three_validators(); // 3 x 32 = 96 total

        engine.propose(txs(), Some("alice"), &registry).unwrap();
        engine
            .cast_vote("alice", VoteChoice::Approve, &registry)
            .unwrap();
        engine
            .cast_vote("bob", VoteChoice::Approve, &registry)
            .unwrap();
        let outcome = engine
            .cast_vote("carol", VoteChoice::Reject, &registry)
            .unwrap();

        // 64 of 96 stake approved: exactly the two-thirds threshold.
        match outcome.resolution {
            Some(Resolution::Finalized(summary)) => {
                assert_eq!(summary.yes_stake, 64.0);
                assert_eq!(summary.approvals, 2);
                assert!(!summary.malicious_capture);
            }
            other => panic!("expected finalization, got {:?}", other),
        }
        assert_eq!(engine.chain().len(), 1);
        assert!(!engine.has_pending());
    }

    #[test]
    fn one_third_stake_rejects() {
        let mut engine = ConsensusEngine::new();
        let registry = three_validators();

        engine.propose(txs(), Some("alice"), &registry).unwrap();
        engine
            .cast_vote("alice", VoteChoice::Approve, &registry)
            .unwrap();
        engine
            .cast_vote("bob", VoteChoice::Reject, &registry)
            .unwrap();
        let outcome = engine
            .cast_vote("carol", VoteChoice::Reject, &registry)
            .unwrap();

        match outcome.resolution {
            Some(Resolution::Rejected(summary)) => {
                assert_eq!(summary.yes_stake, 32.0);
                assert_eq!(summary.no_stake, 64.0);
                assert_eq!(summary.kind, RejectionKind::Ordinary);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        // Rejection discards the proposal with no ledger mutation.
        assert_eq!(engine.chain().len(), 0);
        assert!(!engine.has_pending());
    }

    #[test]
    fn double_vote_is_rejected_without_tally_change() {
        let mut engine = ConsensusEngine::new();
        let registry = three_validators();

        engine.propose(txs(), Some("alice"), &registry).unwrap();
        engine
            .cast_vote("alice", VoteChoice::Approve, &registry)
            .unwrap();

        let err = engine
            .cast_vote("alice", VoteChoice::Reject, &registry)
            .unwrap_err();
        assert_eq!(err, ConsensusError::DuplicateVote("alice".to_string()));

        let view = engine.pending_proposal().unwrap();
        assert_eq!(view.tally.total_votes(), 1);
        assert_eq!(view.tally.approve_count, 1);
    }

    #[test]
    fn vote_without_pending_proposal_fails() {
        let mut engine = ConsensusEngine::new();
        let registry = three_validators();

        let err = engine
            .cast_vote("alice", VoteChoice::Approve, &registry)
            .unwrap_err();
        assert_eq!(err, ConsensusError::NoPendingProposal);
    }

    #[test]
    fn votes_snapshot_stake_at_cast_time() {
        let mut engine = ConsensusEngine::new();
        let mut registry = three_validators();

        engine.propose(txs(), Some("alice"), &registry).unwrap();
        engine
            .cast_vote("alice", VoteChoice::Approve, &registry)
            .unwrap();

        // Stake changes after the vote do not rewrite the recorded snapshot.
        registry.add_stake("alice", 100.0).unwrap();
        let view = engine.pending_proposal().unwrap();
        assert_eq!(view.votes[0].stake, 32.0);
    }

    #[test]
    fn malicious_capture_flags_the_finalized_block() {
        let mut engine = ConsensusEngine::new();
        let mut registry = ValidatorRegistry::new();
        registry.register("mallory").unwrap();
        registry.register("alice").unwrap();
        registry.register("bob").unwrap();
        registry.add_stake("mallory", 64.0).unwrap(); // 96 stake
        registry.set_malicious("mallory", true).unwrap();
        // total 160; mallory alone holds 60% of it

        engine.propose(txs(), Some("alice"), &registry).unwrap();
        engine
            .cast_vote("mallory", VoteChoice::Approve, &registry)
            .unwrap();
        engine
            .cast_vote("alice", VoteChoice::Approve, &registry)
            .unwrap();
        let outcome = engine
            .cast_vote("bob", VoteChoice::Approve, &registry)
            .unwrap();

        match outcome.resolution {
            Some(Resolution::Finalized(summary)) => {
                // 96 of 160 approving stake is malicious: captured.
                assert!(summary.malicious_capture);
            }
            other => panic!("expected finalization, got {:?}", other),
        }
        assert!(engine.chain().blocks()[0].malicious);
    }

    #[test]
    fn honest_majority_carries_no_capture_flag() {
        let mut engine = ConsensusEngine::new();
        let registry = three_validators();

        engine.propose(txs(), Some("alice"), &registry).unwrap();
        for name in ["alice", "bob", "carol"] {
            engine.cast_vote(name, VoteChoice::Approve, &registry).unwrap();
        }

        assert!(!engine.chain().blocks()[0].malicious);
    }

    #[test]
    fn malicious_proposer_stake_joins_the_capture_arithmetic() {
        let mut engine = ConsensusEngine::new();
        let mut registry = ValidatorRegistry::new();
        registry.register("mallory").unwrap();
        registry.register("alice").unwrap();
        registry.register("bob").unwrap();
        registry.add_stake("mallory", 48.0).unwrap(); // 80 stake
        registry.set_malicious("mallory", true).unwrap();

        // Mallory proposes, then drops out before voting. The honest
        // approvals finalize the block, but the malicious proposer's stake
        // still joins both sides of the capture comparison: 80 of
        // 64 + 80 counted stake.
        engine.propose(txs(), Some("mallory"), &registry).unwrap();
        registry.deactivate("mallory").unwrap();

        engine
            .cast_vote("alice", VoteChoice::Approve, &registry)
            .unwrap();
        let outcome = engine
            .cast_vote("bob", VoteChoice::Approve, &registry)
            .unwrap();

        match outcome.resolution {
            Some(Resolution::Finalized(summary)) => {
                assert!(summary.malicious_capture);
            }
            other => panic!("expected finalization, got {:?}", other),
        }
    }

    #[test]
    fn malicious_stake_driven_rejection_is_classified() {
        let mut engine = ConsensusEngine::new();
        let mut registry = ValidatorRegistry::new();
        registry.register("mallory").unwrap();
        registry.register("eve").unwrap();
        registry.register("alice").unwrap();
        registry.add_stake("mallory", 68.0).unwrap(); // 100 stake
        registry.set_malicious("mallory", true).unwrap();
        registry.set_malicious("eve", true).unwrap();
        // honest stake: alice 32; malicious reject stake must exceed 16

        engine.propose(txs(), Some("alice"), &registry).unwrap();
        engine
            .cast_vote("alice", VoteChoice::Approve, &registry)
            .unwrap();
        engine
            .cast_vote("mallory", VoteChoice::Reject, &registry)
            .unwrap();
        let outcome = engine
            .cast_vote("eve", VoteChoice::Reject, &registry)
            .unwrap();

        match outcome.resolution {
            Some(Resolution::Rejected(summary)) => {
                assert_eq!(summary.kind, RejectionKind::MaliciousStakeDriven);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn deactivation_mid_vote_shrinks_participation() {
        let mut engine = ConsensusEngine::new();
        let mut registry = three_validators();
        registry.register("dave").unwrap(); // 4 x 32 = 128 total

        engine.propose(txs(), Some("alice"), &registry).unwrap();
        engine
            .cast_vote("alice", VoteChoice::Approve, &registry)
            .unwrap();
        let outcome = engine
            .cast_vote("bob", VoteChoice::Approve, &registry)
            .unwrap();
        assert!(outcome.resolution.is_none());

        // Dave drops out mid-vote: he can no longer vote, and the active
        // set used for participation and the threshold shrinks to three.
        registry.deactivate("dave").unwrap();
        let err = engine
            .cast_vote("dave", VoteChoice::Reject, &registry)
            .unwrap_err();
        assert_eq!(err, ConsensusError::InactiveValidator("dave".to_string()));

        // Carol completes participation; 64 of the remaining 96 stake
        // approved, so the in-flight proposal finalizes.
        let outcome = engine
            .cast_vote("carol", VoteChoice::Reject, &registry)
            .unwrap();
        assert!(matches!(outcome.resolution, Some(Resolution::Finalized(_))));
    }

    #[test]
    fn validator_views_converge_with_the_canonical_chain() {
        let mut engine = ConsensusEngine::new();
        let registry = three_validators();

        for _ in 0..2 {
            engine.propose(txs(), Some("alice"), &registry).unwrap();
            for name in ["alice", "bob", "carol"] {
                engine.cast_vote(name, VoteChoice::Approve, &registry).unwrap();
            }
        }

        assert_eq!(engine.chain().len(), 2);
        for name in ["alice", "bob", "carol"] {
            let view = engine.validator_view(name).unwrap();
            assert_eq!(view.len(), 2);
            for (ours, canonical) in view.iter().zip(engine.chain().blocks()) {
                assert_eq!(ours.hash, canonical.hash);
            }
        }
    }

    #[test]
    fn proposer_preview_matches_auto_selection() {
        let mut engine = ConsensusEngine::new();
        let registry = three_validators();

        let preview = engine.proposer_preview(&registry).unwrap();
        let proposal = engine.propose(txs(), None, &registry).unwrap();
        assert_eq!(proposal.proposer, preview);
    }
}
