// Votes and stake-weighted tallies.
//
// A vote snapshots the voter's stake and malicious flag at cast time, so a
// later registry mutation never rewrites history. Votes are immutable once
// recorded.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Approve,
    Reject,
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteChoice::Approve => write!(f, "approve"),
            VoteChoice::Reject => write!(f, "reject"),
        }
    }
}

/// A single validator's decision on a pending proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub validator_name: String,
    /// Voter's stake at cast time
    pub stake: f64,
    /// Voter's malicious flag at cast time
    pub malicious: bool,
    pub choice: VoteChoice,
}

/// Stake-weighted aggregation of a proposal's votes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VoteTally {
    pub approve_count: usize,
    pub reject_count: usize,
    pub approve_stake: f64,
    pub reject_stake: f64,
    pub malicious_approve_stake: f64,
    pub malicious_reject_stake: f64,
}

impl VoteTally {
    pub fn from_votes(votes: &[Vote]) -> Self {
        let mut tally = VoteTally::default();
        for vote in votes {
            match vote.choice {
                VoteChoice::Approve => {
                    tally.approve_count += 1;
                    tally.approve_stake += vote.stake;
                    if vote.malicious {
                        tally.malicious_approve_stake += vote.stake;
                    }
                }
                VoteChoice::Reject => {
                    tally.reject_count += 1;
                    tally.reject_stake += vote.stake;
                    if vote.malicious {
                        tally.malicious_reject_stake += vote.stake;
                    }
                }
            }
        }
        tally
    }

    pub fn total_votes(&self) -> usize {
        self.approve_count + self.reject_count
    }

    pub fn voted_stake(&self) -> f64 {
        self.approve_stake + self.reject_stake
    }
}
