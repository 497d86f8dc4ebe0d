// Validator registry: the staking/slashing side of the simulation.
//
// INVARIANTS:
// 1. Only active validators participate in proposer selection and voting
// 2. Stake changes only through stake/withdraw/slash/reward operations,
//    never during voting
// 3. The consensus engine reads this registry at call time; it never
//    mutates it

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ledgersim_crypto::digest;

/// Stake granted to a freshly registered validator, in the simulation's
/// ETH-denominated units.
pub const DEFAULT_INITIAL_STAKE: f64 = 32.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("validator {0} is already registered")]
    AlreadyRegistered(String),

    #[error("unknown validator {0}")]
    UnknownValidator(String),

    #[error("withdrawal of {requested} exceeds staked {available}")]
    InsufficientStake { requested: f64, available: f64 },
}

/// A staked participant in the simulated network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validator {
    /// Stable identifier, assigned at registration
    pub id: String,

    /// Simulated on-chain address derived from the name
    pub address: String,

    /// Display name; votes and proposals refer to validators by name
    pub name: String,

    /// Voting weight, non-negative
    pub stake: f64,

    /// Eligible to propose and vote
    pub active: bool,

    /// Behavioral flag for attack simulation
    pub malicious: bool,

    /// Cumulative slashing penalty total
    pub slashing_risk: f64,

    /// Cumulative rewards credited
    pub rewards: f64,

    /// Simulated availability percentage
    pub uptime: f64,
}

/// Registry of all validators, in registration order.
///
/// Registration order is significant: proposer selection walks the
/// cumulative stake distribution in this order.
#[derive(Debug, Clone)]
pub struct ValidatorRegistry {
    validators: Vec<Validator>,
    initial_stake: f64,
    next_id: u32,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::with_initial_stake(DEFAULT_INITIAL_STAKE)
    }

    pub fn with_initial_stake(initial_stake: f64) -> Self {
        ValidatorRegistry {
            validators: Vec::new(),
            initial_stake,
            next_id: 1,
        }
    }

    /// Register a new validator with the fixed initial stake unit.
    pub fn register(&mut self, name: impl Into<String>) -> Result<Validator, RegistryError> {
        let name = name.into();
        if self.validators.iter().any(|v| v.name == name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }

        let id = format!("val-{}", self.next_id);
        self.next_id += 1;
        let address = format!("0x{}", &digest(&name)[..40]);

        let validator = Validator {
            id,
            address,
            name: name.clone(),
            stake: self.initial_stake,
            active: true,
            malicious: false,
            slashing_risk: 0.0,
            rewards: 0.0,
            uptime: 100.0,
        };
        self.validators.push(validator.clone());

        info!("validator {} registered with stake {}", name, self.initial_stake);
        Ok(validator)
    }

    pub fn get(&self, name: &str) -> Option<&Validator> {
        self.validators.iter().find(|v| v.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Validator, RegistryError> {
        self.validators
            .iter_mut()
            .find(|v| v.name == name)
            .ok_or_else(|| RegistryError::UnknownValidator(name.to_string()))
    }

    /// Exclude a validator from selection and voting.
    pub fn deactivate(&mut self, name: &str) -> Result<(), RegistryError> {
        let validator = self.get_mut(name)?;
        validator.active = false;
        info!("validator {} deactivated", name);
        Ok(())
    }

    /// Restore a validator's participation eligibility.
    pub fn reactivate(&mut self, name: &str) -> Result<(), RegistryError> {
        let validator = self.get_mut(name)?;
        validator.active = true;
        info!("validator {} reactivated", name);
        Ok(())
    }

    /// Flag or clear the behavioral malicious marker.
    pub fn set_malicious(&mut self, name: &str, malicious: bool) -> Result<(), RegistryError> {
        let validator = self.get_mut(name)?;
        validator.malicious = malicious;
        if malicious {
            warn!("validator {} flagged malicious", name);
        }
        Ok(())
    }

    /// Add stake to a validator.
    pub fn add_stake(&mut self, name: &str, amount: f64) -> Result<(), RegistryError> {
        let validator = self.get_mut(name)?;
        validator.stake += amount;
        Ok(())
    }

    /// Withdraw stake. Rejected without mutation if the amount exceeds the
    /// validator's current stake.
    pub fn withdraw(&mut self, name: &str, amount: f64) -> Result<(), RegistryError> {
        let validator = self.get_mut(name)?;
        if amount > validator.stake {
            return Err(RegistryError::InsufficientStake {
                requested: amount,
                available: validator.stake,
            });
        }
        validator.stake -= amount;
        Ok(())
    }

    /// Slash a fraction of a validator's stake, accumulating the penalty.
    /// Returns the amount slashed.
    pub fn slash(&mut self, name: &str, fraction: f64) -> Result<f64, RegistryError> {
        let validator = self.get_mut(name)?;
        let amount = validator.stake * fraction.clamp(0.0, 1.0);
        validator.stake -= amount;
        validator.slashing_risk += amount;
        warn!("validator {} slashed {:.4}", name, amount);
        Ok(amount)
    }

    /// Credit a reward without touching stake.
    pub fn credit_reward(&mut self, name: &str, amount: f64) -> Result<(), RegistryError> {
        let validator = self.get_mut(name)?;
        validator.rewards += amount;
        Ok(())
    }

    /// All validators in registration order.
    pub fn all(&self) -> &[Validator] {
        &self.validators
    }

    /// Active validators in registration order.
    pub fn active(&self) -> Vec<&Validator> {
        self.validators.iter().filter(|v| v.active).collect()
    }

    pub fn active_count(&self) -> usize {
        self.validators.iter().filter(|v| v.active).count()
    }

    /// Sum of active validators' stake.
    pub fn total_active_stake(&self) -> f64 {
        self.validators
            .iter()
            .filter(|v| v.active)
            .map(|v| v.stake)
            .sum()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.get(name).map(|v| v.active).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
