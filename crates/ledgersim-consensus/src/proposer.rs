// Stake-weighted proposer selection.
//
// Deterministic: the slot seed fully determines the outcome for a given
// registry, so every node simulating the same slot agrees on the proposer.
// A validator's selection probability grows strictly with its stake share.

use crate::engine::ConsensusError;
use crate::validator::{Validator, ValidatorRegistry};

const SEED_MULTIPLIER: u64 = 9301;
const SEED_INCREMENT: u64 = 49297;
const SEED_MODULUS: u64 = 233280;

/// Pseudo-random fraction in [0, 1) derived from the slot seed.
pub fn slot_fraction(slot_seed: u64) -> f64 {
    let mixed = slot_seed
        .wrapping_mul(SEED_MULTIPLIER)
        .wrapping_add(SEED_INCREMENT)
        % SEED_MODULUS;
    mixed as f64 / SEED_MODULUS as f64
}

/// Select the proposer for a slot by walking the cumulative stake
/// distribution of active validators in registration order.
///
/// Falls back to the first active validator if floating-point accumulation
/// leaves the fraction unmatched. An empty active set is a defined error,
/// never a panic.
pub fn select_proposer(
    slot_seed: u64,
    registry: &ValidatorRegistry,
) -> Result<&Validator, ConsensusError> {
    let active = registry.active();
    if active.is_empty() {
        return Err(ConsensusError::NoActiveValidators);
    }

    let total_stake: f64 = active.iter().map(|v| v.stake).sum();
    if total_stake <= 0.0 {
        return Ok(active[0]);
    }

    let fraction = slot_fraction(slot_seed);
    let mut cumulative = 0.0;
    for validator in &active {
        cumulative += validator.stake / total_stake;
        if fraction < cumulative {
            return Ok(validator);
        }
    }

    Ok(active[0])
}
