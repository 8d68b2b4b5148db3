//! Reward calculation for the staged play-to-earn bucket
//!
//! Pure functions only: no ledger access, no side effects.

use crate::errors::EconomicsError;
use p2e_types::{amount_string, Amount, FixedPoint};
use serde::{Deserialize, Serialize};

/// Reward quoted for an amount played at a given rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardQuote {
    pub apy: FixedPoint,
    #[serde(with = "amount_string")]
    pub total_mint: Amount,
    /// Whether the bucket still has room for `total_mint`.
    pub can_mint: bool,
}

/// A total mint split between the tax wallet and the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSplit {
    #[serde(with = "amount_string")]
    pub fee: Amount,
    #[serde(with = "amount_string")]
    pub net_reward: Amount,
}

impl RewardSplit {
    pub fn total(&self) -> Amount {
        self.fee + self.net_reward
    }
}

/// `total_mint = floor(amount_played * apy / SCALE)`; `can_mint` holds when
/// `bucket_distributed + total_mint <= bucket_cap`.
pub fn compute_reward(
    amount_played: Amount,
    apy: FixedPoint,
    bucket_distributed: Amount,
    bucket_cap: Amount,
) -> Result<RewardQuote, EconomicsError> {
    let total_mint = apy
        .apply(amount_played)
        .ok_or(EconomicsError::CalculationOverflow("reward total_mint"))?;

    let can_mint = bucket_distributed
        .checked_add(total_mint)
        .is_some_and(|after| after <= bucket_cap);

    Ok(RewardQuote {
        apy,
        total_mint,
        can_mint,
    })
}

/// `fee = floor(total_mint * fee_rate / SCALE)`, `net_reward = total_mint - fee`.
///
/// Truncation lands entirely in the fee, so `fee + net_reward == total_mint`.
pub fn split_reward(total_mint: Amount, fee_rate: FixedPoint) -> Result<RewardSplit, EconomicsError> {
    if fee_rate.exceeds_one() {
        return Err(EconomicsError::Config(format!(
            "fee rate {fee_rate} exceeds 1.0"
        )));
    }

    let fee = fee_rate
        .apply(total_mint)
        .ok_or(EconomicsError::CalculationOverflow("reward fee"))?;

    Ok(RewardSplit {
        fee,
        net_reward: total_mint - fee,
    })
}
