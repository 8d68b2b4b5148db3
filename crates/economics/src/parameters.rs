//! Tokenomics parameters and their validation

use crate::distribution::DistributionLedger;
use crate::errors::EconomicsError;
use crate::stages::{Stage, StageTracker};
use crate::types::{BucketAllocation, ECOSYSTEM, INVESTORS, PLAY_TO_EARN, STAKING, TEAM};
use p2e_types::{amount_string, Amount, FixedPoint, Principal, SCALE};
use serde::{Deserialize, Serialize};

/// Settings for the staged reward path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardParams {
    /// Bucket the staged rewards are minted from.
    pub bucket: String,
    /// Share of every reward routed to the tax wallet.
    pub fee_rate: FixedPoint,
    pub stages: Vec<Stage>,
}

/// Principals wired into a deployment at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleParams {
    pub owner: Principal,
    #[serde(default)]
    pub treasury: Option<Principal>,
    pub tax_wallet: Principal,
}

/// Complete construction input for a token deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenomicsConfig {
    #[serde(with = "amount_string")]
    pub max_total_supply: Amount,
    pub buckets: Vec<BucketAllocation>,
    pub reward: RewardParams,
    pub roles: RoleParams,
}

impl Default for TokenomicsConfig {
    fn default() -> Self {
        // 1 billion tokens with 18 decimals
        let max_total_supply = 1_000_000_000u128 * SCALE;

        Self {
            max_total_supply,
            buckets: vec![
                BucketAllocation::new(PLAY_TO_EARN, FixedPoint::from_percent(40)),
                BucketAllocation::new(ECOSYSTEM, FixedPoint::from_percent(20)),
                BucketAllocation::new(STAKING, FixedPoint::from_percent(15)),
                BucketAllocation::new(TEAM, FixedPoint::from_percent(15)),
                BucketAllocation::new(INVESTORS, FixedPoint::from_percent(10)),
            ],
            reward: RewardParams {
                bucket: PLAY_TO_EARN.to_string(),
                fee_rate: FixedPoint::from_percent(5),
                stages: vec![
                    Stage::new(FixedPoint::from_percent(25), FixedPoint::from_percent(100)),
                    Stage::new(FixedPoint::from_percent(25), FixedPoint::from_percent(75)),
                    Stage::new(FixedPoint::from_percent(25), FixedPoint::from_percent(50)),
                    Stage::new(FixedPoint::from_percent(25), FixedPoint::from_percent(25)),
                ],
            },
            roles: RoleParams {
                owner: Principal::from_label("owner"),
                treasury: Some(Principal::from_label("treasury")),
                tax_wallet: Principal::from_label("tax-wallet"),
            },
        }
    }
}

impl TokenomicsConfig {
    pub fn build_ledger(&self) -> Result<DistributionLedger, EconomicsError> {
        DistributionLedger::new(self.max_total_supply, &self.buckets)
    }

    pub fn build_stages(&self) -> Result<StageTracker, EconomicsError> {
        StageTracker::new(self.reward.stages.clone())
    }

    /// Check every construction rule without building anything persistent.
    pub fn validate(&self) -> Result<(), EconomicsError> {
        let ledger = self.build_ledger()?;
        self.build_stages()?;
        ledger.resolve(&self.reward.bucket)?;

        if self.reward.fee_rate.exceeds_one() {
            return Err(EconomicsError::config(format!(
                "fee rate {} exceeds 1.0",
                self.reward.fee_rate
            )));
        }
        if self.roles.owner.is_zero() {
            return Err(EconomicsError::config("owner must be a non-zero principal"));
        }
        if self.roles.tax_wallet.is_zero() {
            return Err(EconomicsError::config("tax wallet must be a non-zero principal"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TokenomicsConfig::default();
        config.validate().unwrap();

        let ledger = config.build_ledger().unwrap();
        assert_eq!(ledger.buckets().len(), 5);
        assert_eq!(
            ledger.bucket(PLAY_TO_EARN).unwrap().cap,
            400_000_000u128 * SCALE
        );
        assert_eq!(config.build_stages().unwrap().len(), 4);
    }

    #[test]
    fn test_unknown_reward_bucket_rejected() {
        let mut config = TokenomicsConfig::default();
        config.reward.bucket = "nope".into();
        assert_eq!(
            config.validate(),
            Err(EconomicsError::UnknownDistribution("nope".into()))
        );
    }

    #[test]
    fn test_fee_rate_and_roles_validated() {
        let mut config = TokenomicsConfig::default();
        config.reward.fee_rate = FixedPoint::from_percent(150);
        assert!(matches!(config.validate(), Err(EconomicsError::Config(_))));

        let mut config = TokenomicsConfig::default();
        config.roles.tax_wallet = Principal::ZERO;
        assert!(matches!(config.validate(), Err(EconomicsError::Config(_))));
    }

    #[test]
    fn test_config_json_shape() {
        let json = serde_json::json!({
            "max_total_supply": "1000000000",
            "buckets": [
                { "name": "team", "percentage": "0.1" },
                { "name": "rest", "percentage": "0.9" }
            ],
            "reward": {
                "bucket": "rest",
                "fee_rate": "0.05",
                "stages": [
                    { "threshold": "0.5", "apy": "1" },
                    { "threshold": "0.5", "apy": "0.5" }
                ]
            },
            "roles": {
                "owner": Principal::from_label("owner"),
                "tax_wallet": Principal::from_label("tax")
            }
        });

        let config: TokenomicsConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.max_total_supply, 1_000_000_000);
        assert_eq!(config.roles.treasury, None);
        assert_eq!(config.buckets[0].percentage, FixedPoint::from_percent(10));
        config.validate().unwrap();
    }
}
