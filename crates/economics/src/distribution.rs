//! Capped multi-bucket minting ledger
//!
//! A fixed max supply is partitioned across named buckets, each capped at a
//! percentage of the max supply. Every mint is checked against the global cap
//! and the bucket cap before anything is mutated.

use crate::errors::EconomicsError;
use crate::types::{Bucket, BucketAllocation, BucketId, LedgerAudit};
use p2e_types::{amount_string, Amount, FixedPoint};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionLedger {
    #[serde(with = "amount_string")]
    max_total_supply: Amount,
    #[serde(with = "amount_string")]
    total_minted: Amount,
    buckets: Vec<Bucket>,
}

impl DistributionLedger {
    /// Build a ledger from `(name, percentage)` allocations.
    ///
    /// Percentages must each be at most 1.0 and sum to exactly 1.0. Names
    /// must be non-empty and unique.
    pub fn new(
        max_total_supply: Amount,
        allocations: &[BucketAllocation],
    ) -> Result<Self, EconomicsError> {
        if max_total_supply == 0 {
            return Err(EconomicsError::config("max total supply must be positive"));
        }

        let mut seen = HashSet::new();
        let mut sum = FixedPoint::ZERO;
        let mut buckets = Vec::with_capacity(allocations.len());

        for allocation in allocations {
            if allocation.name.trim().is_empty() {
                return Err(EconomicsError::config("bucket names must not be empty"));
            }
            if !seen.insert(allocation.name.as_str()) {
                return Err(EconomicsError::config(format!(
                    "duplicate bucket {:?}",
                    allocation.name
                )));
            }
            if allocation.percentage.exceeds_one() {
                return Err(EconomicsError::config(format!(
                    "bucket {:?} percentage {} exceeds 1.0",
                    allocation.name, allocation.percentage
                )));
            }

            sum = sum
                .checked_add(allocation.percentage)
                .ok_or_else(|| EconomicsError::config("bucket percentages overflow"))?;

            let cap = allocation
                .percentage
                .apply(max_total_supply)
                .ok_or(EconomicsError::CalculationOverflow("bucket cap"))?;

            buckets.push(Bucket {
                name: allocation.name.clone(),
                percentage: allocation.percentage,
                cap,
                distributed: 0,
            });
        }

        if sum != FixedPoint::ONE {
            return Err(EconomicsError::config(format!(
                "bucket percentages sum to {sum}, expected exactly 1"
            )));
        }

        info!(
            target: "economics",
            max_total_supply = %max_total_supply,
            buckets = buckets.len(),
            "Distribution ledger initialised"
        );

        Ok(Self {
            max_total_supply,
            total_minted: 0,
            buckets,
        })
    }

    /// Build a ledger from parallel name and percentage sequences.
    pub fn from_parallel(
        max_total_supply: Amount,
        names: &[String],
        percentages: &[FixedPoint],
    ) -> Result<Self, EconomicsError> {
        if names.len() != percentages.len() {
            return Err(EconomicsError::config(format!(
                "{} bucket names but {} percentages",
                names.len(),
                percentages.len()
            )));
        }

        let allocations: Vec<BucketAllocation> = names
            .iter()
            .zip(percentages)
            .map(|(name, percentage)| BucketAllocation::new(name.clone(), *percentage))
            .collect();

        Self::new(max_total_supply, &allocations)
    }

    /// Resolve a bucket name. Zero-percentage buckets are treated as unknown.
    pub fn resolve(&self, name: &str) -> Result<BucketId, EconomicsError> {
        self.buckets
            .iter()
            .position(|bucket| bucket.name == name && bucket.is_mintable())
            .map(BucketId)
            .ok_or_else(|| EconomicsError::UnknownDistribution(name.to_string()))
    }

    /// Run every mint precondition without mutating anything.
    pub fn check_mint(&self, name: &str, amount: Amount) -> Result<BucketId, EconomicsError> {
        let id = self.resolve(name)?;
        let bucket = &self.buckets[id.0];

        let minted_after = self.total_minted.checked_add(amount);
        if minted_after.map_or(true, |total| total > self.max_total_supply) {
            return Err(EconomicsError::SupplyCapExceeded {
                cap: self.max_total_supply,
                minted: self.total_minted,
                requested: amount,
            });
        }

        let distributed_after = bucket.distributed.checked_add(amount);
        if distributed_after.map_or(true, |total| total > bucket.cap) {
            return Err(EconomicsError::BucketCapExceeded {
                bucket: bucket.name.clone(),
                cap: bucket.cap,
                distributed: bucket.distributed,
                requested: amount,
            });
        }

        debug!(
            target: "economics",
            bucket = %bucket.name,
            amount = %amount,
            "Mint precondition satisfied"
        );

        Ok(id)
    }

    /// Record a mint of `amount` from bucket `name`.
    ///
    /// All checks run before the counters move; on error nothing changes.
    pub fn mint(&mut self, name: &str, amount: Amount) -> Result<BucketId, EconomicsError> {
        let id = self.check_mint(name, amount)?;
        let bucket = &mut self.buckets[id.0];

        bucket.distributed += amount;
        self.total_minted += amount;

        info!(
            target: "economics",
            bucket = %bucket.name,
            amount = %amount,
            distributed = %bucket.distributed,
            cap = %bucket.cap,
            total_minted = %self.total_minted,
            "Minted from distribution bucket"
        );

        Ok(id)
    }

    pub fn max_total_supply(&self) -> Amount {
        self.max_total_supply
    }

    pub fn total_minted(&self) -> Amount {
        self.total_minted
    }

    pub fn remaining_supply(&self) -> Amount {
        self.max_total_supply.saturating_sub(self.total_minted)
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn get(&self, id: BucketId) -> Option<&Bucket> {
        self.buckets.get(id.0)
    }

    /// Look a bucket up by name, including zero-percentage buckets.
    pub fn bucket(&self, name: &str) -> Option<&Bucket> {
        self.buckets.iter().find(|bucket| bucket.name == name)
    }

    /// Re-verify every ledger invariant.
    pub fn audit(&self) -> LedgerAudit {
        let mut issues = Vec::new();

        let mut sum_distributed: Amount = 0;
        let mut percentage_sum = FixedPoint::ZERO;
        for bucket in &self.buckets {
            if bucket.distributed > bucket.cap {
                issues.push(format!(
                    "bucket {:?} distributed {} exceeds cap {}",
                    bucket.name, bucket.distributed, bucket.cap
                ));
            }
            if bucket.percentage.apply(self.max_total_supply) != Some(bucket.cap) {
                issues.push(format!(
                    "bucket {:?} cap {} does not match its percentage {}",
                    bucket.name, bucket.cap, bucket.percentage
                ));
            }
            sum_distributed = sum_distributed.saturating_add(bucket.distributed);
            percentage_sum = percentage_sum
                .checked_add(bucket.percentage)
                .unwrap_or(FixedPoint::from_raw(u128::MAX));
        }

        if percentage_sum != FixedPoint::ONE {
            issues.push(format!(
                "bucket percentages sum to {percentage_sum}, expected 1"
            ));
        }
        if self.total_minted > self.max_total_supply {
            issues.push(format!(
                "total minted {} exceeds max total supply {}",
                self.total_minted, self.max_total_supply
            ));
        }
        if sum_distributed != self.total_minted {
            issues.push(format!(
                "total minted {} does not match sum of bucket distributions {}",
                self.total_minted, sum_distributed
            ));
        }

        LedgerAudit {
            is_healthy: issues.is_empty(),
            issues,
            total_minted: self.total_minted,
            sum_distributed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p2e_types::SCALE;

    fn team_and_rest() -> DistributionLedger {
        DistributionLedger::new(
            1_000_000_000,
            &[
                BucketAllocation::new("team", FixedPoint::from_percent(10)),
                BucketAllocation::new("rest", FixedPoint::from_percent(90)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_bucket_caps_are_truncated_percentages() {
        let ledger = DistributionLedger::new(
            10,
            &[
                BucketAllocation::new("a", FixedPoint::from_raw(SCALE / 3)),
                BucketAllocation::new("b", FixedPoint::from_raw(SCALE - SCALE / 3)),
            ],
        )
        .unwrap();

        assert_eq!(ledger.bucket("a").unwrap().cap, 3);
        assert_eq!(ledger.bucket("b").unwrap().cap, 6);
    }

    #[test]
    fn test_team_cap_boundary() {
        let mut ledger = team_and_rest();

        let err = ledger.mint("team", 100_000_001).unwrap_err();
        assert!(matches!(err, EconomicsError::BucketCapExceeded { .. }));
        assert_eq!(ledger.total_minted(), 0);

        ledger.mint("team", 100_000_000).unwrap();
        assert_eq!(ledger.bucket("team").unwrap().distributed, 100_000_000);
        assert_eq!(ledger.total_minted(), 100_000_000);

        let err = ledger.mint("team", 1).unwrap_err();
        assert!(matches!(err, EconomicsError::BucketCapExceeded { .. }));
    }

    #[test]
    fn test_supply_cap_checked_before_bucket_cap() {
        let mut ledger = team_and_rest();
        ledger.mint("team", 100_000_000).unwrap();
        ledger.mint("rest", 900_000_000).unwrap();
        assert_eq!(ledger.remaining_supply(), 0);

        for name in ["team", "rest"] {
            let err = ledger.mint(name, 1).unwrap_err();
            assert!(matches!(err, EconomicsError::SupplyCapExceeded { .. }));
        }
    }

    #[test]
    fn test_unknown_and_zero_percentage_buckets() {
        let mut ledger = DistributionLedger::new(
            1_000,
            &[
                BucketAllocation::new("all", FixedPoint::ONE),
                BucketAllocation::new("empty", FixedPoint::ZERO),
            ],
        )
        .unwrap();

        assert_eq!(
            ledger.mint("missing", 1),
            Err(EconomicsError::UnknownDistribution("missing".into()))
        );
        assert_eq!(
            ledger.mint("empty", 0),
            Err(EconomicsError::UnknownDistribution("empty".into()))
        );
        assert!(ledger.bucket("empty").is_some());
    }

    #[test]
    fn test_construction_rejects_bad_percentages() {
        let under = DistributionLedger::new(
            1_000,
            &[BucketAllocation::new("a", FixedPoint::from_percent(99))],
        );
        assert!(matches!(under, Err(EconomicsError::Config(_))));

        let over = DistributionLedger::new(
            1_000,
            &[
                BucketAllocation::new("a", FixedPoint::from_percent(60)),
                BucketAllocation::new("b", FixedPoint::from_percent(41)),
            ],
        );
        assert!(matches!(over, Err(EconomicsError::Config(_))));

        let above_one = DistributionLedger::new(
            1_000,
            &[BucketAllocation::new("a", FixedPoint::from_percent(101))],
        );
        assert!(matches!(above_one, Err(EconomicsError::Config(_))));

        let empty = DistributionLedger::new(1_000, &[]);
        assert!(matches!(empty, Err(EconomicsError::Config(_))));
    }

    #[test]
    fn test_construction_rejects_bad_names_and_supply() {
        let duplicate = DistributionLedger::new(
            1_000,
            &[
                BucketAllocation::new("a", FixedPoint::from_percent(50)),
                BucketAllocation::new("a", FixedPoint::from_percent(50)),
            ],
        );
        assert!(matches!(duplicate, Err(EconomicsError::Config(_))));

        let blank = DistributionLedger::new(1_000, &[BucketAllocation::new(" ", FixedPoint::ONE)]);
        assert!(matches!(blank, Err(EconomicsError::Config(_))));

        let zero_supply = DistributionLedger::new(0, &[BucketAllocation::new("a", FixedPoint::ONE)]);
        assert!(matches!(zero_supply, Err(EconomicsError::Config(_))));
    }

    #[test]
    fn test_from_parallel_length_mismatch() {
        let names = vec!["a".to_string(), "b".to_string()];
        let percentages = vec![FixedPoint::ONE];
        let result = DistributionLedger::from_parallel(1_000, &names, &percentages);
        assert!(matches!(result, Err(EconomicsError::Config(_))));

        let percentages = vec![FixedPoint::from_percent(30), FixedPoint::from_percent(70)];
        let ledger = DistributionLedger::from_parallel(1_000, &names, &percentages).unwrap();
        assert_eq!(ledger.bucket("b").unwrap().cap, 700);
    }

    #[test]
    fn test_check_mint_does_not_mutate() {
        let ledger = team_and_rest();
        let id = ledger.check_mint("team", 5).unwrap();
        assert_eq!(ledger.get(id).unwrap().name, "team");
        assert_eq!(ledger.total_minted(), 0);
    }

    #[test]
    fn test_audit_detects_tampered_state() {
        let mut ledger = team_and_rest();
        ledger.mint("team", 10).unwrap();
        assert!(ledger.audit().is_healthy);

        ledger.total_minted = 11;
        let audit = ledger.audit();
        assert!(!audit.is_healthy);
        assert_eq!(audit.sum_distributed, 10);
        assert_eq!(audit.issues.len(), 1);
    }
}
