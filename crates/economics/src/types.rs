//! Core types for the distribution ledger

use p2e_types::{amount_string, Amount, FixedPoint};
use serde::{Deserialize, Serialize};

/// Reference catalog bucket names.
pub const PLAY_TO_EARN: &str = "play_to_earn";
pub const ECOSYSTEM: &str = "ecosystem";
pub const STAKING: &str = "staking";
pub const TEAM: &str = "team";
pub const INVESTORS: &str = "investors";

/// Index of a bucket inside a ledger, resolved once from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketId(pub usize);

/// Name and percentage-of-max-supply of one allocation bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketAllocation {
    pub name: String,
    pub percentage: FixedPoint,
}

impl BucketAllocation {
    pub fn new(name: impl Into<String>, percentage: FixedPoint) -> Self {
        Self {
            name: name.into(),
            percentage,
        }
    }
}

/// A named distribution with its cap and cumulative minted amount.
///
/// `distributed` is a high-water mark of everything ever minted from the
/// bucket; burns elsewhere never lower it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub percentage: FixedPoint,
    #[serde(with = "amount_string")]
    pub cap: Amount,
    #[serde(with = "amount_string")]
    pub distributed: Amount,
}

impl Bucket {
    pub fn remaining(&self) -> Amount {
        self.cap.saturating_sub(self.distributed)
    }

    /// Zero-percentage buckets cannot be minted into.
    pub fn is_mintable(&self) -> bool {
        !self.percentage.is_zero()
    }
}

/// Result of re-verifying ledger invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAudit {
    pub is_healthy: bool,
    pub issues: Vec<String>,
    #[serde(with = "amount_string")]
    pub total_minted: Amount,
    #[serde(with = "amount_string")]
    pub sum_distributed: Amount,
}
