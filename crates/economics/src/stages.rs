//! Staged reward-rate progression
//!
//! A bucket's cap is split into consecutive stages. Each stage owns a slice
//! of the cap (its threshold percentage) and an APY. The current stage is the
//! first one whose cumulative boundary still covers the bucket's distributed
//! amount; the index only ever moves forward.

use crate::errors::EconomicsError;
use p2e_types::{Amount, FixedPoint};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One reward stage: the share of the bucket cap it covers and its rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub threshold: FixedPoint,
    pub apy: FixedPoint,
}

impl Stage {
    pub fn new(threshold: FixedPoint, apy: FixedPoint) -> Self {
        Self { threshold, apy }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTracker {
    stages: Vec<Stage>,
    current: usize,
}

impl StageTracker {
    /// Build a tracker. Every threshold must be positive and the thresholds
    /// together may not cover more than the whole bucket, so cumulative
    /// boundaries are strictly ascending.
    ///
    /// An empty stage list is accepted; the tracker then reports
    /// `InvalidStage` for every rate query.
    pub fn new(stages: Vec<Stage>) -> Result<Self, EconomicsError> {
        let mut cumulative = FixedPoint::ZERO;
        for (index, stage) in stages.iter().enumerate() {
            if stage.threshold.is_zero() {
                return Err(EconomicsError::config(format!(
                    "stage {index} has a zero threshold"
                )));
            }
            cumulative = cumulative
                .checked_add(stage.threshold)
                .filter(|total| !total.exceeds_one())
                .ok_or_else(|| {
                    EconomicsError::config(format!(
                        "stage thresholds exceed the bucket at stage {index}"
                    ))
                })?;
        }

        Ok(Self { stages, current: 0 })
    }

    /// A tracker with no stages.
    pub fn disabled() -> Self {
        Self {
            stages: Vec::new(),
            current: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_stage(&self) -> Result<&Stage, EconomicsError> {
        self.stages.get(self.current).ok_or(EconomicsError::InvalidStage {
            index: self.current,
            len: self.stages.len(),
        })
    }

    pub fn current_apy(&self) -> Result<FixedPoint, EconomicsError> {
        self.current_stage().map(|stage| stage.apy)
    }

    /// Cumulative stage boundaries in token units for a bucket of `bucket_cap`.
    ///
    /// Boundaries never exceed `bucket_cap`.
    pub fn boundaries(&self, bucket_cap: Amount) -> Vec<Amount> {
        let mut acc: Amount = 0;
        self.stages
            .iter()
            .map(|stage| {
                let share = stage.threshold.saturating_apply(bucket_cap);
                acc = acc.saturating_add(share).min(bucket_cap);
                acc
            })
            .collect()
    }

    /// Recompute the current stage from the bucket's distributed amount.
    ///
    /// Picks the smallest index whose cumulative boundary is at least
    /// `bucket_distributed`. If no boundary covers it the index stays where
    /// it is; it never moves backwards.
    pub fn advance_for_distributed(&mut self, bucket_cap: Amount, bucket_distributed: Amount) -> usize {
        let target = self
            .boundaries(bucket_cap)
            .iter()
            .position(|boundary| bucket_distributed <= *boundary);

        if let Some(index) = target {
            if index > self.current {
                info!(
                    target: "economics",
                    from = self.current,
                    to = index,
                    distributed = %bucket_distributed,
                    apy = %self.stages[index].apy,
                    "Reward stage advanced"
                );
                self.current = index;
            }
        }

        self.current
    }

    /// Replace the APY of one stage. The current index is unaffected.
    pub fn set_apy(&mut self, index: usize, apy: FixedPoint) -> Result<(), EconomicsError> {
        let len = self.stages.len();
        let stage = self
            .stages
            .get_mut(index)
            .ok_or(EconomicsError::InvalidStage { index, len })?;

        info!(
            target: "economics",
            stage = index,
            old_apy = %stage.apy,
            new_apy = %apy,
            "Stage APY updated"
        );
        stage.apy = apy;
        Ok(())
    }
}
