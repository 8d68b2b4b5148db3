//! Release-schedule collaborator
//!
//! Net rewards are minted to the release-schedule account and handed back to
//! players over a fixed window. [`LinearReleaseSchedule`] vests each grant
//! linearly over [`RELEASE_DURATION_SECS`].

use anyhow::{anyhow, Result};
use p2e_types::{amount_string, mul_div, Amount, Principal};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Sixty days, in seconds.
pub const RELEASE_DURATION_SECS: u64 = 60 * 86_400;

/// Interface for the external release-schedule collaborator.
pub trait ReleaseSchedule: Send + Sync {
    /// Account that receives the net rewards held for release.
    fn address(&self) -> Principal;

    /// Register a deferred release of `total_reward` for `player`.
    fn new_release_schedule(
        &mut self,
        player: &Principal,
        total_reward: Amount,
        start: u64,
    ) -> Result<()>;
}

/// One registered grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEntry {
    #[serde(with = "amount_string")]
    pub total: Amount,
    #[serde(with = "amount_string")]
    pub released: Amount,
    pub start: u64,
}

impl ReleaseEntry {
    /// Amount vested at `now` (linear, truncating).
    pub fn vested_at(&self, now: u64) -> Amount {
        let elapsed = now.saturating_sub(self.start).min(RELEASE_DURATION_SECS);
        mul_div(self.total, elapsed as u128, RELEASE_DURATION_SECS as u128).unwrap_or(self.total)
    }

    pub fn releasable_at(&self, now: u64) -> Amount {
        self.vested_at(now).saturating_sub(self.released)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearReleaseSchedule {
    address: Principal,
    schedules: HashMap<Principal, Vec<ReleaseEntry>>,
}

impl LinearReleaseSchedule {
    pub fn new(address: Principal) -> Self {
        Self {
            address,
            schedules: HashMap::new(),
        }
    }

    pub fn entries(&self, player: &Principal) -> &[ReleaseEntry] {
        self.schedules.get(player).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total still held for `player`, vested or not.
    pub fn outstanding(&self, player: &Principal) -> Amount {
        self.entries(player)
            .iter()
            .map(|entry| entry.total - entry.released)
            .sum()
    }

    pub fn releasable(&self, player: &Principal, now: u64) -> Amount {
        self.entries(player)
            .iter()
            .map(|entry| entry.releasable_at(now))
            .sum()
    }

    /// Mark everything vested for `player` at `now` as released and return it.
    pub fn release(&mut self, player: &Principal, now: u64) -> Amount {
        let Some(entries) = self.schedules.get_mut(player) else {
            return 0;
        };

        let mut released = 0;
        for entry in entries.iter_mut() {
            let amount = entry.releasable_at(now);
            entry.released += amount;
            released += amount;
        }

        if released > 0 {
            info!(
                target: "treasury",
                player = %player,
                amount = %released,
                "Released vested rewards"
            );
        }
        released
    }
}

impl ReleaseSchedule for LinearReleaseSchedule {
    fn address(&self) -> Principal {
        self.address
    }

    fn new_release_schedule(
        &mut self,
        player: &Principal,
        total_reward: Amount,
        start: u64,
    ) -> Result<()> {
        if player.is_zero() {
            return Err(anyhow!("Cannot schedule a release for the zero principal"));
        }

        self.schedules.entry(*player).or_default().push(ReleaseEntry {
            total: total_reward,
            released: 0,
            start,
        });

        debug!(
            target: "treasury",
            player = %player,
            amount = %total_reward,
            start,
            "Registered release schedule"
        );
        Ok(())
    }
}

/// Records every call; can be told to fail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockReleaseSchedule {
    address: Principal,
    calls: Vec<(Principal, Amount, u64)>,
    fail: bool,
}

impl MockReleaseSchedule {
    pub fn new(address: Principal) -> Self {
        Self {
            address,
            calls: Vec::new(),
            fail: false,
        }
    }

    pub fn get_calls(&self) -> &[(Principal, Amount, u64)] {
        &self.calls
    }

    pub fn set_fail(&mut self, fail: bool) {
        self.fail = fail;
    }
}

impl ReleaseSchedule for MockReleaseSchedule {
    fn address(&self) -> Principal {
        self.address
    }

    fn new_release_schedule(
        &mut self,
        player: &Principal,
        total_reward: Amount,
        start: u64,
    ) -> Result<()> {
        if self.fail {
            return Err(anyhow!("Mock release schedule failure"));
        }
        self.calls.push((*player, total_reward, start));
        Ok(())
    }
}
