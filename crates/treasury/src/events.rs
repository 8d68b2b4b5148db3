//! Reward event log
//!
//! Every reward-grant call that passes authorization records exactly one
//! event, whether the reward was vested or the grant ran in degraded mode.

use p2e_types::{amount_string, Amount, Principal};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// Observable record of one reward grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEvent {
    #[serde(with = "amount_string")]
    pub total_minted: Amount,
    #[serde(with = "amount_string")]
    pub fee: Amount,
    #[serde(with = "amount_string")]
    pub net_reward: Amount,
    pub player: Principal,
    /// Unix seconds.
    pub timestamp: u64,
    /// False for degraded-mode grants (no release schedule configured).
    pub vested: bool,
}

/// Summary statistics over the event log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEventStats {
    pub total_events: usize,
    pub vested_events: usize,
    pub unvested_events: usize,
    pub unique_players: usize,
    #[serde(with = "amount_string")]
    pub total_minted: Amount,
    #[serde(with = "amount_string")]
    pub total_fees: Amount,
    #[serde(with = "amount_string")]
    pub total_net_rewards: Amount,
}

/// Append-only log of reward events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEventLog {
    events: Vec<RewardEvent>,
}

impl RewardEventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn record(&mut self, event: RewardEvent) {
        info!(
            target: "treasury",
            player = %event.player,
            total_minted = %event.total_minted,
            fee = %event.fee,
            net_reward = %event.net_reward,
            timestamp = event.timestamp,
            vested = event.vested,
            "Reward event"
        );
        self.events.push(event);
    }

    pub fn events(&self) -> &[RewardEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn for_player<'a>(&'a self, player: &'a Principal) -> impl Iterator<Item = &'a RewardEvent> {
        self.events.iter().filter(move |event| event.player == *player)
    }

    /// Net rewards recorded for `player` across vested grants.
    pub fn player_total(&self, player: &Principal) -> Amount {
        self.for_player(player)
            .filter(|event| event.vested)
            .map(|event| event.net_reward)
            .sum()
    }

    pub fn get_statistics(&self) -> RewardEventStats {
        let mut stats = RewardEventStats {
            total_events: self.events.len(),
            ..Default::default()
        };
        let mut players = HashSet::new();

        for event in &self.events {
            if event.vested {
                stats.vested_events += 1;
                stats.total_minted = stats.total_minted.saturating_add(event.total_minted);
                stats.total_fees = stats.total_fees.saturating_add(event.fee);
                stats.total_net_rewards = stats.total_net_rewards.saturating_add(event.net_reward);
            } else {
                stats.unvested_events += 1;
            }
            players.insert(event.player);
        }
        stats.unique_players = players.len();
        stats
    }
}
