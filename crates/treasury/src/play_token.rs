//! Play-to-earn token facade
//!
//! Owns the allocation core (access gate, distribution ledger, stage tracker,
//! fee settings, reward events) and drives the external token and
//! release-schedule collaborators. Every operation runs its checks before the
//! first collaborator call; a rejected call leaves all state untouched.

use crate::account_ledger::TokenLedger;
use crate::errors::TreasuryError;
use crate::events::{RewardEvent, RewardEventLog};
use crate::release_schedule::ReleaseSchedule;
use anyhow::Context;
use p2e_economics::{
    compute_reward, split_reward, AccessGate, Bucket, BucketId, DistributionLedger,
    EconomicsError, LedgerAudit, RewardQuote, RewardSplit, StageTracker, TokenomicsConfig,
};
use p2e_types::{Amount, FixedPoint, Principal};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Result of a reward grant that passed authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GrantOutcome {
    /// Fee minted to the tax wallet, net reward minted to the release
    /// schedule and registered for the player.
    Vested {
        split: RewardSplit,
        release_schedule: Principal,
    },
    /// No release schedule configured: nothing minted, event still recorded.
    Unvested { split: RewardSplit },
}

impl GrantOutcome {
    pub fn is_vested(&self) -> bool {
        matches!(self, Self::Vested { .. })
    }

    pub fn split(&self) -> RewardSplit {
        match self {
            Self::Vested { split, .. } | Self::Unvested { split } => *split,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayToken<T, R> {
    gate: AccessGate,
    ledger: DistributionLedger,
    stages: StageTracker,
    reward_bucket: String,
    fee_rate: FixedPoint,
    tax_wallet: Principal,
    events: RewardEventLog,
    token: T,
    release_schedule: Option<R>,
}

impl<T: TokenLedger, R: ReleaseSchedule> PlayToken<T, R> {
    /// Build a deployment with no release schedule installed.
    pub fn new(config: &TokenomicsConfig, token: T) -> Result<Self, TreasuryError> {
        config.validate()?;

        let owner = config.roles.owner;
        let mut gate = AccessGate::new(owner)?;
        if config.roles.treasury.is_some() {
            gate.set_treasury(&owner, config.roles.treasury)?;
        }

        let token = Self {
            gate,
            ledger: config.build_ledger()?,
            stages: config.build_stages()?,
            reward_bucket: config.reward.bucket.clone(),
            fee_rate: config.reward.fee_rate,
            tax_wallet: config.roles.tax_wallet,
            events: RewardEventLog::new(),
            token,
            release_schedule: None,
        };

        info!(
            target: "treasury",
            owner = %owner,
            reward_bucket = %token.reward_bucket,
            stages = token.stages.len(),
            fee_rate = %token.fee_rate,
            "Play token deployed"
        );

        Ok(token)
    }

    /// Install the initial release schedule. Its address must be non-zero.
    pub fn with_release_schedule(mut self, schedule: R) -> Result<Self, TreasuryError> {
        ensure_schedule_address(&schedule)?;
        self.release_schedule = Some(schedule);
        Ok(self)
    }

    // -------------------------------------------------------------------------
    // Owner surface
    // -------------------------------------------------------------------------

    /// Mint `amount` from bucket `bucket` to `recipient`. Owner only.
    pub fn mint_for_bucket(
        &mut self,
        caller: &Principal,
        bucket: &str,
        recipient: &Principal,
        amount: Amount,
    ) -> Result<BucketId, TreasuryError> {
        self.gate.ensure_owner(caller)?;
        self.ledger.check_mint(bucket, amount)?;

        self.token
            .mint(recipient, amount)
            .with_context(|| format!("minting {amount} from {bucket} to {recipient}"))?;
        let id = match self.ledger.mint(bucket, amount) {
            Ok(id) => id,
            Err(err) => {
                self.reverse_mints(&[(*recipient, amount)]);
                return Err(err.into());
            }
        };

        if bucket == self.reward_bucket {
            self.refresh_stage();
        }
        Ok(id)
    }

    pub fn set_apy(
        &mut self,
        caller: &Principal,
        stage: usize,
        apy: FixedPoint,
    ) -> Result<(), TreasuryError> {
        self.gate.ensure_owner(caller)?;
        self.stages.set_apy(stage, apy)?;
        Ok(())
    }

    pub fn set_fee_rate(&mut self, caller: &Principal, fee_rate: FixedPoint) -> Result<(), TreasuryError> {
        self.gate.ensure_owner(caller)?;
        if fee_rate.exceeds_one() {
            return Err(EconomicsError::Config(format!("fee rate {fee_rate} exceeds 1.0")).into());
        }

        info!(target: "treasury", old = %self.fee_rate, new = %fee_rate, "Fee rate updated");
        self.fee_rate = fee_rate;
        Ok(())
    }

    pub fn set_tax_wallet(&mut self, caller: &Principal, wallet: Principal) -> Result<(), TreasuryError> {
        self.gate.ensure_owner(caller)?;
        if wallet.is_zero() {
            return Err(EconomicsError::Config("tax wallet must be a non-zero principal".into()).into());
        }

        info!(target: "treasury", wallet = %wallet, "Tax wallet updated");
        self.tax_wallet = wallet;
        Ok(())
    }

    /// Install, replace or remove the release schedule. Returns the previous one.
    pub fn set_release_schedule(
        &mut self,
        caller: &Principal,
        schedule: Option<R>,
    ) -> Result<Option<R>, TreasuryError> {
        self.gate.ensure_owner(caller)?;
        if let Some(schedule) = schedule.as_ref() {
            ensure_schedule_address(schedule)?;
        }

        info!(
            target: "treasury",
            address = ?schedule.as_ref().map(|s| s.address().encode()),
            "Release schedule updated"
        );
        Ok(std::mem::replace(&mut self.release_schedule, schedule))
    }

    pub fn set_treasury(
        &mut self,
        caller: &Principal,
        treasury: Option<Principal>,
    ) -> Result<(), TreasuryError> {
        self.gate.set_treasury(caller, treasury)?;
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Principal,
        new_owner: Principal,
    ) -> Result<(), TreasuryError> {
        self.gate.transfer_ownership(caller, new_owner)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Treasury surface
    // -------------------------------------------------------------------------

    /// Quote the reward for `amount_played` at the current stage rate.
    pub fn quote_reward(&self, amount_played: Amount) -> Result<RewardQuote, EconomicsError> {
        let apy = self.stages.current_apy()?;
        let bucket = self.reward_bucket_state()?;
        compute_reward(amount_played, apy, bucket.distributed, bucket.cap)
    }

    /// Grant a precomputed reward, stamped with the current wall-clock time.
    pub fn grant_reward(
        &mut self,
        caller: &Principal,
        player: &Principal,
        total_mint: Amount,
    ) -> Result<GrantOutcome, TreasuryError> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        self.grant_reward_at(caller, player, total_mint, now)
    }

    /// Grant a precomputed reward. Treasury only.
    ///
    /// With a release schedule installed, the fee is minted to the tax wallet
    /// and the net reward to the schedule, which is then told to release it
    /// to `player`. Without one, nothing is minted and the outcome is
    /// [`GrantOutcome::Unvested`]. Both paths record one reward event.
    ///
    /// A grant applies as a unit. If any collaborator call fails, mints
    /// already issued are burned again, the ledger is restored and no event
    /// is recorded.
    pub fn grant_reward_at(
        &mut self,
        caller: &Principal,
        player: &Principal,
        total_mint: Amount,
        timestamp: u64,
    ) -> Result<GrantOutcome, TreasuryError> {
        self.gate.ensure_treasury(caller)?;
        let split = split_reward(total_mint, self.fee_rate)?;

        if self.release_schedule.is_none() {
            warn!(
                target: "treasury",
                player = %player,
                total_mint = %total_mint,
                "No release schedule configured; reward recorded but not minted"
            );
            self.events.record(RewardEvent {
                total_minted: total_mint,
                fee: split.fee,
                net_reward: split.net_reward,
                player: *player,
                timestamp,
                vested: false,
            });
            return Ok(GrantOutcome::Unvested { split });
        }

        self.ledger.check_mint(&self.reward_bucket, total_mint)?;

        let checkpoint = self.ledger.clone();
        let mut minted = Vec::with_capacity(2);
        let release_address = match self.settle_grant(player, split, timestamp, &mut minted) {
            Ok(address) => address,
            Err(err) => {
                self.reverse_mints(&minted);
                self.ledger = checkpoint;
                warn!(
                    target: "treasury",
                    player = %player,
                    total_mint = %total_mint,
                    error = %err,
                    "Reward grant rolled back"
                );
                return Err(err);
            }
        };

        self.refresh_stage();
        self.events.record(RewardEvent {
            total_minted: total_mint,
            fee: split.fee,
            net_reward: split.net_reward,
            player: *player,
            timestamp,
            vested: true,
        });

        Ok(GrantOutcome::Vested {
            split,
            release_schedule: release_address,
        })
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn ledger(&self) -> &DistributionLedger {
        &self.ledger
    }

    pub fn stages(&self) -> &StageTracker {
        &self.stages
    }

    pub fn reward_bucket(&self) -> &str {
        &self.reward_bucket
    }

    pub fn reward_bucket_state(&self) -> Result<&Bucket, EconomicsError> {
        self.ledger
            .bucket(&self.reward_bucket)
            .ok_or_else(|| EconomicsError::UnknownDistribution(self.reward_bucket.clone()))
    }

    pub fn fee_rate(&self) -> FixedPoint {
        self.fee_rate
    }

    pub fn tax_wallet(&self) -> Principal {
        self.tax_wallet
    }

    pub fn events(&self) -> &RewardEventLog {
        &self.events
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    /// Direct access to the token collaborator for operations outside the
    /// allocation core, such as burns.
    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }

    pub fn release_schedule(&self) -> Option<&R> {
        self.release_schedule.as_ref()
    }

    pub fn release_schedule_mut(&mut self) -> Option<&mut R> {
        self.release_schedule.as_mut()
    }

    /// Ledger audit plus a cross-check against the token's circulating supply.
    pub fn audit(&self) -> Result<LedgerAudit, TreasuryError> {
        let mut audit = self.ledger.audit();
        let supply = self.token.total_supply()?;

        // Burns may lower supply below the minted total, never raise it above.
        if supply > self.ledger.total_minted() {
            audit.issues.push(format!(
                "token supply {} exceeds total minted {}",
                supply,
                self.ledger.total_minted()
            ));
            audit.is_healthy = false;
        }
        if self.stages.current_index() > 0 && self.stages.current_index() >= self.stages.len() {
            audit.issues.push(format!(
                "stage index {} out of range for {} stages",
                self.stages.current_index(),
                self.stages.len()
            ));
            audit.is_healthy = false;
        }
        Ok(audit)
    }

    /// Collaborator half of a vested grant. Every successful token mint is
    /// pushed onto `minted` so the caller can reverse it.
    fn settle_grant(
        &mut self,
        player: &Principal,
        split: RewardSplit,
        timestamp: u64,
        minted: &mut Vec<(Principal, Amount)>,
    ) -> Result<Principal, TreasuryError> {
        let release_address = self
            .release_schedule
            .as_ref()
            .map(|schedule| schedule.address())
            .ok_or_else(|| EconomicsError::Config("no release schedule configured".into()))?;

        self.token
            .mint(&self.tax_wallet, split.fee)
            .context("minting reward fee to tax wallet")?;
        minted.push((self.tax_wallet, split.fee));

        self.token
            .mint(&release_address, split.net_reward)
            .context("minting net reward to release schedule")?;
        minted.push((release_address, split.net_reward));

        self.ledger.mint(&self.reward_bucket, split.total())?;

        if let Some(schedule) = self.release_schedule.as_mut() {
            schedule
                .new_release_schedule(player, split.net_reward, timestamp)
                .context("registering release schedule")?;
        }
        Ok(release_address)
    }

    /// Burn back token mints of an aborted operation, newest first.
    fn reverse_mints(&mut self, minted: &[(Principal, Amount)]) {
        for (holder, amount) in minted.iter().rev() {
            if let Err(err) = self.token.burn(holder, *amount) {
                error!(
                    target: "treasury",
                    holder = %holder,
                    amount = %amount,
                    error = %err,
                    "Failed to reverse mint"
                );
            }
        }
    }

    fn refresh_stage(&mut self) -> usize {
        let (cap, distributed) = match self.ledger.bucket(&self.reward_bucket) {
            Some(bucket) => (bucket.cap, bucket.distributed),
            None => return self.stages.current_index(),
        };
        self.stages.advance_for_distributed(cap, distributed)
    }
}

fn ensure_schedule_address<R: ReleaseSchedule>(schedule: &R) -> Result<(), EconomicsError> {
    if schedule.address().is_zero() {
        return Err(EconomicsError::Config(
            "release schedule must have a non-zero address".into(),
        ));
    }
    Ok(())
}
