//! P2E Token Command Line Interface
//!
//! Deploys a capped play-to-earn token from configuration, persists it as
//! JSON and exposes every administrative and treasury operation.

mod settings;
mod state;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use p2e_treasury::{
    InMemoryTokenLedger, LinearReleaseSchedule, PlayToken, ReleaseSchedule, TokenLedger,
};
use p2e_types::{Amount, FixedPoint, Principal, PrincipalError, PRINCIPAL_STRING_LENGTH};
use serde_json::json;
use settings::AppConfig;
use state::Deployment;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "p2e-cli")]
#[command(about = "P2E Token Command Line Interface", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Deployment state file (overrides `state_path` from configuration)
    #[arg(long, global = true, value_name = "PATH")]
    state: Option<PathBuf>,

    /// Log level (overrides `log_level` from configuration)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new deployment from configuration
    Init {
        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },
    /// Print ledger, stage and role summary
    Show,
    /// Quote the reward for an amount played at the current stage rate
    Quote {
        amount_played: Amount,
    },
    /// Mint from a distribution bucket (owner)
    Mint {
        #[arg(long, value_parser = parse_principal)]
        caller: Principal,
        bucket: String,
        #[arg(value_parser = parse_principal)]
        recipient: Principal,
        amount: Amount,
    },
    /// Grant a precomputed reward to a player (treasury)
    Grant {
        #[arg(long, value_parser = parse_principal)]
        caller: Principal,
        #[arg(value_parser = parse_principal)]
        player: Principal,
        total_mint: Amount,
        /// Release start in Unix seconds (defaults to now)
        #[arg(long)]
        timestamp: Option<u64>,
    },
    /// Replace one stage's APY (owner)
    SetApy {
        #[arg(long, value_parser = parse_principal)]
        caller: Principal,
        stage: usize,
        apy: FixedPoint,
    },
    /// Set the reward fee rate, e.g. 0.05 (owner)
    SetFeeRate {
        #[arg(long, value_parser = parse_principal)]
        caller: Principal,
        fee_rate: FixedPoint,
    },
    /// Set the wallet receiving reward fees (owner)
    SetTaxWallet {
        #[arg(long, value_parser = parse_principal)]
        caller: Principal,
        #[arg(value_parser = parse_principal)]
        wallet: Principal,
    },
    /// Designate the treasury caller; omit to clear (owner)
    SetTreasury {
        #[arg(long, value_parser = parse_principal)]
        caller: Principal,
        #[arg(value_parser = parse_principal)]
        treasury: Option<Principal>,
    },
    /// Install a fresh release schedule at an address; omit to remove (owner)
    SetReleaseSchedule {
        #[arg(long, value_parser = parse_principal)]
        caller: Principal,
        #[arg(value_parser = parse_principal)]
        address: Option<Principal>,
    },
    /// Hand ownership to another principal (owner)
    TransferOwnership {
        #[arg(long, value_parser = parse_principal)]
        caller: Principal,
        #[arg(value_parser = parse_principal)]
        new_owner: Principal,
    },
    /// Burn tokens held by an account
    Burn {
        #[arg(value_parser = parse_principal)]
        holder: Principal,
        amount: Amount,
    },
    /// Show an account balance
    Balance {
        #[arg(value_parser = parse_principal)]
        who: Principal,
    },
    /// List reward events and statistics
    Events {
        /// Only events for this player
        #[arg(long, value_parser = parse_principal)]
        player: Option<Principal>,
    },
    /// Pay out everything vested for a player
    Release {
        #[arg(value_parser = parse_principal)]
        player: Principal,
        /// Evaluation time in Unix seconds (defaults to now)
        #[arg(long)]
        now: Option<u64>,
    },
}

/// Accept an encoded principal (`p` + 64 hex) or derive one from a label.
fn parse_principal(value: &str) -> Result<Principal, PrincipalError> {
    if value.len() == PRINCIPAL_STRING_LENGTH && value.starts_with('p') {
        return Principal::decode(value);
    }
    Ok(Principal::from_label(value))
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut app_config = AppConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        app_config.log_level = level;
    }
    if let Some(path) = cli.state {
        app_config.state_path = path;
    }
    settings::init_logging(&app_config)?;

    run(cli.command, &app_config)
}

fn run(command: Commands, app_config: &AppConfig) -> Result<()> {
    let path = app_config.state_path.as_path();

    if let Commands::Init { force } = command {
        if path.exists() && !force {
            bail!(
                "state file {} already exists (pass --force to overwrite)",
                path.display()
            );
        }

        let mut deployment: Deployment =
            PlayToken::new(&app_config.tokenomics, InMemoryTokenLedger::new())
                .context("failed to deploy token")?;
        if let Some(address) = app_config.release_schedule {
            deployment = deployment
                .with_release_schedule(LinearReleaseSchedule::new(address))
                .context("failed to install release schedule")?;
        }
        state::save(path, &deployment)?;

        info!(path = %path.display(), "Deployment initialised");
        return print_summary(&deployment);
    }

    let mut deployment = state::load(path)?;
    let mutated = handle_command(command, &mut deployment)?;
    if mutated {
        state::save(path, &deployment)?;
    }
    Ok(())
}

/// Run one command against a loaded deployment. Returns whether state changed.
fn handle_command(command: Commands, deployment: &mut Deployment) -> Result<bool> {
    match command {
        Commands::Init { .. } => bail!("init cannot run against an existing deployment"),
        Commands::Show => {
            print_summary(deployment)?;
            Ok(false)
        }
        Commands::Quote { amount_played } => {
            let quote = deployment.quote_reward(amount_played)?;
            print_json(&json!({
                "amount_played": amount_played.to_string(),
                "stage": deployment.stages().current_index(),
                "apy": quote.apy,
                "total_mint": quote.total_mint.to_string(),
                "can_mint": quote.can_mint,
            }))?;
            Ok(false)
        }
        Commands::Mint {
            caller,
            bucket,
            recipient,
            amount,
        } => {
            deployment.mint_for_bucket(&caller, &bucket, &recipient, amount)?;
            println!("Minted {amount} from {bucket} to {recipient}");
            Ok(true)
        }
        Commands::Grant {
            caller,
            player,
            total_mint,
            timestamp,
        } => {
            let outcome = deployment.grant_reward_at(
                &caller,
                &player,
                total_mint,
                timestamp.unwrap_or_else(now_secs),
            )?;
            print_json(&outcome)?;
            Ok(true)
        }
        Commands::SetApy { caller, stage, apy } => {
            deployment.set_apy(&caller, stage, apy)?;
            println!("Stage {stage} APY set to {apy}");
            Ok(true)
        }
        Commands::SetFeeRate { caller, fee_rate } => {
            deployment.set_fee_rate(&caller, fee_rate)?;
            println!("Fee rate set to {fee_rate}");
            Ok(true)
        }
        Commands::SetTaxWallet { caller, wallet } => {
            deployment.set_tax_wallet(&caller, wallet)?;
            println!("Tax wallet set to {wallet}");
            Ok(true)
        }
        Commands::SetTreasury { caller, treasury } => {
            deployment.set_treasury(&caller, treasury)?;
            match deployment.gate().treasury() {
                Some(treasury) => println!("Treasury caller set to {treasury}"),
                None => println!("Treasury caller cleared"),
            }
            Ok(true)
        }
        Commands::SetReleaseSchedule { caller, address } => {
            let previous =
                deployment.set_release_schedule(&caller, address.map(LinearReleaseSchedule::new))?;
            if let Some(previous) = previous {
                println!("Replaced release schedule at {}", previous.address());
            }
            match address {
                Some(address) => println!("Release schedule installed at {address}"),
                None => println!("Release schedule removed; grants now run unvested"),
            }
            Ok(true)
        }
        Commands::TransferOwnership { caller, new_owner } => {
            deployment.transfer_ownership(&caller, new_owner)?;
            println!("Ownership transferred to {new_owner}");
            Ok(true)
        }
        Commands::Burn { holder, amount } => {
            deployment.token_mut().burn(&holder, amount)?;
            println!("Burned {amount} from {holder}");
            Ok(true)
        }
        Commands::Balance { who } => {
            let balance = deployment.token().balance_of(&who)?;
            print_json(&json!({ "principal": who, "balance": balance.to_string() }))?;
            Ok(false)
        }
        Commands::Events { player } => {
            let events = deployment.events();
            match player {
                Some(player) => print_json(&json!({
                    "events": events.for_player(&player).collect::<Vec<_>>(),
                    "vested_total": events.player_total(&player).to_string(),
                }))?,
                None => print_json(&json!({
                    "events": events.events(),
                    "statistics": events.get_statistics(),
                }))?,
            }
            Ok(false)
        }
        Commands::Release { player, now } => {
            let now = now.unwrap_or_else(now_secs);
            let Some(schedule) = deployment.release_schedule() else {
                bail!("no release schedule configured");
            };
            let address = schedule.address();
            let amount = schedule.releasable(&player, now);
            if amount == 0 {
                println!("Nothing releasable for {player}");
                return Ok(false);
            }

            deployment
                .token_mut()
                .transfer(&address, &player, amount)
                .context("failed to pay out released rewards")?;
            if let Some(schedule) = deployment.release_schedule_mut() {
                schedule.release(&player, now);
            }
            println!("Released {amount} to {player}");
            Ok(true)
        }
    }
}

fn print_summary(deployment: &Deployment) -> Result<()> {
    let ledger = deployment.ledger();
    let stages = deployment.stages();
    let cap = deployment.reward_bucket_state()?.cap;

    let buckets: Vec<_> = ledger
        .buckets()
        .iter()
        .map(|bucket| {
            json!({
                "name": bucket.name,
                "percentage": bucket.percentage,
                "cap": bucket.cap.to_string(),
                "distributed": bucket.distributed.to_string(),
                "remaining": bucket.remaining().to_string(),
            })
        })
        .collect();

    let stage_rows: Vec<_> = stages
        .stages()
        .iter()
        .zip(stages.boundaries(cap))
        .map(|(stage, boundary)| {
            json!({
                "threshold": stage.threshold,
                "apy": stage.apy,
                "boundary": boundary.to_string(),
            })
        })
        .collect();

    print_json(&json!({
        "owner": deployment.gate().owner(),
        "treasury": deployment.gate().treasury(),
        "tax_wallet": deployment.tax_wallet(),
        "fee_rate": deployment.fee_rate(),
        "release_schedule": deployment.release_schedule().map(|schedule| schedule.address()),
        "max_total_supply": ledger.max_total_supply().to_string(),
        "total_minted": ledger.total_minted().to_string(),
        "remaining_supply": ledger.remaining_supply().to_string(),
        "token_supply": deployment.token().total_supply()?.to_string(),
        "buckets": buckets,
        "reward_bucket": deployment.reward_bucket(),
        "current_stage": stages.current_index(),
        "stages": stage_rows,
        "audit": deployment.audit()?,
    }))
}
