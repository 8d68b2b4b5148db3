//! CLI configuration
//!
//! Sources are layered in order: built-in defaults, an optional TOML file
//! given with `--config`, then `P2E_` environment variables. Nested keys use
//! a double underscore, e.g. `P2E_TOKENOMICS__REWARD__FEE_RATE=0.1`.

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use p2e_economics::TokenomicsConfig;
use p2e_types::Principal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_STATE_PATH: &str = "p2e-state.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    /// `pretty` or `json`.
    pub log_format: String,
    /// Where the deployment is persisted between invocations.
    pub state_path: PathBuf,
    /// Release-schedule account installed at `init`. Unset means grants run
    /// in degraded mode until one is configured.
    pub release_schedule: Option<Principal>,
    pub tokenomics: TokenomicsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            release_schedule: Some(Principal::from_label("release-schedule")),
            tokenomics: TokenomicsConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = AppConfig::default();
        let mut builder = Config::builder()
            .add_source(Config::try_from(&defaults).context("failed to encode default configuration")?);

        if let Some(path) = path {
            if !path.exists() {
                bail!(
                    "Configuration file {} not found (specified via --config)",
                    path.display()
                );
            }
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("P2E")
                .prefix_separator("_")
                .separator("__"),
        );

        let config: AppConfig = builder
            .build()?
            .try_deserialize()
            .context("failed to parse configuration")?;

        config
            .tokenomics
            .validate()
            .context("invalid tokenomics configuration")?;
        if config.release_schedule.is_some_and(|address| address.is_zero()) {
            bail!("release_schedule must be a non-zero principal");
        }
        if !matches!(config.log_format.as_str(), "pretty" | "json") {
            bail!("unsupported log_format {:?} (expected pretty or json)", config.log_format);
        }

        Ok(config)
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `log_level`.
pub fn init_logging(config: &AppConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}
