//! JSON persistence of a deployment between CLI invocations.

use anyhow::{bail, Context, Result};
use p2e_treasury::{InMemoryTokenLedger, LinearReleaseSchedule, PlayToken};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// The CLI deployment: in-memory token balances plus the linear 60-day
/// release schedule.
pub type Deployment = PlayToken<InMemoryTokenLedger, LinearReleaseSchedule>;

pub fn load(path: &Path) -> Result<Deployment> {
    if !path.exists() {
        bail!(
            "no deployment found at {} (run `p2e-cli init` first)",
            path.display()
        );
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read state file {}", path.display()))?;
    let deployment: Deployment = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse state file {}", path.display()))?;

    let audit = deployment.audit()?;
    if !audit.is_healthy {
        warn!(issues = ?audit.issues, path = %path.display(), "Deployment state failed audit");
    }

    debug!(path = %path.display(), "Loaded deployment");
    Ok(deployment)
}

pub fn save(path: &Path, deployment: &Deployment) -> Result<()> {
    let encoded = serde_json::to_string_pretty(deployment)?;

    // Write beside the target, then rename over it.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, encoded)
        .with_context(|| format!("failed to write state file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace state file {}", path.display()))?;

    debug!(path = %path.display(), "Saved deployment");
    Ok(())
}
