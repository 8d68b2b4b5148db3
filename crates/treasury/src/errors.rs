use p2e_economics::EconomicsError;
use thiserror::Error;

/// Failures surfaced by [`crate::PlayToken`] operations.
#[derive(Debug, Error)]
pub enum TreasuryError {
    /// Rejected by the ledger, stage tracker or access gate; nothing changed.
    #[error(transparent)]
    Economics(#[from] EconomicsError),

    /// The token or release-schedule collaborator refused a call.
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

impl TreasuryError {
    /// The economics rejection behind this error, if any.
    pub fn economics(&self) -> Option<&EconomicsError> {
        match self {
            Self::Economics(err) => Some(err),
            Self::Collaborator(_) => None,
        }
    }
}
