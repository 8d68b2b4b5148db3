use p2e_types::{Amount, Principal};
use thiserror::Error;

/// Errors raised by the allocation ledger, stage tracker and access gate.
///
/// Every variant except `Config` is recoverable: the rejected operation leaves
/// all state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EconomicsError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown distribution {0:?}")]
    UnknownDistribution(String),

    #[error("minting {requested} would exceed max total supply {cap} (already minted {minted})")]
    SupplyCapExceeded {
        cap: Amount,
        minted: Amount,
        requested: Amount,
    },

    #[error(
        "minting {requested} into {bucket:?} would exceed its cap {cap} (already distributed {distributed})"
    )]
    BucketCapExceeded {
        bucket: String,
        cap: Amount,
        distributed: Amount,
        requested: Amount,
    },

    #[error("stage index {index} is out of bounds for {len} stages")]
    InvalidStage { index: usize, len: usize },

    #[error("principal {0} is not authorized for this operation")]
    Unauthorized(Principal),

    #[error("arithmetic overflow while performing economics calculation: {0}")]
    CalculationOverflow(&'static str),
}

impl EconomicsError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
