//! P2E Treasury Module
//!
//! Wires the distribution ledger, stage tracker and access gate to the
//! external token and release-schedule collaborators, and grants staged
//! play-to-earn rewards on behalf of the treasury.

pub mod account_ledger;
pub mod errors;
pub mod events;
pub mod play_token;
pub mod release_schedule;

pub use account_ledger::{InMemoryTokenLedger, MockTokenLedger, TokenLedger};
pub use errors::TreasuryError;
pub use events::{RewardEvent, RewardEventLog, RewardEventStats};
pub use play_token::{GrantOutcome, PlayToken};
pub use release_schedule::{
    LinearReleaseSchedule, MockReleaseSchedule, ReleaseSchedule, RELEASE_DURATION_SECS,
};
