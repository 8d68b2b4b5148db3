//! P2E Economics Module
//!
//! Implements the capped allocation model of the P2E token:
//! - Distribution ledger partitioning a hard max supply into percentage-capped buckets
//! - Staged reward-rate tracker driven by a bucket's cumulative distribution
//! - Pure reward calculation and fee split
//! - Owner / designated-caller access gate

pub mod access;
pub mod distribution;
pub mod errors;
pub mod parameters;
pub mod reward;
pub mod stages;
pub mod types;

pub use access::*;
pub use distribution::*;
pub use errors::*;
pub use parameters::*;
pub use reward::*;
pub use stages::*;
pub use types::*;

/// Module version for API introspection
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
