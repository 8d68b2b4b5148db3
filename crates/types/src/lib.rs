//! Shared primitives for the P2E token workspace.
//!
//! - [`FixedPoint`]: scaled-integer percentages and rates (1.0 == 10^18)
//! - [`Principal`]: 32-byte identity used for owners, callers and recipients

pub mod address;
pub mod scalars;

pub use address::*;
pub use scalars::*;
