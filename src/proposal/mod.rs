//! Optimisation proposals and the benchmark evidence behind them.
//!
//! Workers produce proposals and measure them on their isolated copies. The
//! consensus engine later ranks proposals using these measurements.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
