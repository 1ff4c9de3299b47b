//! Step definitions for task processing scenarios.

mod given;
mod then;
mod when;
pub mod world;
