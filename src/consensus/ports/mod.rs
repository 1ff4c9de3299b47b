//! Port contracts for consensus persistence.

pub mod repository;

pub use repository::{ConsensusRepository, ConsensusRepositoryError, ConsensusRepositoryResult};
