//! Port contracts for proposal and benchmark persistence.

pub mod repository;

pub use repository::{
    BenchmarkRepository, ProposalRepository, ProposalRepositoryError, ProposalRepositoryResult,
};
