//! In-memory adapters for proposals and benchmark results.

mod benchmark;
mod proposal;

pub use benchmark::InMemoryBenchmarkRepository;
pub use proposal::InMemoryProposalRepository;

use crate::proposal::ports::ProposalRepositoryError;

fn lock_error(err: impl ToString) -> ProposalRepositoryError {
    ProposalRepositoryError::persistence(std::io::Error::other(err.to_string()))
}
