//! Error types for proposal and benchmark validation.

use thiserror::Error;

/// Errors returned while constructing proposal domain values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProposalDomainError {
    /// A proposal must carry at least one statement.
    #[error("proposal must contain at least one statement")]
    NoStatements,

    /// A statement is empty after trimming.
    #[error("statement {index} is empty")]
    EmptyStatement {
        /// Zero-based statement position.
        index: usize,
    },

    /// The rationale is empty after trimming.
    #[error("proposal rationale must not be empty")]
    EmptyRationale,

    /// The estimated query time improvement is zero or not finite.
    #[error("estimated improvement must be a non-zero finite percentage, got {0}")]
    InvalidEstimatedImprovement(f64),

    /// The estimated storage overhead is not finite.
    #[error("estimated storage overhead must be finite, got {0} MB")]
    InvalidStorageOverhead(f64),

    /// The executed benchmark query is empty.
    #[error("benchmark query text must not be empty")]
    EmptyQueryExecuted,

    /// A benchmark execution time must be positive.
    #[error("benchmark execution time must be positive, got {0} ms")]
    NonPositiveExecutionTime(f64),

    /// A storage impact must not be negative.
    #[error("storage impact must not be negative, got {0} MB")]
    NegativeStorageImpact(f64),

    /// The execution plan summary has no plan type.
    #[error("execution plan must have a plan type")]
    EmptyPlanType,
}

/// Error returned while parsing proposal types from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown proposal type: {0}")]
pub struct ParseProposalTypeError(pub String);

/// Error returned while parsing qualitative impact levels.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid impact level '{0}', expected low, medium or high")]
pub struct ParseImpactLevelError(pub String);

/// Error returned while parsing benchmark test names.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown benchmark query name: {0}")]
pub struct ParseBenchmarkQueryNameError(pub String);
