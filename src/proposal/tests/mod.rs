//! Unit tests for proposals, benchmarks and their repositories.
