//! Unit tests for consensus scoring.

mod engine_tests;
