//! Integration test utilities for garbled circuits
//!
//! This crate provides test-only utilities for comparing plain and garbled circuit evaluation
//! to verify the correctness of the garbled circuits implementation.

pub mod blood_compatibility;
pub mod plain_evaluator;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

/// Initializes a tracing subscriber for the current test thread
///
/// Keep the returned guard alive for the duration of the test. Output is
/// controlled through `RUST_LOG`.
pub fn init_tracing() -> tracing::dispatcher::DefaultGuard {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .set_default()
}
