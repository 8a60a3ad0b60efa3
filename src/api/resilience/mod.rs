//! Transport resilience for content-management API calls
//!
//! Provides the retry policy used by `CmaClient`.

pub mod retry;

pub use retry::{RetryConfig, RetryPolicy, RetryableError};
