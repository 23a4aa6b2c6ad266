//! Bounded retry with deterministic exponential backoff.
//!
//! This module provides:
//! - [`with_retry`]: retry an operation while its failures classify as
//!   transient
//! - [`with_api_retry`]: retry only on an explicit set of error codes
//! - [`backoff_delay`]: the pure delay computation behind both

mod backoff;
mod executor;

pub use backoff::backoff_delay;
pub use executor::{
    with_api_retry, with_retry, ApiRetryOptions, RetryCondition, RetryObserver, RetryOptions,
};
