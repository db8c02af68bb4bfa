//! Error recovery strategies and the dispatching handler.
//!
//! One strategy exists per recoverable category; the [`ErrorHandler`] scans
//! them in a fixed order and returns the first match's result. The network
//! strategy is the only one that suspends, backing off on the async timer
//! before signaling the caller to retry.

pub mod backoff;
pub mod handler;
pub mod strategies;

// Re-export main types for convenient access
pub use backoff::BackoffPolicy;
pub use handler::ErrorHandler;
pub use strategies::{
    CommandNotFoundRecovery, ContextOverflowRecovery, FileNotFoundRecovery, NetworkErrorRecovery,
    PermissionDeniedRecovery, RecoveryStrategy,
};
