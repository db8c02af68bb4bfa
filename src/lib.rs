//! Salvage - error classification and recovery for autonomous coding agents
//!
//! Given any failure value raised while an agent runs a tool (shell command,
//! file read, network call), salvage classifies it into a closed category
//! taxonomy and applies a category-specific recovery strategy: exponential
//! backoff retry for network failures, actionable suggestions for the rest.
//!
//! ```no_run
//! use salvage::recovery::ErrorHandler;
//! use salvage::taxonomy::Context;
//!
//! # async fn example() {
//! let handler = ErrorHandler::new();
//! let result = handler.handle_message("connection refused", Context::new()).await;
//! if result.success {
//!     // merge result.new_state into the context and retry the operation
//! }
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod logging;
pub mod recovery;
pub mod taxonomy;

// Re-export the main surface at the crate root
pub use classifier::{Classifier, ClassifierRule, Matcher};
pub use config::{ConfigError, RecoveryConfig};
pub use recovery::{BackoffPolicy, ErrorHandler, RecoveryStrategy};
pub use taxonomy::{Context, ErrorCategory, RecoverableError, RecoveryResult};
