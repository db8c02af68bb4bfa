//! Error taxonomy shared by the classifier and the recovery dispatcher.
//!
//! This module defines the closed set of error categories, the classified
//! error type produced by the classifier, and the result type produced by
//! recovery strategies.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-supplied auxiliary data threaded through classification and
/// recovery (file paths, commands, retry counters).
///
/// Values are JSON so numeric counters like `retry_count` round-trip without
/// string parsing.
pub type Context = serde_json::Map<String, Value>;

/// Classification of errors for recovery strategy selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// User input issues.
    UserError,
    /// Missing files.
    FileNotFound,
    /// Permission issues.
    PermissionDenied,
    /// Missing commands or packages.
    CommandNotFound,
    /// Code syntax issues.
    SyntaxError,
    /// API or network failures.
    NetworkError,
    /// Context limit issues.
    ContextOverflow,
    /// Tool execution failures.
    ToolError,
    /// Internal errors.
    SystemError,
}

impl ErrorCategory {
    /// All categories, in declaration order.
    pub const ALL: [ErrorCategory; 9] = [
        ErrorCategory::UserError,
        ErrorCategory::FileNotFound,
        ErrorCategory::PermissionDenied,
        ErrorCategory::CommandNotFound,
        ErrorCategory::SyntaxError,
        ErrorCategory::NetworkError,
        ErrorCategory::ContextOverflow,
        ErrorCategory::ToolError,
        ErrorCategory::SystemError,
    ];

    /// Returns the snake_case name used in serialized form and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "user_error",
            ErrorCategory::FileNotFound => "file_not_found",
            ErrorCategory::PermissionDenied => "permission_denied",
            ErrorCategory::CommandNotFound => "command_not_found",
            ErrorCategory::SyntaxError => "syntax_error",
            ErrorCategory::NetworkError => "network_error",
            ErrorCategory::ContextOverflow => "context_overflow",
            ErrorCategory::ToolError => "tool_error",
            ErrorCategory::SystemError => "system_error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error the recovery dispatcher knows how to respond to.
///
/// Built once by the classifier from a raised failure value plus optional
/// caller context, and immutable thereafter. Classification is a pure
/// function: the same input always produces an equal `RecoverableError`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecoverableError {
    /// The error category for recovery strategy selection.
    pub category: ErrorCategory,
    /// Rendered form of the original failure.
    pub original: String,
    /// Additional context about the error (file paths, retry counters).
    pub context: Context,
    /// Human-readable suggestion for fixing the error.
    pub recovery_suggestion: String,
    /// User-friendly error message.
    pub user_message: String,
    /// Whether automatic retry is allowed.
    pub retry_allowed: bool,
}

impl RecoverableError {
    /// Creates a new recoverable error with retry allowed.
    pub fn new(
        category: ErrorCategory,
        original: impl Into<String>,
        context: Context,
        recovery_suggestion: impl Into<String>,
        user_message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            original: original.into(),
            context,
            recovery_suggestion: recovery_suggestion.into(),
            user_message: user_message.into(),
            retry_allowed: true,
        }
    }

    /// Sets whether automatic retry is allowed.
    pub fn with_retry_allowed(mut self, allowed: bool) -> Self {
        self.retry_allowed = allowed;
        self
    }

    /// Returns a context value as a string slice, if present and a string.
    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(Value::as_str)
    }

    /// Returns a context value as an unsigned integer, if present and numeric.
    pub fn context_u64(&self, key: &str) -> Option<u64> {
        self.context.get(key).and_then(Value::as_u64)
    }
}

impl fmt::Display for RecoverableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message)
    }
}

impl std::error::Error for RecoverableError {}

/// Result of an error recovery attempt.
///
/// `success = true` signals the caller may retry the original operation,
/// merging `new_state` into its context first. `success = false` means the
/// error should be surfaced along with the suggestion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecoveryResult {
    /// Whether recovery succeeded (i.e. a retry is worthwhile).
    pub success: bool,
    /// Human-readable message about the recovery attempt.
    pub message: String,
    /// Optional suggestion for user action.
    pub suggestion: Option<String>,
    /// Optional new state to merge into the caller's context.
    pub new_state: Option<Context>,
}

impl RecoveryResult {
    /// Creates a successful result signaling the caller may retry.
    pub fn retry(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            suggestion: None,
            new_state: None,
        }
    }

    /// Creates a failed result to surface to the user.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            suggestion: None,
            new_state: None,
        }
    }

    /// Attaches a suggestion for user action.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attaches state for the caller to merge into its context.
    pub fn with_new_state(mut self, new_state: Context) -> Self {
        self.new_state = Some(new_state);
        self
    }
}
