//! Per-category recovery strategies.
//!
//! Each strategy handles exactly one error category. Apart from the network
//! strategy, which suspends for a backoff delay and signals the caller to
//! retry, strategies report failure together with an actionable suggestion.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use super::backoff::BackoffPolicy;
use crate::taxonomy::{Context, ErrorCategory, RecoverableError, RecoveryResult};

/// Maximum number of candidate paths listed by the file search.
const MAX_CANDIDATES: usize = 5;

/// A policy object that knows how to respond to one error category.
#[async_trait]
pub trait RecoveryStrategy: Send + Sync {
    /// Checks if this strategy can handle the classified error.
    fn can_handle(&self, error: &RecoverableError) -> bool;

    /// Attempts to recover from the error.
    ///
    /// May suspend (the network strategy backs off on the async timer) but
    /// always yields a well-formed result.
    async fn recover(&self, error: &RecoverableError) -> RecoveryResult;
}

/// Recovers from missing-file errors by deriving a glob search.
#[derive(Debug, Default)]
pub struct FileNotFoundRecovery {
    search_root: Option<PathBuf>,
}

impl FileNotFoundRecovery {
    /// Creates a strategy that only suggests the search pattern.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a strategy that also runs the search under `root` and lists
    /// close matches in the suggestion.
    pub fn with_search_root(root: impl Into<PathBuf>) -> Self {
        Self {
            search_root: Some(root.into()),
        }
    }
}

#[async_trait]
impl RecoveryStrategy for FileNotFoundRecovery {
    fn can_handle(&self, error: &RecoverableError) -> bool {
        error.category == ErrorCategory::FileNotFound
    }

    async fn recover(&self, error: &RecoverableError) -> RecoveryResult {
        let file_name = error.context_str("file_name").unwrap_or("");
        if file_name.is_empty() {
            return RecoveryResult::failure(error.user_message.clone())
                .with_suggestion("Please check the file path and try again.");
        }

        let base_name = Path::new(file_name)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        let pattern = format!("**/*{}", base_name);

        let mut suggestion = format!(
            "Could not find '{}'. Search for similar files with `glob(\"{}\")`, \
             or provide the correct path.",
            file_name, pattern
        );

        if let Some(root) = &self.search_root {
            let candidates = search_candidates(root, &base_name);
            debug!(candidates = candidates.len(), %pattern, "file search finished");
            if !candidates.is_empty() {
                suggestion.push_str("\nClose matches:");
                for candidate in &candidates {
                    suggestion.push_str(&format!("\n  - {}", candidate.display()));
                }
            }
        }

        let mut state = Context::new();
        state.insert("search_pattern".to_string(), json!(pattern));

        RecoveryResult::failure(format!("File not found: {}", file_name))
            .with_suggestion(suggestion)
            .with_new_state(state)
    }
}

/// Runs the derived glob under `root`, capped at [`MAX_CANDIDATES`] hits.
fn search_candidates(root: &Path, base_name: &str) -> Vec<PathBuf> {
    let pattern = root.join(format!("**/*{}", base_name));
    let Some(pattern) = pattern.to_str() else {
        return Vec::new();
    };
    match glob::glob(pattern) {
        Ok(paths) => paths.filter_map(Result::ok).take(MAX_CANDIDATES).collect(),
        Err(_) => Vec::new(),
    }
}

/// Recovers from context overflow by offering context-management options.
#[derive(Debug, Default)]
pub struct ContextOverflowRecovery;

impl ContextOverflowRecovery {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RecoveryStrategy for ContextOverflowRecovery {
    fn can_handle(&self, error: &RecoverableError) -> bool {
        error.category == ErrorCategory::ContextOverflow
    }

    async fn recover(&self, _error: &RecoverableError) -> RecoveryResult {
        RecoveryResult::failure("Context limit approaching or exceeded.").with_suggestion(
            "The conversation context is getting too large. Options:\n\
             1. Summarize progress so far and save it to memory\n\
             2. Narrow focus to a specific area of the codebase\n\
             3. Use pagination (read with a limit) instead of full reads",
        )
    }
}

/// Recovers from network errors with exponential backoff retry.
#[derive(Debug, Default)]
pub struct NetworkErrorRecovery {
    policy: BackoffPolicy,
}

impl NetworkErrorRecovery {
    /// Creates a strategy with the default backoff policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a strategy with a custom backoff policy.
    pub fn with_policy(policy: BackoffPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl RecoveryStrategy for NetworkErrorRecovery {
    fn can_handle(&self, error: &RecoverableError) -> bool {
        error.category == ErrorCategory::NetworkError
    }

    async fn recover(&self, error: &RecoverableError) -> RecoveryResult {
        let retry_count = error.context_u64("retry_count").unwrap_or(0);

        if !self.policy.allows_retry(retry_count) {
            warn!(
                retries = self.policy.max_retries,
                "network retries exhausted"
            );
            return RecoveryResult::failure(format!(
                "Network error after {} retries: {}",
                self.policy.max_retries, error.original
            ))
            .with_suggestion("Please check your internet connection and try again.");
        }

        let delay = self.policy.delay_for(retry_count);
        info!(
            delay_secs = delay.as_secs(),
            attempt = retry_count + 1,
            "backing off before network retry"
        );
        tokio::time::sleep(delay).await;

        let mut state = Context::new();
        state.insert("retry_count".to_string(), json!(retry_count + 1));

        RecoveryResult::retry(format!(
            "Network error, retrying in {}s... (attempt {}/{})",
            delay.as_secs(),
            retry_count + 1,
            self.policy.max_retries
        ))
        .with_new_state(state)
    }
}

/// Recovers from permission errors with permission-fix suggestions.
#[derive(Debug, Default)]
pub struct PermissionDeniedRecovery;

impl PermissionDeniedRecovery {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RecoveryStrategy for PermissionDeniedRecovery {
    fn can_handle(&self, error: &RecoverableError) -> bool {
        error.category == ErrorCategory::PermissionDenied
    }

    async fn recover(&self, error: &RecoverableError) -> RecoveryResult {
        let file_path = error.context_str("file_path").unwrap_or("");

        let suggestion = format!(
            "Permission denied for: {path}\n\n\
             To fix this, you may need to:\n\
             1. Check file permissions: `ls -la {path}`\n\
             2. Make the file executable: `chmod +x {path}`\n\
             3. Change ownership if needed: `sudo chown $USER {path}`",
            path = file_path
        );

        RecoveryResult::failure(format!("Permission denied: {}", file_path))
            .with_suggestion(suggestion)
    }
}

/// Recovers from missing-command errors with install suggestions.
#[derive(Debug, Default)]
pub struct CommandNotFoundRecovery;

impl CommandNotFoundRecovery {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RecoveryStrategy for CommandNotFoundRecovery {
    fn can_handle(&self, error: &RecoverableError) -> bool {
        error.category == ErrorCategory::CommandNotFound
    }

    async fn recover(&self, error: &RecoverableError) -> RecoveryResult {
        let command = error.context_str("command").unwrap_or("");

        let suggestion = format!(
            "Command not found: {cmd}\n\n\
             To fix this, you may need to:\n\
             1. Check if the package is installed: `which {cmd}`\n\
             2. Install it, for example:\n\
                - Python: `pip install {cmd}`\n\
                - Node: `npm install -g {cmd}`\n\
                - System: `sudo apt install {cmd}` or `brew install {cmd}`",
            cmd = command
        );

        RecoveryResult::failure(format!("Command not found: {}", command))
            .with_suggestion(suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use std::time::Duration;
    use tokio::time::Instant;

    fn classified(message: &str, context: Context) -> RecoverableError {
        Classifier::new().classify_message(message, context)
    }

    fn context_with(key: &str, value: serde_json::Value) -> Context {
        let mut context = Context::new();
        context.insert(key.to_string(), value);
        context
    }

    #[test]
    fn test_can_handle_is_exact_category_match() {
        let file_error = classified("no such file", Context::new());
        let network_error = classified("connection refused", Context::new());

        assert!(FileNotFoundRecovery::new().can_handle(&file_error));
        assert!(!FileNotFoundRecovery::new().can_handle(&network_error));
        assert!(NetworkErrorRecovery::new().can_handle(&network_error));
        assert!(!NetworkErrorRecovery::new().can_handle(&file_error));
        assert!(!ContextOverflowRecovery::new().can_handle(&file_error));
        assert!(!PermissionDeniedRecovery::new().can_handle(&file_error));
        assert!(!CommandNotFoundRecovery::new().can_handle(&file_error));
    }

    #[tokio::test]
    async fn test_file_not_found_derives_search_pattern() {
        let error = classified(
            "no such file",
            context_with("file_name", serde_json::json!("src/deep/main.rs")),
        );

        let result = FileNotFoundRecovery::new().recover(&error).await;

        assert!(!result.success);
        assert_eq!(result.message, "File not found: src/deep/main.rs");
        let suggestion = result.suggestion.unwrap();
        assert!(suggestion.contains("**/*main.rs"));
        let state = result.new_state.unwrap();
        assert_eq!(state.get("search_pattern"), Some(&serde_json::json!("**/*main.rs")));
    }

    #[tokio::test]
    async fn test_file_not_found_without_file_name() {
        let error = classified("no such file", Context::new());

        let result = FileNotFoundRecovery::new().recover(&error).await;

        assert!(!result.success);
        assert_eq!(result.message, "File not found: unknown");
        assert!(result.new_state.is_none());
    }

    #[tokio::test]
    async fn test_file_not_found_lists_candidates_under_search_root() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("src");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("main.rs"), "fn main() {}").unwrap();

        let error = classified(
            "no such file",
            context_with("file_name", serde_json::json!("main.rs")),
        );

        let strategy = FileNotFoundRecovery::with_search_root(dir.path());
        let result = strategy.recover(&error).await;

        let suggestion = result.suggestion.unwrap();
        assert!(suggestion.contains("Close matches:"));
        assert!(suggestion.contains("main.rs"));
    }

    #[tokio::test]
    async fn test_context_overflow_menu() {
        let error = classified("context limit exceeded", Context::new());

        let result = ContextOverflowRecovery::new().recover(&error).await;

        assert!(!result.success);
        assert_eq!(result.message, "Context limit approaching or exceeded.");
        let suggestion = result.suggestion.unwrap();
        assert!(suggestion.contains("Summarize"));
        assert!(suggestion.contains("pagination"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_recovery_first_attempt_backs_off_one_second() {
        let error = classified("connection refused", Context::new());

        let start = Instant::now();
        let result = NetworkErrorRecovery::new().recover(&error).await;

        // Paused clock: sleep advances virtual time exactly.
        assert!(start.elapsed() >= Duration::from_secs(1));
        assert!(result.success);
        assert!(result.message.contains("retrying in 1s"));
        assert!(result.message.contains("attempt 1/3"));
        let state = result.new_state.unwrap();
        assert_eq!(state.get("retry_count"), Some(&serde_json::json!(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_recovery_delay_doubles_with_retry_count() {
        let error = classified(
            "connection refused",
            context_with("retry_count", serde_json::json!(2)),
        );

        let start = Instant::now();
        let result = NetworkErrorRecovery::new().recover(&error).await;

        assert!(start.elapsed() >= Duration::from_secs(4));
        assert!(result.success);
        assert!(result.message.contains("retrying in 4s"));
        let state = result.new_state.unwrap();
        assert_eq!(state.get("retry_count"), Some(&serde_json::json!(3)));
    }

    #[tokio::test]
    async fn test_network_recovery_exhausted_is_terminal() {
        let error = classified(
            "connection refused",
            context_with("retry_count", serde_json::json!(3)),
        );

        let result = NetworkErrorRecovery::new().recover(&error).await;

        assert!(!result.success);
        assert!(result.message.contains("after 3 retries"));
        assert!(result.message.contains("connection refused"));
        assert_eq!(
            result.suggestion.as_deref(),
            Some("Please check your internet connection and try again.")
        );
        assert!(result.new_state.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_recovery_custom_policy() {
        let policy = BackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(1), 1);
        let strategy = NetworkErrorRecovery::with_policy(policy);

        let first = classified("connection refused", Context::new());
        let result = strategy.recover(&first).await;
        assert!(result.success);

        let exhausted = classified(
            "connection refused",
            context_with("retry_count", serde_json::json!(1)),
        );
        let result = strategy.recover(&exhausted).await;
        assert!(!result.success);
        assert!(result.message.contains("after 1 retries"));
    }

    #[tokio::test]
    async fn test_permission_denied_suggests_chmod_chown() {
        let error = classified(
            "Permission denied: /etc/shadow",
            context_with("file_path", serde_json::json!("/etc/shadow")),
        );

        let result = PermissionDeniedRecovery::new().recover(&error).await;

        assert!(!result.success);
        assert_eq!(result.message, "Permission denied: /etc/shadow");
        let suggestion = result.suggestion.unwrap();
        assert!(suggestion.contains("chmod +x /etc/shadow"));
        assert!(suggestion.contains("sudo chown $USER /etc/shadow"));
    }

    #[tokio::test]
    async fn test_command_not_found_suggests_installs() {
        let error = classified(
            "bash: rg: command not found",
            context_with("command", serde_json::json!("rg")),
        );

        let result = CommandNotFoundRecovery::new().recover(&error).await;

        assert!(!result.success);
        assert_eq!(result.message, "Command not found: rg");
        let suggestion = result.suggestion.unwrap();
        assert!(suggestion.contains("which rg"));
        assert!(suggestion.contains("brew install rg"));
    }
}
