//! Central error handler dispatching to per-category recovery strategies.

use std::fmt;

use tracing::{debug, warn};

use super::backoff::BackoffPolicy;
use super::strategies::{
    CommandNotFoundRecovery, ContextOverflowRecovery, FileNotFoundRecovery, NetworkErrorRecovery,
    PermissionDeniedRecovery, RecoveryStrategy,
};
use crate::classifier::Classifier;
use crate::config::RecoveryConfig;
use crate::taxonomy::{Context, RecoverableError, RecoveryResult};

/// Classifies failures and applies the matching recovery strategy.
///
/// Strategies are scanned in a fixed order and categories map one-to-one to
/// strategies, so the first match owns the outcome. Categories without a
/// dedicated strategy fall back to a generic failure result built from the
/// classified error. Every exit path yields a well-formed
/// [`RecoveryResult`]; handling itself cannot fail.
pub struct ErrorHandler {
    classifier: Classifier,
    strategies: Vec<Box<dyn RecoveryStrategy>>,
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorHandler {
    /// Creates a handler with the default classifier, backoff policy, and
    /// strategy set.
    pub fn new() -> Self {
        Self::with_policy(BackoffPolicy::default())
    }

    /// Creates a handler with a custom network backoff policy.
    pub fn with_policy(policy: BackoffPolicy) -> Self {
        Self::build(Classifier::new(), FileNotFoundRecovery::new(), policy)
    }

    /// Creates a handler from loaded configuration.
    pub fn from_config(config: &RecoveryConfig) -> Self {
        let file_recovery = match &config.search_root {
            Some(root) => FileNotFoundRecovery::with_search_root(root),
            None => FileNotFoundRecovery::new(),
        };
        Self::build(Classifier::new(), file_recovery, config.backoff.policy())
    }

    fn build(
        classifier: Classifier,
        file_recovery: FileNotFoundRecovery,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            classifier,
            strategies: vec![
                Box::new(file_recovery),
                Box::new(ContextOverflowRecovery::new()),
                Box::new(NetworkErrorRecovery::with_policy(policy)),
                Box::new(PermissionDeniedRecovery::new()),
                Box::new(CommandNotFoundRecovery::new()),
            ],
        }
    }

    /// Replaces the classifier (e.g. one extended with custom rules).
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Appends a custom strategy, scanned after the built-in set.
    pub fn with_strategy(mut self, strategy: Box<dyn RecoveryStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Returns the classifier in use.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Classifies a failure without running recovery.
    pub fn classify<E: fmt::Display + ?Sized>(
        &self,
        error: &E,
        context: Context,
    ) -> RecoverableError {
        self.classifier.classify(error, context)
    }

    /// Handles any failure value: classify, then recover.
    pub async fn handle<E: fmt::Display + ?Sized>(
        &self,
        error: &E,
        context: Context,
    ) -> RecoveryResult {
        let classified = self.classifier.classify(error, context);
        self.recover_classified(&classified).await
    }

    /// Handles raw failure text.
    pub async fn handle_message(&self, message: &str, context: Context) -> RecoveryResult {
        let classified = self.classifier.classify_message(message, context);
        self.recover_classified(&classified).await
    }

    /// Handles a shell result from its output text and exit status.
    pub async fn handle_output(
        &self,
        text: &str,
        exit_code: i32,
        context: Context,
    ) -> RecoveryResult {
        let classified = self.classifier.classify_output(text, exit_code, context);
        self.recover_classified(&classified).await
    }

    /// Runs recovery for an already-classified error.
    pub async fn recover_classified(&self, classified: &RecoverableError) -> RecoveryResult {
        debug!(category = %classified.category, "dispatching recovery");

        for strategy in &self.strategies {
            if strategy.can_handle(classified) {
                // Categories map one-to-one to strategies: the first match
                // owns the outcome, whether or not it reports success.
                return strategy.recover(classified).await;
            }
        }

        warn!(category = %classified.category, "no strategy; surfacing to caller");
        RecoveryResult::failure(classified.user_message.clone())
            .with_suggestion(classified.recovery_suggestion.clone())
    }
}
