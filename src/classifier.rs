//! Ordered-rule error classifier.
//!
//! Classifies raw failure text into the category taxonomy by evaluating an
//! ordered rule list, first match wins. Rule order is significant: a message
//! mentioning both "network" and "syntax" classifies as a network error
//! because the network rule sits earlier in the table.

use regex::Regex;
use std::fmt;

use crate::taxonomy::{Context, ErrorCategory, RecoverableError};

/// How a classifier rule decides whether it applies to a message.
///
/// Matchers are evaluated against the lowercased message text.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Matches if any of the substrings occurs in the message.
    AnyOf(Vec<String>),
    /// Matches if every inner matcher matches.
    AllOf(Vec<Matcher>),
    /// Matches if the regex finds a match. Supplied patterns should be
    /// case-insensitive or lowercase, since the input is lowercased.
    Pattern(Regex),
}

impl Matcher {
    /// Builds an any-of substring matcher.
    pub fn any_of<I, S>(substrings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Matcher::AnyOf(substrings.into_iter().map(Into::into).collect())
    }

    /// Builds a conjunction of matchers.
    pub fn all_of(matchers: Vec<Matcher>) -> Self {
        Matcher::AllOf(matchers)
    }

    /// Builds a regex matcher.
    pub fn pattern(regex: Regex) -> Self {
        Matcher::Pattern(regex)
    }

    fn matches(&self, lowered: &str) -> bool {
        match self {
            Matcher::AnyOf(substrings) => substrings.iter().any(|s| lowered.contains(s.as_str())),
            Matcher::AllOf(matchers) => matchers.iter().all(|m| m.matches(lowered)),
            Matcher::Pattern(regex) => regex.is_match(lowered),
        }
    }
}

/// A single (matcher, category) rule in the classifier table.
#[derive(Debug, Clone)]
pub struct ClassifierRule {
    matcher: Matcher,
    category: ErrorCategory,
    description: String,
}

impl ClassifierRule {
    /// Creates a new rule.
    pub fn new(matcher: Matcher, category: ErrorCategory, description: impl Into<String>) -> Self {
        Self {
            matcher,
            category,
            description: description.into(),
        }
    }

    /// Checks whether this rule applies to the given message.
    pub fn matches(&self, message: &str) -> bool {
        self.matcher.matches(&message.to_lowercase())
    }

    /// Returns the category this rule assigns on match.
    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    /// Returns the human-readable description of what this rule detects.
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Classifier that maps failure text to error categories using an ordered
/// rule table.
///
/// Classification is a pure function of (message, context); it never fails:
/// text matching no rule lands in [`ErrorCategory::ToolError`].
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ClassifierRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    /// Creates a classifier with the default rule table.
    pub fn new() -> Self {
        Self {
            rules: Self::default_rules(),
        }
    }

    /// Creates a classifier with a custom rule table.
    pub fn with_rules(rules: Vec<ClassifierRule>) -> Self {
        Self { rules }
    }

    /// The default rule table, in priority order.
    fn default_rules() -> Vec<ClassifierRule> {
        vec![
            ClassifierRule::new(
                Matcher::any_of(["no such file", "file not found"]),
                ErrorCategory::FileNotFound,
                "Missing file",
            ),
            ClassifierRule::new(
                Matcher::any_of(["permission denied", "access denied"]),
                ErrorCategory::PermissionDenied,
                "Permission or access denied",
            ),
            ClassifierRule::new(
                Matcher::any_of(["command not found", "not recognized"]),
                ErrorCategory::CommandNotFound,
                "Missing command or package",
            ),
            ClassifierRule::new(
                Matcher::any_of(["timeout", "connection", "network", "unreachable"]),
                ErrorCategory::NetworkError,
                "Network or API failure",
            ),
            ClassifierRule::new(
                Matcher::all_of(vec![
                    Matcher::any_of(["context"]),
                    Matcher::any_of(["limit", "too large"]),
                ]),
                ErrorCategory::ContextOverflow,
                "Context window limit",
            ),
            ClassifierRule::new(
                Matcher::any_of(["syntax"]),
                ErrorCategory::SyntaxError,
                "Code syntax error",
            ),
        ]
    }

    /// Appends a rule after the existing table (lowest priority).
    pub fn add_rule(&mut self, rule: ClassifierRule) {
        self.rules.push(rule);
    }

    /// Inserts a rule ahead of the existing table (highest priority).
    pub fn prepend_rule(&mut self, rule: ClassifierRule) {
        self.rules.insert(0, rule);
    }

    /// Returns the rule table, in priority order.
    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }

    /// Classifies any failure value via its `Display` rendering.
    pub fn classify<E: fmt::Display + ?Sized>(&self, error: &E, context: Context) -> RecoverableError {
        self.classify_message(&error.to_string(), context)
    }

    /// Classifies raw failure text.
    pub fn classify_message(&self, message: &str, context: Context) -> RecoverableError {
        let lowered = message.to_lowercase();
        let category = self
            .rules
            .iter()
            .find(|rule| rule.matcher.matches(&lowered))
            .map(|rule| rule.category)
            .unwrap_or(ErrorCategory::ToolError);
        build_error(category, message, context)
    }

    /// Classifies a process exit status using shell conventions.
    ///
    /// Returns `None` for codes that carry no classification signal.
    ///
    /// # Exit Code Mappings
    /// - 126: command found but not executable
    /// - 127: command not found
    pub fn classify_exit_status(&self, exit_code: i32, context: Context) -> Option<RecoverableError> {
        match exit_code {
            126 => Some(build_error(
                ErrorCategory::PermissionDenied,
                "exit status 126: command found but not executable",
                context,
            )),
            127 => Some(build_error(
                ErrorCategory::CommandNotFound,
                "exit status 127: command not found",
                context,
            )),
            _ => None,
        }
    }

    /// Classifies a shell result from its output text and exit status.
    ///
    /// Text classification wins when it produces something more specific
    /// than the tool-error fallback; otherwise the exit status is consulted.
    pub fn classify_output(
        &self,
        text: &str,
        exit_code: i32,
        context: Context,
    ) -> RecoverableError {
        if !text.trim().is_empty() {
            let classified = self.classify_message(text, context.clone());
            if classified.category != ErrorCategory::ToolError {
                return classified;
            }
            if let Some(by_code) = self.classify_exit_status(exit_code, context) {
                return by_code;
            }
            return classified;
        }

        self.classify_exit_status(exit_code, context.clone())
            .unwrap_or_else(|| {
                build_error(
                    ErrorCategory::ToolError,
                    &format!("exit status {}", exit_code),
                    context,
                )
            })
    }
}

/// Builds the `RecoverableError` for a category, filling the message and
/// suggestion templates from the context.
fn build_error(category: ErrorCategory, message: &str, context: Context) -> RecoverableError {
    let unknown = || "unknown".to_string();
    let (suggestion, user_message) = match category {
        ErrorCategory::FileNotFound => (
            "Search for the file using glob or check the path".to_string(),
            format!(
                "File not found: {}",
                context
                    .get("file_name")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(unknown)
            ),
        ),
        ErrorCategory::PermissionDenied => (
            "Check file permissions with `ls -la`".to_string(),
            "Permission denied. You may need to change file permissions.".to_string(),
        ),
        ErrorCategory::CommandNotFound => (
            "Check if the command is installed".to_string(),
            format!(
                "Command not found: {}",
                context
                    .get("command")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(unknown)
            ),
        ),
        ErrorCategory::NetworkError => (
            "Retry with exponential backoff".to_string(),
            "Network error occurred. Retrying...".to_string(),
        ),
        ErrorCategory::ContextOverflow => (
            "Summarize and use pagination".to_string(),
            "Context limit reached. Need to summarize or narrow scope.".to_string(),
        ),
        ErrorCategory::SyntaxError => (
            "Check code syntax and fix issues".to_string(),
            format!("Syntax error: {}", message),
        ),
        ErrorCategory::UserError => (
            "Review the input and try again".to_string(),
            format!("Input error: {}", message),
        ),
        ErrorCategory::SystemError => (
            "Retry, and report the error if it persists".to_string(),
            format!("System error: {}", message),
        ),
        ErrorCategory::ToolError => (
            "Check the error message and try a different approach".to_string(),
            format!("Tool error: {}", message),
        ),
    };

    RecoverableError::new(category, message, context, suggestion, user_message)
}
