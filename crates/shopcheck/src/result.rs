//! Result and error types for shopcheck.

use std::fmt;
use thiserror::Error;

/// Result type for shopcheck operations
pub type ShopResult<T> = Result<T, ShopError>;

/// Why a single element action failed.
///
/// Every action is atomic from the caller's point of view: it either
/// succeeded or failed for exactly one of these reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionFailure {
    /// No candidate selector resolved in time
    NotFound,
    /// The element resolved but the action did not complete in time
    TimedOut,
    /// The element exists but is not visible
    NotVisible,
    /// The element is visible but disabled
    Disabled,
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not-found",
            Self::TimedOut => "timed-out",
            Self::NotVisible => "not-visible",
            Self::Disabled => "disabled",
        };
        f.write_str(s)
    }
}

/// Errors that can occur in shopcheck
#[derive(Debug, Error)]
pub enum ShopError {
    /// Programmer error: unknown element name, empty selector chain,
    /// unparseable selector, bad override
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// None of the candidate selectors resolved within the timeout
    #[error("Element '{element}' not found after trying {tried} selector(s) for {elapsed_ms}ms")]
    NotFound {
        /// Semantic element name
        element: String,
        /// Number of candidates tried
        tried: usize,
        /// Time spent probing
        elapsed_ms: u64,
    },

    /// Element resolved but the action did not complete within its bound
    #[error("{action} on '{element}' timed out after {ms}ms")]
    ActionTimeout {
        /// Semantic element name
        element: String,
        /// Action name (click, fill, ...)
        action: &'static str,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Element resolved but is not visible
    #[error("Element '{element}' is not visible")]
    NotVisible {
        /// Semantic element name
        element: String,
    },

    /// Element resolved but is disabled
    #[error("Element '{element}' is disabled")]
    Disabled {
        /// Semantic element name
        element: String,
    },

    /// Page did not settle before the quiescence ceiling
    #[error("Page did not become quiescent within {ms}ms")]
    QuiescenceTimeout {
        /// Ceiling in milliseconds
        ms: u64,
    },

    /// A scenario ran past its overall budget
    #[error("Scenario '{scenario}' did not finish within {ms}ms")]
    ScenarioTimeout {
        /// Scenario name
        scenario: String,
        /// Budget in milliseconds
        ms: u64,
    },

    /// A multi-step business flow stopped partway
    #[error("{flow} stopped at {step} (last completed: {}): {reason}", .last_completed.as_deref().unwrap_or("none"))]
    FlowFailure {
        /// Flow name
        flow: &'static str,
        /// Step that failed
        step: String,
        /// Last step that completed, if any
        last_completed: Option<String>,
        /// Triggering failure
        reason: Box<ShopError>,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Underlying session reported a transport or protocol failure
    #[error("Session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Element or scope was detached from the document mid-operation
    #[error("Element detached from document: {handle}")]
    Detached {
        /// Handle identifier
        handle: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Fixture error (setup/teardown failed)
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// Test data file missing or malformed
    #[error("Test data error: {message}")]
    TestData {
        /// Error message
        message: String,
    },

    /// Scenario assertion failed
    #[error("Assertion failed: {message}")]
    Assertion {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ShopError {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a session error
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Create an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Classify an element action failure.
    ///
    /// Returns `None` for errors that are not action outcomes (configuration,
    /// transport, I/O).
    #[must_use]
    pub fn failure(&self) -> Option<ActionFailure> {
        match self {
            Self::NotFound { .. } | Self::Detached { .. } => Some(ActionFailure::NotFound),
            Self::ActionTimeout { .. }
            | Self::QuiescenceTimeout { .. }
            | Self::ScenarioTimeout { .. } => Some(ActionFailure::TimedOut),
            Self::NotVisible { .. } => Some(ActionFailure::NotVisible),
            Self::Disabled { .. } => Some(ActionFailure::Disabled),
            Self::FlowFailure { reason, .. } => reason.failure(),
            _ => None,
        }
    }

    /// Whether this error means "the element is absent"
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.failure() == Some(ActionFailure::NotFound)
    }

    /// Whether this error is a programmer mistake that must never be retried
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
