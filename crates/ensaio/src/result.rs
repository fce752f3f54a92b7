//! Result and error types for Ensaio.

use thiserror::Error;

/// Result type for Ensaio operations
pub type EnsaioResult<T> = Result<T, EnsaioError>;

/// Errors that can occur while running a step script
#[derive(Debug, Error)]
pub enum EnsaioError {
    /// A blocking action could not resolve its target
    #[error("Step {step}: target not found for {action}: '{target}'")]
    TargetNotFound {
        /// Step ordinal (1-based)
        step: u32,
        /// Action name
        action: &'static str,
        /// Raw target description
        target: String,
    },

    /// Post-action verification did not match any acceptance rule
    #[error("Step {step}: assertion failed: {message}")]
    AssertionFailed {
        /// Step ordinal (1-based)
        step: u32,
        /// What was expected and what was observed
        message: String,
    },

    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page driver error (query, click, fill, navigation primitives)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Step script could not be parsed or failed validation
    #[error("Script error: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EnsaioError {
    /// Wrap a driver-level failure
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Wrap a script-level failure
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    /// Whether this failure aborts the remaining steps of a run
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::TargetNotFound { .. } | Self::AssertionFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let not_found = EnsaioError::TargetNotFound {
            step: 3,
            action: "click",
            target: "Confirmar".to_string(),
        };
        assert!(not_found.is_fatal());

        let assertion = EnsaioError::AssertionFailed {
            step: 5,
            message: "address unchanged".to_string(),
        };
        assert!(assertion.is_fatal());

        assert!(!EnsaioError::driver("timeout").is_fatal());
        assert!(!EnsaioError::script("bad yaml").is_fatal());
    }

    #[test]
    fn test_display_includes_step_and_target() {
        let e = EnsaioError::TargetNotFound {
            step: 7,
            action: "fill",
            target: "Cliente".to_string(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Step 7"));
        assert!(msg.contains("Cliente"));
    }
}
