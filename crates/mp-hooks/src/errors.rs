use std::error::Error as StdError;

use thiserror::Error;

/// Failure reported by a hook handler.
///
/// The dispatcher never wraps or rewrites these: whatever a handler returns
/// reaches the caller of [`crate::HookDispatcher::call`] as is.
#[derive(Debug, Error)]
pub enum HookError {
    /// The handler rejected the call.
    #[error("{message}")]
    Failed {
        /// Human-readable description.
        message: String,
    },
    /// The handler failed because of an underlying error.
    #[error("{message}: {source}")]
    Caused {
        /// Human-readable description.
        message: String,
        /// Underlying error.
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },
}

impl HookError {
    /// Builds a failure carrying only a message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Builds a failure wrapping an underlying error.
    #[must_use]
    pub fn caused<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Caused {
            message: message.into(),
            source: Box::new(source),
        }
    }
}

/// Errors raised while parsing a [`crate::HookName`] from untrusted text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HookNameError {
    /// The name was empty or whitespace only.
    #[error("hook name must not be blank")]
    Blank,
    /// The name contained interior whitespace.
    #[error("hook name '{0}' must not contain whitespace")]
    Whitespace(String),
}
