//! Error taxonomy for the routing core.
//!
//! Handlers return `anyhow` errors; these enums cover the failures the core
//! itself produces so that the failure reporter can name their category.

use std::time::Duration;

use thiserror::Error;

/// Misuse of the identity store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// An accessor was used before `initialize`.
    #[error("identity store must be initialized before use")]
    NotInitialized,
    /// `initialize` was called a second time.
    #[error("identity store has already been initialized")]
    AlreadyInitialized,
    /// `initialize` received an unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Misuse of the reply channels of an interaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InteractionError {
    /// A direct reply (or deferral) was attempted after acknowledgment.
    #[error("interaction `{0}` has already been acknowledged")]
    AlreadyAcknowledged(String),
    /// A follow-up was attempted before acknowledgment.
    #[error("interaction `{0}` has not been acknowledged yet")]
    NotAcknowledged(String),
}

/// Failures the dispatcher synthesizes around a handler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The handler did not finish within the configured deadline.
    #[error("handler did not finish within {0:?}")]
    Timeout(Duration),
    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl DispatchError {
    /// Short category name shown to users.
    pub fn category(&self) -> &'static str {
        match self {
            DispatchError::Timeout(_) => "Timeout",
            DispatchError::Panicked(_) => "Panic",
        }
    }
}
