use ractor::{MessagingErr, SpawnErr};
use thiserror::Error;

/// Common error types for the dispatch system
///
/// None of these are raised for message-level anomalies (unknown workers, work offered
/// to a busy worker, a full queue); those are logged and absorbed by the actors.
#[derive(Error, Debug, Clone)]
pub enum DispatchError {
    /// Configuration related errors
    #[error("{0}")]
    Configuration(String),

    /// Actor spawn errors
    #[error("{0}")]
    Spawn(String),

    /// Message delivery errors (the receiving mailbox is closed)
    #[error("{0}")]
    Messaging(String),

    /// Failure reported by a concrete work handler
    #[error("{0}")]
    Handler(String),

    /// Timeout errors
    #[error("{0}")]
    Timeout(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String)
}

/// Convert from anyhow::Error
impl From<anyhow::Error> for DispatchError {
    fn from(err: anyhow::Error) -> Self {
        DispatchError::Generic(err.to_string())
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for DispatchError {
    fn from(err: std::io::Error) -> Self {
        DispatchError::Configuration(err.to_string())
    }
}

/// Convert from serde_yaml::Error
impl From<serde_yaml::Error> for DispatchError {
    fn from(err: serde_yaml::Error) -> Self {
        DispatchError::Configuration(err.to_string())
    }
}

/// Convert from ractor::SpawnErr
impl From<SpawnErr> for DispatchError {
    fn from(err: SpawnErr) -> Self {
        DispatchError::Spawn(err.to_string())
    }
}

/// Convert from ractor::MessagingErr
impl<T> From<MessagingErr<T>> for DispatchError {
    fn from(err: MessagingErr<T>) -> Self {
        DispatchError::Messaging(err.to_string())
    }
}
