//! Error types for sandpass

use thiserror::Error;

/// Main error type for sandpass operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures while obtaining or exercising an access grant
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("empty target path")]
    EmptyTarget,

    #[error("no existing ancestor for target: {0}")]
    TargetUnresolvable(String),

    #[error("no persisted grant covers: {0}")]
    NotGranted(String),

    #[error("user declined the access prompt")]
    UserDeclined,

    #[error("chosen path does not cover the target: {0}")]
    SelectionRejected(String),

    #[error("persisted grant no longer resolves: {0}")]
    GrantResolutionFailed(String),

    #[error("no live access to: {0}")]
    NoCurrentAccess(String),
}

/// Grant store errors
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("corrupt grant record: {0}")]
    Corrupt(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;
