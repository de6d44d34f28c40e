/// Low-level transport errors (RocksDB, serialization, session locks).
/// This is the error type for the `QueueTransport` trait. Transport calls can
/// only fail with infrastructure errors, never with domain outcomes such as
/// "not found".
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("rocksdb error: {0}")]
    RocksDb(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt data: {0}")]
    CorruptData(String),

    #[error("session is locked by another receiver: {0}")]
    SessionLocked(String),

    #[error("session not held: {0}")]
    SessionNotFound(String),
}

impl From<rocksdb::Error> for TransportError {
    fn from(err: rocksdb::Error) -> Self {
        TransportError::RocksDb(err.into_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Serialization(err.to_string())
    }
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// A lookup request that cannot be turned into a match predicate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredicateError {
    #[error("provide a message id or an order number")]
    MissingLookupKey,

    #[error("message id must not be empty")]
    EmptyMessageId,
}

// --- Per-operation error types ---

#[derive(Debug, thiserror::Error)]
pub enum FindError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("queue configuration unavailable: {0}")]
    Configuration(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<PredicateError> for FindError {
    fn from(err: PredicateError) -> Self {
        FindError::Validation(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("queue configuration unavailable: {0}")]
    Configuration(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, thiserror::Error)]
pub enum RequeueError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("queue configuration unavailable: {0}")]
    Configuration(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<PredicateError> for RequeueError {
    fn from(err: PredicateError) -> Self {
        RequeueError::Validation(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("queue configuration unavailable: {0}")]
    Configuration(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("queue configuration unavailable: {0}")]
    Configuration(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors raised while loading `SondaConfig` from disk.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("error reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
