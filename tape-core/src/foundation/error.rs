use std::io;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ConfigError,
    InvalidThreshold,
    RequestBuildFailed,
    SigningFailed,
    EnvelopeBuildFailed,
    EndorsementRejected,
    ConnectionFailed,
    StreamClosed,
    ProtocolViolation,
    BroadcastFailed,
    ObserversExhausted,
    InsufficientCommitters,
    Cancelled,
    InvalidStateTransition,
    CryptoError,
    EncodingError,
    SerializationError,
    IoError,
    Message,
}

#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub code: ErrorCode,
    pub message: String,
}

/// Failure taxonomy of a run.
///
/// Per-transaction failures (request/proposal/envelope build, endorsement rejection) abandon a
/// single transaction. Everything else is fatal and ends the run.
#[derive(Debug, Error)]
pub enum TapeError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("invalid commit threshold {threshold} for {committers} committers")]
    InvalidThreshold { threshold: usize, committers: usize },

    #[error("failed to build request seq={seq}: {details}")]
    RequestBuildFailed { seq: u64, details: String },

    #[error("signing failed for tx {tx_id} (endorser {endorser}): {details}")]
    SigningFailed { tx_id: String, endorser: String, details: String },

    #[error("failed to build envelope for tx {tx_id}: {details}")]
    EnvelopeBuildFailed { tx_id: String, details: String },

    #[error("endorser {endorser} rejected tx {tx_id}: {reason}")]
    EndorsementRejected { tx_id: String, endorser: String, reason: String },

    #[error("connection to {node} failed during {operation}: {details}")]
    ConnectionFailed { node: String, operation: String, details: String },

    #[error("stream from {node} closed unexpectedly")]
    StreamClosed { node: String },

    #[error("protocol violation from {node}: {details}")]
    ProtocolViolation { node: String, details: String },

    #[error("broadcast to {orderer} failed: {details}")]
    BroadcastFailed { orderer: String, details: String },

    #[error("all block streams ended after {committed} of {target} committed transactions")]
    ObserversExhausted { committed: usize, target: usize },

    #[error("only {live} committer streams left, {required} required; {committed} of {target} committed")]
    InsufficientCommitters { live: usize, required: usize, committed: usize, target: usize },

    #[error("run cancelled")]
    Cancelled,

    #[error("invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("crypto error during {operation}: {details}")]
    CryptoError { operation: String, details: String },

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("{format} serialization error: {details}")]
    SerializationError { format: String, details: String },

    #[error("io error during {operation}: {details}")]
    IoError { operation: String, details: String },

    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, TapeError>;

impl TapeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TapeError::ConfigError(_) => ErrorCode::ConfigError,
            TapeError::InvalidThreshold { .. } => ErrorCode::InvalidThreshold,
            TapeError::RequestBuildFailed { .. } => ErrorCode::RequestBuildFailed,
            TapeError::SigningFailed { .. } => ErrorCode::SigningFailed,
            TapeError::EnvelopeBuildFailed { .. } => ErrorCode::EnvelopeBuildFailed,
            TapeError::EndorsementRejected { .. } => ErrorCode::EndorsementRejected,
            TapeError::ConnectionFailed { .. } => ErrorCode::ConnectionFailed,
            TapeError::StreamClosed { .. } => ErrorCode::StreamClosed,
            TapeError::ProtocolViolation { .. } => ErrorCode::ProtocolViolation,
            TapeError::BroadcastFailed { .. } => ErrorCode::BroadcastFailed,
            TapeError::ObserversExhausted { .. } => ErrorCode::ObserversExhausted,
            TapeError::InsufficientCommitters { .. } => ErrorCode::InsufficientCommitters,
            TapeError::Cancelled => ErrorCode::Cancelled,
            TapeError::InvalidStateTransition { .. } => ErrorCode::InvalidStateTransition,
            TapeError::CryptoError { .. } => ErrorCode::CryptoError,
            TapeError::EncodingError(_) => ErrorCode::EncodingError,
            TapeError::SerializationError { .. } => ErrorCode::SerializationError,
            TapeError::IoError { .. } => ErrorCode::IoError,
            TapeError::Message(_) => ErrorCode::Message,
        }
    }

    pub fn context(&self) -> ErrorContext {
        ErrorContext { code: self.code(), message: self.to_string() }
    }

    /// Returns false for failures scoped to a single transaction.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            TapeError::RequestBuildFailed { .. }
                | TapeError::SigningFailed { .. }
                | TapeError::EnvelopeBuildFailed { .. }
                | TapeError::EndorsementRejected { .. }
        )
    }

    pub fn connection_failed(node: impl Into<String>, operation: impl Into<String>, details: impl ToString) -> Self {
        TapeError::ConnectionFailed { node: node.into(), operation: operation.into(), details: details.to_string() }
    }

    pub fn protocol_violation(node: impl Into<String>, details: impl Into<String>) -> Self {
        TapeError::ProtocolViolation { node: node.into(), details: details.into() }
    }
}

impl From<hex::FromHexError> for TapeError {
    fn from(err: hex::FromHexError) -> Self {
        TapeError::EncodingError(format!("hex decode error: {}", err))
    }
}

impl From<bincode::Error> for TapeError {
    fn from(err: bincode::Error) -> Self {
        TapeError::SerializationError { format: "bincode".to_string(), details: err.to_string() }
    }
}

impl From<serde_json::Error> for TapeError {
    fn from(err: serde_json::Error) -> Self {
        TapeError::SerializationError { format: "json".to_string(), details: err.to_string() }
    }
}

impl From<figment::Error> for TapeError {
    fn from(err: figment::Error) -> Self {
        TapeError::ConfigError(format!("config extraction failed: {err}"))
    }
}

impl From<io::Error> for TapeError {
    fn from(err: io::Error) -> Self {
        TapeError::IoError { operation: "io".to_string(), details: err.to_string() }
    }
}

#[macro_export]
macro_rules! io_err {
    ($op:expr, $err:expr) => {
        $crate::foundation::TapeError::IoError { operation: $op.into(), details: $err.to_string() }
    };
}
