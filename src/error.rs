use crate::types::{DataType, Rank};

pub type Result<T> = std::result::Result<T, CommError>;

#[derive(Debug, thiserror::Error)]
pub enum CommError {
    #[error("invalid rank {rank}: communicator size is {size}")]
    InvalidRank { rank: Rank, size: u32 },

    #[error("{operation} expects {expected} buffers, got {actual}")]
    BufferCountMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("element type mismatch: buffer holds {expected}, message carries {actual}")]
    TypeMismatch { expected: DataType, actual: DataType },

    #[error("no rank participates in the new communicator")]
    EmptyCommunicator,

    #[error("connection to rank {rank} failed: {reason}")]
    ConnectionFailed { rank: Rank, reason: String },

    #[error("peer {rank} disconnected unexpectedly")]
    PeerDisconnected { rank: Rank },

    #[error("protocol version mismatch: local={local}, remote={remote}")]
    ProtocolMismatch { local: u16, remote: u16 },

    #[error("handshake rejected: {0}")]
    HandshakeRejected(String),

    #[error("message decode failed: {0}")]
    DecodeFailed(String),

    #[error("message encode failed: {0}")]
    EncodeFailed(String),

    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{operation} failed at rank {rank}: {reason}")]
    CollectiveFailed {
        operation: &'static str,
        rank: Rank,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("internal lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl CommError {
    /// Create a `Transport` error with just a message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a `Transport` error with a message and a source error.
    pub fn transport_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Errors caused by the caller's arguments, reported before any I/O.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRank { .. }
                | Self::BufferCountMismatch { .. }
                | Self::TypeMismatch { .. }
                | Self::EmptyCommunicator
        )
    }
}
