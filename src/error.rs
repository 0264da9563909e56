//! Error types for resplink
//!
//! Every public operation returns [`ClientError`]. Wire-level decode problems
//! are described by [`ParsingFailure`] and wrapped into it.

use std::io;
use thiserror::Error;

/// Result type alias using ClientError
pub type Result<T> = std::result::Result<T, ClientError>;

/// Why a sequence of bytes could not become a reply value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsingFailure {
    #[error("unexpected leading byte 0x{0:02x}")]
    UnexpectedLeadingByte(u8),

    #[error("missing length after '{0}' marker")]
    TruncatedLength(char),

    #[error("non-numeric length field: {0:?}")]
    InvalidLength(String),

    #[error("non-numeric integer reply: {0:?}")]
    InvalidInteger(String),

    #[error("line is not terminated by CRLF")]
    MalformedTerminator,

    #[error("stream ended in the middle of a reply")]
    UnexpectedEof,

    #[error("declared length {declared} exceeds the maximum of {max} bytes")]
    Oversized { declared: i64, max: usize },

    #[error("arrays nested deeper than {max} levels")]
    TooDeep { max: usize },
}

impl ParsingFailure {
    /// True when the failed line was consumed whole, so the next reply still
    /// starts at a known position
    pub fn keeps_framing(&self) -> bool {
        matches!(
            self,
            ParsingFailure::UnexpectedLeadingByte(_) | ParsingFailure::InvalidInteger(_)
        )
    }
}

/// Unified error type for client operations
#[derive(Debug, Error)]
pub enum ClientError {
    // -------------------------------------------------------------------------
    // Wire Errors
    // -------------------------------------------------------------------------
    #[error("Parsing error: {0}")]
    Parse(#[from] ParsingFailure),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // -------------------------------------------------------------------------
    // Conversion Errors
    // -------------------------------------------------------------------------
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Integer parse error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Cannot convert {found} reply into {target}")]
    TypeMismatch {
        target: &'static str,
        found: &'static str,
    },

    #[error("Mapping conversion needs an even number of elements, got {0}")]
    OddMappingLength(usize),

    #[error("{0}")]
    Message(String),

    // -------------------------------------------------------------------------
    // Dispatch Errors
    // -------------------------------------------------------------------------
    #[error("Dispatch loop has terminated")]
    LoopTerminated,

    #[error("Reply receiver is gone")]
    ReceiverGone,

    #[error("Reply is not ready yet")]
    NotReady,

    #[error("Correlation id space exhausted")]
    IdSpaceExhausted,
}

impl ClientError {
    /// Build a generic message error
    pub fn message(msg: impl Into<String>) -> Self {
        ClientError::Message(msg.into())
    }

    /// True when the connection can no longer be used: a transport failure,
    /// or a decode failure after which the start of the next reply is unknown
    pub fn is_fatal(&self) -> bool {
        match self {
            ClientError::Io(_) => true,
            ClientError::Parse(failure) => !failure.keeps_framing(),
            _ => false,
        }
    }
}

// `io::Error` is not `Clone`; a transport failure has to reach every pending
// request, so the I/O arm is rebuilt from its kind and message.
impl Clone for ClientError {
    fn clone(&self) -> Self {
        match self {
            ClientError::Parse(e) => ClientError::Parse(e.clone()),
            ClientError::Io(e) => ClientError::Io(io::Error::new(e.kind(), e.to_string())),
            ClientError::Utf8(e) => ClientError::Utf8(*e),
            ClientError::ParseInt(e) => ClientError::ParseInt(e.clone()),
            ClientError::Server(msg) => ClientError::Server(msg.clone()),
            ClientError::TypeMismatch { target, found } => ClientError::TypeMismatch {
                target: *target,
                found: *found,
            },
            ClientError::OddMappingLength(n) => ClientError::OddMappingLength(*n),
            ClientError::Message(msg) => ClientError::Message(msg.clone()),
            ClientError::LoopTerminated => ClientError::LoopTerminated,
            ClientError::ReceiverGone => ClientError::ReceiverGone,
            ClientError::NotReady => ClientError::NotReady,
            ClientError::IdSpaceExhausted => ClientError::IdSpaceExhausted,
        }
    }
}
