//! Call errors and their host-facing form

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Kind;

/// Coarse classification of a failed call, visible to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ArityError,
    TypeError,
    KeyParseError,
    CryptoOperationError,
    #[serde(rename = "StreamIOError")]
    StreamIoError,
    InternalFault,
    UnknownExport,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ArityError => "ArityError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::KeyParseError => "KeyParseError",
            ErrorKind::CryptoOperationError => "CryptoOperationError",
            ErrorKind::StreamIoError => "StreamIOError",
            ErrorKind::InternalFault => "InternalFault",
            ErrorKind::UnknownExport => "UnknownExport",
        };
        f.write_str(name)
    }
}

/// Everything that can make an exported call reject
///
/// Messages name the step that failed. They never carry plaintext or key
/// material; the `age` errors wrapped here only describe what went wrong.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("expected {expected} arguments, got {got}")]
    Arity { expected: usize, got: usize },
    #[error("expected argument {position} to be {expected}, got {found}")]
    Type {
        position: usize,
        expected: &'static str,
        found: Kind,
    },
    /// `position` is 1-based, `index` is 0-based within the array
    #[error(
        "expected argument {position} to be {expected}, element at index {index} is {found}"
    )]
    ElementType {
        position: usize,
        expected: &'static str,
        index: usize,
        found: Kind,
    },
    #[error("failed to parse private key: {0}")]
    IdentityParse(String),
    #[error("recipient #{index} could not be parsed as an age public key: {reason}")]
    RecipientParse { index: usize, reason: String },
    #[error("failed to start age writer: {0}")]
    EncryptStart(#[source] age::EncryptError),
    #[error("failed to decrypt text: {0}")]
    Decrypt(#[source] age::DecryptError),
    #[error("{context}: {source}")]
    Stream {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("internal fault: {0}")]
    InternalFault(String),
    #[error("unknown export: {0}")]
    UnknownExport(String),
}

impl CallError {
    pub fn stream(context: &'static str, source: std::io::Error) -> Self {
        CallError::Stream { context, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CallError::Arity { .. } => ErrorKind::ArityError,
            CallError::Type { .. } | CallError::ElementType { .. } => ErrorKind::TypeError,
            CallError::IdentityParse(_) | CallError::RecipientParse { .. } => {
                ErrorKind::KeyParseError
            }
            CallError::EncryptStart(_) | CallError::Decrypt(_) => ErrorKind::CryptoOperationError,
            CallError::Stream { .. } => ErrorKind::StreamIoError,
            CallError::InternalFault(_) => ErrorKind::InternalFault,
            CallError::UnknownExport(_) => ErrorKind::UnknownExport,
        }
    }
}

/// The error object a rejected promise carries back to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct HostError {
    pub kind: ErrorKind,
    pub message: String,
}

impl HostError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InternalFault,
            message: message.into(),
        }
    }
}

impl From<CallError> for HostError {
    fn from(err: CallError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_messages_name_the_failing_step() {
        let err = CallError::Arity {
            expected: 2,
            got: 1,
        };
        assert_eq!(err.to_string(), "expected 2 arguments, got 1");
        assert_eq!(err.kind(), ErrorKind::ArityError);

        let err = CallError::Type {
            position: 1,
            expected: "a string",
            found: Kind::Number,
        };
        assert_eq!(
            err.to_string(),
            "expected argument 1 to be a string, got number"
        );

        let err = CallError::ElementType {
            position: 2,
            expected: "an array of strings",
            index: 3,
            found: Kind::Number,
        };
        assert_eq!(
            err.to_string(),
            "expected argument 2 to be an array of strings, element at index 3 is number"
        );

        let err = CallError::RecipientParse {
            index: 3,
            reason: "invalid Bech32 encoding".to_string(),
        };
        assert!(err.to_string().starts_with("recipient #3 could not be parsed"));
        assert_eq!(err.kind(), ErrorKind::KeyParseError);
    }

    #[test]
    fn test_host_error_keeps_kind_and_message() {
        let err = CallError::stream(
            "failed to close age encryptor",
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"),
        );
        let host = HostError::from(err);
        assert_eq!(host.kind, ErrorKind::StreamIoError);
        assert_eq!(host.message, "failed to close age encryptor: pipe closed");
        assert_eq!(
            host.to_string(),
            "StreamIOError: failed to close age encryptor: pipe closed"
        );
    }

    #[test]
    fn test_kind_serializes_as_displayed() {
        let host = HostError {
            kind: ErrorKind::StreamIoError,
            message: "x".to_string(),
        };
        let json = serde_json::to_value(&host).unwrap();
        assert_eq!(json["kind"], "StreamIOError");
        assert_eq!(json["kind"], ErrorKind::StreamIoError.to_string());

        let back: HostError = serde_json::from_value(json).unwrap();
        assert_eq!(back, host);
    }
}
