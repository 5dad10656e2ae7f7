/// Error taxonomy for the client core
///
/// Every failure is caught at the operation that caused it (load, mutation,
/// image stage) and kept next to the state it belongs to. Errors are `Clone`
/// because they travel inside UI messages.

use std::collections::BTreeMap;
use thiserror::Error;

/// Coarse classification used by the UI and by logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network unreachable, timeout, or a non-success status
    Transport,
    /// Malformed JSON or an image payload that cannot be decoded
    Decode,
    /// The server rejected the submitted record
    Validation,
    /// A client-side rule stopped the action before anything was sent
    Interaction,
}

impl ErrorKind {
    /// Short heading shown in front of the error message
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Transport => "Connection problem",
            ErrorKind::Decode => "Unreadable data",
            ErrorKind::Validation => "Rejected by the server",
            ErrorKind::Interaction => "Not possible right now",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server responded with status {status}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("image could not be decoded: {0}")]
    Image(String),

    #[error("server rejected the record: {message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("`{0}` is not a valid date (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("the {open} dialog is already open")]
    DialogBusy { open: &'static str },

    #[error("no dialog is open")]
    NoDialog,

    #[error("record #{0} is not in the list")]
    UnknownRecord(i64),

    #[error("a request for {0} is still in flight")]
    MutationInFlight(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Transport(_) | ClientError::Status { .. } => ErrorKind::Transport,
            ClientError::Decode(_) | ClientError::Image(_) => ErrorKind::Decode,
            ClientError::Validation { .. } => ErrorKind::Validation,
            ClientError::MissingField(_)
            | ClientError::InvalidDate(_)
            | ClientError::DialogBusy { .. }
            | ClientError::NoDialog
            | ClientError::UnknownRecord(_)
            | ClientError::MutationInFlight(_) => ErrorKind::Interaction,
        }
    }

    /// Server-side messages for one form field, if the server sent any
    pub fn field_messages(&self, field: &str) -> &[String] {
        match self {
            ClientError::Validation { fields, .. } => {
                fields.get(field).map(Vec::as_slice).unwrap_or(&[])
            }
            _ => &[],
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
