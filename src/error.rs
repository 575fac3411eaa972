use std::io;

use thiserror::Error as ThisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source ended while a token or container was still open.
    Truncated,
    /// An unexpected byte where a structural token was required.
    Malformed,
    /// A member name with no matching field on the target type.
    UnknownMember,
    /// The JSON value does not fit the declared member type.
    Mismatch,
    InvalidString,
    InvalidNumber,
    InvalidDate,
    DepthLimit,
    Io,
}

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub offset: Option<u64>,
    #[source]
    source: Option<io::Error>,
}

impl Error {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            offset: None,
            source: None,
        }
    }

    pub fn truncated(context: &'static str) -> Self {
        Self::new(
            ErrorKind::Truncated,
            format!("truncated input: unexpected end of data in {context}"),
        )
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Malformed, message)
    }

    pub fn unexpected_byte(byte: u8, expected: &'static str) -> Self {
        Self::malformed(format!(
            "unexpected byte {:?} where {expected} was required",
            char::from(byte)
        ))
    }

    pub fn unknown_member(type_name: &str, member: &str) -> Self {
        Self::new(
            ErrorKind::UnknownMember,
            format!("no member named {member:?} on {type_name}"),
        )
    }

    pub fn mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::new(
            ErrorKind::Mismatch,
            format!("type mismatch: expected {expected}, found {found}"),
        )
    }

    pub fn unknown_variant(type_name: &str, literal: &str) -> Self {
        Self::new(
            ErrorKind::Mismatch,
            format!("{literal:?} is not a variant of {type_name}"),
        )
    }

    /// `null` for a member type that has no empty value.
    pub fn unexpected_null(type_name: &str) -> Self {
        Self::new(
            ErrorKind::Mismatch,
            format!("null is not a {type_name}; declare the member as Option<{type_name}>"),
        )
    }

    pub fn invalid_string(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidString, message)
    }

    pub fn invalid_number(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidNumber, message)
    }

    pub fn invalid_date(literal: &str, err: chrono::ParseError) -> Self {
        Self::new(
            ErrorKind::InvalidDate,
            format!("invalid timestamp {literal:?}: {err}"),
        )
    }

    pub fn depth_limit(max_depth: usize) -> Self {
        Self::new(
            ErrorKind::DepthLimit,
            format!("nesting deeper than {max_depth} levels"),
        )
    }

    pub fn io(err: io::Error) -> Self {
        Self {
            kind: ErrorKind::Io,
            message: format!("read failed: {err}"),
            offset: None,
            source: Some(err),
        }
    }

    /// Attaches the absolute source offset unless one is already recorded.
    pub fn at(mut self, offset: u64) -> Self {
        if self.offset.is_none() {
            self.offset = Some(offset);
        }
        self
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err)
    }
}
