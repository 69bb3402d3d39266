//! Error types for path and handle operations

use std::fmt;
use std::io;
use thiserror::Error;

/// Why a segment was rejected by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidReason {
    /// The segment is the empty string
    Empty,
    /// The segment is a pseudo-segment or a reserved device name
    Reserved,
    /// The segment contains a forbidden character
    Char,
    /// The segment contains a separator where one is not allowed
    Separator,
    /// The segment ends in a forbidden suffix
    Suffix,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Reserved => "reserved",
            Self::Char => "char",
            Self::Separator => "separator",
            Self::Suffix => "suffix",
        };
        f.write_str(name)
    }
}

/// The error type for path and handle operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    /// A segment failed platform validation
    #[error("Invalid segment {segment:?} ({reason}{})", particular_suffix(.particular))]
    InvalidSegment {
        segment: String,
        reason: InvalidReason,
        particular: Option<String>,
    },

    /// A path was built from zero segments
    #[error("Empty paths are not allowed")]
    EmptyPath,

    /// A join would ascend past the root or past the available components
    #[error("Insufficient parents: {path} cannot give up {needed} more segment(s)")]
    InsufficientParents { path: String, needed: usize },

    /// The right-hand side of a join was absolute
    #[error("Cannot join absolute path {path} onto {base}")]
    AbsolutePath { base: String, path: String },

    /// A native call failed
    #[error("{call} failed: {}", os_message(.code))]
    Os { call: &'static str, code: i32 },

    /// The handle was already closed
    #[error("Handle is not open (during {operation})")]
    HandleClosed { operation: &'static str },

    /// A name read back from the OS is not valid UTF-8
    #[error("Name is not valid UTF-8: {name}")]
    InvalidEncoding { name: String },
}

fn os_message(code: &i32) -> io::Error {
    io::Error::from_raw_os_error(*code)
}

fn particular_suffix(particular: &Option<String>) -> String {
    match particular {
        Some(p) => format!(": {p:?}"),
        None => String::new(),
    }
}

impl PathError {
    pub(crate) fn invalid(segment: &str, reason: InvalidReason, particular: Option<&str>) -> Self {
        PathError::InvalidSegment {
            segment: segment.to_string(),
            reason,
            particular: particular.map(str::to_string),
        }
    }

    /// Capture `errno` for a failed native call
    pub(crate) fn last_os_error(call: &'static str) -> Self {
        PathError::Os {
            call,
            code: io::Error::last_os_error().raw_os_error().unwrap_or(0),
        }
    }

    /// The native error code, if this is an OS error
    pub fn os_code(&self) -> Option<i32> {
        match self {
            PathError::Os { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether this is an OS error reporting a missing file
    pub fn is_not_found(&self) -> bool {
        self.os_code()
            .map(|code| io::Error::from_raw_os_error(code).kind() == io::ErrorKind::NotFound)
            .unwrap_or(false)
    }
}

impl From<PathError> for io::Error {
    fn from(err: PathError) -> Self {
        match err {
            PathError::Os { code, .. } => io::Error::from_raw_os_error(code),
            other => io::Error::new(io::ErrorKind::InvalidInput, other),
        }
    }
}

/// Result type for path and handle operations
pub type Result<T> = std::result::Result<T, PathError>;
