use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::grammar::ValueKind;

/// Result type alias for annotation parsing
pub type Result<T> = std::result::Result<T, Error>;

/// Location of a comment line in its source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    /// Source file the line was read from
    pub file: PathBuf,
    /// 1-based line number
    pub line: usize,
}

impl Position {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// Error types raised while parsing annotation blocks.
///
/// Every variant produced by the comment parser carries the position of the
/// offending line. All of them are fatal to the unit being parsed.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed embedded JSON or composite syntax
    #[error("{position}: parse error in {key}: {message}")]
    Parse {
        position: Position,
        key: String,
        message: String,
    },

    /// Value does not match the declared value kind
    #[error("{position}: {value:?} is not a valid {expected} for {key}")]
    Type {
        position: Position,
        key: String,
        value: String,
        expected: ValueKind,
    },

    /// Value outside the entry's closed set
    #[error("{position}: {value:?} is not one of [{}] for {key}", allowed.join(", "))]
    EnumViolation {
        position: Position,
        key: String,
        value: String,
        allowed: Vec<String>,
    },

    /// A unique (key, value) pair occurred twice in one session
    #[error("{second}: duplicate {key} {value:?}, first declared at {first}")]
    Duplicate {
        key: String,
        value: String,
        first: Position,
        second: Position,
    },

    /// Composite item with an unknown sub-key and nothing to continue onto
    #[error("{position}: unknown key {key:?} in {parent}")]
    UnknownGrammarKey {
        position: Position,
        parent: String,
        key: String,
    },

    /// Two route documents declare the same method and path
    #[error("{position}: route {method} {path} is already declared")]
    DuplicateRoute {
        position: Position,
        method: String,
        path: String,
    },
}

impl Error {
    /// Position of the line that raised this error.
    pub fn position(&self) -> &Position {
        match self {
            Error::Parse { position, .. }
            | Error::Type { position, .. }
            | Error::EnumViolation { position, .. }
            | Error::UnknownGrammarKey { position, .. }
            | Error::DuplicateRoute { position, .. } => position,
            Error::Duplicate { second, .. } => second,
        }
    }
}
