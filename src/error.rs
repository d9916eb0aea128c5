use std::fmt;
use thiserror::Error;

/// Line/column position in script source, both 1-based
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Every failure the lexer, parser or interpreter can raise.
///
/// All of them are fatal to the run. Built-ins that report soft failures
/// (`getline` returning `-1`, `index` returning an empty string) do so through
/// their return value instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("lexer error at {location}: {message}")]
    Lexer {
        message: String,
        location: SourceLocation,
    },

    #[error("parse error at {location}: {message}")]
    Parser {
        message: String,
        location: SourceLocation,
    },

    #[error("runtime error: {message}")]
    Runtime { message: String },

    #[error("runtime error at {location}: {message}")]
    RuntimeWithLocation {
        message: String,
        location: SourceLocation,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    pub fn lexer(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::Lexer {
            message: message.into(),
            location: SourceLocation::new(line, column),
        }
    }

    pub fn parser(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::Parser {
            message: message.into(),
            location,
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// Runtime error pinned to a node; falls back to [`Error::Runtime`] for
    /// nodes that carry no position.
    pub fn runtime_at(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        match location {
            Some(location) => Self::RuntimeWithLocation {
                message: message.into(),
                location,
            },
            None => Self::runtime(message),
        }
    }

    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Self::Lexer { location, .. }
            | Self::Parser { location, .. }
            | Self::RuntimeWithLocation { location, .. } => Some(*location),
            _ => None,
        }
    }

    /// True for errors raised while evaluating a program (as opposed to
    /// reading or parsing it).
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            Self::Runtime { .. } | Self::RuntimeWithLocation { .. } | Self::Regex(_)
        )
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
