//! Error types for grammar compilation and scanning.
//!
//! Every error is fatal: a scan either yields a complete tree or fails, and a
//! failed scan is never resumed.

use std::fmt;

use thiserror::Error;

/// A location in the query: byte offset plus 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    /// Counted in chars, not bytes.
    pub column: usize,
}

impl Position {
    pub const START: Position = Position { offset: 0, line: 1, column: 1 };
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Why a grammar context failed to compile.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileCause {
    #[error("rule '{rule}' has an invalid pattern: {source}")]
    InvalidPattern { rule: &'static str, source: regex::Error },

    #[error("rule '{0}' is declared more than once")]
    DuplicateRule(&'static str),

    #[error("rule '{0}' can match a line break but does not declare spans_lines")]
    UndeclaredLineBreak(&'static str),

    #[error("context has no rules")]
    EmptyContext,

    #[error("failed to build the context matcher: {0}")]
    Matcher(regex::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("unknown grammar context '{0}'")]
    UnknownContext(String),

    #[error("grammar context '{0}' is declared more than once")]
    DuplicateContext(String),

    #[error("error while building context '{context}': {cause}")]
    GrammarCompile { context: String, cause: CompileCause },

    #[error("invalid syntax at {position} near '{remaining}' (context={context})")]
    Syntax { position: Position, remaining: String, context: String },

    #[error("rule '{rule}' closed context '{context}' at {position}, but there is no enclosing level")]
    UnbalancedContext { rule: &'static str, context: String, position: Position },

    #[error("input ended inside context '{context}' ({depth} level(s) still open)")]
    UnterminatedContext { context: String, depth: usize },

    #[error("scanner stopped making progress at {position} (context={context})")]
    NoProgress { position: Position, context: String },

    #[error("scan exceeded the limit of {limit} steps at {position}")]
    StepLimitExceeded { limit: usize, position: Position },
}

impl Error {
    /// Where in the query the scan stopped, for errors raised mid-scan.
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::Syntax { position, .. }
            | Error::UnbalancedContext { position, .. }
            | Error::NoProgress { position, .. }
            | Error::StepLimitExceeded { position, .. } => Some(*position),
            Error::UnknownContext(_)
            | Error::DuplicateContext(_)
            | Error::GrammarCompile { .. }
            | Error::UnterminatedContext { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_context_and_position() {
        let err = Error::Syntax {
            position: Position { offset: 3, line: 1, column: 4 },
            remaining: "]".into(),
            context: "attribute_value".into(),
        };
        assert_eq!(err.to_string(), "invalid syntax at 1:4 near ']' (context=attribute_value)");
        assert_eq!(err.position(), Some(Position { offset: 3, line: 1, column: 4 }));
    }

    #[test]
    fn end_of_input_errors_have_no_position() {
        let err = Error::UnterminatedContext { context: "has".into(), depth: 3 };
        assert_eq!(err.position(), None);
        assert_eq!(err.to_string(), "input ended inside context 'has' (3 level(s) still open)");
    }
}
