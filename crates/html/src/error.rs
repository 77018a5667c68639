//! HTML parsing error types

use thiserror::Error;

/// HTML parsing result type
pub type HtmlResult<T> = Result<T, HtmlError>;

/// HTML parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HtmlError {
    #[error("Unexpected end of input inside {0}")]
    UnexpectedEof(&'static str),

    #[error("Invalid tag name: {0}")]
    InvalidTagName(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
