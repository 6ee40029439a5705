use crate::lexer::LexError;
use crate::parser::ParserError;
use thiserror::Error;

/// Fatal errors that stop a minification run.
///
/// Everything the core merely notices (unused names, undeclared references and
/// the like) goes through the diagnostic handler instead.
#[derive(Debug, Error)]
pub enum CompilationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Lex(#[from] LexError),

    #[error("{0}")]
    Parse(#[from] ParserError),
}
