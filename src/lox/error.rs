use thiserror::Error;
use crate::lox::interpreter::RuntimeError;
use crate::lox::lexer::LexerError;
use crate::lox::parser::ParseError;

/// Everything that can stop a source text from running to completion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoxError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error("{} parse error(s)", .0.len())]
    Parse(Vec<ParseError>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl From<Vec<ParseError>> for LoxError {
    fn from(errors: Vec<ParseError>) -> Self {
        LoxError::Parse(errors)
    }
}

impl LoxError {
    /// Lexical and parse errors are static: the program never started running.
    pub fn is_static(&self) -> bool {
        !matches!(self, LoxError::Runtime(_))
    }
}
