use thiserror::Error;

use crate::lexer::{LexerError, Token};

#[derive(Debug, PartialEq, Clone, Error)]
pub enum ParserError {
    #[error("expected token {0:?}, found {1:?}")]
    ExpectedToken(Token, Token),

    #[error("unexpected token {0:?}")]
    UnexpectedToken(Token),

    #[error("{0}")]
    SyntaxError(String),

    #[error(transparent)]
    Lexer(#[from] LexerError),
}

impl ParserError {
    pub fn syntax_error(msg: impl Into<String>) -> Self {
        Self::SyntaxError(msg.into())
    }
}
