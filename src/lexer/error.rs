use thiserror::Error;

#[derive(Debug, PartialEq, Clone, Error)]
pub enum LexerError {
    #[error("unexpected character: {0:?}")]
    UnexpectedCharacter(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unindent does not match any outer indentation level")]
    InconsistentDedent,
}

pub type LexerResult<T> = Result<T, LexerError>;
