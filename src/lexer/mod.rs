mod error;
#[allow(clippy::module_inception)]
mod lexer;
mod token;

pub use error::{LexerError, LexerResult};
pub use lexer::Lexer;
pub use token::Token;
