mod error;
#[allow(clippy::module_inception)]
mod parser;
pub mod types;

pub use error::ParserError;
pub use parser::Parser;
