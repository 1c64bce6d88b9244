/// The Python token vocabulary, as far as the analyzer needs it. Numbers keep
/// their raw text: nothing downstream ever evaluates one.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Identifier(String),
    Number(String),
    StringLiteral(String),
    BytesLiteral(String),
    /// An f-string, kept as raw body text. Embedded expressions are opaque to
    /// the analyzer, matching how attribute usage is collected.
    FStringLiteral(String),
    BooleanLiteral(bool),
    None,

    // Keywords
    And,
    As,
    Assert,
    Async,
    Await,
    Break,
    Class,
    Continue,
    Def,
    Del,
    Elif,
    Else,
    Except,
    Finally,
    For,
    From,
    Global,
    If,
    Import,
    In,
    Is,
    Lambda,
    Nonlocal,
    Not,
    Or,
    Pass,
    Raise,
    Return,
    Try,
    While,
    With,
    Yield,

    // Operators
    Plus,
    Minus,
    Asterisk,
    DoubleAsterisk,
    Slash,
    DoubleSlash,
    Modulo,
    AtSign,
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    LeftShift,
    RightShift,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
    Walrus,
    ReturnTypeArrow,
    Ellipsis,

    // Assignment
    Assign,
    PlusEquals,
    MinusEquals,
    AsteriskEquals,
    SlashEquals,
    DoubleSlashEquals,
    ModEquals,
    AtEquals,
    AmpersandEquals,
    PipeEquals,
    CaretEquals,
    LeftShiftEquals,
    RightShiftEquals,
    DoubleAsteriskEquals,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Semicolon,

    // Structure
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl Token {
    pub fn is_compound_assign(&self) -> bool {
        matches!(
            self,
            Token::PlusEquals
                | Token::MinusEquals
                | Token::AsteriskEquals
                | Token::SlashEquals
                | Token::DoubleSlashEquals
                | Token::ModEquals
                | Token::AtEquals
                | Token::AmpersandEquals
                | Token::PipeEquals
                | Token::CaretEquals
                | Token::LeftShiftEquals
                | Token::RightShiftEquals
                | Token::DoubleAsteriskEquals
        )
    }

    /// Tokens that can continue a flat operand chain. `not` and `is` are
    /// handled separately by the parser since they pair up (`not in`,
    /// `is not`).
    pub fn is_binary_connector(&self) -> bool {
        matches!(
            self,
            Token::Plus
                | Token::Minus
                | Token::Asterisk
                | Token::DoubleAsterisk
                | Token::Slash
                | Token::DoubleSlash
                | Token::Modulo
                | Token::AtSign
                | Token::Ampersand
                | Token::Pipe
                | Token::Caret
                | Token::LeftShift
                | Token::RightShift
                | Token::LessThan
                | Token::GreaterThan
                | Token::LessThanOrEqual
                | Token::GreaterThanOrEqual
                | Token::Equal
                | Token::NotEqual
                | Token::And
                | Token::Or
                | Token::In
        )
    }
}
