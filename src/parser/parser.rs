use crate::{
    core::{log, LogLevel},
    lexer::{Lexer, Token},
    parser::{types::Ast, ParserError},
};

mod expr;
mod import;
mod stmt;

/// A recursive-descent parser over an eagerly lexed token stream.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    pub fn from_text(text: &str) -> Result<Self, ParserError> {
        Ok(Self::new(Lexer::tokenize(text)?))
    }

    /// Return the full AST. This consumes all the tokens.
    pub fn parse(&mut self) -> Result<Ast, ParserError> {
        self.consume_newlines();
        let stmts = self.parse_statements_until(|tok| matches!(tok, Token::Eof))?;
        self.consume(&Token::Eof)?;
        Ok(stmts)
    }

    pub(crate) fn parse_block(&mut self) -> Result<Ast, ParserError> {
        if self.current_token() == &Token::Newline {
            self.consume_current();
            self.consume_newlines();
            self.parse_indented_block()
        } else {
            self.parse_single_line_block()
        }
    }

    fn parse_indented_block(&mut self) -> Result<Ast, ParserError> {
        self.consume(&Token::Indent)?;
        self.consume_newlines();

        let stmts = self.parse_statements_until(|tok| matches!(tok, Token::Dedent))?;
        self.consume(&Token::Dedent)?;
        Ok(stmts)
    }

    /// Support single-line blocks: `if x: a = 1; b = 2`.
    fn parse_single_line_block(&mut self) -> Result<Ast, ParserError> {
        let stmts = self.parse_statements_until(|tok| {
            matches!(tok, Token::Newline | Token::Dedent | Token::Eof)
        })?;
        self.consume_optional(&Token::Newline);
        Ok(stmts)
    }

    fn parse_statements_until<F>(&mut self, is_terminator: F) -> Result<Ast, ParserError>
    where
        F: Fn(&Token) -> bool,
    {
        let mut stmts = vec![];
        while !is_terminator(self.current_token()) {
            stmts.push(self.parse_statement()?);

            while matches!(self.current_token(), Token::Newline | Token::Semicolon) {
                if is_terminator(self.current_token()) {
                    break;
                }
                self.consume_current();
            }
        }
        Ok(stmts)
    }

    fn current_token(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self, ahead: usize) -> &Token {
        let idx = self.pos + ahead;
        &self.tokens[idx.min(self.tokens.len() - 1)]
    }

    fn end_of_statement(&self) -> bool {
        matches!(
            self.current_token(),
            Token::Newline | Token::Semicolon | Token::Dedent | Token::Eof
        )
    }

    fn consume_newlines(&mut self) {
        while self.current_token() == &Token::Newline {
            self.consume_current();
        }
    }

    fn consume_current(&mut self) {
        log(LogLevel::Trace, || {
            format!("consume: {:?}", self.current_token())
        });
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn consume(&mut self, expected: &Token) -> Result<(), ParserError> {
        if self.current_token() != expected {
            return Err(ParserError::ExpectedToken(
                expected.clone(),
                self.current_token().clone(),
            ));
        }
        self.consume_current();
        Ok(())
    }

    fn consume_optional(&mut self, expected: &Token) {
        if self.current_token() == expected {
            self.consume_current();
        }
    }

    /// Parse a `Token::Identifier` without any semantic analysis.
    fn parse_identifier(&mut self) -> Result<String, ParserError> {
        match self.current_token().clone() {
            Token::Identifier(ident) => {
                self.consume_current();
                Ok(ident)
            }
            _ => Err(ParserError::syntax_error("invalid identifier")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::*;

    pub(crate) fn parse(input: &str) -> Ast {
        match Parser::from_text(input).and_then(|mut p| p.parse()) {
            Ok(ast) => ast,
            Err(e) => panic!("parser error: {e:?}"),
        }
    }

    pub(crate) fn expect_error(input: &str) -> ParserError {
        match Parser::from_text(input).and_then(|mut p| p.parse()) {
            Ok(_) => panic!("expected a ParserError"),
            Err(e) => e,
        }
    }

    #[test]
    fn empty_module() {
        assert_eq!(parse(""), vec![]);
        assert_eq!(parse("\n\n# only a comment\n"), vec![]);
    }

    #[test]
    fn semicolon_separated_statements() {
        let ast = parse("a = 10; a\n");
        assert_eq!(ast.len(), 2);
        assert!(matches!(ast[1], Statement::Expression(Expr::Name(_))));
    }

    #[test]
    fn single_line_block() {
        let ast = parse("if True: a = 4\nelse: a = 6\n");
        let Statement::If {
            branches,
            else_block,
        } = &ast[0]
        else {
            panic!("expected an if statement");
        };
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].body.len(), 1);
        assert_eq!(else_block.as_ref().map(|b| b.len()), Some(1));
    }

    #[test]
    fn indented_blocks_nest() {
        let ast = parse("if a:\n    if b:\n        pass\n    c = 1\n");
        let Statement::If { branches, .. } = &ast[0] else {
            panic!("expected an if statement");
        };
        assert_eq!(branches[0].body.len(), 2);
    }

    #[test]
    fn stray_indent_is_an_error() {
        let e = expect_error("if True: a = 3\n    b = 8\n");
        assert_eq!(e, ParserError::UnexpectedToken(Token::Indent));
    }
}
