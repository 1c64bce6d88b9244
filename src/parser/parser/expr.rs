use crate::{
    lexer::Token,
    parser::{types::*, Parser, ParserError},
};

impl Parser {
    /// Parse an expression at the statement level, where a bare comma builds
    /// a tuple.
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParserError> {
        let first = self.parse_simple_expr()?;
        if self.current_token() != &Token::Comma {
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.current_token() == &Token::Comma {
            self.consume_current();
            if !Self::starts_expression(self.current_token()) {
                break;
            }
            elements.push(self.parse_simple_expr()?);
        }
        Ok(Expr::Tuple(elements))
    }

    /// Parse a single expression, stopping at any comma.
    pub(crate) fn parse_simple_expr(&mut self) -> Result<Expr, ParserError> {
        match self.current_token() {
            Token::Lambda => self.parse_lambda(),
            Token::Await => {
                self.consume_current();
                Ok(Expr::Await(Box::new(self.parse_simple_expr()?)))
            }
            Token::Yield => {
                self.consume_current();
                if self.current_token() == &Token::From {
                    self.consume_current();
                    Ok(Expr::YieldFrom(Box::new(self.parse_simple_expr()?)))
                } else if Self::starts_expression(self.current_token()) {
                    Ok(Expr::Yield(Some(Box::new(self.parse_expr()?))))
                } else {
                    Ok(Expr::Yield(None))
                }
            }
            _ => self.parse_ternary(),
        }
    }

    fn parse_ternary(&mut self) -> Result<Expr, ParserError> {
        let if_value = self.parse_operand_chain()?;
        if self.current_token() != &Token::If {
            return Ok(if_value);
        }
        self.consume_current();
        let condition = self.parse_operand_chain()?;
        self.consume(&Token::Else)?;
        let else_value = self.parse_simple_expr()?;
        Ok(Expr::Ternary {
            condition: Box::new(condition),
            if_value: Box::new(if_value),
            else_value: Box::new(else_value),
        })
    }

    /// Collapse a run of binary, boolean and comparison operators into a flat
    /// operand list. Operator identity is dropped; only the operands matter
    /// downstream.
    fn parse_operand_chain(&mut self) -> Result<Expr, ParserError> {
        let mut operands = vec![self.parse_unary()?];
        loop {
            match self.current_token() {
                tok if tok.is_binary_connector() => self.consume_current(),
                Token::Not if self.peek(1) == &Token::In => {
                    self.consume_current();
                    self.consume_current();
                }
                Token::Is => {
                    self.consume_current();
                    self.consume_optional(&Token::Not);
                }
                _ => break,
            }
            operands.push(self.parse_unary()?);
        }

        if operands.len() == 1 {
            Ok(operands.remove(0))
        } else {
            Ok(Expr::Operation(operands))
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParserError> {
        match self.current_token() {
            Token::Minus | Token::Plus | Token::Tilde | Token::Not => {
                self.consume_current();
                Ok(Expr::Unary(Box::new(self.parse_unary()?)))
            }
            Token::Asterisk => {
                self.consume_current();
                Ok(Expr::Starred(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.current_token() {
                Token::Dot => {
                    self.consume_current();
                    let attr = self.parse_identifier()?;
                    expr = Expr::Attribute {
                        object: Box::new(expr),
                        attr,
                    };
                }
                Token::LParen => {
                    self.consume_current();
                    let (args, kwargs) = self.parse_call_args()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        kwargs,
                    };
                }
                Token::LBracket => {
                    self.consume_current();
                    let index = self.parse_subscript_index()?;
                    expr = Expr::Subscript {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_atom(&mut self) -> Result<Expr, ParserError> {
        match self.current_token().clone() {
            Token::Identifier(name) => {
                self.consume_current();
                if self.current_token() == &Token::Walrus {
                    self.consume_current();
                    let value = self.parse_simple_expr()?;
                    Ok(Expr::Walrus {
                        target: name,
                        value: Box::new(value),
                    })
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Token::Number(text) => {
                self.consume_current();
                Ok(Expr::Number(text))
            }
            Token::StringLiteral(text) => {
                self.consume_current();
                // Adjacent string literals concatenate.
                let mut text = text;
                while let Token::StringLiteral(next) = self.current_token().clone() {
                    self.consume_current();
                    text.push_str(&next);
                }
                Ok(Expr::StringLiteral(text))
            }
            Token::BytesLiteral(text) => {
                self.consume_current();
                Ok(Expr::BytesLiteral(text))
            }
            Token::FStringLiteral(text) => {
                self.consume_current();
                Ok(Expr::FString(text))
            }
            Token::BooleanLiteral(value) => {
                self.consume_current();
                Ok(Expr::Boolean(value))
            }
            Token::None => {
                self.consume_current();
                Ok(Expr::None)
            }
            Token::Ellipsis => {
                self.consume_current();
                Ok(Expr::Ellipsis)
            }
            Token::Lambda => self.parse_lambda(),
            Token::LParen => self.parse_parenthesized(),
            Token::LBracket => self.parse_list_display(),
            Token::LBrace => self.parse_brace_display(),
            tok => Err(ParserError::UnexpectedToken(tok)),
        }
    }

    fn parse_parenthesized(&mut self) -> Result<Expr, ParserError> {
        self.consume(&Token::LParen)?;
        if self.current_token() == &Token::RParen {
            self.consume_current();
            return Ok(Expr::Tuple(vec![]));
        }

        let first = self.parse_simple_expr()?;
        match self.current_token() {
            Token::For | Token::Async => {
                let clauses = self.parse_comprehension_clauses()?;
                self.consume(&Token::RParen)?;
                Ok(Expr::GeneratorComprehension {
                    body: Box::new(first),
                    clauses,
                })
            }
            Token::Comma => {
                let mut elements = vec![first];
                while self.current_token() == &Token::Comma {
                    self.consume_current();
                    if self.current_token() == &Token::RParen {
                        break;
                    }
                    elements.push(self.parse_simple_expr()?);
                }
                self.consume(&Token::RParen)?;
                Ok(Expr::Tuple(elements))
            }
            _ => {
                self.consume(&Token::RParen)?;
                Ok(first)
            }
        }
    }

    fn parse_list_display(&mut self) -> Result<Expr, ParserError> {
        self.consume(&Token::LBracket)?;
        if self.current_token() == &Token::RBracket {
            self.consume_current();
            return Ok(Expr::List(vec![]));
        }

        let first = self.parse_simple_expr()?;
        if matches!(self.current_token(), Token::For | Token::Async) {
            let clauses = self.parse_comprehension_clauses()?;
            self.consume(&Token::RBracket)?;
            return Ok(Expr::ListComprehension {
                body: Box::new(first),
                clauses,
            });
        }

        let mut elements = vec![first];
        while self.current_token() == &Token::Comma {
            self.consume_current();
            if self.current_token() == &Token::RBracket {
                break;
            }
            elements.push(self.parse_simple_expr()?);
        }
        self.consume(&Token::RBracket)?;
        Ok(Expr::List(elements))
    }

    fn parse_brace_display(&mut self) -> Result<Expr, ParserError> {
        self.consume(&Token::LBrace)?;
        if self.current_token() == &Token::RBrace {
            self.consume_current();
            return Ok(Expr::Dict(vec![]));
        }

        // `**` can only open a dict display.
        if self.current_token() == &Token::DoubleAsterisk {
            let mut items = vec![self.parse_dict_item()?];
            while self.current_token() == &Token::Comma {
                self.consume_current();
                if self.current_token() == &Token::RBrace {
                    break;
                }
                items.push(self.parse_dict_item()?);
            }
            self.consume(&Token::RBrace)?;
            return Ok(Expr::Dict(items));
        }

        let first = self.parse_simple_expr()?;
        if self.current_token() == &Token::Colon {
            self.consume_current();
            let value = self.parse_simple_expr()?;
            if matches!(self.current_token(), Token::For | Token::Async) {
                let clauses = self.parse_comprehension_clauses()?;
                self.consume(&Token::RBrace)?;
                return Ok(Expr::DictComprehension {
                    key_body: Box::new(first),
                    value_body: Box::new(value),
                    clauses,
                });
            }

            let mut items = vec![DictItem::Pair(first, value)];
            while self.current_token() == &Token::Comma {
                self.consume_current();
                if self.current_token() == &Token::RBrace {
                    break;
                }
                items.push(self.parse_dict_item()?);
            }
            self.consume(&Token::RBrace)?;
            return Ok(Expr::Dict(items));
        }

        if matches!(self.current_token(), Token::For | Token::Async) {
            let clauses = self.parse_comprehension_clauses()?;
            self.consume(&Token::RBrace)?;
            return Ok(Expr::SetComprehension {
                body: Box::new(first),
                clauses,
            });
        }

        let mut elements = vec![first];
        while self.current_token() == &Token::Comma {
            self.consume_current();
            if self.current_token() == &Token::RBrace {
                break;
            }
            elements.push(self.parse_simple_expr()?);
        }
        self.consume(&Token::RBrace)?;
        Ok(Expr::Set(elements))
    }

    fn parse_dict_item(&mut self) -> Result<DictItem, ParserError> {
        if self.current_token() == &Token::DoubleAsterisk {
            self.consume_current();
            return Ok(DictItem::Unpack(self.parse_simple_expr()?));
        }
        let key = self.parse_simple_expr()?;
        self.consume(&Token::Colon)?;
        let value = self.parse_simple_expr()?;
        Ok(DictItem::Pair(key, value))
    }

    /// Parse arguments up to and including the closing paren. The opening
    /// paren has already been consumed.
    pub(crate) fn parse_call_args(
        &mut self,
    ) -> Result<(Vec<Expr>, Vec<KeywordArg>), ParserError> {
        let mut args = vec![];
        let mut kwargs = vec![];
        while self.current_token() != &Token::RParen {
            match self.current_token().clone() {
                Token::DoubleAsterisk => {
                    self.consume_current();
                    kwargs.push(KeywordArg {
                        name: None,
                        value: self.parse_simple_expr()?,
                    });
                }
                Token::Identifier(name) if self.peek(1) == &Token::Assign => {
                    self.consume_current();
                    self.consume_current();
                    kwargs.push(KeywordArg {
                        name: Some(name),
                        value: self.parse_simple_expr()?,
                    });
                }
                _ => {
                    let arg = self.parse_simple_expr()?;
                    if matches!(self.current_token(), Token::For | Token::Async) {
                        let clauses = self.parse_comprehension_clauses()?;
                        args.push(Expr::GeneratorComprehension {
                            body: Box::new(arg),
                            clauses,
                        });
                    } else {
                        args.push(arg);
                    }
                }
            }
            if self.current_token() != &Token::RParen {
                self.consume(&Token::Comma)?;
            }
        }
        self.consume(&Token::RParen)?;
        Ok((args, kwargs))
    }

    fn parse_subscript_index(&mut self) -> Result<Expr, ParserError> {
        let mut items = vec![self.parse_slice_item()?];
        while self.current_token() == &Token::Comma {
            self.consume_current();
            if self.current_token() == &Token::RBracket {
                break;
            }
            items.push(self.parse_slice_item()?);
        }
        self.consume(&Token::RBracket)?;

        if items.len() == 1 {
            Ok(items.remove(0))
        } else {
            Ok(Expr::Tuple(items))
        }
    }

    fn parse_slice_item(&mut self) -> Result<Expr, ParserError> {
        let start = if self.current_token() == &Token::Colon {
            None
        } else {
            Some(self.parse_simple_expr()?)
        };

        if self.current_token() != &Token::Colon {
            return match start {
                Some(expr) => Ok(expr),
                None => Err(ParserError::syntax_error("empty subscript")),
            };
        }
        self.consume_current();

        let stop = if matches!(
            self.current_token(),
            Token::Colon | Token::Comma | Token::RBracket
        ) {
            None
        } else {
            Some(self.parse_simple_expr()?)
        };
        let step = if self.current_token() == &Token::Colon {
            self.consume_current();
            if matches!(self.current_token(), Token::Comma | Token::RBracket) {
                None
            } else {
                Some(self.parse_simple_expr()?)
            }
        } else {
            None
        };

        Ok(Expr::Slice {
            start: start.map(Box::new),
            stop: stop.map(Box::new),
            step: step.map(Box::new),
        })
    }

    pub(crate) fn parse_comprehension_clauses(&mut self) -> Result<Vec<ForClause>, ParserError> {
        let mut clauses = vec![];
        loop {
            self.consume_optional(&Token::Async);
            self.consume(&Token::For)?;
            let target = self.parse_target_list()?;
            self.consume(&Token::In)?;
            // The iterable and conditions stop short of ternaries so that
            // `if` always opens a condition here.
            let iterable = self.parse_operand_chain()?;
            let mut conditions = vec![];
            while self.current_token() == &Token::If {
                self.consume_current();
                conditions.push(self.parse_operand_chain()?);
            }
            clauses.push(ForClause {
                target,
                iterable,
                conditions,
            });

            if !matches!(self.current_token(), Token::For | Token::Async) {
                break;
            }
        }
        Ok(clauses)
    }

    /// Parse assignment targets for `for`, `with ... as` and comprehensions,
    /// where a chain operator like `in` must not be consumed.
    pub(crate) fn parse_target_list(&mut self) -> Result<Expr, ParserError> {
        let first = self.parse_target()?;
        if self.current_token() != &Token::Comma {
            return Ok(first);
        }

        let mut targets = vec![first];
        while self.current_token() == &Token::Comma {
            self.consume_current();
            if !Self::starts_expression(self.current_token()) {
                break;
            }
            targets.push(self.parse_target()?);
        }
        Ok(Expr::Tuple(targets))
    }

    pub(crate) fn parse_target(&mut self) -> Result<Expr, ParserError> {
        if self.current_token() == &Token::Asterisk {
            self.consume_current();
            return Ok(Expr::Starred(Box::new(self.parse_target()?)));
        }
        self.parse_postfix()
    }

    fn parse_lambda(&mut self) -> Result<Expr, ParserError> {
        self.consume(&Token::Lambda)?;
        while self.current_token() != &Token::Colon {
            match self.current_token() {
                Token::Asterisk | Token::DoubleAsterisk | Token::Comma | Token::Slash => {
                    self.consume_current()
                }
                Token::Identifier(_) => {
                    self.consume_current();
                    if self.current_token() == &Token::Assign {
                        self.consume_current();
                        self.parse_simple_expr()?;
                    }
                }
                _ => return Err(ParserError::syntax_error("malformed lambda parameters")),
            }
        }
        self.consume_current();
        Ok(Expr::Lambda(Box::new(self.parse_simple_expr()?)))
    }

    fn starts_expression(tok: &Token) -> bool {
        matches!(
            tok,
            Token::Identifier(_)
                | Token::Number(_)
                | Token::StringLiteral(_)
                | Token::BytesLiteral(_)
                | Token::FStringLiteral(_)
                | Token::BooleanLiteral(_)
                | Token::None
                | Token::Ellipsis
                | Token::LParen
                | Token::LBracket
                | Token::LBrace
                | Token::Minus
                | Token::Plus
                | Token::Tilde
                | Token::Not
                | Token::Asterisk
                | Token::Lambda
                | Token::Await
                | Token::Yield
        )
    }
}
