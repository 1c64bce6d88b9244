use crate::{
    lexer::Token,
    parser::{types::*, Parser, ParserError},
};

impl Parser {
    pub(crate) fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        match self.current_token() {
            Token::AtSign => self.parse_decorated(),
            Token::Async => self.parse_async_statement(),
            Token::Def => self.parse_function_def(vec![], false),
            Token::Class => self.parse_class_def(vec![]),
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),
            Token::For => self.parse_for(),
            Token::Try => self.parse_try(),
            Token::With => self.parse_with(),
            Token::Import => self.parse_import(),
            Token::From => self.parse_from_import(),
            Token::Return => {
                self.consume_current();
                let value = if self.end_of_statement() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                Ok(Statement::Return(value))
            }
            Token::Raise => self.parse_raise(),
            Token::Del => self.parse_delete(),
            Token::Assert => self.parse_assert(),
            Token::Global => {
                self.consume_current();
                Ok(Statement::Global(self.parse_identifier_list()?))
            }
            Token::Nonlocal => {
                self.consume_current();
                Ok(Statement::Nonlocal(self.parse_identifier_list()?))
            }
            Token::Pass => {
                self.consume_current();
                Ok(Statement::Pass)
            }
            Token::Break => {
                self.consume_current();
                Ok(Statement::Break)
            }
            Token::Continue => {
                self.consume_current();
                Ok(Statement::Continue)
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParserError> {
        let expr = self.parse_expr()?;
        match self.current_token().clone() {
            Token::Assign => {
                self.consume_current();
                // Chained assignment: everything but the final expression is
                // a target.
                let mut targets = vec![expr];
                let mut value = self.parse_expr()?;
                while self.current_token() == &Token::Assign {
                    self.consume_current();
                    targets.push(value);
                    value = self.parse_expr()?;
                }
                Ok(Statement::Assign { targets, value })
            }
            tok if tok.is_compound_assign() => {
                self.consume_current();
                let value = self.parse_expr()?;
                Ok(Statement::AugAssign {
                    target: expr,
                    value,
                })
            }
            Token::Colon => {
                self.consume_current();
                let annotation = self.parse_simple_expr()?;
                let value = if self.current_token() == &Token::Assign {
                    self.consume_current();
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                Ok(Statement::AnnAssign {
                    target: expr,
                    annotation,
                    value,
                })
            }
            _ => Ok(Statement::Expression(expr)),
        }
    }

    fn parse_decorated(&mut self) -> Result<Statement, ParserError> {
        let mut decorators = vec![];
        while self.current_token() == &Token::AtSign {
            self.consume_current();
            decorators.push(self.parse_simple_expr()?);
            self.consume(&Token::Newline)?;
            self.consume_newlines();
        }

        match self.current_token() {
            Token::Def => self.parse_function_def(decorators, false),
            Token::Async => {
                self.consume_current();
                self.parse_function_def(decorators, true)
            }
            Token::Class => self.parse_class_def(decorators),
            _ => Err(ParserError::syntax_error(
                "decorators must precede a function or class definition",
            )),
        }
    }

    fn parse_async_statement(&mut self) -> Result<Statement, ParserError> {
        self.consume(&Token::Async)?;
        match self.current_token() {
            Token::Def => self.parse_function_def(vec![], true),
            Token::For => self.parse_for(),
            Token::With => self.parse_with(),
            _ => Err(ParserError::syntax_error(
                "async must precede def, for or with",
            )),
        }
    }

    fn parse_function_def(
        &mut self,
        decorators: Vec<Expr>,
        is_async: bool,
    ) -> Result<Statement, ParserError> {
        self.consume(&Token::Def)?;
        let name = self.parse_identifier()?;
        self.consume(&Token::LParen)?;
        let defaults = self.parse_def_params()?;
        self.consume(&Token::RParen)?;
        if self.current_token() == &Token::ReturnTypeArrow {
            self.consume_current();
            self.parse_simple_expr()?;
        }
        self.consume(&Token::Colon)?;
        let body = self.parse_block()?;
        Ok(Statement::FunctionDef {
            name,
            defaults,
            body,
            decorators,
            is_async,
        })
    }

    /// Walk a parameter list keeping only the default-value expressions.
    /// Parameter names and annotations never contribute usage.
    fn parse_def_params(&mut self) -> Result<Vec<Expr>, ParserError> {
        let mut defaults = vec![];
        while self.current_token() != &Token::RParen {
            match self.current_token() {
                Token::Asterisk | Token::DoubleAsterisk | Token::Slash => self.consume_current(),
                Token::Identifier(_) => {
                    self.consume_current();
                    if self.current_token() == &Token::Colon {
                        self.consume_current();
                        self.parse_simple_expr()?;
                    }
                    if self.current_token() == &Token::Assign {
                        self.consume_current();
                        defaults.push(self.parse_simple_expr()?);
                    }
                }
                _ => return Err(ParserError::syntax_error("malformed parameter list")),
            }
            if self.current_token() != &Token::RParen {
                self.consume(&Token::Comma)?;
            }
        }
        Ok(defaults)
    }

    fn parse_class_def(&mut self, decorators: Vec<Expr>) -> Result<Statement, ParserError> {
        self.consume(&Token::Class)?;
        let name = self.parse_identifier()?;
        let bases = if self.current_token() == &Token::LParen {
            self.consume_current();
            let (args, kwargs) = self.parse_call_args()?;
            // Keyword bases (metaclass=...) still carry names worth keeping.
            args.into_iter()
                .chain(kwargs.into_iter().map(|kw| kw.value))
                .collect()
        } else {
            vec![]
        };
        self.consume(&Token::Colon)?;
        let body = self.parse_block()?;
        Ok(Statement::ClassDef {
            name,
            bases,
            decorators,
            body,
        })
    }

    fn parse_if(&mut self) -> Result<Statement, ParserError> {
        self.consume(&Token::If)?;
        let condition = self.parse_expr()?;
        self.consume(&Token::Colon)?;
        let body = self.parse_block()?;
        let mut branches = vec![ConditionalBlock { condition, body }];

        let mut else_block = None;
        loop {
            match self.current_token() {
                Token::Elif => {
                    self.consume_current();
                    let condition = self.parse_expr()?;
                    self.consume(&Token::Colon)?;
                    let body = self.parse_block()?;
                    branches.push(ConditionalBlock { condition, body });
                }
                Token::Else => {
                    self.consume_current();
                    self.consume(&Token::Colon)?;
                    else_block = Some(self.parse_block()?);
                    break;
                }
                _ => break,
            }
        }

        Ok(Statement::If {
            branches,
            else_block,
        })
    }

    fn parse_while(&mut self) -> Result<Statement, ParserError> {
        self.consume(&Token::While)?;
        let condition = self.parse_expr()?;
        self.consume(&Token::Colon)?;
        let body = self.parse_block()?;
        let else_block = self.parse_optional_else()?;
        Ok(Statement::While {
            condition,
            body,
            else_block,
        })
    }

    fn parse_for(&mut self) -> Result<Statement, ParserError> {
        self.consume(&Token::For)?;
        let target = self.parse_target_list()?;
        self.consume(&Token::In)?;
        let iterable = self.parse_expr()?;
        self.consume(&Token::Colon)?;
        let body = self.parse_block()?;
        let else_block = self.parse_optional_else()?;
        Ok(Statement::For {
            target,
            iterable,
            body,
            else_block,
        })
    }

    fn parse_try(&mut self) -> Result<Statement, ParserError> {
        self.consume(&Token::Try)?;
        self.consume(&Token::Colon)?;
        let body = self.parse_block()?;

        let mut handlers = vec![];
        let mut saw_default = false;
        while self.current_token() == &Token::Except {
            if saw_default {
                return Err(ParserError::syntax_error(
                    "default except clause must be last",
                ));
            }
            self.consume_current();
            // Exception groups (`except*`) are treated like plain handlers.
            self.consume_optional(&Token::Asterisk);
            let exception = if self.current_token() == &Token::Colon {
                saw_default = true;
                None
            } else {
                let exc = self.parse_simple_expr()?;
                if self.current_token() == &Token::As {
                    self.consume_current();
                    self.parse_identifier()?;
                }
                Some(exc)
            };
            self.consume(&Token::Colon)?;
            let handler_body = self.parse_block()?;
            handlers.push(ExceptHandler {
                exception,
                body: handler_body,
            });
        }

        let else_block = self.parse_optional_else()?;
        let finally_block = if self.current_token() == &Token::Finally {
            self.consume_current();
            self.consume(&Token::Colon)?;
            Some(self.parse_block()?)
        } else {
            None
        };

        if handlers.is_empty() && finally_block.is_none() {
            return Err(ParserError::syntax_error(
                "try statement must have an except or finally clause",
            ));
        }

        Ok(Statement::Try {
            body,
            handlers,
            else_block,
            finally_block,
        })
    }

    fn parse_with(&mut self) -> Result<Statement, ParserError> {
        self.consume(&Token::With)?;
        let mut items = vec![self.parse_with_item()?];
        while self.current_token() == &Token::Comma {
            self.consume_current();
            items.push(self.parse_with_item()?);
        }
        self.consume(&Token::Colon)?;
        let body = self.parse_block()?;
        Ok(Statement::With { items, body })
    }

    fn parse_with_item(&mut self) -> Result<WithItem, ParserError> {
        let context = self.parse_simple_expr()?;
        let target = if self.current_token() == &Token::As {
            self.consume_current();
            Some(self.parse_target()?)
        } else {
            None
        };
        Ok(WithItem { context, target })
    }

    fn parse_raise(&mut self) -> Result<Statement, ParserError> {
        self.consume(&Token::Raise)?;
        if self.end_of_statement() {
            return Ok(Statement::Raise {
                exception: None,
                cause: None,
            });
        }
        let exception = Some(self.parse_simple_expr()?);
        let cause = if self.current_token() == &Token::From {
            self.consume_current();
            Some(self.parse_simple_expr()?)
        } else {
            None
        };
        Ok(Statement::Raise { exception, cause })
    }

    fn parse_delete(&mut self) -> Result<Statement, ParserError> {
        self.consume(&Token::Del)?;
        let mut targets = vec![self.parse_target()?];
        while self.current_token() == &Token::Comma {
            self.consume_current();
            if self.end_of_statement() {
                break;
            }
            targets.push(self.parse_target()?);
        }
        Ok(Statement::Delete(targets))
    }

    fn parse_assert(&mut self) -> Result<Statement, ParserError> {
        self.consume(&Token::Assert)?;
        // The message lives after a comma, so the test cannot be parsed at
        // the tuple level.
        let test = self.parse_simple_expr()?;
        let message = if self.current_token() == &Token::Comma {
            self.consume_current();
            Some(self.parse_simple_expr()?)
        } else {
            None
        };
        Ok(Statement::Assert { test, message })
    }

    fn parse_optional_else(&mut self) -> Result<Option<Ast>, ParserError> {
        if self.current_token() == &Token::Else {
            self.consume_current();
            self.consume(&Token::Colon)?;
            Ok(Some(self.parse_block()?))
        } else {
            Ok(None)
        }
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>, ParserError> {
        let mut names = vec![self.parse_identifier()?];
        while self.current_token() == &Token::Comma {
            self.consume_current();
            names.push(self.parse_identifier()?);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parser::tests::{expect_error, parse};
    use crate::parser::types::*;

    #[test]
    fn simple_assignment() {
        let ast = parse("x = 5\n");
        assert_eq!(
            ast,
            vec![Statement::Assign {
                targets: vec![Expr::Name("x".into())],
                value: Expr::Number("5".into()),
            }]
        );
    }

    #[test]
    fn chained_assignment() {
        let ast = parse("a = b = 5\n");
        assert_eq!(
            ast,
            vec![Statement::Assign {
                targets: vec![Expr::Name("a".into()), Expr::Name("b".into())],
                value: Expr::Number("5".into()),
            }]
        );
    }

    #[test]
    fn unpacking_assignment() {
        let ast = parse("a, b = pair\n");
        assert_eq!(
            ast,
            vec![Statement::Assign {
                targets: vec![Expr::Tuple(vec![
                    Expr::Name("a".into()),
                    Expr::Name("b".into()),
                ])],
                value: Expr::Name("pair".into()),
            }]
        );
    }

    #[test]
    fn export_list_assignment() {
        let ast = parse("__all__ = [\"helper\", \"extra\"]\n");
        assert_eq!(
            ast,
            vec![Statement::Assign {
                targets: vec![Expr::Name("__all__".into())],
                value: Expr::List(vec![
                    Expr::StringLiteral("helper".into()),
                    Expr::StringLiteral("extra".into()),
                ]),
            }]
        );
    }

    #[test]
    fn annotated_assignment() {
        let ast = parse("x: int = 5\ny: str\n");
        assert_eq!(
            ast[0],
            Statement::AnnAssign {
                target: Expr::Name("x".into()),
                annotation: Expr::Name("int".into()),
                value: Some(Expr::Number("5".into())),
            }
        );
        assert_eq!(
            ast[1],
            Statement::AnnAssign {
                target: Expr::Name("y".into()),
                annotation: Expr::Name("str".into()),
                value: None,
            }
        );
    }

    #[test]
    fn compound_assignment() {
        let ast = parse("total += value\n");
        assert_eq!(
            ast,
            vec![Statement::AugAssign {
                target: Expr::Name("total".into()),
                value: Expr::Name("value".into()),
            }]
        );
    }

    #[test]
    fn function_def_keeps_defaults() {
        let ast = parse("def f(a, b=fallback, *args, **kwargs):\n    return a\n");
        let Statement::FunctionDef {
            name,
            defaults,
            body,
            decorators,
            is_async,
        } = &ast[0]
        else {
            panic!("expected a function def");
        };
        assert_eq!(name, "f");
        assert_eq!(defaults, &vec![Expr::Name("fallback".into())]);
        assert_eq!(body.len(), 1);
        assert!(decorators.is_empty());
        assert!(!is_async);
    }

    #[test]
    fn decorated_async_function() {
        let ast = parse("@app.route\nasync def handler():\n    pass\n");
        let Statement::FunctionDef {
            decorators,
            is_async,
            ..
        } = &ast[0]
        else {
            panic!("expected a function def");
        };
        assert!(is_async);
        assert_eq!(
            decorators,
            &vec![Expr::Attribute {
                object: Box::new(Expr::Name("app".into())),
                attr: "route".into(),
            }]
        );
    }

    #[test]
    fn class_def_with_bases() {
        let ast = parse("class Foo(Base, metaclass=Meta):\n    pass\n");
        let Statement::ClassDef { name, bases, .. } = &ast[0] else {
            panic!("expected a class def");
        };
        assert_eq!(name, "Foo");
        assert_eq!(
            bases,
            &vec![Expr::Name("Base".into()), Expr::Name("Meta".into())]
        );
    }

    #[test]
    fn for_loop_with_else() {
        let ast = parse("for i, x in pairs:\n    use(x)\nelse:\n    done()\n");
        let Statement::For {
            target,
            iterable,
            body,
            else_block,
        } = &ast[0]
        else {
            panic!("expected a for loop");
        };
        assert_eq!(
            target,
            &Expr::Tuple(vec![Expr::Name("i".into()), Expr::Name("x".into())])
        );
        assert_eq!(iterable, &Expr::Name("pairs".into()));
        assert_eq!(body.len(), 1);
        assert_eq!(else_block.as_ref().map(|b| b.len()), Some(1));
    }

    #[test]
    fn try_except_finally() {
        let ast = parse(
            "try:\n    risky()\nexcept ValueError as e:\n    handle(e)\nexcept:\n    pass\nfinally:\n    cleanup()\n",
        );
        let Statement::Try {
            handlers,
            finally_block,
            ..
        } = &ast[0]
        else {
            panic!("expected a try statement");
        };
        assert_eq!(handlers.len(), 2);
        assert_eq!(handlers[0].exception, Some(Expr::Name("ValueError".into())));
        assert_eq!(handlers[1].exception, None);
        assert!(finally_block.is_some());
    }

    #[test]
    fn bare_try_is_an_error() {
        expect_error("try:\n    pass\n");
    }

    #[test]
    fn with_statement() {
        let ast = parse("with open(path) as f, lock:\n    pass\n");
        let Statement::With { items, .. } = &ast[0] else {
            panic!("expected a with statement");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].target, Some(Expr::Name("f".into())));
        assert_eq!(items[1].target, None);
    }

    #[test]
    fn raise_with_cause() {
        let ast = parse("raise ValueError(msg) from exc\n");
        let Statement::Raise { exception, cause } = &ast[0] else {
            panic!("expected a raise statement");
        };
        assert!(exception.is_some());
        assert_eq!(cause, &Some(Expr::Name("exc".into())));
    }

    #[test]
    fn assert_with_message() {
        let ast = parse("assert x, \"oops\"\n");
        assert_eq!(
            ast,
            vec![Statement::Assert {
                test: Expr::Name("x".into()),
                message: Some(Expr::StringLiteral("oops".into())),
            }]
        );
    }

    #[test]
    fn scope_declarations() {
        let ast = parse("global a, b\nnonlocal c\n");
        assert_eq!(ast[0], Statement::Global(vec!["a".into(), "b".into()]));
        assert_eq!(ast[1], Statement::Nonlocal(vec!["c".into()]));
    }
}
