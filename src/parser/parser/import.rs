use crate::{
    domain::ModuleName,
    lexer::Token,
    parser::{types::*, Parser, ParserError},
};

impl Parser {
    pub(crate) fn parse_import(&mut self) -> Result<Statement, ParserError> {
        self.consume(&Token::Import)?;
        let mut items = vec![self.parse_import_item()?];
        while self.current_token() == &Token::Comma {
            self.consume_current();
            items.push(self.parse_import_item()?);
        }
        Ok(Statement::Import(items))
    }

    fn parse_import_item(&mut self) -> Result<ImportItem, ParserError> {
        let module = self.parse_module_name()?;
        let alias = self.parse_optional_alias()?;
        Ok(ImportItem { module, alias })
    }

    pub(crate) fn parse_from_import(&mut self) -> Result<Statement, ParserError> {
        self.consume(&Token::From)?;
        let path = self.parse_import_path()?;
        self.consume(&Token::Import)?;

        let names = match self.current_token() {
            Token::Asterisk => {
                self.consume_current();
                FromImportNames::Star
            }
            Token::LParen => {
                self.consume_current();
                let items = self.parse_parenthesized_import_items()?;
                FromImportNames::List(items)
            }
            _ => {
                let mut items = vec![self.parse_from_import_item()?];
                while self.current_token() == &Token::Comma {
                    self.consume_current();
                    items.push(self.parse_from_import_item()?);
                }
                FromImportNames::List(items)
            }
        };

        Ok(Statement::FromImport { path, names })
    }

    fn parse_import_path(&mut self) -> Result<ImportPath, ParserError> {
        let mut levels = 0;
        loop {
            match self.current_token() {
                Token::Dot => {
                    levels += 1;
                    self.consume_current();
                }
                // `from ...pkg` lexes the dot run as an ellipsis.
                Token::Ellipsis => {
                    levels += 3;
                    self.consume_current();
                }
                _ => break,
            }
        }

        if levels == 0 {
            Ok(ImportPath::Absolute(self.parse_module_name()?))
        } else {
            let tail = if matches!(self.current_token(), Token::Identifier(_)) {
                self.parse_module_name()?
            } else {
                ModuleName::default()
            };
            Ok(ImportPath::Relative(levels, tail))
        }
    }

    fn parse_module_name(&mut self) -> Result<ModuleName, ParserError> {
        let mut segments = vec![self.parse_identifier()?];
        while self.current_token() == &Token::Dot {
            self.consume_current();
            segments.push(self.parse_identifier()?);
        }
        Ok(ModuleName::new(segments))
    }

    /// Trailing commas are allowed inside the parens.
    fn parse_parenthesized_import_items(&mut self) -> Result<Vec<FromImportItem>, ParserError> {
        let mut items = vec![self.parse_from_import_item()?];
        while self.current_token() == &Token::Comma {
            self.consume_current();
            if self.current_token() == &Token::RParen {
                break;
            }
            items.push(self.parse_from_import_item()?);
        }
        self.consume(&Token::RParen)?;
        Ok(items)
    }

    fn parse_from_import_item(&mut self) -> Result<FromImportItem, ParserError> {
        let name = self.parse_identifier()?;
        let alias = self.parse_optional_alias()?;
        Ok(FromImportItem { name, alias })
    }

    fn parse_optional_alias(&mut self) -> Result<Option<String>, ParserError> {
        if self.current_token() == &Token::As {
            self.consume_current();
            Ok(Some(self.parse_identifier()?))
        } else {
            Ok(None)
        }
    }
}
