use crate::lexer::{LexerError, LexerResult, Token};

const TAB_WIDTH: usize = 8;

/// A whole-file Python tokenizer.
///
/// Indentation is turned into `Indent`/`Dedent` tokens from a width stack,
/// with tabs expanded to multiples of eight. Newlines inside open delimiters
/// are swallowed (implicit line joining), as are backslash continuations.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
    indent_stack: Vec<usize>,
    delimiter_depth: usize,
    at_line_start: bool,
}

impl Lexer {
    pub fn tokenize(text: &str) -> LexerResult<Vec<Token>> {
        let mut lexer = Lexer {
            chars: text.chars().collect(),
            pos: 0,
            tokens: vec![],
            indent_stack: vec![0],
            delimiter_depth: 0,
            at_line_start: true,
        };
        lexer.run()?;
        Ok(lexer.tokens)
    }

    fn run(&mut self) -> LexerResult<()> {
        while self.pos < self.chars.len() {
            if self.at_line_start && self.delimiter_depth == 0 {
                self.lex_indentation()?;
                continue;
            }

            let c = self.current();
            match c {
                '\n' => {
                    self.pos += 1;
                    if self.delimiter_depth == 0 {
                        self.tokens.push(Token::Newline);
                        self.at_line_start = true;
                    }
                }
                '\r' | ' ' | '\t' => self.pos += 1,
                '#' => self.skip_comment(),
                '\\' if self.is_line_continuation() => self.skip_line_continuation(),
                '\'' | '"' => self.lex_string(false, false, false)?,
                c if c.is_ascii_digit() => self.lex_number(),
                '.' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),
                c if is_identifier_start(c) => self.lex_word()?,
                _ => self.lex_operator()?,
            }
        }

        if !self.at_line_start {
            self.tokens.push(Token::Newline);
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.tokens.push(Token::Dedent);
        }
        self.tokens.push(Token::Eof);
        Ok(())
    }

    /// Measure leading whitespace at the start of a logical line. Blank and
    /// comment-only lines never change the indentation level.
    fn lex_indentation(&mut self) -> LexerResult<()> {
        let mut width = 0;
        loop {
            match self.current_opt() {
                Some(' ') => {
                    width += 1;
                    self.pos += 1;
                }
                Some('\t') => {
                    width = width / TAB_WIDTH * TAB_WIDTH + TAB_WIDTH;
                    self.pos += 1;
                }
                _ => break,
            }
        }

        match self.current_opt() {
            None => {}
            Some('\n') | Some('\r') => self.pos += 1,
            Some('#') => self.skip_comment(),
            Some('\\') if self.is_line_continuation() => {
                // A continuation directly after the indent: the line's real
                // content starts further down, at this width.
                self.emit_indentation(width)?;
                self.at_line_start = false;
            }
            Some(_) => {
                self.emit_indentation(width)?;
                self.at_line_start = false;
            }
        }
        Ok(())
    }

    fn emit_indentation(&mut self, width: usize) -> LexerResult<()> {
        let current = *self.indent_stack.last().expect("indent stack is never empty");
        if width > current {
            self.indent_stack.push(width);
            self.tokens.push(Token::Indent);
        } else {
            while width < *self.indent_stack.last().expect("indent stack is never empty") {
                self.indent_stack.pop();
                self.tokens.push(Token::Dedent);
            }
            if width != *self.indent_stack.last().expect("indent stack is never empty") {
                return Err(LexerError::InconsistentDedent);
            }
        }
        Ok(())
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.current_opt() {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn is_line_continuation(&self) -> bool {
        match (self.peek(1), self.peek(2)) {
            (Some('\n'), _) => true,
            (Some('\r'), Some('\n')) => true,
            _ => false,
        }
    }

    fn skip_line_continuation(&mut self) {
        self.pos += if self.peek(1) == Some('\r') { 3 } else { 2 };
    }

    /// Greedy numeric scan. The raw text is kept verbatim: the analyzer never
    /// evaluates numbers, so arbitrary-precision ints and imaginary suffixes
    /// come along for free.
    fn lex_number(&mut self) {
        let start = self.pos;
        while let Some(c) = self.current_opt() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                self.pos += 1;
                if (c == 'e' || c == 'E')
                    && matches!(self.current_opt(), Some('+') | Some('-'))
                    && !text_starts_with_radix_prefix(&self.chars[start..])
                {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.tokens.push(Token::Number(text));
    }

    fn lex_word(&mut self) -> LexerResult<()> {
        let start = self.pos;
        while let Some(c) = self.current_opt() {
            if is_identifier_continue(c) {
                self.pos += 1;
            } else {
                break;
            }
        }
        let word: String = self.chars[start..self.pos].iter().collect();

        if matches!(self.current_opt(), Some('\'') | Some('"')) {
            if let Some((raw, bytes, fstring)) = string_prefix_flags(&word) {
                return self.lex_string(raw, bytes, fstring);
            }
        }

        self.tokens.push(keyword_or_identifier(word));
        Ok(())
    }

    fn lex_string(&mut self, raw: bool, bytes: bool, fstring: bool) -> LexerResult<()> {
        let quote = self.current();
        let triple = self.peek(1) == Some(quote) && self.peek(2) == Some(quote);
        self.pos += if triple { 3 } else { 1 };

        let mut content = String::new();
        loop {
            let Some(c) = self.current_opt() else {
                return Err(LexerError::UnterminatedString);
            };

            if c == '\\' {
                let Some(next) = self.peek(1) else {
                    return Err(LexerError::UnterminatedString);
                };
                if raw {
                    content.push('\\');
                    content.push(next);
                } else {
                    content.push(unescape(next));
                }
                self.pos += 2;
                continue;
            }

            if c == quote {
                if !triple {
                    self.pos += 1;
                    break;
                }
                if self.peek(1) == Some(quote) && self.peek(2) == Some(quote) {
                    self.pos += 3;
                    break;
                }
                content.push(c);
                self.pos += 1;
                continue;
            }

            if c == '\n' && !triple {
                return Err(LexerError::UnterminatedString);
            }

            content.push(c);
            self.pos += 1;
        }

        let token = if bytes {
            Token::BytesLiteral(content)
        } else if fstring {
            Token::FStringLiteral(content)
        } else {
            Token::StringLiteral(content)
        };
        self.tokens.push(token);
        Ok(())
    }

    fn lex_operator(&mut self) -> LexerResult<()> {
        let c = self.current();
        let c1 = self.peek(1);
        let c2 = self.peek(2);

        let three = match (c, c1, c2) {
            ('*', Some('*'), Some('=')) => Some(Token::DoubleAsteriskEquals),
            ('/', Some('/'), Some('=')) => Some(Token::DoubleSlashEquals),
            ('<', Some('<'), Some('=')) => Some(Token::LeftShiftEquals),
            ('>', Some('>'), Some('=')) => Some(Token::RightShiftEquals),
            ('.', Some('.'), Some('.')) => Some(Token::Ellipsis),
            _ => None,
        };
        if let Some(token) = three {
            self.pos += 3;
            self.tokens.push(token);
            return Ok(());
        }

        let two = match (c, c1) {
            ('*', Some('*')) => Some(Token::DoubleAsterisk),
            ('/', Some('/')) => Some(Token::DoubleSlash),
            ('<', Some('<')) => Some(Token::LeftShift),
            ('>', Some('>')) => Some(Token::RightShift),
            ('<', Some('=')) => Some(Token::LessThanOrEqual),
            ('>', Some('=')) => Some(Token::GreaterThanOrEqual),
            ('=', Some('=')) => Some(Token::Equal),
            ('!', Some('=')) => Some(Token::NotEqual),
            ('-', Some('>')) => Some(Token::ReturnTypeArrow),
            (':', Some('=')) => Some(Token::Walrus),
            ('+', Some('=')) => Some(Token::PlusEquals),
            ('-', Some('=')) => Some(Token::MinusEquals),
            ('*', Some('=')) => Some(Token::AsteriskEquals),
            ('/', Some('=')) => Some(Token::SlashEquals),
            ('%', Some('=')) => Some(Token::ModEquals),
            ('@', Some('=')) => Some(Token::AtEquals),
            ('&', Some('=')) => Some(Token::AmpersandEquals),
            ('|', Some('=')) => Some(Token::PipeEquals),
            ('^', Some('=')) => Some(Token::CaretEquals),
            _ => None,
        };
        if let Some(token) = two {
            self.pos += 2;
            self.tokens.push(token);
            return Ok(());
        }

        let one = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Asterisk,
            '/' => Token::Slash,
            '%' => Token::Modulo,
            '@' => Token::AtSign,
            '&' => Token::Ampersand,
            '|' => Token::Pipe,
            '^' => Token::Caret,
            '~' => Token::Tilde,
            '<' => Token::LessThan,
            '>' => Token::GreaterThan,
            '=' => Token::Assign,
            ',' => Token::Comma,
            ':' => Token::Colon,
            '.' => Token::Dot,
            ';' => Token::Semicolon,
            '(' => {
                self.delimiter_depth += 1;
                Token::LParen
            }
            '[' => {
                self.delimiter_depth += 1;
                Token::LBracket
            }
            '{' => {
                self.delimiter_depth += 1;
                Token::LBrace
            }
            ')' => {
                self.delimiter_depth = self.delimiter_depth.saturating_sub(1);
                Token::RParen
            }
            ']' => {
                self.delimiter_depth = self.delimiter_depth.saturating_sub(1);
                Token::RBracket
            }
            '}' => {
                self.delimiter_depth = self.delimiter_depth.saturating_sub(1);
                Token::RBrace
            }
            other => return Err(LexerError::UnexpectedCharacter(other)),
        };
        self.pos += 1;
        self.tokens.push(one);
        Ok(())
    }

    fn current(&self) -> char {
        self.chars[self.pos]
    }

    fn current_opt(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn text_starts_with_radix_prefix(chars: &[char]) -> bool {
    chars.first() == Some(&'0') && matches!(chars.get(1), Some('x') | Some('X'))
}

fn string_prefix_flags(word: &str) -> Option<(bool, bool, bool)> {
    if word.is_empty() || word.len() > 2 {
        return None;
    }
    let (mut raw, mut bytes, mut fstring) = (false, false, false);
    for c in word.chars() {
        match c.to_ascii_lowercase() {
            'r' => raw = true,
            'b' => bytes = true,
            'f' => fstring = true,
            'u' => {}
            _ => return None,
        }
    }
    Some((raw, bytes, fstring))
}

fn keyword_or_identifier(word: String) -> Token {
    match word.as_str() {
        "and" => Token::And,
        "as" => Token::As,
        "assert" => Token::Assert,
        "async" => Token::Async,
        "await" => Token::Await,
        "break" => Token::Break,
        "class" => Token::Class,
        "continue" => Token::Continue,
        "def" => Token::Def,
        "del" => Token::Del,
        "elif" => Token::Elif,
        "else" => Token::Else,
        "except" => Token::Except,
        "finally" => Token::Finally,
        "for" => Token::For,
        "from" => Token::From,
        "global" => Token::Global,
        "if" => Token::If,
        "import" => Token::Import,
        "in" => Token::In,
        "is" => Token::Is,
        "lambda" => Token::Lambda,
        "nonlocal" => Token::Nonlocal,
        "not" => Token::Not,
        "or" => Token::Or,
        "pass" => Token::Pass,
        "raise" => Token::Raise,
        "return" => Token::Return,
        "try" => Token::Try,
        "while" => Token::While,
        "with" => Token::With,
        "yield" => Token::Yield,
        "None" => Token::None,
        "True" => Token::BooleanLiteral(true),
        "False" => Token::BooleanLiteral(false),
        _ => Token::Identifier(word),
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        Lexer::tokenize(input).expect("lexing should succeed")
    }

    #[test]
    fn simple_assignment() {
        let tokens = lex("x = 1\n");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("x".into()),
                Token::Assign,
                Token::Number("1".into()),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn indentation_blocks() {
        let tokens = lex("if x:\n    pass\n");
        assert_eq!(
            tokens,
            vec![
                Token::If,
                Token::Identifier("x".into()),
                Token::Colon,
                Token::Newline,
                Token::Indent,
                Token::Pass,
                Token::Newline,
                Token::Dedent,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn blank_and_comment_lines_do_not_indent() {
        let tokens = lex("if x:\n    a = 1\n\n    # comment\n    b = 2\n");
        let indents = tokens.iter().filter(|t| **t == Token::Indent).count();
        let dedents = tokens.iter().filter(|t| **t == Token::Dedent).count();
        assert_eq!(indents, 1);
        assert_eq!(dedents, 1);
    }

    #[test]
    fn implicit_line_joining_inside_parens() {
        let tokens = lex("f(a,\n  b)\n");
        assert!(!tokens[..tokens.len() - 2].contains(&Token::Newline));
        assert!(!tokens.contains(&Token::Indent));
    }

    #[test]
    fn backslash_continuation() {
        let tokens = lex("a = 1 + \\\n    2\n");
        let newlines = tokens.iter().filter(|t| **t == Token::Newline).count();
        assert_eq!(newlines, 1);
        assert!(!tokens.contains(&Token::Indent));
    }

    #[test]
    fn string_variants() {
        assert_eq!(
            lex("'a'\n")[0],
            Token::StringLiteral("a".into())
        );
        assert_eq!(
            lex("\"a\\nb\"\n")[0],
            Token::StringLiteral("a\nb".into())
        );
        assert_eq!(
            lex("r'a\\nb'\n")[0],
            Token::StringLiteral("a\\nb".into())
        );
        assert_eq!(
            lex("b'abc'\n")[0],
            Token::BytesLiteral("abc".into())
        );
        assert_eq!(
            lex("f'x{y}'\n")[0],
            Token::FStringLiteral("x{y}".into())
        );
    }

    #[test]
    fn triple_quoted_spans_lines() {
        let tokens = lex("s = '''line1\nline2'''\n");
        assert_eq!(tokens[2], Token::StringLiteral("line1\nline2".into()));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert_eq!(
            Lexer::tokenize("'abc\n"),
            Err(LexerError::UnterminatedString)
        );
    }

    #[test]
    fn dotted_names() {
        let tokens = lex("a.b.c\n");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("a".into()),
                Token::Dot,
                Token::Identifier("b".into()),
                Token::Dot,
                Token::Identifier("c".into()),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn compound_operators() {
        let tokens = lex("a //= b ** c\n");
        assert!(tokens.contains(&Token::DoubleSlashEquals));
        assert!(tokens.contains(&Token::DoubleAsterisk));
    }

    #[test]
    fn walrus_and_arrow() {
        let tokens = lex("def f() -> int: (n := 1)\n");
        assert!(tokens.contains(&Token::ReturnTypeArrow));
        assert!(tokens.contains(&Token::Walrus));
    }

    #[test]
    fn numbers_keep_raw_text() {
        let tokens = lex("x = 0x1f + 1_000 + 1.5e-3\n");
        assert!(tokens.contains(&Token::Number("0x1f".into())));
        assert!(tokens.contains(&Token::Number("1_000".into())));
        assert!(tokens.contains(&Token::Number("1.5e-3".into())));
    }

    #[test]
    fn inconsistent_dedent_is_an_error() {
        let input = "if x:\n        a = 1\n    b = 2\n";
        assert_eq!(
            Lexer::tokenize(input),
            Err(LexerError::InconsistentDedent)
        );
    }

    #[test]
    fn final_dedents_are_flushed_at_eof() {
        let tokens = lex("if x:\n    pass");
        assert_eq!(
            &tokens[tokens.len() - 3..],
            &[Token::Newline, Token::Dedent, Token::Eof]
        );
    }
}
