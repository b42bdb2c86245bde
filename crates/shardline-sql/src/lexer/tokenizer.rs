//! Hand-written SQL tokenizer.

use super::{Keyword, Span, Token, TokenKind};

/// Turns SQL text into tokens, one at a time.
///
/// String literals accept both doubled quotes (`'it''s'`) and MySQL
/// backslash escapes (`'it\'s'`). Identifiers may be quoted with double
/// quotes or backticks.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    start: usize,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.input[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn bump_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn token(&self, kind: TokenKind) -> Token {
        Token::new(kind, Span::new(self.start, self.pos))
    }

    fn error(&self, message: impl Into<String>) -> Token {
        self.token(TokenKind::Error(message.into()))
    }

    /// Skips whitespace, `--` line comments and `/* */` block comments.
    ///
    /// Returns an error token for a block comment that never closes.
    fn skip_trivia(&mut self) -> Option<Token> {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            }
            match (self.peek(), self.peek_second()) {
                (Some('-'), Some('-')) => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    self.start = self.pos;
                    self.pos += 2;
                    match self.input[self.pos..].find("*/") {
                        Some(offset) => self.pos += offset + 2,
                        None => {
                            self.pos = self.input.len();
                            return Some(self.error("unterminated block comment"));
                        }
                    }
                }
                _ => return None,
            }
        }
    }

    fn scan_word(&mut self) -> Token {
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        {
            self.bump();
        }
        let word = &self.input[self.start..self.pos];
        match Keyword::lookup(word) {
            Some(keyword) => self.token(TokenKind::Keyword(keyword)),
            None => self.token(TokenKind::Identifier(word.to_string())),
        }
    }

    /// Reads the body of a quoted run after the opening `quote` has been
    /// consumed. A doubled quote stands for one quote character.
    fn scan_quoted(&mut self, quote: char, backslash_escapes: bool) -> Option<String> {
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return None,
                Some(c) if c == quote => {
                    if self.bump_if(quote) {
                        text.push(quote);
                    } else {
                        return Some(text);
                    }
                }
                Some('\\') if backslash_escapes => match self.bump() {
                    None => return None,
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some('0') => text.push('\0'),
                    Some(other) => text.push(other),
                },
                Some(c) => text.push(c),
            }
        }
    }

    fn scan_string(&mut self) -> Token {
        match self.scan_quoted('\'', true) {
            Some(text) => self.token(TokenKind::String(text)),
            None => self.error("unterminated string literal"),
        }
    }

    fn scan_quoted_identifier(&mut self, quote: char) -> Token {
        match self.scan_quoted(quote, false) {
            Some(name) => self.token(TokenKind::Identifier(name)),
            None => self.error("unterminated quoted identifier"),
        }
    }

    fn scan_blob(&mut self) -> Token {
        // The `X` and opening quote are already consumed.
        let Some(hex) = self.scan_quoted('\'', false) else {
            return self.error("unterminated blob literal");
        };
        let digits: Vec<char> = hex.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.len() % 2 != 0 {
            return self.error("odd number of hex digits in blob literal");
        }
        let mut bytes = Vec::with_capacity(digits.len() / 2);
        for pair in digits.chunks(2) {
            let text: String = pair.iter().collect();
            match u8::from_str_radix(&text, 16) {
                Ok(byte) => bytes.push(byte),
                Err(_) => return self.error(format!("invalid hex digits '{text}' in blob literal")),
            }
        }
        self.token(TokenKind::Blob(bytes))
    }

    fn scan_number(&mut self) -> Token {
        let mut is_float = false;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let exponent_start = self.pos;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            } else {
                // `1e` followed by something else: the `e` starts a word.
                self.pos = exponent_start;
            }
        }

        let text = &self.input[self.start..self.pos];
        if is_float {
            match text.parse::<f64>() {
                Ok(value) => self.token(TokenKind::Float(value)),
                Err(e) => self.error(format!("invalid number '{text}': {e}")),
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => self.token(TokenKind::Integer(value)),
                Err(e) => self.error(format!("invalid integer '{text}': {e}")),
            }
        }
    }

    /// Scans the next token. Returns [`TokenKind::Eof`] forever once the
    /// input is exhausted.
    #[must_use]
    pub fn next_token(&mut self) -> Token {
        if let Some(error) = self.skip_trivia() {
            return error;
        }
        self.start = self.pos;

        let Some(c) = self.bump() else {
            return self.token(TokenKind::Eof);
        };

        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            '?' => TokenKind::Question,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '~' => TokenKind::BitNot,
            '&' => TokenKind::BitAnd,
            '=' => TokenKind::Eq,
            '<' if self.bump_if('=') => TokenKind::LtEq,
            '<' if self.bump_if('>') => TokenKind::NotEq,
            '<' if self.bump_if('<') => TokenKind::LeftShift,
            '<' => TokenKind::Lt,
            '>' if self.bump_if('=') => TokenKind::GtEq,
            '>' if self.bump_if('>') => TokenKind::RightShift,
            '>' => TokenKind::Gt,
            '!' if self.bump_if('=') => TokenKind::NotEq,
            '|' if self.bump_if('|') => TokenKind::Concat,
            '|' => TokenKind::BitOr,
            '\'' => return self.scan_string(),
            '"' | '`' => return self.scan_quoted_identifier(c),
            'x' | 'X' if self.bump_if('\'') => return self.scan_blob(),
            c if c.is_ascii_digit() => {
                self.pos = self.start;
                return self.scan_number();
            }
            c if c.is_alphabetic() || c == '_' => return self.scan_word(),
            other => TokenKind::Error(format!("unexpected character '{other}'")),
        };
        self.token(kind)
    }

    /// Tokenizes the whole input, ending with a single EOF token.
    #[must_use]
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.is_eof();
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }
}
