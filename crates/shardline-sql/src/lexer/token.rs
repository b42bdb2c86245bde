//! Token types produced by the lexer.

use super::Span;

macro_rules! keywords {
    ($($variant:ident => $text:literal,)*) => {
        /// Reserved words the parser gives structural meaning to.
        ///
        /// Function names (`COUNT`, `SUM`, `REPLACE`) and statement words the
        /// parser only rejects (`CREATE`, `TRUNCATE`) are not keywords; they
        /// lex as identifiers.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($variant,)*
        }

        impl Keyword {
            /// Looks a word up case-insensitively.
            #[must_use]
            pub fn lookup(word: &str) -> Option<Self> {
                match word.to_ascii_uppercase().as_str() {
                    $($text => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// Canonical upper-case spelling.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }
        }
    };
}

keywords! {
    Select => "SELECT",
    From => "FROM",
    Where => "WHERE",
    Order => "ORDER",
    By => "BY",
    Group => "GROUP",
    Having => "HAVING",
    Limit => "LIMIT",
    Offset => "OFFSET",
    Distinct => "DISTINCT",
    All => "ALL",
    Join => "JOIN",
    Inner => "INNER",
    Left => "LEFT",
    Right => "RIGHT",
    Full => "FULL",
    Outer => "OUTER",
    Cross => "CROSS",
    On => "ON",
    Using => "USING",
    Union => "UNION",
    Intersect => "INTERSECT",
    Except => "EXCEPT",
    Insert => "INSERT",
    Into => "INTO",
    Values => "VALUES",
    Update => "UPDATE",
    Set => "SET",
    Delete => "DELETE",
    Default => "DEFAULT",
    And => "AND",
    Or => "OR",
    Not => "NOT",
    In => "IN",
    Between => "BETWEEN",
    Like => "LIKE",
    Is => "IS",
    Null => "NULL",
    True => "TRUE",
    False => "FALSE",
    Exists => "EXISTS",
    Asc => "ASC",
    Desc => "DESC",
    As => "AS",
    Case => "CASE",
    When => "WHEN",
    Then => "THEN",
    Else => "ELSE",
    End => "END",
    Cast => "CAST",
    With => "WITH",
}

/// The kind of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Integer literal (`42`).
    Integer(i64),
    /// Floating point literal (`3.25`, `1e3`).
    Float(f64),
    /// String literal with quotes and escapes removed.
    String(String),
    /// Hex blob literal (`X'CAFE'`).
    Blob(Vec<u8>),
    /// Bare or quoted identifier.
    Identifier(String),
    Keyword(Keyword),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    /// `!=` or `<>`
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// `||`
    Concat,
    BitAnd,
    BitOr,
    BitNot,
    LeftShift,
    RightShift,

    LeftParen,
    RightParen,
    Comma,
    Semicolon,
    Dot,
    /// `:` introducing a named parameter.
    Colon,
    /// `?` positional parameter.
    Question,

    Eof,
    /// Input the lexer could not make sense of.
    Error(String),
}

/// A token and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup_ignores_case() {
        assert_eq!(Keyword::lookup("select"), Some(Keyword::Select));
        assert_eq!(Keyword::lookup("SeLeCt"), Some(Keyword::Select));
        assert_eq!(Keyword::lookup("orders"), None);
    }

    #[test]
    fn test_function_names_are_not_keywords() {
        for word in ["count", "SUM", "max", "min", "avg", "replace", "truncate"] {
            assert_eq!(Keyword::lookup(word), None, "{word} should lex as identifier");
        }
    }

    #[test]
    fn test_keyword_as_str_round_trips() {
        for kw in [Keyword::Where, Keyword::Between, Keyword::Default] {
            assert_eq!(Keyword::lookup(kw.as_str()), Some(kw));
        }
    }

    #[test]
    fn test_token_as_keyword() {
        let from = Token::new(TokenKind::Keyword(Keyword::From), Span::new(0, 4));
        let comma = Token::new(TokenKind::Comma, Span::new(4, 5));
        assert_eq!(from.as_keyword(), Some(Keyword::From));
        assert_eq!(comma.as_keyword(), None);
        assert!(Token::new(TokenKind::Eof, Span::at(5)).is_eof());
    }
}
