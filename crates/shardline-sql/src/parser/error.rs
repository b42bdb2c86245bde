//! Parser error types.

use crate::lexer::{Span, TokenKind};

/// Why a statement was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The text is not valid SQL for the supported grammar.
    Syntax,
    /// The text is a statement kind other than SELECT / INSERT / UPDATE /
    /// DELETE (DDL, transaction control, set operations, ...).
    UnsupportedStatement,
}

/// A parse error.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Location of the offending token.
    pub span: Span,
    /// What the parser was looking for, if it was looking for something
    /// specific.
    pub expected: Option<String>,
    pub found: Option<TokenKind>,
}

impl ParseError {
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::Syntax,
            message: message.into(),
            span,
            expected: None,
            found: None,
        }
    }

    /// A statement the middleware does not handle, named by its leading
    /// word(s).
    #[must_use]
    pub fn unsupported(statement: &str, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::UnsupportedStatement,
            message: format!("unsupported statement kind: {statement}"),
            span,
            expected: None,
            found: None,
        }
    }

    /// The parser wanted `expected` but saw `found`. A lexer error token is
    /// reported with the lexer's own message.
    #[must_use]
    pub fn unexpected(expected: impl Into<String>, found: TokenKind, span: Span) -> Self {
        let expected = expected.into();
        let message = match &found {
            TokenKind::Eof => format!("unexpected end of input: expected {expected}"),
            TokenKind::Error(reason) => reason.clone(),
            other => format!("unexpected token: expected {expected}, found {other:?}"),
        };
        Self {
            kind: ParseErrorKind::Syntax,
            message,
            span,
            expected: Some(expected),
            found: Some(found),
        }
    }

    #[must_use]
    pub const fn is_unsupported_statement(&self) -> bool {
        matches!(self.kind, ParseErrorKind::UnsupportedStatement)
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at position {}..{}",
            self.message, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_eof_message() {
        let err = ParseError::unexpected("identifier", TokenKind::Eof, Span::at(13));
        assert_eq!(
            err.to_string(),
            "unexpected end of input: expected identifier at position 13..13"
        );
        assert_eq!(err.kind, ParseErrorKind::Syntax);
    }

    #[test]
    fn test_lexer_errors_keep_their_message() {
        let err = ParseError::unexpected(
            "expression",
            TokenKind::Error("unterminated string literal".to_string()),
            Span::new(4, 9),
        );
        assert_eq!(err.message, "unterminated string literal");
    }

    #[test]
    fn test_unsupported_statement() {
        let err = ParseError::unsupported("CREATE", Span::new(0, 6));
        assert!(err.is_unsupported_statement());
        assert!(err.message.contains("CREATE"));
    }
}
