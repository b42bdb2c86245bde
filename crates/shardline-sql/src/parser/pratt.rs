//! Operator precedence table for Pratt expression parsing.

use crate::ast::{BinaryOp, UnaryOp};
use crate::lexer::{Keyword, TokenKind};

/// Binding power of a prefix operator.
///
/// `NOT` binds looser than comparisons so that `NOT a = 1 AND b = 2` reads
/// as `(NOT (a = 1)) AND (b = 2)`.
#[must_use]
pub const fn prefix_binding_power(kind: &TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Minus | TokenKind::Plus | TokenKind::BitNot => Some(17),
        TokenKind::Keyword(Keyword::Not) => Some(5),
        _ => None,
    }
}

/// Returns `(left_bp, right_bp)` for an infix operator; all operators are
/// left associative.
#[must_use]
pub const fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)> {
    match kind {
        TokenKind::Keyword(Keyword::Or) => Some((1, 2)),
        TokenKind::Keyword(Keyword::And) => Some((3, 4)),
        TokenKind::Eq
        | TokenKind::NotEq
        | TokenKind::Lt
        | TokenKind::LtEq
        | TokenKind::Gt
        | TokenKind::GtEq
        | TokenKind::Keyword(
            Keyword::Is | Keyword::In | Keyword::Between | Keyword::Like | Keyword::Not,
        ) => Some((5, 6)),
        TokenKind::BitOr => Some((7, 8)),
        TokenKind::BitAnd => Some((9, 10)),
        TokenKind::LeftShift | TokenKind::RightShift => Some((11, 12)),
        TokenKind::Plus | TokenKind::Minus | TokenKind::Concat => Some((13, 14)),
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some((15, 16)),
        _ => None,
    }
}

#[must_use]
pub const fn token_to_binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Percent => Some(BinaryOp::Mod),
        TokenKind::Eq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::LtEq => Some(BinaryOp::LtEq),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::GtEq => Some(BinaryOp::GtEq),
        TokenKind::Keyword(Keyword::And) => Some(BinaryOp::And),
        TokenKind::Keyword(Keyword::Or) => Some(BinaryOp::Or),
        TokenKind::Keyword(Keyword::Like) => Some(BinaryOp::Like),
        TokenKind::Concat => Some(BinaryOp::Concat),
        TokenKind::BitAnd => Some(BinaryOp::BitAnd),
        TokenKind::BitOr => Some(BinaryOp::BitOr),
        TokenKind::LeftShift => Some(BinaryOp::LeftShift),
        TokenKind::RightShift => Some(BinaryOp::RightShift),
        _ => None,
    }
}

/// Maps a prefix token to its operator. Unary `+` has no node of its own.
#[must_use]
pub const fn token_to_unary_op(kind: &TokenKind) -> Option<UnaryOp> {
    match kind {
        TokenKind::Minus => Some(UnaryOp::Neg),
        TokenKind::Keyword(Keyword::Not) => Some(UnaryOp::Not),
        TokenKind::BitNot => Some(UnaryOp::BitNot),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infix(kind: &TokenKind) -> (u8, u8) {
        infix_binding_power(kind).unwrap()
    }

    #[test]
    fn test_precedence_ordering() {
        let or = infix(&TokenKind::Keyword(Keyword::Or));
        let and = infix(&TokenKind::Keyword(Keyword::And));
        let eq = infix(&TokenKind::Eq);
        let add = infix(&TokenKind::Plus);
        let mul = infix(&TokenKind::Star);
        assert!(or.0 < and.0);
        assert!(and.0 < eq.0);
        assert!(eq.0 < add.0);
        assert!(add.0 < mul.0);
    }

    #[test]
    fn test_not_sits_between_and_and_comparison() {
        let not = prefix_binding_power(&TokenKind::Keyword(Keyword::Not)).unwrap();
        assert!(not > infix(&TokenKind::Keyword(Keyword::And)).0);
        assert!(not <= infix(&TokenKind::Eq).0);
    }

    #[test]
    fn test_operators_are_left_associative() {
        for kind in [TokenKind::Plus, TokenKind::Star, TokenKind::Keyword(Keyword::And)] {
            let (left, right) = infix(&kind);
            assert!(left < right);
        }
    }

    #[test]
    fn test_token_mapping() {
        assert_eq!(token_to_binary_op(&TokenKind::Percent), Some(BinaryOp::Mod));
        assert_eq!(token_to_binary_op(&TokenKind::Comma), None);
        assert_eq!(token_to_unary_op(&TokenKind::BitNot), Some(UnaryOp::BitNot));
        assert_eq!(token_to_unary_op(&TokenKind::Plus), None);
    }
}
