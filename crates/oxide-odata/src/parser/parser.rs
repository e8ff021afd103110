//! Filter parser implementation.

use super::error::ParseError;
use crate::ast::{CompareOp, FilterExpr, LogicalOp};
use crate::lexer::{Keyword, Lexer, Token, TokenKind};
use crate::value::SqlValue;

/// Maximum nesting of parentheses and `not`.
const MAX_DEPTH: usize = 128;

/// Maximum number of comparisons in one expression.
///
/// Connectives are left associative, so this also bounds the depth of the
/// resulting tree.
const MAX_COMPARISONS: usize = 1024;

/// Returns `(left_bp, right_bp, op)` for the logical connectives.
///
/// `or` binds loosest, `and` tighter; both are left associative.
const fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8, LogicalOp)> {
    match kind {
        TokenKind::Keyword(Keyword::Or) => Some((1, 2, LogicalOp::Or)),
        TokenKind::Keyword(Keyword::And) => Some((3, 4, LogicalOp::And)),
        _ => None,
    }
}

/// Parses a complete `$filter` expression.
///
/// # Errors
///
/// Returns a `ParseError` if the input is not a valid filter expression.
pub fn parse_filter(input: &str) -> Result<FilterExpr, ParseError> {
    Parser::new(input).parse()
}

/// `$filter` parser.
///
/// ```text
/// expr       := or_expr
/// or_expr    := and_expr ('or' and_expr)*
/// and_expr   := unary ('and' unary)*
/// unary      := 'not' unary | primary
/// primary    := '(' expr ')' | comparison
/// comparison := IDENT OP LITERAL
/// ```
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    depth: usize,
    comparisons: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            depth: 0,
            comparisons: 0,
        }
    }

    /// Parses the whole input as one expression.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` on unbalanced parentheses, unknown operators,
    /// dangling connectives, malformed literals or trailing input, and when
    /// the expression nests or chains too deeply.
    pub fn parse(&mut self) -> Result<FilterExpr, ParseError> {
        let expr = self.parse_expression(0)?;
        match &self.current.kind {
            TokenKind::Eof => Ok(expr),
            TokenKind::RightParen => Err(ParseError::new(
                "Unbalanced parenthesis: unexpected ')'",
                self.current.span,
            )),
            _ => Err(self.unexpected("'and', 'or' or end of input")),
        }
    }

    fn parse_expression(&mut self, min_bp: u8) -> Result<FilterExpr, ParseError> {
        let mut lhs = self.parse_unary()?;

        while let Some((left_bp, right_bp, op)) = infix_binding_power(&self.current.kind) {
            if left_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expression(right_bp)?;
            lhs = FilterExpr::Logical {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<FilterExpr, ParseError> {
        if self.check_keyword(Keyword::Not) {
            self.enter()?;
            self.advance();
            let inner = self.parse_unary();
            self.depth -= 1;
            return Ok(FilterExpr::Not(Box::new(inner?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<FilterExpr, ParseError> {
        match &self.current.kind {
            TokenKind::LeftParen => {
                let open = self.current.span;
                self.enter()?;
                self.advance();
                let expr = self.parse_expression(0);
                self.depth -= 1;
                let expr = expr?;
                if self.current.kind == TokenKind::RightParen {
                    self.advance();
                    Ok(expr)
                } else if self.current.is_eof() {
                    Err(ParseError::new(
                        "Unbalanced parenthesis: missing ')'",
                        open.merge(self.current.span),
                    ))
                } else {
                    Err(self.unexpected("')'"))
                }
            }
            TokenKind::Identifier(_) => self.parse_comparison(),
            TokenKind::Error(msg) => Err(ParseError::new(msg.clone(), self.current.span)),
            _ => Err(self.unexpected("field name, 'not' or '('")),
        }
    }

    fn parse_comparison(&mut self) -> Result<FilterExpr, ParseError> {
        self.comparisons += 1;
        if self.comparisons > MAX_COMPARISONS {
            return Err(ParseError::new(
                format!("Expression has more than {MAX_COMPARISONS} comparisons"),
                self.current.span,
            ));
        }
        let field = self.expect_identifier()?;

        let op = match &self.current.kind {
            TokenKind::Keyword(kw) => CompareOp::from_keyword(*kw),
            TokenKind::Identifier(name) => {
                return Err(ParseError::unexpected(
                    "comparison operator (eq, ne, gt, ge, lt, le)",
                    TokenKind::Identifier(name.clone()),
                    self.current.span,
                )
                .with_message(format!("Unknown operator '{name}'")));
            }
            TokenKind::Error(msg) => {
                return Err(ParseError::new(msg.clone(), self.current.span));
            }
            _ => None,
        };
        let Some(op) = op else {
            return Err(self.unexpected("comparison operator (eq, ne, gt, ge, lt, le)"));
        };
        self.advance();

        let value = self.parse_literal()?;
        Ok(FilterExpr::Comparison { field, op, value })
    }

    fn parse_literal(&mut self) -> Result<SqlValue, ParseError> {
        let value = match &self.current.kind {
            TokenKind::String(s) => SqlValue::Text(s.clone()),
            TokenKind::Integer(n) => SqlValue::Int(*n),
            TokenKind::Float(f) => SqlValue::Float(*f),
            TokenKind::Keyword(Keyword::True) => SqlValue::Bool(true),
            TokenKind::Keyword(Keyword::False) => SqlValue::Bool(false),
            TokenKind::Keyword(Keyword::Null) => SqlValue::Null,
            TokenKind::Error(msg) => {
                return Err(ParseError::new(msg.clone(), self.current.span));
            }
            _ => return Err(self.unexpected("literal")),
        };
        self.advance();
        Ok(value)
    }

    // --- Helper methods ---

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::new(
                "Expression nested too deeply",
                self.current.span,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current.as_keyword() == Some(keyword)
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("field name")),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::unexpected(expected, self.current.kind.clone(), self.current.span)
    }
}
