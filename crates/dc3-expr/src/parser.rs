//! Recursive-descent parser over the token stream from [`crate::lexer`].
//!
//! Grammar (lowest to highest precedence):
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := '-' unary | atom
//! atom   := number | ident | '(' expr ')' | call
//! call   := ('min' | 'max') '(' expr ',' expr ')'
//!         | 'clip' '(' expr ',' expr ',' expr ')'
//! ```

use dc3_common::BuildError;
use thiserror::Error;

use crate::ast::{BinOp, Expr};
use crate::lexer::{self, Token};

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("lex error: {0}")]
    Lex(#[from] lexer::LexError),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token: {0:?}")]
    UnexpectedToken(Token),

    #[error("expected {expected}, found {found:?}")]
    Expected { expected: &'static str, found: Token },

    #[error("unknown function: {0}")]
    UnknownFunction(String),
}

impl From<ParseError> for BuildError {
    fn from(err: ParseError) -> Self {
        BuildError::bad_request(err.to_string())
    }
}

pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let tokens = lexer::tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::UnexpectedToken(parser.tokens[parser.pos].clone()));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expect(&mut self, token: &Token, name: &'static str) -> Result<(), ParseError> {
        match self.advance() {
            Some(t) if &t == token => Ok(()),
            Some(t) => Err(ParseError::Expected {
                expected: name,
                found: t,
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    lhs = Expr::BinOp(BinOp::Add, Box::new(lhs), Box::new(rhs));
                }
                Some(Token::Minus) => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    lhs = Expr::BinOp(BinOp::Sub, Box::new(lhs), Box::new(rhs));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::BinOp(BinOp::Mul, Box::new(lhs), Box::new(rhs));
                }
                Some(Token::Slash) => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::BinOp(BinOp::Div, Box::new(lhs), Box::new(rhs));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Ident(alias, name)) if alias.is_empty() => self.parse_call(&name),
            Some(Token::Ident(alias, subband)) => Ok(Expr::Var(alias, subband)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(t) => Err(ParseError::UnexpectedToken(t)),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<Expr, ParseError> {
        self.expect(&Token::LParen, "'('")?;
        match name {
            "min" | "max" => {
                let a = self.parse_expr()?;
                self.expect(&Token::Comma, "','")?;
                let b = self.parse_expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(Expr::MinMax {
                    is_min: name == "min",
                    a: Box::new(a),
                    b: Box::new(b),
                })
            }
            "clip" => {
                let expr = self.parse_expr()?;
                self.expect(&Token::Comma, "','")?;
                let lo = self.parse_expr()?;
                self.expect(&Token::Comma, "','")?;
                let hi = self.parse_expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(Expr::Clip {
                    expr: Box::new(expr),
                    lo: Box::new(lo),
                    hi: Box::new(hi),
                })
            }
            other => Err(ParseError::UnknownFunction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_subtraction() {
        let expr = parse("s2.b08 - s2.b04").unwrap();
        assert_eq!(
            expr,
            Expr::BinOp(
                BinOp::Sub,
                Box::new(Expr::Var("s2".into(), "b08".into())),
                Box::new(Expr::Var("s2".into(), "b04".into())),
            )
        );
    }

    #[test]
    fn test_parse_ndvi_respects_precedence() {
        // (S2.B08 - S2.B04) / (S2.B08 + S2.B04)
        let expr = parse("(s2.b08 - s2.b04) / (s2.b08 + s2.b04)").unwrap();
        match expr {
            Expr::BinOp(BinOp::Div, _, _) => {}
            other => panic!("expected top-level division, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_clip_call() {
        let expr = parse("clip(s2.ndvi, -1, 1)").unwrap();
        match expr {
            Expr::Clip { lo, hi, .. } => {
                assert_eq!(*lo, Expr::Number(-1.0));
                assert_eq!(*hi, Expr::Number(1.0));
            }
            other => panic!("expected clip, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_min_max() {
        let expr = parse("max(s2.b04, s2.b08)").unwrap();
        assert!(matches!(expr, Expr::MinMax { is_min: false, .. }));
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        assert!(parse("s2.b04 +").is_err());
        assert!(parse("s2.b04 s2.b08").is_err());
    }

    #[test]
    fn test_unknown_function_rejected() {
        assert_eq!(
            parse("sqrt(s2.b04)").unwrap_err(),
            ParseError::UnknownFunction("sqrt".into())
        );
    }

    #[test]
    fn test_referenced_variables_dedup() {
        let expr = parse("s2.b04 + s2.b04 - s2.b08").unwrap();
        assert_eq!(
            expr.referenced_variables(),
            vec![
                ("s2".to_string(), "b04".to_string()),
                ("s2".to_string(), "b08".to_string()),
            ]
        );
    }
}
