//! Expression tree for directive call chains and its recursive descent parser.

use std::fmt;

use super::lexer::{Token, tokenize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Ident(String),
    /// `base.name`
    Selector { base: Box<Expr>, name: String },
    /// `callee(args...)`
    Call { callee: Box<Expr>, args: Vec<Expr> },
    Str(String),
    Int(i64),
    /// `Type{...}`; `empty` is false when the braces hold anything.
    Composite { ty: Box<Expr>, empty: bool },
    /// `&x` or `*x`
    Unary { op: char, expr: Box<Expr> },
}

impl Expr {
    pub fn parse(source: &str) -> Result<Expr, String> {
        let tokens = tokenize(source).map_err(|offset| {
            format!("unexpected character at offset {offset} in `{source}`")
        })?;
        let mut parser = ExprParser { tokens: &tokens, pos: 0 };
        let expr = parser.expr()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(format!("unexpected {:?} after `{}`", token, expr)),
        }
    }

    /// Returns `(qualifier, name)` for `name` and `qualifier.name` references.
    pub fn as_reference(&self) -> Option<(Option<&str>, &str)> {
        match self {
            Expr::Ident(name) => Some((None, name.as_str())),
            Expr::Selector { base, name } => match base.as_ref() {
                Expr::Ident(qualifier) => Some((Some(qualifier.as_str()), name.as_str())),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => write!(f, "{name}"),
            Expr::Selector { base, name } => write!(f, "{base}.{name}"),
            Expr::Call { callee, args } => {
                write!(f, "{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::Str(s) => write!(f, "{s:?}"),
            Expr::Int(i) => write!(f, "{i}"),
            Expr::Composite { ty, empty: true } => write!(f, "{ty}{{}}"),
            Expr::Composite { ty, empty: false } => write!(f, "{ty}{{...}}"),
            Expr::Unary { op, expr } => write!(f, "{op}{expr}"),
        }
    }
}

struct ExprParser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), String> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(match self.peek() {
                Some(found) => format!("expected {:?}, found {:?}", expected, found),
                None => format!("expected {:?}, found end of input", expected),
            })
        }
    }

    fn ident(&mut self) -> Result<String, String> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name.clone()),
            Some(other) => Err(format!("expected identifier, found {:?}", other)),
            None => Err("expected identifier, found end of input".to_string()),
        }
    }

    fn expr(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Some(Token::Amp) => {
                self.advance();
                Ok(Expr::Unary {
                    op: '&',
                    expr: Box::new(self.expr()?),
                })
            }
            Some(Token::Star) => {
                self.advance();
                Ok(Expr::Unary {
                    op: '*',
                    expr: Box::new(self.expr()?),
                })
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr, String> {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance();
                    let name = self.ident()?;
                    expr = Expr::Selector {
                        base: Box::new(expr),
                        name,
                    };
                }
                Some(Token::LParen) => {
                    self.advance();
                    let args = self.args()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                Some(Token::LBrace) if expr.as_reference().is_some() => {
                    self.advance();
                    let empty = self.skip_braced()?;
                    expr = Expr::Composite {
                        ty: Box::new(expr),
                        empty,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(Expr::Ident(name.clone())),
            Some(Token::Str(s)) => Ok(Expr::Str(s.clone())),
            Some(Token::Int(i)) => Ok(Expr::Int(*i)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(other) => Err(format!("unexpected {:?}", other)),
            None => Err("unexpected end of input".to_string()),
        }
    }

    fn args(&mut self) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if self.eat(&Token::Comma) {
                // trailing comma before `)`
                if self.eat(&Token::RParen) {
                    return Ok(args);
                }
                continue;
            }
            self.expect(Token::RParen)?;
            return Ok(args);
        }
    }

    /// Consumes a balanced `{ ... }` body (opening brace already taken).
    fn skip_braced(&mut self) -> Result<bool, String> {
        let mut depth = 1usize;
        let mut empty = true;
        while let Some(token) = self.advance() {
            match token {
                Token::LBrace => depth += 1,
                Token::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(empty);
                    }
                }
                _ => {}
            }
            empty = false;
        }
        Err("unterminated composite literal".to_string())
    }
}
