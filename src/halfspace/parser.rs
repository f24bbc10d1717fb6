//! Textual linear-inequation parser.
//!
//! Purpose
//! - Parse inputs like `"x + 2*y < 3"` over a fixed variable alphabet into a
//!   `Halfspace`, for the input surface (UI/CLI predicate entry) that feeds
//!   the abstraction engine's initial decomposition.
//!
//! Design
//! - A regex-tokenized stream feeds a precedence-climbing recursive-descent
//!   parser producing an AST of unary/binary operator nodes with string
//!   leaves. The halfspace layer then flattens the AST to
//!   coefficient-per-variable terms, sums duplicates, and normalizes.
//!   `<`/`<=` and `>`/`>=` are not distinguished beyond `>`/`>=` being
//!   parsed as the flipped form, matching the crate-wide convention that
//!   strict and non-strict comparisons are both tau-fuzzy.
//!
//! References
//! - Regex-as-input-validation precedent:
//!   `examples/GamesCrafters-GamesmanNova/src/game/zero_by/variants.rs`
//!   (`Regex::new(VARIANT_PATTERN)` gating malformed variant strings before
//!   further parsing).

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Error;
use crate::halfspace::Halfspace;
use crate::linalg::vector;

#[derive(Clone, Debug, PartialEq)]
enum Tok {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Lt,
    Le,
    Gt,
    Ge,
    LParen,
    RParen,
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(\d+(?:\.\d+)?)|(<=|>=|<|>|\+|-|\*|\(|\))|([A-Za-z_][A-Za-z0-9_]*))")
            .expect("static token regex is valid")
    })
}

fn tokenize(input: &str) -> Result<Vec<Tok>, Error> {
    let mut toks = Vec::new();
    let mut rest = input;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let caps = token_regex().captures(rest).ok_or_else(|| Error::ParseError {
            message: format!("unrecognized input near \"{rest}\""),
        })?;
        let whole = caps.get(0).expect("regex always yields group 0").as_str();
        if let Some(m) = caps.get(1) {
            let n: f64 = m.as_str().parse().map_err(|_| Error::ParseError {
                message: format!("malformed number \"{}\"", m.as_str()),
            })?;
            toks.push(Tok::Num(n));
        } else if let Some(m) = caps.get(2) {
            toks.push(match m.as_str() {
                "+" => Tok::Plus,
                "-" => Tok::Minus,
                "*" => Tok::Star,
                "<=" => Tok::Le,
                ">=" => Tok::Ge,
                "<" => Tok::Lt,
                ">" => Tok::Gt,
                "(" => Tok::LParen,
                ")" => Tok::RParen,
                other => unreachable!("token regex produced unexpected operator {other}"),
            });
        } else if let Some(m) = caps.get(3) {
            toks.push(Tok::Ident(m.as_str().to_string()));
        } else {
            unreachable!("token regex matched with no capturing group");
        }
        rest = &rest[whole.len()..];
    }
    Ok(toks)
}

/// AST node for a parsed arithmetic expression.
#[derive(Clone, Debug)]
enum Expr {
    Num(f64),
    Var(String),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum RelOp {
    Lt,
    Le,
    Gt,
    Ge,
}

struct Parser<'a> {
    toks: &'a [Tok],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(toks: &'a [Tok]) -> Self {
        Self { toks, pos: 0 }
    }

    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Tok> {
        let t = self.toks.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expr(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.term()?;
        loop {
            match self.peek() {
                Some(Tok::Plus) => {
                    self.advance();
                    let rhs = self.term()?;
                    lhs = Expr::Add(Box::new(lhs), Box::new(rhs));
                }
                Some(Tok::Minus) => {
                    self.advance();
                    let rhs = self.term()?;
                    lhs = Expr::Sub(Box::new(lhs), Box::new(rhs));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.factor()?;
        while let Some(Tok::Star) = self.peek() {
            self.advance();
            let rhs = self.factor()?;
            lhs = Expr::Mul(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> Result<Expr, Error> {
        match self.advance().cloned() {
            Some(Tok::Num(n)) => Ok(Expr::Num(n)),
            Some(Tok::Ident(name)) => Ok(Expr::Var(name)),
            Some(Tok::LParen) => {
                let e = self.expr()?;
                match self.advance() {
                    Some(Tok::RParen) => Ok(e),
                    _ => Err(Error::ParseError {
                        message: "expected closing parenthesis".to_string(),
                    }),
                }
            }
            Some(Tok::Minus) => Ok(Expr::Neg(Box::new(self.factor()?))),
            Some(Tok::Plus) => self.factor(),
            other => Err(Error::ParseError {
                message: format!("unexpected token while parsing a factor: {other:?}"),
            }),
        }
    }

    fn rel_op(&mut self) -> Result<RelOp, Error> {
        match self.advance() {
            Some(Tok::Lt) => Ok(RelOp::Lt),
            Some(Tok::Le) => Ok(RelOp::Le),
            Some(Tok::Gt) => Ok(RelOp::Gt),
            Some(Tok::Ge) => Ok(RelOp::Ge),
            other => Err(Error::ParseError {
                message: format!("expected a comparison operator, found {other:?}"),
            }),
        }
    }
}

/// Flattened linear form `sum(coeff_i * var_i) + constant`.
#[derive(Clone, Debug, Default)]
struct LinearForm {
    coeffs: HashMap<String, f64>,
    constant: f64,
}

impl LinearForm {
    fn constant(c: f64) -> Self {
        Self {
            coeffs: HashMap::new(),
            constant: c,
        }
    }

    fn var(name: &str) -> Self {
        let mut coeffs = HashMap::new();
        coeffs.insert(name.to_string(), 1.0);
        Self {
            coeffs,
            constant: 0.0,
        }
    }

    fn negate(mut self) -> Self {
        for v in self.coeffs.values_mut() {
            *v = -*v;
        }
        self.constant = -self.constant;
        self
    }

    fn add(mut self, other: Self) -> Self {
        for (k, v) in other.coeffs {
            *self.coeffs.entry(k).or_insert(0.0) += v;
        }
        self.constant += other.constant;
        self
    }

    fn sub(self, other: Self) -> Self {
        self.add(other.negate())
    }

    fn scale(mut self, k: f64) -> Self {
        for v in self.coeffs.values_mut() {
            *v *= k;
        }
        self.constant *= k;
        self
    }

    fn is_constant(&self) -> bool {
        self.coeffs.values().all(|c| c.abs() < 1e-15)
    }
}

fn flatten(expr: &Expr) -> Result<LinearForm, Error> {
    match expr {
        Expr::Num(n) => Ok(LinearForm::constant(*n)),
        Expr::Var(name) => Ok(LinearForm::var(name)),
        Expr::Neg(e) => Ok(flatten(e)?.negate()),
        Expr::Add(a, b) => Ok(flatten(a)?.add(flatten(b)?)),
        Expr::Sub(a, b) => Ok(flatten(a)?.sub(flatten(b)?)),
        Expr::Mul(a, b) => {
            let lf_a = flatten(a)?;
            let lf_b = flatten(b)?;
            if lf_a.is_constant() {
                Ok(lf_b.scale(lf_a.constant))
            } else if lf_b.is_constant() {
                Ok(lf_a.scale(lf_b.constant))
            } else {
                Err(Error::ParseError {
                    message: "nonlinear term: both sides of '*' depend on a variable".to_string(),
                })
            }
        }
    }
}

/// Parse `text` (e.g. `"x + 2*y < 3"`) into a `Halfspace` over the fixed
/// variable alphabet `vars`, whose order determines the resulting normal
/// vector's coordinate order.
pub fn parse_inequation(text: &str, vars: &[&str]) -> Result<Halfspace, Error> {
    let toks = tokenize(text)?;
    let mut parser = Parser::new(&toks);
    let lhs = parser.expr()?;
    let op = parser.rel_op()?;
    let rhs = parser.expr()?;
    if parser.pos != toks.len() {
        return Err(Error::ParseError {
            message: "trailing input after inequation".to_string(),
        });
    }

    let lhs_lf = flatten(&lhs)?;
    let rhs_lf = flatten(&rhs)?;

    // Normalize every comparator to the "<=" form: `a <= b`.
    let (a, b) = match op {
        RelOp::Lt | RelOp::Le => (lhs_lf, rhs_lf),
        RelOp::Gt | RelOp::Ge => (rhs_lf, lhs_lf),
    };
    let diff = a.sub(b.clone());
    // diff.coeffs . x <= -diff.constant, i.e. n = diff.coeffs, o = -diff.constant
    let mut coeffs = diff.coeffs;
    for (name, _) in coeffs.clone() {
        if !vars.contains(&name.as_str()) {
            return Err(Error::ParseError {
                message: format!("unknown variable \"{name}\" (expected one of {vars:?})"),
            });
        }
    }
    let mut n = vec![0.0; vars.len()];
    let mut any_nonzero = false;
    for (i, name) in vars.iter().enumerate() {
        if let Some(c) = coeffs.remove(*name) {
            if c.abs() > 1e-15 {
                any_nonzero = true;
            }
            n[i] = c;
        }
    }
    if !any_nonzero {
        return Err(Error::ParseError {
            message: format!("inequation \"{text}\" has no variable terms"),
        });
    }
    let o = -diff.constant;
    Ok(Halfspace::normalize(vector(&n), o))
}
