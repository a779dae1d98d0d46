//! Boolean expressions over bindings: `!`, `&&`, `||` and parentheses.

use crate::binding::Binding;
use crate::error::{TemplateError, TemplateResult};
use crate::scope::Scope;
use logos::Logos;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum Token<'src> {
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("!")]
    Bang,
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*|\[[0-9]+\])*", |lex| lex.slice())]
    Binding(&'src str),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Literal(bool),
    Binding(Binding),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self, leaf: &mut impl FnMut(&Binding) -> bool) -> bool {
        match self {
            Expr::Literal(value) => *value,
            Expr::Binding(binding) => leaf(binding),
            Expr::Not(inner) => !inner.eval(leaf),
            Expr::And(left, right) => left.eval(leaf) && right.eval(leaf),
            Expr::Or(left, right) => left.eval(leaf) || right.eval(leaf),
        }
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Binding>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Binding(binding) => {
                if !out.iter().any(|b| b.source() == binding.source()) {
                    out.push(binding);
                }
            }
            Expr::Not(inner) => inner.collect(out),
            Expr::And(left, right) | Expr::Or(left, right) => {
                left.collect(out);
                right.collect(out);
            }
        }
    }
}

/// A parsed controlling expression, kept together with its source text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Condition {
    source: String,
    expr: Expr,
}

impl Condition {
    pub fn parse(source: &str) -> TemplateResult<Self> {
        let tokens = Token::lexer(source)
            .spanned()
            .map(|(token, span)| match token {
                Ok(token) => Ok((token, span)),
                Err(()) => Err(TemplateError::InvalidCondition {
                    source_text: source.to_string(),
                    offset: span.start,
                    reason: "unexpected character".to_string(),
                }),
            })
            .collect::<TemplateResult<Vec<_>>>()?;

        let mut parser = Parser {
            source,
            tokens,
            pos: 0,
        };
        let expr = parser.or()?;
        if let Some((_, span)) = parser.tokens.get(parser.pos) {
            return Err(parser.error(span.start, "unexpected token"));
        }

        Ok(Self {
            source: source.trim().to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Distinct bindings in order of first appearance
    pub fn bindings(&self) -> Vec<&Binding> {
        let mut out = Vec::new();
        self.expr.collect(&mut out);
        out
    }

    /// Evaluate against a scope. Pinned overrides win over resolved values.
    pub fn evaluate(&self, scope: &Scope<'_>) -> bool {
        self.expr.eval(&mut |binding: &Binding| {
            scope
                .override_for(binding.source())
                .unwrap_or_else(|| binding.resolve(scope).is_truthy())
        })
    }

    /// Evaluate against truth values keyed by binding source text; bindings
    /// absent from `assignment` count as false.
    pub fn evaluate_with(&self, assignment: impl Fn(&str) -> Option<bool>) -> bool {
        self.expr
            .eval(&mut |binding: &Binding| assignment(binding.source()).unwrap_or(false))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for Condition {
    type Error = TemplateError;

    fn try_from(source: String) -> TemplateResult<Self> {
        Condition::parse(&source)
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        condition.source
    }
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |(_, span)| span.start)
    }

    fn error(&self, offset: usize, reason: &str) -> TemplateError {
        TemplateError::InvalidCondition {
            source_text: self.source.to_string(),
            offset,
            reason: reason.to_string(),
        }
    }

    fn or(&mut self) -> TemplateResult<Expr> {
        let mut left = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> TemplateResult<Expr> {
        let mut left = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> TemplateResult<Expr> {
        if self.peek() == Some(&Token::Bang) {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> TemplateResult<Expr> {
        let offset = self.offset();
        let token = self.peek().cloned();
        self.pos += 1;

        match token {
            Some(Token::True) => Ok(Expr::Literal(true)),
            Some(Token::False) => Ok(Expr::Literal(false)),
            Some(Token::Binding(source)) => Ok(Expr::Binding(Binding::parse(source)?)),
            Some(Token::LParen) => {
                let inner = self.or()?;
                if self.peek() != Some(&Token::RParen) {
                    return Err(self.error(self.offset(), "expected ')'"));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(_) => Err(self.error(offset, "expected a binding or '('")),
            None => Err(self.error(offset, "unexpected end of expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::StateSnapshot;
    use serde_json::json;

    fn with<'a>(pairs: &'a [(&'a str, bool)]) -> impl Fn(&str) -> Option<bool> + 'a {
        move |name| pairs.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    #[test]
    fn test_precedence() {
        let condition = Condition::parse("a || b && !c").unwrap();
        assert!(condition.evaluate_with(with(&[("a", true)])));
        assert!(condition.evaluate_with(with(&[("b", true)])));
        assert!(!condition.evaluate_with(with(&[("b", true), ("c", true)])));

        let grouped = Condition::parse("(a || b) && !c").unwrap();
        assert!(!grouped.evaluate_with(with(&[("a", true), ("c", true)])));
    }

    #[test]
    fn test_bindings_are_distinct_in_order() {
        let condition = Condition::parse("user.isAdmin && (flags[0] || !user.isAdmin)").unwrap();
        let names: Vec<&str> = condition.bindings().iter().map(|b| b.source()).collect();
        assert_eq!(names, vec!["user.isAdmin", "flags[0]"]);
    }

    #[test]
    fn test_evaluate_against_state_and_overrides() {
        let state = StateSnapshot::from(json!({"open": true, "items": []}));
        let condition = Condition::parse("open && items.length").unwrap();
        assert!(!condition.evaluate(&Scope::new(&state)));

        let mut overrides = crate::scope::Overrides::new();
        overrides.insert("items.length".to_string(), true);
        assert!(condition.evaluate(&Scope::new(&state).with_overrides(&overrides)));
    }

    #[test]
    fn test_parse_errors_report_offset() {
        match Condition::parse("a && ") {
            Err(TemplateError::InvalidCondition { offset, .. }) => assert_eq!(offset, 5),
            other => panic!("Expected InvalidCondition, got {:?}", other),
        }
        assert!(Condition::parse("a b").is_err());
        assert!(Condition::parse("(a").is_err());
        assert!(Condition::parse("a == b").is_err());
    }

    #[test]
    fn test_literals_and_keywords() {
        assert!(Condition::parse("true").unwrap().evaluate_with(|_| None));
        let condition = Condition::parse("trueish").unwrap();
        assert_eq!(condition.bindings()[0].source(), "trueish");
    }
}
