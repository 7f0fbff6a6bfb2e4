//! Pre-routing deterministic policy: refuses secret/credential requests
//! and answers literal arithmetic without ever touching a model.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

/// Security/secret request indicators. Substring match on the lowercased
/// input; this check runs before arithmetic detection and short-circuits it.
const SECRET_KEYWORDS: &[&str] =
    &["password", "api key", "secret", "token", "hack", "bypass", "exploit"];

const REFUSAL_MESSAGE: &str = "I can't help with credential, secret, or hacking-related requests.";
const UNSAFE_EXPRESSION_MESSAGE: &str = "I couldn't evaluate that expression safely.";

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MathError {
    #[error("division by zero")]
    DivideByZero,
    #[error("malformed expression: {0}")]
    Malformed(&'static str),
}

/// Tries to answer the request without routing. Returns `Some` with the
/// final response when the input is a secret request or a literal
/// arithmetic expression, `None` when the pipeline should continue.
pub fn try_handle_deterministically(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();

    if SECRET_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
        return Some(REFUSAL_MESSAGE.to_string());
    }

    let stripped = lower.replace("calculate", "");
    let expr = stripped.trim();
    if !looks_like_arithmetic(expr) {
        return None;
    }

    match evaluate_expression(expr) {
        Ok(value) => Some(format!("Result: {}", value.normalize())),
        Err(_) => Some(UNSAFE_EXPRESSION_MESSAGE.to_string()),
    }
}

fn looks_like_arithmetic(expr: &str) -> bool {
    !expr.is_empty()
        && expr.chars().all(|c| {
            c.is_ascii_digit() || c.is_whitespace() || matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | '.')
        })
}

/// Evaluates a four-operator expression with standard precedence over
/// exact decimals. The whole input must be consumed; trailing characters
/// make the expression malformed.
pub fn evaluate_expression(expr: &str) -> Result<Decimal, MathError> {
    let mut parser = ExpressionParser::new(expr);
    let value = parser.parse_expression()?;
    parser.skip_whitespace();
    if parser.pos < parser.bytes.len() {
        return Err(MathError::Malformed("unexpected trailing input"));
    }
    Ok(value)
}

struct ExpressionParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ExpressionParser<'a> {
    fn new(expr: &'a str) -> Self {
        Self { bytes: expr.as_bytes(), pos: 0 }
    }

    fn parse_expression(&mut self) -> Result<Decimal, MathError> {
        let mut value = self.parse_term()?;
        loop {
            self.skip_whitespace();
            if self.consume(b'+') {
                value += self.parse_term()?;
            } else if self.consume(b'-') {
                value -= self.parse_term()?;
            } else {
                break;
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> Result<Decimal, MathError> {
        let mut value = self.parse_factor()?;
        loop {
            self.skip_whitespace();
            if self.consume(b'*') {
                value *= self.parse_factor()?;
            } else if self.consume(b'/') {
                let denominator = self.parse_factor()?;
                if denominator.is_zero() {
                    return Err(MathError::DivideByZero);
                }
                value /= denominator;
            } else {
                break;
            }
        }
        Ok(value)
    }

    fn parse_factor(&mut self) -> Result<Decimal, MathError> {
        self.skip_whitespace();
        if self.consume(b'(') {
            let inner = self.parse_expression()?;
            self.skip_whitespace();
            if !self.consume(b')') {
                return Err(MathError::Malformed("missing closing parenthesis"));
            }
            return Ok(inner);
        }
        self.parse_number()
    }

    fn parse_number(&mut self) -> Result<Decimal, MathError> {
        self.skip_whitespace();
        let start = self.pos;
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_digit() || self.bytes[self.pos] == b'.')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(MathError::Malformed("expected number"));
        }

        // Slicing on byte offsets is safe: the grammar only admits ASCII.
        let token = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| MathError::Malformed("bad number"))?;
        Decimal::from_str(token).map_err(|_| MathError::Malformed("bad number"))
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn consume(&mut self, expected: u8) -> bool {
        if self.pos < self.bytes.len() && self.bytes[self.pos] == expected {
            self.pos += 1;
            return true;
        }
        false
    }
}
