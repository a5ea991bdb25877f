//! Recursive descent reader over literal tokens.

use chrono::{TimeZone, Utc};
use num_traits::ToPrimitive;

use super::lexer::{Spanned, Token};
use super::CallResolver;
use crate::duration::ScriptDuration;
use crate::error::{Result, StartosisError, ValueError};
use crate::value::{Dict, Set, Value};

/// Deepest container or call nesting the reader accepts.
pub(crate) const MAX_NESTING_DEPTH: usize = 256;

pub(crate) struct Parser<'r> {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    resolver: &'r dyn CallResolver,
}

impl<'r> Parser<'r> {
    pub(crate) fn new(mut tokens: Vec<Spanned>, resolver: &'r dyn CallResolver) -> Self {
        if !matches!(tokens.last(), Some(Spanned { token: Token::Eof, .. })) {
            let offset = tokens.last().map_or(0, |s| s.offset);
            tokens.push(Spanned {
                token: Token::Eof,
                offset,
            });
        }
        Self {
            tokens,
            pos: 0,
            depth: 0,
            resolver,
        }
    }

    pub(crate) fn parse_document(&mut self) -> Result<Value> {
        let value = self.parse_expr()?;
        if !matches!(self.peek(), Token::Eof) {
            return Err(self.syntax("trailing input after value").into());
        }
        Ok(value)
    }

    // The token list always ends with Eof and `pos` never moves past it.
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn peek_second(&self) -> &Token {
        let idx = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[idx].token
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos].offset
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn syntax(&self, message: impl Into<String>) -> ValueError {
        ValueError::Syntax {
            offset: self.offset(),
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<()> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.syntax(format!("expected {}", what)).into())
        }
    }

    /// Consume a separating comma; returns false when `close` follows.
    fn separator(&mut self, close: &Token, what: &str) -> Result<bool> {
        if self.peek() == close {
            return Ok(false);
        }
        self.expect(Token::Comma, what)?;
        Ok(self.peek() != close)
    }

    fn parse_expr(&mut self) -> Result<Value> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self
                .syntax(format!("nesting exceeds {} levels", MAX_NESTING_DEPTH))
                .into());
        }
        self.depth += 1;
        let value = self.parse_term();
        self.depth -= 1;
        value
    }

    fn parse_term(&mut self) -> Result<Value> {
        match self.advance() {
            Token::Minus => match self.parse_expr()? {
                Value::Int(i) => Ok(Value::Int(-i)),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(StartosisError::interpretation(format!(
                    "unary '-' is not defined for {}",
                    other.type_name()
                ))),
            },
            Token::Int(i) => Ok(Value::Int(i)),
            Token::Float(f) => Ok(Value::Float(f)),
            Token::Str(s) => Ok(Value::from(s)),
            Token::Bytes(b) => Ok(Value::bytes(b)),
            Token::LBracket => {
                let mut items = Vec::new();
                if *self.peek() != Token::RBracket {
                    loop {
                        items.push(self.parse_expr()?);
                        if !self.separator(&Token::RBracket, "',' or ']'")? {
                            break;
                        }
                    }
                }
                self.expect(Token::RBracket, "']'")?;
                Ok(Value::list(items))
            }
            Token::LParen => {
                if *self.peek() == Token::RParen {
                    self.advance();
                    return Ok(Value::tuple(Vec::new()));
                }
                let first = self.parse_expr()?;
                if *self.peek() == Token::RParen {
                    self.advance();
                    return Ok(first);
                }
                let mut items = vec![first];
                while self.separator(&Token::RParen, "',' or ')'")? {
                    items.push(self.parse_expr()?);
                }
                self.expect(Token::RParen, "')'")?;
                Ok(Value::tuple(items))
            }
            Token::LBrace => {
                let mut dict = Dict::new();
                if *self.peek() != Token::RBrace {
                    loop {
                        let key = self.parse_expr()?;
                        self.expect(Token::Colon, "':'")?;
                        let value = self.parse_expr()?;
                        dict.insert(key, value)?;
                        if !self.separator(&Token::RBrace, "',' or '}'")? {
                            break;
                        }
                    }
                }
                self.expect(Token::RBrace, "'}'")?;
                Ok(Value::dict(dict))
            }
            Token::Ident(name) => match name.as_str() {
                "None" => Ok(Value::None),
                "True" => Ok(Value::Bool(true)),
                "False" => Ok(Value::Bool(false)),
                _ => self.parse_call(name),
            },
            other => Err(self.syntax(format!("unexpected token {:?}", other)).into()),
        }
    }

    fn parse_call(&mut self, mut name: String) -> Result<Value> {
        while *self.peek() == Token::Dot {
            self.advance();
            match self.advance() {
                Token::Ident(part) => {
                    name.push('.');
                    name.push_str(&part);
                }
                _ => return Err(self.syntax("expected identifier after '.'").into()),
            }
        }
        self.expect(Token::LParen, &format!("'(' after '{}'", name))?;

        let mut positional = Vec::new();
        let mut named: Vec<(String, Value)> = Vec::new();
        if *self.peek() != Token::RParen {
            loop {
                let keyword = match (self.peek(), self.peek_second()) {
                    (Token::Ident(key), Token::Equals) => Some(key.clone()),
                    _ => None,
                };
                if let Some(key) = keyword {
                    self.advance();
                    self.advance();
                    named.push((key, self.parse_expr()?));
                } else if named.is_empty() {
                    positional.push(self.parse_expr()?);
                } else {
                    return Err(self
                        .syntax("positional argument follows keyword argument")
                        .into());
                }
                if !self.separator(&Token::RParen, "',' or ')'")? {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "')'")?;
        self.call(&name, positional, named)
    }

    fn call(&self, name: &str, positional: Vec<Value>, named: Vec<(String, Value)>) -> Result<Value> {
        match name {
            "set" | "float" | "time.from_timestamp" | "time.parse_duration" if !named.is_empty() => {
                Err(StartosisError::interpretation(format!(
                    "{}() does not accept keyword arguments",
                    name
                )))
            }
            "set" => build_set(positional),
            "float" => build_float(positional),
            "time.from_timestamp" => build_time(positional),
            "time.parse_duration" => match positional.as_slice() {
                [Value::String(text)] => Ok(Value::Duration(ScriptDuration::parse(text)?)),
                _ => Err(StartosisError::interpretation(
                    "time.parse_duration() expects a single string",
                )),
            },
            _ => self.resolver.resolve_call(name, positional, named),
        }
    }
}

fn build_set(positional: Vec<Value>) -> Result<Value> {
    match positional.as_slice() {
        [] => Ok(Value::set(Set::new())),
        [Value::List(items)] => Ok(Value::set_from(items.borrow().iter().cloned())?),
        [Value::Tuple(items)] => Ok(Value::set_from(items.iter().cloned())?),
        _ => Err(StartosisError::interpretation(
            "set() expects at most one list or tuple",
        )),
    }
}

fn build_float(positional: Vec<Value>) -> Result<Value> {
    let f = match positional.as_slice() {
        [Value::Float(f)] => *f,
        [Value::Int(i)] => i.to_f64().unwrap_or(f64::NAN),
        [Value::String(text)] => match text.to_ascii_lowercase().as_str() {
            "nan" | "+nan" | "-nan" => f64::NAN,
            "inf" | "+inf" | "infinity" | "+infinity" => f64::INFINITY,
            "-inf" | "-infinity" => f64::NEG_INFINITY,
            other => other.parse::<f64>().map_err(|_| {
                StartosisError::interpretation(format!("float() cannot parse '{}'", text))
            })?,
        },
        _ => {
            return Err(StartosisError::interpretation(
                "float() expects a single number or string",
            ))
        }
    };
    Ok(Value::Float(f))
}

fn build_time(positional: Vec<Value>) -> Result<Value> {
    let (secs, nanos) = match positional.as_slice() {
        [Value::Int(secs)] => (secs.to_i64(), Some(0)),
        [Value::Int(secs), Value::Int(nanos)] => (secs.to_i64(), nanos.to_u32()),
        _ => {
            return Err(StartosisError::interpretation(
                "time.from_timestamp() expects integer seconds and optional nanoseconds",
            ))
        }
    };
    secs.zip(nanos)
        .and_then(|(secs, nanos)| Utc.timestamp_opt(secs, nanos).single())
        .map(Value::Time)
        .ok_or_else(|| StartosisError::interpretation("time.from_timestamp() is out of range"))
}
