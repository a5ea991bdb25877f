//! Tokenizer for script literal text.

use num_bigint::BigInt;

use crate::error::ValueError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Int(BigInt),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Equals,
    Dot,
    Minus,
    Eof,
}

#[derive(Debug, Clone)]
pub(crate) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub(crate) fn tokenize(text: &str) -> Result<Vec<Spanned>, ValueError> {
    let mut lexer = Lexer {
        src: text,
        pos: 0,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Spanned>,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(ahead)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> ValueError {
        ValueError::Syntax {
            offset,
            message: message.into(),
        }
    }

    fn push(&mut self, token: Token, offset: usize) {
        self.tokens.push(Spanned { token, offset });
    }

    fn run(&mut self) -> Result<(), ValueError> {
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '(' | ')' | '[' | ']' | '{' | '}' | ',' | ':' | '=' | '.' | '-' => {
                    self.bump();
                    let token = match c {
                        '(' => Token::LParen,
                        ')' => Token::RParen,
                        '[' => Token::LBracket,
                        ']' => Token::RBracket,
                        '{' => Token::LBrace,
                        '}' => Token::RBrace,
                        ',' => Token::Comma,
                        ':' => Token::Colon,
                        '=' => Token::Equals,
                        '.' => Token::Dot,
                        _ => Token::Minus,
                    };
                    self.push(token, start);
                }
                '"' | '\'' => {
                    let text = self.string_body()?;
                    self.push(Token::Str(text), start);
                }
                'b' if matches!(self.peek_at(1), Some('"') | Some('\'')) => {
                    self.bump();
                    let data = self.bytes_body()?;
                    self.push(Token::Bytes(data), start);
                }
                c if c.is_ascii_digit() => {
                    let token = self.number()?;
                    self.push(token, start);
                }
                c if c.is_alphabetic() || c == '_' => {
                    while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
                        self.bump();
                    }
                    let ident = self.src[start..self.pos].to_string();
                    self.push(Token::Ident(ident), start);
                }
                other => return Err(self.error(start, format!("unexpected character '{}'", other))),
            }
        }
        self.push(Token::Eof, self.pos);
        Ok(())
    }

    fn number(&mut self) -> Result<Token, ValueError> {
        let start = self.pos;
        let mut is_float = false;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') {
            is_float = true;
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            self.bump();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.bump();
            }
            if !matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                return Err(self.error(self.pos, "malformed exponent"));
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        let text = &self.src[start..self.pos];
        if is_float {
            text.parse::<f64>()
                .map(Token::Float)
                .map_err(|_| self.error(start, format!("invalid float literal '{}'", text)))
        } else {
            BigInt::parse_bytes(text.as_bytes(), 10)
                .map(Token::Int)
                .ok_or_else(|| self.error(start, format!("invalid int literal '{}'", text)))
        }
    }

    fn string_body(&mut self) -> Result<String, ValueError> {
        let start = self.pos;
        let quote = self.bump().unwrap_or('"');
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error(start, "unterminated string literal")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escape_at = self.pos;
                    match self.escape()? {
                        Escaped::Char(c) => out.push(c),
                        Escaped::Byte(b) if b < 0x80 => out.push(b as char),
                        Escaped::Byte(_) => {
                            return Err(self.error(escape_at, "non-ASCII \\x escape in string"))
                        }
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn bytes_body(&mut self) -> Result<Vec<u8>, ValueError> {
        let start = self.pos;
        let quote = self.bump().unwrap_or('"');
        let mut out = Vec::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error(start, "unterminated bytes literal")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.escape()? {
                    Escaped::Byte(b) => out.push(b),
                    Escaped::Char(c) => {
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                    }
                },
                Some(c) => {
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
        }
    }

    fn escape(&mut self) -> Result<Escaped, ValueError> {
        let at = self.pos;
        let c = self
            .bump()
            .ok_or_else(|| self.error(at, "unterminated escape"))?;
        let escaped = match c {
            'n' => Escaped::Char('\n'),
            'r' => Escaped::Char('\r'),
            't' => Escaped::Char('\t'),
            '0' => Escaped::Char('\0'),
            'a' => Escaped::Char('\u{07}'),
            'b' => Escaped::Char('\u{08}'),
            'f' => Escaped::Char('\u{0c}'),
            'v' => Escaped::Char('\u{0b}'),
            '\\' => Escaped::Char('\\'),
            '"' => Escaped::Char('"'),
            '\'' => Escaped::Char('\''),
            'x' => Escaped::Byte(self.hex_digits(2)? as u8),
            'u' => Escaped::Char(self.code_point(4)?),
            'U' => Escaped::Char(self.code_point(8)?),
            other => return Err(self.error(at, format!("unknown escape '\\{}'", other))),
        };
        Ok(escaped)
    }

    fn hex_digits(&mut self, count: usize) -> Result<u32, ValueError> {
        let at = self.pos;
        let mut value = 0u32;
        for _ in 0..count {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error(at, "invalid hex escape"))?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn code_point(&mut self, count: usize) -> Result<char, ValueError> {
        let at = self.pos;
        let value = self.hex_digits(count)?;
        char::from_u32(value).ok_or_else(|| self.error(at, "invalid unicode escape"))
    }
}

enum Escaped {
    Char(char),
    Byte(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<Token> {
        tokenize(text).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_call_tokens() {
        assert_eq!(
            kinds("PortSpec(number=80)"),
            vec![
                Token::Ident("PortSpec".into()),
                Token::LParen,
                Token::Ident("number".into()),
                Token::Equals,
                Token::Int(BigInt::from(80)),
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("1.5")[0], Token::Float(1.5));
        assert_eq!(kinds("1e20")[0], Token::Float(1e20));
        assert_eq!(
            kinds("123456789012345678901234567890")[0],
            Token::Int(BigInt::parse_bytes(b"123456789012345678901234567890", 10).unwrap())
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(kinds(r#""a\"b\n\x01""#)[0], Token::Str("a\"b\n\u{01}".into()));
        assert_eq!(kinds(r#"b"\xff""#)[0], Token::Bytes(vec![0xff]));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(tokenize("\"abc").is_err());
    }
}
