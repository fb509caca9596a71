//! Tokenizer for annotation and default-value text

use super::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Name(String),
    Int(String),
    Float(String),
    Imaginary(String),
    Str(String),
    Bytes(Vec<u8>),
    Punct(&'static str),
    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Name(name) => write!(f, "name '{}'", name),
            TokenKind::Int(text) | TokenKind::Float(text) | TokenKind::Imaginary(text) => {
                write!(f, "number {}", text)
            }
            TokenKind::Str(_) => write!(f, "string literal"),
            TokenKind::Bytes(_) => write!(f, "bytes literal"),
            TokenKind::Punct(p) => write!(f, "'{}'", p),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with its byte span in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

// Longest first so that "**" wins over "*"
const PUNCTUATION: &[&str] = &[
    "...", "**", "//", "<<", ">>", "->", "==", "!=", "<=", ">=", "(", ")", "[", "]", "{", "}",
    ",", ":", "=", ".", "*", "/", "%", "+", "-", "~", "|", "&", "^", "@", "<", ">", ";",
];

pub struct Lexer<'a> {
    input: &'a str,
    current: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, current: 0 }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, ExprError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }
            tokens.push(self.scan_token()?);
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            start: self.input.len(),
            end: self.input.len(),
        });
        Ok(tokens)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.current..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.current += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn scan_token(&mut self) -> Result<Token, ExprError> {
        let start = self.current;
        let ch = self.peek().ok_or_else(|| ExprError::UnexpectedEnd {
            expected: "token".to_string(),
        })?;

        let kind = if let Some(prefix_len) = self.string_prefix_len() {
            self.scan_string(prefix_len)?
        } else if ch.is_ascii_digit()
            || (ch == '.' && self.peek_next().is_some_and(|c| c.is_ascii_digit()))
        {
            self.scan_number()?
        } else if ch == '_' || ch.is_alphabetic() {
            self.scan_name()
        } else if let Some(punct) = PUNCTUATION.iter().find(|p| self.rest().starts_with(**p)) {
            self.current += punct.len();
            TokenKind::Punct(punct)
        } else {
            return Err(ExprError::Unsupported(format!("character {:?}", ch)));
        };

        Ok(Token {
            kind,
            start,
            end: self.current,
        })
    }

    /// Length of a string prefix such as `r`, `b` or `rb` directly
    /// followed by a quote (0 for a bare quote)
    fn string_prefix_len(&self) -> Option<usize> {
        let rest = self.rest();
        let prefix_len = rest
            .chars()
            .take_while(|c| matches!(c, 'r' | 'R' | 'b' | 'B' | 'u' | 'U' | 'f' | 'F'))
            .take(3)
            .count();
        if prefix_len <= 2 && matches!(rest[prefix_len..].chars().next(), Some('\'' | '"')) {
            Some(prefix_len)
        } else {
            None
        }
    }

    fn scan_string(&mut self, prefix_len: usize) -> Result<TokenKind, ExprError> {
        let prefix = self.rest()[..prefix_len].to_ascii_lowercase();
        if prefix.contains('f') {
            return Err(ExprError::Unsupported("f-strings".to_string()));
        }
        let raw = prefix.contains('r');
        let bytes = prefix.contains('b');
        self.current += prefix_len;

        let quote = self.advance().ok_or_else(|| ExprError::UnexpectedEnd {
            expected: "string literal".to_string(),
        })?;
        let triple = self.rest().starts_with(&format!("{quote}{quote}"));
        if triple {
            self.current += 2;
        }

        let mut value = String::new();
        loop {
            if triple && self.rest().starts_with(&format!("{quote}{quote}{quote}")) {
                self.current += 3;
                break;
            }
            let ch = self.advance().ok_or_else(|| {
                ExprError::InvalidLiteral("unterminated string literal".to_string())
            })?;
            if ch == quote && !triple {
                break;
            }
            if ch == '\\' {
                let escaped = self.advance().ok_or_else(|| {
                    ExprError::InvalidLiteral("unterminated string literal".to_string())
                })?;
                if raw {
                    value.push('\\');
                    value.push(escaped);
                } else {
                    self.push_escape(&mut value, escaped)?;
                }
                continue;
            }
            value.push(ch);
        }

        if bytes {
            if !value.is_ascii() {
                return Err(ExprError::InvalidLiteral(
                    "bytes can only contain ASCII literal characters".to_string(),
                ));
            }
            Ok(TokenKind::Bytes(value.into_bytes()))
        } else {
            Ok(TokenKind::Str(value))
        }
    }

    fn push_escape(&mut self, value: &mut String, escaped: char) -> Result<(), ExprError> {
        match escaped {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            '0' => value.push('\0'),
            '\\' => value.push('\\'),
            '\'' => value.push('\''),
            '"' => value.push('"'),
            '\n' => {}
            'x' | 'u' | 'U' => {
                let width = match escaped {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let rest = self.rest();
                let digits = rest.get(..width).ok_or_else(|| {
                    ExprError::InvalidLiteral(format!("truncated \\{} escape", escaped))
                })?;
                let code = u32::from_str_radix(digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        ExprError::InvalidLiteral(format!("invalid \\{} escape", escaped))
                    })?;
                value.push(code);
                self.current += width;
            }
            other => {
                // Unknown escapes are kept verbatim
                value.push('\\');
                value.push(other);
            }
        }
        Ok(())
    }

    fn scan_number(&mut self) -> Result<TokenKind, ExprError> {
        let start = self.current;
        let radix_prefix = self.rest().get(..2).map(|p| p.to_ascii_lowercase());
        if matches!(radix_prefix.as_deref(), Some("0x" | "0o" | "0b")) {
            self.current += 2;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit() || c == '_') {
                self.advance();
            }
            return Ok(TokenKind::Int(self.input[start..self.current].to_string()));
        }

        let mut is_float = false;
        self.digits();
        if self.peek() == Some('.') {
            is_float = true;
            self.advance();
            self.digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(ExprError::InvalidLiteral(
                    self.input[start..self.current].to_string(),
                ));
            }
            self.digits();
        }

        if matches!(self.peek(), Some('j' | 'J')) {
            let text = self.input[start..self.current].to_string();
            self.advance();
            return Ok(TokenKind::Imaginary(text));
        }
        if self.peek().is_some_and(|c| c == '_' || c.is_alphanumeric()) {
            return Err(ExprError::InvalidLiteral(format!(
                "{}{}",
                &self.input[start..self.current],
                self.peek().unwrap_or_default()
            )));
        }

        let text = self.input[start..self.current].to_string();
        Ok(if is_float {
            TokenKind::Float(text)
        } else {
            TokenKind::Int(text)
        })
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.advance();
        }
    }

    fn scan_name(&mut self) -> TokenKind {
        let start = self.current;
        while self.peek().is_some_and(|c| c == '_' || c.is_alphanumeric()) {
            self.advance();
        }
        TokenKind::Name(self.input[start..self.current].to_string())
    }
}
