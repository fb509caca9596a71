//! Recursive descent parser for declaration fragments
//!
//! Precedence climbs from conditional expressions down to atoms, in the
//! usual order: `if`/`else`, `or`, `and`, `not`, comparisons, `|`, `^`,
//! `&`, shifts, `+`/`-`, `*`/`/`/`//`/`%`/`@`, unary, `**`, trailers.

use num_bigint::BigInt;

use super::lexer::{Token, TokenKind};
use super::{BinaryOp, DisplayKind, Expr, ExprError, Keyword, Literal, UnaryOp};

/// One parameter declaration: `[*]name[: annotation][= default]`
#[derive(Debug, Clone, PartialEq)]
pub struct RawDeclaration {
    pub name: String,
    pub is_vararg: bool,
    pub annotation: Option<Expr>,
    pub default: Option<(Expr, String)>,
}

/// Deepest bracket, unary or conditional nesting accepted in one fragment
pub const MAX_NESTING: usize = 100;

pub struct ExprParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

impl<'a> ExprParser<'a> {
    pub fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            current: 0,
            depth: 0,
        }
    }

    /// Run `parse` one nesting level deeper, failing past `MAX_NESTING`
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, ExprError>) -> Result<T, ExprError> {
        if self.depth >= MAX_NESTING {
            return Err(ExprError::Unsupported("expression nested too deeply".to_string()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.current)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        self.tokens
            .get(self.current + offset)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        kind
    }

    fn check_punct(&self, punct: &str) -> bool {
        matches!(self.peek(), TokenKind::Punct(p) if *p == punct)
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), TokenKind::Name(n) if n == keyword)
    }

    fn match_punct(&mut self, punct: &str) -> bool {
        if self.check_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, keyword: &str) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> ExprError {
        match self.peek() {
            TokenKind::Eof => ExprError::UnexpectedEnd {
                expected: expected.to_string(),
            },
            found => ExprError::UnexpectedToken {
                expected: expected.to_string(),
                found: found.to_string(),
            },
        }
    }

    fn expect_punct(&mut self, punct: &str) -> Result<(), ExprError> {
        if self.match_punct(punct) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", punct)))
        }
    }

    fn expect_name(&mut self) -> Result<String, ExprError> {
        match self.peek().clone() {
            TokenKind::Name(name) if !is_reserved_word(&name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn expect_end(&self) -> Result<(), ExprError> {
        if matches!(self.peek(), TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.current)
            .map(|t| t.start)
            .unwrap_or(self.source.len())
    }

    fn previous_end(&self) -> usize {
        self.current
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.end)
            .unwrap_or(0)
    }

    /// Parse an expression that must span the whole input
    pub fn parse_complete_expression(&mut self) -> Result<Expr, ExprError> {
        let expr = self.parse_expression()?;
        self.expect_end()?;
        Ok(expr)
    }

    /// Parse a single parameter declaration; rejects `**kwargs` and
    /// anything that looks like a second parameter
    pub fn parse_declaration(&mut self) -> Result<RawDeclaration, ExprError> {
        if self.check_punct("**") {
            return Err(ExprError::Unsupported("**kwargs".to_string()));
        }
        let is_vararg = self.match_punct("*");
        let name = self.expect_name()?;

        let annotation = if self.match_punct(":") {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let default = if self.match_punct("=") {
            let start = self.offset();
            let expr = self.parse_expression()?;
            let text = self.source[start..self.previous_end()].trim().to_string();
            Some((expr, text))
        } else {
            None
        };

        if self.match_punct(",") && !matches!(self.peek(), TokenKind::Eof) {
            return Err(ExprError::Unsupported("more than one parameter".to_string()));
        }
        self.expect_end()?;

        Ok(RawDeclaration {
            name,
            is_vararg,
            annotation,
            default,
        })
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ExprError> {
        if self.check_keyword("lambda") {
            return Err(ExprError::Unsupported("lambda".to_string()));
        }
        let body = self.parse_or()?;
        if self.match_keyword("if") {
            let test = self.parse_or()?;
            if !self.match_keyword("else") {
                return Err(self.unexpected("'else'"));
            }
            let orelse = self.nested(Self::parse_expression)?;
            return Ok(Expr::Conditional {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            });
        }
        Ok(body)
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and()?;
        while self.match_keyword("or") {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_not()?;
        while self.match_keyword("and") {
            let right = self.parse_not()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ExprError> {
        if self.match_keyword("not") {
            let operand = self.nested(Self::parse_not)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn comparison_op(&mut self) -> Option<BinaryOp> {
        let op = match self.peek() {
            TokenKind::Punct("==") => BinaryOp::Eq,
            TokenKind::Punct("!=") => BinaryOp::NotEq,
            TokenKind::Punct("<") => BinaryOp::Lt,
            TokenKind::Punct("<=") => BinaryOp::LtE,
            TokenKind::Punct(">") => BinaryOp::Gt,
            TokenKind::Punct(">=") => BinaryOp::GtE,
            TokenKind::Name(n) if n == "in" => BinaryOp::In,
            TokenKind::Name(n) if n == "is" => {
                self.advance();
                return Some(if self.match_keyword("not") {
                    BinaryOp::IsNot
                } else {
                    BinaryOp::Is
                });
            }
            TokenKind::Name(n) if n == "not" && matches!(self.peek_at(1), TokenKind::Name(m) if m == "in") => {
                self.advance();
                self.advance();
                return Some(BinaryOp::NotIn);
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_bitor()?;
        while let Some(op) = self.comparison_op() {
            let right = self.parse_bitor()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_bitor(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_bitxor()?;
        while self.match_punct("|") {
            let right = self.parse_bitxor()?;
            left = binary(BinaryOp::BitOr, left, right);
        }
        Ok(left)
    }

    fn parse_bitxor(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_bitand()?;
        while self.match_punct("^") {
            let right = self.parse_bitand()?;
            left = binary(BinaryOp::BitXor, left, right);
        }
        Ok(left)
    }

    fn parse_bitand(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_shift()?;
        while self.match_punct("&") {
            let right = self.parse_shift()?;
            left = binary(BinaryOp::BitAnd, left, right);
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_arith()?;
        loop {
            let op = if self.match_punct("<<") {
                BinaryOp::LShift
            } else if self.match_punct(">>") {
                BinaryOp::RShift
            } else {
                break;
            };
            let right = self.parse_arith()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_arith(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_term()?;
        loop {
            let op = if self.match_punct("+") {
                BinaryOp::Add
            } else if self.match_punct("-") {
                BinaryOp::Sub
            } else {
                break;
            };
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek() {
                TokenKind::Punct("*") => BinaryOp::Mul,
                TokenKind::Punct("/") => BinaryOp::Div,
                TokenKind::Punct("//") => BinaryOp::FloorDiv,
                TokenKind::Punct("%") => BinaryOp::Mod,
                TokenKind::Punct("@") => BinaryOp::MatMul,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek() {
            TokenKind::Punct("-") => UnaryOp::Neg,
            TokenKind::Punct("+") => UnaryOp::Pos,
            TokenKind::Punct("~") => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.nested(Self::parse_factor)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> Result<Expr, ExprError> {
        let base = self.parse_primary()?;
        if self.match_punct("**") {
            let exponent = self.nested(Self::parse_factor)?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_atom()?;
        loop {
            if self.match_punct(".") {
                let attr = self.expect_name()?;
                expr = Expr::Attribute {
                    value: Box::new(expr),
                    attr,
                };
            } else if self.match_punct("(") {
                let (args, keywords) = self.nested(Self::parse_call_arguments)?;
                expr = Expr::Call {
                    func: Box::new(expr),
                    args,
                    keywords,
                };
            } else if self.match_punct("[") {
                let index = self.nested(Self::parse_expression)?;
                self.expect_punct("]")?;
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_call_arguments(&mut self) -> Result<(Vec<Expr>, Vec<Keyword>), ExprError> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        while !self.check_punct(")") {
            if self.match_punct("**") {
                let value = self.parse_expression()?;
                keywords.push(Keyword { name: None, value });
            } else if matches!(self.peek(), TokenKind::Name(_))
                && matches!(self.peek_at(1), TokenKind::Punct("="))
            {
                let name = self.expect_name()?;
                self.advance();
                let value = self.parse_expression()?;
                keywords.push(Keyword {
                    name: Some(name),
                    value,
                });
            } else {
                args.push(self.parse_display_item()?);
            }
            if !self.match_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok((args, keywords))
    }

    /// An item of a display or call: an expression or a starred expression
    fn parse_display_item(&mut self) -> Result<Expr, ExprError> {
        if self.match_punct("*") {
            let value = self.parse_or()?;
            return Ok(Expr::Starred(Box::new(value)));
        }
        self.parse_expression()
    }

    /// Skip the remainder of a comprehension up to and including `close`
    fn skip_comprehension(&mut self, close: &str) -> Result<(), ExprError> {
        let mut depth = 0usize;
        loop {
            match self.advance() {
                TokenKind::Eof => return Err(self.unexpected(&format!("'{}'", close))),
                TokenKind::Punct("(" | "[" | "{") => depth += 1,
                TokenKind::Punct(p @ (")" | "]" | "}")) => {
                    if depth == 0 {
                        if p == close {
                            return Ok(());
                        }
                        return Err(ExprError::UnexpectedToken {
                            expected: format!("'{}'", close),
                            found: format!("'{}'", p),
                        });
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
    }

    /// Items of a bracketed display after the opening bracket; returns
    /// `None` when the display turned out to be a comprehension
    fn parse_display_items(&mut self, close: &str) -> Result<(Option<Vec<Expr>>, bool), ExprError> {
        let mut items = Vec::new();
        let mut saw_comma = false;
        while !self.check_punct(close) {
            items.push(self.parse_display_item()?);
            if items.len() == 1 && self.check_keyword("for") {
                self.skip_comprehension(close)?;
                return Ok((None, false));
            }
            if !self.match_punct(",") {
                break;
            }
            saw_comma = true;
        }
        self.expect_punct(close)?;
        Ok((Some(items), saw_comma))
    }

    fn parse_atom(&mut self) -> Result<Expr, ExprError> {
        match self.peek().clone() {
            TokenKind::Name(name) => {
                if is_reserved_word(&name) {
                    return Err(self.unexpected("expression"));
                }
                self.advance();
                Ok(match name.as_str() {
                    "True" => Expr::Literal(Literal::Bool(true)),
                    "False" => Expr::Literal(Literal::Bool(false)),
                    "None" => Expr::Literal(Literal::None),
                    _ => Expr::Name(name),
                })
            }
            TokenKind::Int(text) => {
                self.advance();
                Ok(Expr::Literal(Literal::Int(parse_int(&text)?)))
            }
            TokenKind::Float(text) => {
                self.advance();
                Ok(Expr::Literal(Literal::Float(parse_float(&text)?)))
            }
            TokenKind::Imaginary(text) => {
                self.advance();
                Ok(Expr::Literal(Literal::Imaginary(parse_float(&text)?)))
            }
            TokenKind::Str(first) => {
                self.advance();
                let mut value = first;
                // Adjacent string literals concatenate
                while let TokenKind::Str(next) = self.peek().clone() {
                    value.push_str(&next);
                    self.advance();
                }
                Ok(Expr::Literal(Literal::Str(value)))
            }
            TokenKind::Bytes(first) => {
                self.advance();
                let mut value = first;
                while let TokenKind::Bytes(next) = self.peek().clone() {
                    value.extend(next);
                    self.advance();
                }
                Ok(Expr::Literal(Literal::Bytes(value)))
            }
            TokenKind::Punct("...") => {
                self.advance();
                Ok(Expr::Literal(Literal::Ellipsis))
            }
            TokenKind::Punct("(") => {
                self.advance();
                let (items, saw_comma) = self.nested(|p| p.parse_display_items(")"))?;
                match items {
                    None => Ok(Expr::Comprehension(DisplayKind::Tuple)),
                    Some(mut items) if items.len() == 1 && !saw_comma => {
                        let inner = items.remove(0);
                        if matches!(inner, Expr::Starred(_)) {
                            return Err(ExprError::Unsupported(
                                "starred expression in parentheses".to_string(),
                            ));
                        }
                        Ok(inner)
                    }
                    Some(items) => Ok(Expr::Display(DisplayKind::Tuple, items)),
                }
            }
            TokenKind::Punct("[") => {
                self.advance();
                let (items, _) = self.nested(|p| p.parse_display_items("]"))?;
                Ok(match items {
                    Some(items) => Expr::Display(DisplayKind::List, items),
                    None => Expr::Comprehension(DisplayKind::List),
                })
            }
            TokenKind::Punct("{") => {
                self.advance();
                self.nested(Self::parse_brace_display)
            }
            TokenKind::Punct("*") => {
                self.advance();
                let value = self.nested(Self::parse_or)?;
                Ok(Expr::Starred(Box::new(value)))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_brace_display(&mut self) -> Result<Expr, ExprError> {
        if self.match_punct("}") {
            return Ok(Expr::Display(DisplayKind::Dict, Vec::new()));
        }
        let first = if self.match_punct("**") {
            Expr::Starred(Box::new(self.parse_or()?))
        } else {
            self.parse_display_item()?
        };

        if !self.match_punct(":") {
            // Set display or set comprehension
            if self.check_keyword("for") {
                self.skip_comprehension("}")?;
                return Ok(Expr::Comprehension(DisplayKind::Set));
            }
            let mut items = vec![first];
            while self.match_punct(",") {
                if self.check_punct("}") {
                    break;
                }
                items.push(self.parse_display_item()?);
            }
            self.expect_punct("}")?;
            return Ok(Expr::Display(DisplayKind::Set, items));
        }

        let value = self.parse_expression()?;
        if self.check_keyword("for") {
            self.skip_comprehension("}")?;
            return Ok(Expr::Comprehension(DisplayKind::Dict));
        }
        let mut items = vec![first, value];
        while self.match_punct(",") {
            if self.check_punct("}") {
                break;
            }
            items.push(self.parse_expression()?);
            self.expect_punct(":")?;
            items.push(self.parse_expression()?);
        }
        self.expect_punct("}")?;
        Ok(Expr::Display(DisplayKind::Dict, items))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn is_reserved_word(name: &str) -> bool {
    matches!(
        name,
        "if" | "else" | "for" | "in" | "not" | "and" | "or" | "is" | "lambda" | "def" | "class"
            | "return" | "import" | "from" | "as" | "pass" | "yield" | "await"
    )
}

fn parse_int(text: &str) -> Result<BigInt, ExprError> {
    let cleaned = text.replace('_', "");
    let lower = cleaned.to_ascii_lowercase();
    let (digits, radix) = if let Some(digits) = lower.strip_prefix("0x") {
        (digits, 16)
    } else if let Some(digits) = lower.strip_prefix("0o") {
        (digits, 8)
    } else if let Some(digits) = lower.strip_prefix("0b") {
        (digits, 2)
    } else {
        if lower.len() > 1 && lower.starts_with('0') && lower.bytes().any(|b| b != b'0') {
            return Err(ExprError::InvalidLiteral(format!(
                "leading zeros in decimal integer literal {}",
                text
            )));
        }
        (lower.as_str(), 10)
    };
    BigInt::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| ExprError::InvalidLiteral(text.to_string()))
}

fn parse_float(text: &str) -> Result<f64, ExprError> {
    text.replace('_', "")
        .parse::<f64>()
        .map_err(|_| ExprError::InvalidLiteral(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{parse_expression, Lexer};

    fn declaration(text: &str) -> Result<RawDeclaration, ExprError> {
        let tokens = Lexer::new(text).tokenize()?;
        ExprParser::new(text, tokens).parse_declaration()
    }

    #[test]
    fn test_bare_name() {
        let decl = declaration("p1").unwrap();
        assert_eq!(decl.name, "p1");
        assert!(decl.annotation.is_none());
        assert!(decl.default.is_none());
        assert!(!decl.is_vararg);
    }

    #[test]
    fn test_annotation_and_default_text() {
        let decl = declaration("x: int(c_default=\"a = b\") = sys.maxsize").unwrap();
        let (expr, text) = decl.default.unwrap();
        assert_eq!(text, "sys.maxsize");
        assert_eq!(expr.dotted_name().as_deref(), Some("sys.maxsize"));
        assert!(matches!(decl.annotation, Some(Expr::Call { .. })));
    }

    #[test]
    fn test_vararg() {
        let decl = declaration("*args: object").unwrap();
        assert!(decl.is_vararg);
        assert_eq!(decl.name, "args");
    }

    #[test]
    fn test_rejects_kwargs_and_commas() {
        assert!(matches!(declaration("**kwargs"), Err(ExprError::Unsupported(_))));
        assert!(matches!(declaration("a, b"), Err(ExprError::Unsupported(_))));
        assert!(declaration("a,").is_ok());
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::Add, right, .. } => {
                assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse_expression("-2 ** 2").unwrap(),
            Expr::Unary { op: UnaryOp::Neg, .. }
        ));
        assert!(matches!(
            parse_expression("a is not b").unwrap(),
            Expr::Binary { op: BinaryOp::IsNot, .. }
        ));
        assert!(matches!(
            parse_expression("a not in b").unwrap(),
            Expr::Binary { op: BinaryOp::NotIn, .. }
        ));
    }

    #[test]
    fn test_displays() {
        assert_eq!(parse_expression("()").unwrap(), Expr::Display(DisplayKind::Tuple, vec![]));
        assert!(matches!(parse_expression("(1,)").unwrap(), Expr::Display(DisplayKind::Tuple, _)));
        assert_eq!(parse_expression("(1)").unwrap(), Expr::Literal(Literal::Int(1.into())));
        assert!(matches!(parse_expression("{1, 2}").unwrap(), Expr::Display(DisplayKind::Set, _)));
        assert!(matches!(
            parse_expression("{k: v for k in x}").unwrap(),
            Expr::Comprehension(DisplayKind::Dict)
        ));
        assert!(matches!(
            parse_expression("(x for x in (1, 2))").unwrap(),
            Expr::Comprehension(DisplayKind::Tuple)
        ));
    }

    #[test]
    fn test_call_keywords() {
        match parse_expression("str(accept={str, NoneType}, zeroes=True)").unwrap() {
            Expr::Call { args, keywords, .. } => {
                assert!(args.is_empty());
                assert_eq!(keywords.len(), 2);
                assert_eq!(keywords[0].name.as_deref(), Some("accept"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_int_literals() {
        assert_eq!(parse_int("0x10").unwrap(), BigInt::from(16));
        assert_eq!(parse_int("1_000").unwrap(), BigInt::from(1000));
        assert_eq!(parse_int("000").unwrap(), BigInt::from(0));
        assert!(parse_int("007").is_err());
        assert!(parse_int("0x").is_err());
        assert_eq!(
            parse_int("0xffffffffffffffffffffffffffffffffff").unwrap().to_str_radix(16),
            "f".repeat(34)
        );
    }

    #[test]
    fn test_nesting_limit() {
        let shallow = format!("{}1{}", "(".repeat(MAX_NESTING - 1), ")".repeat(MAX_NESTING - 1));
        assert_eq!(parse_expression(&shallow).unwrap(), Expr::Literal(Literal::Int(1.into())));

        for deep in [
            format!("{}1{}", "(".repeat(50_000), ")".repeat(50_000)),
            format!("{}1", "-".repeat(50_000)),
            format!("{}x", "not ".repeat(50_000)),
            format!("{}1{}", "[".repeat(50_000), "]".repeat(50_000)),
            "f(".repeat(50_000),
        ] {
            assert_eq!(
                parse_expression(&deep),
                Err(ExprError::Unsupported("expression nested too deeply".to_string()))
            );
        }
    }

    #[test]
    fn test_trailing_garbage() {
        assert!(parse_expression("1 2").is_err());
        assert!(parse_expression("a if b").is_err());
    }
}
