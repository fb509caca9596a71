//! Expression sub-language for annotations and default values
//!
//! Parameter lines borrow the host language's expression syntax for
//! converter annotations and default values. Only a narrow slice of that
//! syntax is meaningful here, so this module carries a small lexer and a
//! recursive-descent parser instead of a full grammar:
//! - literals, names, attribute chains, calls, unary and binary operators
//!   are parsed into their own nodes
//! - displays, comprehensions, conditionals and starred items are
//!   recognised only far enough to be classified and rejected

pub mod lexer;
pub mod literal;
pub mod parser;

pub use lexer::{Lexer, Token, TokenKind};
pub use literal::{c_repr, py_repr_str, Literal};
pub use parser::{ExprParser, RawDeclaration};

use thiserror::Error;

/// Errors from the expression lexer and parser
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: String },
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),
    #[error("unsupported syntax: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Invert,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    MatMul,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
    Is,
    IsNot,
}

/// Which bracket a display or comprehension used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKind {
    Tuple,
    List,
    Set,
    Dict,
}

/// A keyword argument in a call; `name` is `None` for a `**mapping` splat
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub name: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Name(String),
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Display(DisplayKind, Vec<Expr>),
    Comprehension(DisplayKind),
    Starred(Box<Expr>),
}

/// Coarse node classification used to accept or reject default values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprShape {
    Literal,
    Name,
    Attribute,
    Subscript,
    Unary,
    Binary,
    Call,
    Conditional,
    Display,
    Comprehension,
    Starred,
}

impl ExprShape {
    /// Shapes a default value may take when no native render override is given
    pub fn is_representable(self) -> bool {
        matches!(
            self,
            ExprShape::Literal
                | ExprShape::Name
                | ExprShape::Attribute
                | ExprShape::Subscript
                | ExprShape::Unary
                | ExprShape::Binary
        )
    }
}

impl Expr {
    pub fn shape(&self) -> ExprShape {
        match self {
            Expr::Literal(_) => ExprShape::Literal,
            Expr::Name(_) => ExprShape::Name,
            Expr::Attribute { .. } => ExprShape::Attribute,
            Expr::Subscript { .. } => ExprShape::Subscript,
            Expr::Unary { .. } => ExprShape::Unary,
            Expr::Binary { .. } => ExprShape::Binary,
            Expr::Call { .. } => ExprShape::Call,
            Expr::Conditional { .. } => ExprShape::Conditional,
            Expr::Display(..) => ExprShape::Display,
            Expr::Comprehension(_) => ExprShape::Comprehension,
            Expr::Starred(_) => ExprShape::Starred,
        }
    }

    /// First node anywhere in the tree whose shape is not representable
    pub fn first_unrepresentable(&self) -> Option<ExprShape> {
        let shape = self.shape();
        if !shape.is_representable() {
            return Some(shape);
        }
        match self {
            Expr::Attribute { value, .. } => value.first_unrepresentable(),
            Expr::Subscript { value, index } => value
                .first_unrepresentable()
                .or_else(|| index.first_unrepresentable()),
            Expr::Unary { operand, .. } => operand.first_unrepresentable(),
            Expr::Binary { left, right, .. } => left
                .first_unrepresentable()
                .or_else(|| right.first_unrepresentable()),
            _ => None,
        }
    }

    /// Constant folding limited to what a literal evaluator accepts:
    /// plain literals and signed numeric literals
    pub fn literal_value(&self) -> Option<Literal> {
        match self {
            Expr::Literal(lit) => Some(lit.clone()),
            Expr::Unary { op, operand } => match (op, operand.as_ref()) {
                (UnaryOp::Neg, Expr::Literal(lit)) => lit.negate(),
                (UnaryOp::Pos, Expr::Literal(lit)) if lit.is_numeric() => Some(lit.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// `a.b.c` as a dotted name, when the chain bottoms out in a plain name
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            Expr::Name(name) => Some(name.clone()),
            Expr::Attribute { value, attr } => {
                value.dotted_name().map(|base| format!("{base}.{attr}"))
            }
            _ => None,
        }
    }

    /// Whether this is a unary operator applied to a numeric literal
    pub fn is_signed_number(&self) -> bool {
        matches!(self, Expr::Unary { op: UnaryOp::Neg | UnaryOp::Pos, operand }
            if matches!(operand.as_ref(), Expr::Literal(lit) if lit.is_numeric()))
    }
}

/// Parse a complete expression from text
pub fn parse_expression(text: &str) -> Result<Expr, ExprError> {
    let tokens = Lexer::new(text).tokenize()?;
    let mut parser = ExprParser::new(text, tokens);
    parser.parse_complete_expression()
}
