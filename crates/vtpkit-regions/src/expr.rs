//! Algebraic expressions over `x`, `y` and `z`.
//!
//! Expressions are compiled once into a tree and evaluated many times.
//! Grammar, loosest binding first:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := primary (('^' | '**') unary)?
//! primary := number | ident | ident '(' expr (',' expr)* ')' | '(' expr ')'
//! ```
//!
//! `^` is right associative and `-x^2` parses as `-(x^2)`.

use std::fmt;
use thiserror::Error;

/// Expression compile error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    Arity {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("unexpected {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Ident(usize, usize),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

impl Token {
    fn describe(&self, source: &str) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Ident(start, end) => format!("identifier '{}'", &source[*start..*end]),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::Caret => "'^'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let ch = bytes[pos];
        match ch {
            b' ' | b'\t' | b'\r' | b'\n' => pos += 1,
            b'0'..=b'9' | b'.' => {
                let start = pos;
                while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
                    pos += 1;
                }
                // exponent, only when digits follow
                if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
                    let mut look = pos + 1;
                    if look < bytes.len() && (bytes[look] == b'+' || bytes[look] == b'-') {
                        look += 1;
                    }
                    if look < bytes.len() && bytes[look].is_ascii_digit() {
                        pos = look;
                        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                            pos += 1;
                        }
                    }
                }
                let text = &source[start..pos];
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ExprError::InvalidNumber(text.to_string()))?;
                tokens.push(Token::Number(value));
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                let start = pos;
                while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_')
                {
                    pos += 1;
                }
                tokens.push(Token::Ident(start, pos));
            }
            b'+' => {
                tokens.push(Token::Plus);
                pos += 1;
            }
            b'-' => {
                tokens.push(Token::Minus);
                pos += 1;
            }
            b'*' => {
                if bytes.get(pos + 1) == Some(&b'*') {
                    tokens.push(Token::Caret);
                    pos += 2;
                } else {
                    tokens.push(Token::Star);
                    pos += 1;
                }
            }
            b'/' => {
                tokens.push(Token::Slash);
                pos += 1;
            }
            b'^' => {
                tokens.push(Token::Caret);
                pos += 1;
            }
            b'(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            b')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            b',' => {
                tokens.push(Token::Comma);
                pos += 1;
            }
            _ => {
                let ch = source[pos..].chars().next().unwrap_or('?');
                return Err(ExprError::UnexpectedChar(ch));
            }
        }
    }

    Ok(tokens)
}

/// Built-in functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Exp,
    Ln,
    Log10,
    Abs,
    Floor,
    Ceil,
    Min,
    Max,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        let function = match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "sqrt" => Self::Sqrt,
            "exp" => Self::Exp,
            // log is the natural logarithm
            "ln" | "log" => Self::Ln,
            "log10" => Self::Log10,
            "abs" => Self::Abs,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "min" => Self::Min,
            "max" => Self::Max,
            _ => return None,
        };
        Some(function)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Sqrt => "sqrt",
            Self::Exp => "exp",
            Self::Ln => "ln",
            Self::Log10 => "log10",
            Self::Abs => "abs",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    fn arity(self) -> usize {
        match self {
            Self::Min | Self::Max => 2,
            _ => 1,
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        let a = args[0];
        match self {
            Self::Sin => a.sin(),
            Self::Cos => a.cos(),
            Self::Tan => a.tan(),
            Self::Asin => a.asin(),
            Self::Acos => a.acos(),
            Self::Atan => a.atan(),
            Self::Sqrt => a.sqrt(),
            Self::Exp => a.exp(),
            Self::Ln => a.ln(),
            Self::Log10 => a.log10(),
            Self::Abs => a.abs(),
            Self::Floor => a.floor(),
            Self::Ceil => a.ceil(),
            Self::Min => a.min(args[1]),
            Self::Max => a.max(args[1]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Var {
    X,
    Y,
    Z,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Number(f64),
    Var(Var),
    Neg(Box<Node>),
    Call(Function, Vec<Node>),
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn eval(&self, x: f64, y: f64, z: f64) -> f64 {
        match self {
            Node::Number(n) => *n,
            Node::Var(Var::X) => x,
            Node::Var(Var::Y) => y,
            Node::Var(Var::Z) => z,
            Node::Neg(inner) => -inner.eval(x, y, z),
            Node::Call(function, args) => {
                let values: Vec<f64> = args.iter().map(|arg| arg.eval(x, y, z)).collect();
                function.apply(&values)
            }
            Node::Binary { op, left, right } => {
                let l = left.eval(x, y, z);
                let r = right.eval(x, y, z);
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                    BinaryOp::Pow => l.powf(r),
                }
            }
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn parse_expr(&mut self) -> Result<Node, ExprError> {
        let mut node = self.parse_term()?;
        loop {
            let op = if self.consume(Token::Plus) {
                BinaryOp::Add
            } else if self.consume(Token::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };
            let right = self.parse_term()?;
            node = Node::Binary {
                op,
                left: Box::new(node),
                right: Box::new(right),
            };
        }
        Ok(node)
    }

    fn parse_term(&mut self) -> Result<Node, ExprError> {
        let mut node = self.parse_unary()?;
        loop {
            let op = if self.consume(Token::Star) {
                BinaryOp::Mul
            } else if self.consume(Token::Slash) {
                BinaryOp::Div
            } else {
                break;
            };
            let right = self.parse_unary()?;
            node = Node::Binary {
                op,
                left: Box::new(node),
                right: Box::new(right),
            };
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Node, ExprError> {
        if self.consume(Token::Plus) {
            return self.parse_unary();
        }
        if self.consume(Token::Minus) {
            let inner = self.parse_unary()?;
            return Ok(Node::Neg(Box::new(inner)));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Node, ExprError> {
        let base = self.parse_primary()?;
        if self.consume(Token::Caret) {
            let exponent = self.parse_unary()?;
            return Ok(Node::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Node, ExprError> {
        let token = self.next().ok_or(ExprError::UnexpectedEnd)?;
        match token {
            Token::Number(value) => Ok(Node::Number(value)),
            Token::Ident(start, end) => {
                let name = self.source[start..end].to_ascii_lowercase();
                if self.consume(Token::LParen) {
                    self.parse_call(&name)
                } else {
                    Self::identifier(name)
                }
            }
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            other => Err(ExprError::UnexpectedToken(other.describe(self.source))),
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<Node, ExprError> {
        let function =
            Function::lookup(name).ok_or_else(|| ExprError::UnknownFunction(name.to_string()))?;

        let mut args = vec![self.parse_expr()?];
        while self.consume(Token::Comma) {
            args.push(self.parse_expr()?);
        }
        self.expect(Token::RParen)?;

        if args.len() != function.arity() {
            return Err(ExprError::Arity {
                name: function.name(),
                expected: function.arity(),
                found: args.len(),
            });
        }
        Ok(Node::Call(function, args))
    }

    fn identifier(name: String) -> Result<Node, ExprError> {
        match name.as_str() {
            "x" => Ok(Node::Var(Var::X)),
            "y" => Ok(Node::Var(Var::Y)),
            "z" => Ok(Node::Var(Var::Z)),
            "pi" => Ok(Node::Number(std::f64::consts::PI)),
            "e" => Ok(Node::Number(std::f64::consts::E)),
            _ => Err(ExprError::UnknownIdentifier(name)),
        }
    }

    fn consume(&mut self, expected: Token) -> bool {
        if let Some(token) = self.peek() {
            if std::mem::discriminant(token) == std::mem::discriminant(&expected) {
                self.pos += 1;
                return true;
            }
        }
        false
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExprError> {
        if self.consume(expected) {
            return Ok(());
        }
        match self.peek() {
            Some(token) => Err(ExprError::UnexpectedToken(token.describe(self.source))),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }
}

/// A compiled expression
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    source: String,
    root: Node,
}

impl Expr {
    /// Compile an expression
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let trimmed = source.trim();
        let tokens = tokenize(trimmed)?;
        if tokens.is_empty() {
            return Err(ExprError::Empty);
        }

        let mut parser = Parser {
            source: trimmed,
            tokens,
            pos: 0,
        };
        let root = parser.parse_expr()?;
        if let Some(token) = parser.peek() {
            return Err(ExprError::UnexpectedToken(token.describe(trimmed)));
        }

        Ok(Self {
            source: trimmed.to_string(),
            root,
        })
    }

    /// Evaluate at a point
    pub fn eval(&self, x: f64, y: f64, z: f64) -> f64 {
        self.root.eval(x, y, z)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::str::FromStr for Expr {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
