// crates/sieve-logic/src/expr.rs
// ============================================================================
// Module: Restricted Expression Grammar
// Description: Tokenizer, Pratt parser, and interpreter for mutation
// arguments. Purpose: Evaluate arithmetic over context fields without
// executing arbitrary code. Dependencies: crate::{context, error}
// ============================================================================

//! ## Overview
//! Mutation arguments may embed expressions like
//! `clamp(player.scoring / 100 + 0.05, 0.01, 0.99)`. The grammar supports
//! arithmetic, comparisons, boolean logic, field paths, and a fixed function
//! table. Expressions are parsed once at registration; evaluation walks the
//! tree against the caller's context and random source. There is no escape
//! hatch to user code.
//!
//! Field paths accept `:`-qualified segments (`player:1f3a-9c.ego`), so a
//! hyphen directly after such a segment binds to the path; subtraction there
//! requires surrounding whitespace.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::context::ContextResolver;
use crate::context::RandomSource;
use crate::context::Scalar;
use crate::error::LogicError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum expression nesting accepted by the parser.
const MAX_EXPR_DEPTH: usize = 24;

// ============================================================================
// SECTION: AST
// ============================================================================

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Boolean negation.
    Not,
}

/// Binary operators in precedence groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Boolean OR.
    Or,
    /// Boolean AND.
    And,
    /// Equality.
    Eq,
    /// Inequality.
    Ne,
    /// Strictly less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Strictly greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Remainder.
    Rem,
}

/// Fixed function table available to expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// `logistic(x, midpoint, steepness)`: sigmoid in `(0, 1)`.
    Logistic,
    /// `clamp(x, lo, hi)`.
    Clamp,
    /// `min(a, b)`.
    Min,
    /// `max(a, b)`.
    Max,
    /// `abs(x)`.
    Abs,
    /// `floor(x)`.
    Floor,
    /// `sqrt(x)`; negative inputs clamp to zero.
    Sqrt,
    /// `weighted_choice(w1, v1, w2, v2, ...)`: draws a value by weight.
    WeightedChoice,
}

impl Function {
    /// Looks up a function by source name.
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "logistic" => Some(Self::Logistic),
            "clamp" => Some(Self::Clamp),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "abs" => Some(Self::Abs),
            "floor" => Some(Self::Floor),
            "sqrt" => Some(Self::Sqrt),
            "weighted_choice" => Some(Self::WeightedChoice),
            _ => None,
        }
    }

    /// Returns the source-level name for diagnostics.
    const fn name(self) -> &'static str {
        match self {
            Self::Logistic => "logistic",
            Self::Clamp => "clamp",
            Self::Min => "min",
            Self::Max => "max",
            Self::Abs => "abs",
            Self::Floor => "floor",
            Self::Sqrt => "sqrt",
            Self::WeightedChoice => "weighted_choice",
        }
    }
}

/// Parsed expression tree.
///
/// # Invariants
/// - Trees produced by [`parse_expr`] respect the depth bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Num(f64),
    /// Boolean literal.
    Bool(bool),
    /// Context field reference.
    Field(String),
    /// Unary application.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// Binary application.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Call into the fixed function table.
    Call {
        /// Function being applied.
        function: Function,
        /// Argument expressions.
        args: Vec<Expr>,
    },
}

// ============================================================================
// SECTION: Tokenizer
// ============================================================================

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// Numeric literal.
    Num(f64),
    /// Identifier or field path.
    Ident(String),
    /// Single- or double-character operator.
    Op(&'static str),
    /// Opening parenthesis.
    LParen,
    /// Closing parenthesis.
    RParen,
    /// Argument separator.
    Comma,
}

/// Token plus its byte offset for diagnostics.
#[derive(Debug, Clone, PartialEq)]
struct Spanned {
    /// Token payload.
    token: Token,
    /// Byte offset into the source.
    offset: usize,
}

/// Returns true when the byte may start an identifier or path.
fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

/// Returns true when the byte may continue a plain identifier segment.
fn is_ident_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'.'
}

/// Returns true when the byte may continue a `:`-qualified id segment.
fn is_qualified_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

/// Tokenizes expression source.
fn tokenize(source: &str) -> Result<Vec<Spanned>, LogicError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if byte.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let offset = i;
        if byte.is_ascii_digit() || (byte == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)) {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            let text = &source[start..i];
            let value: f64 = text.parse().map_err(|_| LogicError::Parse {
                offset,
                message: format!("invalid number literal: {text}"),
            })?;
            tokens.push(Spanned { token: Token::Num(value), offset });
            continue;
        }
        if is_ident_start(byte) {
            let start = i;
            while i < bytes.len() && is_ident_continue(bytes[i]) {
                i += 1;
            }
            // A colon pulls in one qualified segment (entity ids may contain
            // hyphens), then dotted continuation resumes.
            while i < bytes.len() && bytes[i] == b':' {
                i += 1;
                while i < bytes.len() && is_qualified_continue(bytes[i]) {
                    i += 1;
                }
                while i < bytes.len() && is_ident_continue(bytes[i]) {
                    i += 1;
                }
            }
            tokens.push(Spanned { token: Token::Ident(source[start..i].to_string()), offset });
            continue;
        }
        let two = if i + 1 < bytes.len() && source.is_char_boundary(i + 2) {
            &source[i..i + 2]
        } else {
            ""
        };
        let matched: Option<(&'static str, usize)> = match two {
            "&&" => Some(("&&", 2)),
            "||" => Some(("||", 2)),
            "==" => Some(("==", 2)),
            "!=" => Some(("!=", 2)),
            "<=" => Some(("<=", 2)),
            ">=" => Some((">=", 2)),
            _ => match byte {
                b'+' => Some(("+", 1)),
                b'-' => Some(("-", 1)),
                b'*' => Some(("*", 1)),
                b'/' => Some(("/", 1)),
                b'%' => Some(("%", 1)),
                b'<' => Some(("<", 1)),
                b'>' => Some((">", 1)),
                b'!' => Some(("!", 1)),
                _ => None,
            },
        };
        if let Some((op, width)) = matched {
            tokens.push(Spanned { token: Token::Op(op), offset });
            i += width;
            continue;
        }
        match byte {
            b'(' => {
                tokens.push(Spanned { token: Token::LParen, offset });
                i += 1;
            }
            b')' => {
                tokens.push(Spanned { token: Token::RParen, offset });
                i += 1;
            }
            b',' => {
                tokens.push(Spanned { token: Token::Comma, offset });
                i += 1;
            }
            _ => {
                return Err(LogicError::Parse {
                    offset,
                    message: format!("unexpected character: {}", char::from(byte)),
                });
            }
        }
    }
    Ok(tokens)
}

// ============================================================================
// SECTION: Parser
// ============================================================================

/// Pratt parser state over the token stream.
struct Parser {
    /// Token stream.
    tokens: Vec<Spanned>,
    /// Cursor into the stream.
    pos: usize,
    /// Total source length, for end-of-input diagnostics.
    end: usize,
}

impl Parser {
    /// Peeks the current token.
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    /// Consumes and returns the current token.
    fn next(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.pos).cloned();
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    /// Returns the offset used for end-of-input errors.
    fn here(&self) -> usize {
        self.peek().map_or(self.end, |spanned| spanned.offset)
    }

    /// Returns the binding power of a binary operator token, if any.
    fn binding_power(op: &str) -> Option<u8> {
        match op {
            "||" => Some(1),
            "&&" => Some(2),
            "==" | "!=" => Some(3),
            "<" | "<=" | ">" | ">=" => Some(4),
            "+" | "-" => Some(5),
            "*" | "/" | "%" => Some(6),
            _ => None,
        }
    }

    /// Maps an operator token to its AST operator.
    fn binary_op(op: &str) -> Option<BinaryOp> {
        match op {
            "||" => Some(BinaryOp::Or),
            "&&" => Some(BinaryOp::And),
            "==" => Some(BinaryOp::Eq),
            "!=" => Some(BinaryOp::Ne),
            "<" => Some(BinaryOp::Lt),
            "<=" => Some(BinaryOp::Lte),
            ">" => Some(BinaryOp::Gt),
            ">=" => Some(BinaryOp::Gte),
            "+" => Some(BinaryOp::Add),
            "-" => Some(BinaryOp::Sub),
            "*" => Some(BinaryOp::Mul),
            "/" => Some(BinaryOp::Div),
            "%" => Some(BinaryOp::Rem),
            _ => None,
        }
    }

    /// Parses an expression with at least `min_bp` binding power.
    fn parse_bp(&mut self, min_bp: u8, depth: usize) -> Result<Expr, LogicError> {
        if depth > MAX_EXPR_DEPTH {
            return Err(LogicError::TooDeep { max: MAX_EXPR_DEPTH, actual: depth });
        }
        let mut left = self.parse_prefix(depth)?;
        loop {
            let Some(spanned) = self.peek() else { break };
            let Token::Op(op) = &spanned.token else { break };
            let Some(bp) = Self::binding_power(op) else { break };
            if bp < min_bp {
                break;
            }
            let op = *op;
            self.pos += 1;
            let right = self.parse_bp(bp + 1, depth + 1)?;
            let Some(ast_op) = Self::binary_op(op) else { break };
            left = Expr::Binary { op: ast_op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    /// Parses a prefix expression: literal, field, unary, call, or group.
    fn parse_prefix(&mut self, depth: usize) -> Result<Expr, LogicError> {
        let offset = self.here();
        let Some(spanned) = self.next() else {
            return Err(LogicError::Parse { offset, message: "unexpected end of expression".to_string() });
        };
        match spanned.token {
            Token::Num(value) => Ok(Expr::Num(value)),
            Token::Ident(name) => self.parse_ident(name, spanned.offset, depth),
            Token::Op("-") => Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(self.parse_bp(7, depth + 1)?),
            }),
            Token::Op("!") => Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(self.parse_bp(7, depth + 1)?),
            }),
            Token::LParen => {
                let inner = self.parse_bp(0, depth + 1)?;
                self.expect_rparen()?;
                Ok(inner)
            }
            _ => Err(LogicError::Parse {
                offset: spanned.offset,
                message: "expected literal, field, or '('".to_string(),
            }),
        }
    }

    /// Parses an identifier continuation: literal keyword, call, or field.
    fn parse_ident(&mut self, name: String, offset: usize, depth: usize) -> Result<Expr, LogicError> {
        match name.as_str() {
            "true" => return Ok(Expr::Bool(true)),
            "false" => return Ok(Expr::Bool(false)),
            _ => {}
        }
        if matches!(self.peek(), Some(spanned) if spanned.token == Token::LParen) {
            self.pos += 1;
            let function = Function::from_name(&name)
                .ok_or_else(|| LogicError::UnknownFunction(name.clone()))?;
            let mut args = Vec::new();
            if !matches!(self.peek(), Some(spanned) if spanned.token == Token::RParen) {
                loop {
                    args.push(self.parse_bp(0, depth + 1)?);
                    match self.next() {
                        Some(spanned) if spanned.token == Token::Comma => {}
                        Some(spanned) if spanned.token == Token::RParen => break,
                        _ => {
                            return Err(LogicError::Parse {
                                offset,
                                message: "expected ',' or ')' in argument list".to_string(),
                            });
                        }
                    }
                }
            } else {
                self.pos += 1;
            }
            check_arity(function, args.len())?;
            return Ok(Expr::Call { function, args });
        }
        Ok(Expr::Field(name))
    }

    /// Consumes a closing parenthesis or errors.
    fn expect_rparen(&mut self) -> Result<(), LogicError> {
        let offset = self.here();
        match self.next() {
            Some(spanned) if spanned.token == Token::RParen => Ok(()),
            _ => Err(LogicError::Parse { offset, message: "expected ')'".to_string() }),
        }
    }
}

/// Validates the argument count for a function.
fn check_arity(function: Function, actual: usize) -> Result<(), LogicError> {
    let valid = match function {
        Function::Logistic | Function::Clamp => actual == 3,
        Function::Min | Function::Max => actual == 2,
        Function::Abs | Function::Floor | Function::Sqrt => actual == 1,
        Function::WeightedChoice => actual >= 2 && actual % 2 == 0,
    };
    if valid {
        Ok(())
    } else {
        let expected = match function {
            Function::Logistic | Function::Clamp => 3,
            Function::Min | Function::Max => 2,
            Function::Abs | Function::Floor | Function::Sqrt => 1,
            Function::WeightedChoice => 2,
        };
        Err(LogicError::Arity { function: function.name().to_string(), expected, actual })
    }
}

/// Parses expression source into an [`Expr`] tree.
///
/// # Errors
///
/// Returns [`LogicError::Parse`], [`LogicError::UnknownFunction`],
/// [`LogicError::Arity`], or [`LogicError::TooDeep`].
pub fn parse_expr(source: &str) -> Result<Expr, LogicError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0, end: source.len() };
    let expr = parser.parse_bp(0, 0)?;
    if let Some(spanned) = parser.peek() {
        return Err(LogicError::Parse {
            offset: spanned.offset,
            message: "trailing input after expression".to_string(),
        });
    }
    Ok(expr)
}

// ============================================================================
// SECTION: Interpreter
// ============================================================================

impl Expr {
    /// Evaluates the expression against a context and random source.
    ///
    /// Missing fields resolve to `0.0` so mutation arguments stay total;
    /// division by zero yields `0.0` for the same reason.
    ///
    /// # Errors
    ///
    /// Returns [`LogicError::TypeMismatch`] when an operand has a type the
    /// operator cannot consume, or [`LogicError::DegenerateWeights`] from
    /// `weighted_choice`.
    pub fn eval<C, R>(&self, ctx: &C, rng: &mut R) -> Result<Scalar, LogicError>
    where
        C: ContextResolver,
        R: RandomSource,
    {
        match self {
            Self::Num(value) => Ok(Scalar::Num(*value)),
            Self::Bool(value) => Ok(Scalar::Bool(*value)),
            Self::Field(path) => Ok(ctx.resolve(path).unwrap_or(Scalar::Num(0.0))),
            Self::Unary { op, operand } => {
                let value = operand.eval(ctx, rng)?;
                match op {
                    UnaryOp::Neg => Ok(Scalar::Num(-as_number(&value)?)),
                    UnaryOp::Not => Ok(Scalar::Bool(!value.truthy())),
                }
            }
            Self::Binary { op, left, right } => eval_binary(*op, left, right, ctx, rng),
            Self::Call { function, args } => eval_call(*function, args, ctx, rng),
        }
    }
}

/// Extracts a number or raises a type mismatch.
fn as_number(value: &Scalar) -> Result<f64, LogicError> {
    value.as_num().ok_or_else(|| LogicError::TypeMismatch {
        expected: "number".to_string(),
        found: value.type_label().to_string(),
    })
}

/// Evaluates a binary application.
fn eval_binary<C, R>(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    ctx: &C,
    rng: &mut R,
) -> Result<Scalar, LogicError>
where
    C: ContextResolver,
    R: RandomSource,
{
    match op {
        BinaryOp::Or => {
            let lhs = left.eval(ctx, rng)?;
            if lhs.truthy() {
                return Ok(Scalar::Bool(true));
            }
            Ok(Scalar::Bool(right.eval(ctx, rng)?.truthy()))
        }
        BinaryOp::And => {
            let lhs = left.eval(ctx, rng)?;
            if !lhs.truthy() {
                return Ok(Scalar::Bool(false));
            }
            Ok(Scalar::Bool(right.eval(ctx, rng)?.truthy()))
        }
        BinaryOp::Eq | BinaryOp::Ne => {
            let lhs = left.eval(ctx, rng)?;
            let rhs = right.eval(ctx, rng)?;
            let equal = scalars_equal(&lhs, &rhs);
            Ok(Scalar::Bool(if matches!(op, BinaryOp::Eq) { equal } else { !equal }))
        }
        BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
            let lhs = as_number(&left.eval(ctx, rng)?)?;
            let rhs = as_number(&right.eval(ctx, rng)?)?;
            let outcome = match op {
                BinaryOp::Lt => lhs < rhs,
                BinaryOp::Lte => lhs <= rhs,
                BinaryOp::Gt => lhs > rhs,
                _ => lhs >= rhs,
            };
            Ok(Scalar::Bool(outcome))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let lhs = as_number(&left.eval(ctx, rng)?)?;
            let rhs = as_number(&right.eval(ctx, rng)?)?;
            let outcome = match op {
                BinaryOp::Add => lhs + rhs,
                BinaryOp::Sub => lhs - rhs,
                BinaryOp::Mul => lhs * rhs,
                BinaryOp::Div => {
                    if rhs == 0.0 {
                        0.0
                    } else {
                        lhs / rhs
                    }
                }
                _ => {
                    if rhs == 0.0 {
                        0.0
                    } else {
                        lhs % rhs
                    }
                }
            };
            Ok(Scalar::Num(outcome))
        }
    }
}

/// Structural scalar equality used by `==` and `!=`.
fn scalars_equal(left: &Scalar, right: &Scalar) -> bool {
    match (left, right) {
        (Scalar::Num(l), Scalar::Num(r)) => (l - r).abs() < f64::EPSILON,
        (Scalar::Bool(l), Scalar::Bool(r)) => l == r,
        (Scalar::Str(l), Scalar::Str(r)) => l == r,
        _ => false,
    }
}

/// Evaluates a call into the fixed function table.
fn eval_call<C, R>(
    function: Function,
    args: &[Expr],
    ctx: &C,
    rng: &mut R,
) -> Result<Scalar, LogicError>
where
    C: ContextResolver,
    R: RandomSource,
{
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(as_number(&arg.eval(ctx, rng)?)?);
    }
    let outcome = match function {
        Function::Logistic => {
            let (x, midpoint, steepness) = (values[0], values[1], values[2]);
            1.0 / (1.0 + (-steepness * (x - midpoint)).exp())
        }
        Function::Clamp => values[0].clamp(values[1].min(values[2]), values[1].max(values[2])),
        Function::Min => values[0].min(values[1]),
        Function::Max => values[0].max(values[1]),
        Function::Abs => values[0].abs(),
        Function::Floor => values[0].floor(),
        Function::Sqrt => values[0].max(0.0).sqrt(),
        Function::WeightedChoice => {
            let total: f64 = values.iter().step_by(2).sum();
            if total <= 0.0 {
                return Err(LogicError::DegenerateWeights);
            }
            let mut draw = rng.next_unit() * total;
            let mut chosen = values[values.len() - 1];
            for pair in values.chunks_exact(2) {
                if draw < pair[0] {
                    chosen = pair[1];
                    break;
                }
                draw -= pair[0];
            }
            chosen
        }
    };
    Ok(Scalar::Num(outcome))
}
