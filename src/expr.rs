//! Expression module for representing parsed mathematical expressions.
//!
//! This module defines `Expr`, the immutable operator tree produced by the parser and
//! walked by the evaluator. The tree is built recursively using `Box<Expr>` for nested
//! expressions and holds no evaluation state, so one tree can be evaluated any number of
//! times, from any number of threads.
//!
//! # Expression Tree Structure
//! The expression tree is built recursively with each node being one of:
//! - Leaf nodes: numerals, named constants and the free variable
//! - Unary operations: negation and calls to registry functions
//! - Binary operations: Add, Sub, Mul, Div, Pow
//!
//! # Evaluation
//! `eval` maps a `Number` for the free variable to a `Number` result. Operand tags decide
//! the result tag (see [`Number`]), and undefined operations surface as a
//! [`DomainError`] instead of a NaN or an infinity.

use crate::errors::DomainError;
use crate::number::Number;
use crate::registry::{Builtin, Constant};

/// An expression tree node representing mathematical operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeral from the source text
    Const(f64),
    /// A named constant (`pi`, `e`, `i`)
    Constant(Constant),
    /// The free variable, by name
    Var(String),
    /// Addition of two expressions
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction of two expressions
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication of two expressions
    Mul(Box<Expr>, Box<Expr>),
    /// Division of two expressions
    Div(Box<Expr>, Box<Expr>),
    /// Exponentiation of an expression by another expression
    Pow(Box<Expr>, Box<Expr>),
    /// Negation of an expression
    Neg(Box<Expr>),
    /// A registry function applied to an expression
    Call(Builtin, Box<Expr>),
}

impl Expr {
    /// Evaluates the tree with the free variable bound to `x`.
    ///
    /// # Errors
    /// Returns the first `DomainError` met while walking the tree, e.g. a division by
    /// zero or the real logarithm of a non-positive value.
    pub fn eval(&self, x: Number) -> Result<Number, DomainError> {
        match self {
            Expr::Const(value) => Ok(Number::Real(*value)),
            Expr::Constant(constant) => Ok(constant.value()),
            Expr::Var(_) => Ok(x),
            Expr::Add(left, right) => Ok(left.eval(x)? + right.eval(x)?),
            Expr::Sub(left, right) => Ok(left.eval(x)? - right.eval(x)?),
            Expr::Mul(left, right) => Ok(left.eval(x)? * right.eval(x)?),
            Expr::Div(left, right) => left.eval(x)?.checked_div(right.eval(x)?),
            Expr::Pow(base, exponent) => base.eval(x)?.pow(exponent.eval(x)?),
            Expr::Neg(expr) => Ok(-expr.eval(x)?),
            Expr::Call(builtin, arg) => builtin.apply(arg.eval(x)?),
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match self {
            Expr::Const(_) | Expr::Constant(_) | Expr::Var(_) => 1,
            Expr::Add(left, right)
            | Expr::Sub(left, right)
            | Expr::Mul(left, right)
            | Expr::Div(left, right)
            | Expr::Pow(left, right) => 1 + left.node_count() + right.node_count(),
            Expr::Neg(expr) | Expr::Call(_, expr) => 1 + expr.node_count(),
        }
    }

    /// Returns true if the free variable occurs anywhere in the tree.
    pub fn contains_var(&self) -> bool {
        match self {
            Expr::Var(_) => true,
            Expr::Const(_) | Expr::Constant(_) => false,
            Expr::Add(left, right)
            | Expr::Sub(left, right)
            | Expr::Mul(left, right)
            | Expr::Div(left, right)
            | Expr::Pow(left, right) => left.contains_var() || right.contains_var(),
            Expr::Neg(expr) | Expr::Call(_, expr) => expr.contains_var(),
        }
    }
}

/// Implements string representation of expressions.
///
/// The format is:
/// - Constants and variables print by value or name
/// - Binary operations are fully parenthesized: (a + b)
/// - Functions use call notation: sin(x)
/// - Negation is parenthesized with its operand: (-x)
///
/// The output parses back into an equal tree.
impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Const(val) => write!(f, "{val}"),
            Expr::Constant(constant) => write!(f, "{}", constant.name()),
            Expr::Var(name) => write!(f, "{name}"),
            Expr::Add(left, right) => write!(f, "({left} + {right})"),
            Expr::Sub(left, right) => write!(f, "({left} - {right})"),
            Expr::Mul(left, right) => write!(f, "({left} * {right})"),
            Expr::Div(left, right) => write!(f, "({left} / {right})"),
            Expr::Pow(base, exponent) => write!(f, "({base}^{exponent})"),
            Expr::Neg(expr) => write!(f, "(-{expr})"),
            Expr::Call(builtin, arg) => write!(f, "{}({arg})", builtin.name()),
        }
    }
}
