//! Error types for the numcalc crate.
//!
//! This module defines the failure modes of each stage of the pipeline:
//!
//! - `ParseError`: Malformed expression text, raised while compiling
//! - `DomainError`: An operation that is undefined at one evaluation point
//! - `CalculusError`: Failures of the numeric routines (differentiation, integration,
//!   root finding), including domain errors hit while sampling a function
//! - `ConvergenceWarning`: A non-fatal note attached to a quadrature result whose
//!   subdivision budget ran out
//! - `Error`: Umbrella type for callers that chain compilation and computation with `?`
//!
//! Each error type implements the standard Error trait and provides detailed error messages.

use thiserror::Error;

use crate::number::Number;

/// Errors that can occur while turning expression text into an operator tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The expression contains no tokens at all
    #[error("empty expression")]
    Empty,
    /// The token stream ended where an operand was expected (e.g. `2*x+`)
    #[error("unexpected end of expression, expected an operand")]
    UnexpectedEnd,
    /// A token appeared where it cannot be used
    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken { token: String, position: usize },
    /// An opening parenthesis was never closed, or a closing one has no partner
    #[error("unbalanced parenthesis at position {position}")]
    UnbalancedParen { position: usize },
    /// An identifier that is neither the variable, a constant nor a known function
    #[error("unknown identifier '{name}' at position {position}")]
    UnknownIdentifier { name: String, position: usize },
    /// A character the lexer does not recognize
    #[error("invalid character '{ch}' at position {position}")]
    InvalidCharacter { ch: char, position: usize },
    /// A numeral that cannot be read as a finite number
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
    /// A function name that is not followed by a parenthesized argument
    #[error("function '{0}' must be followed by a parenthesized argument")]
    MissingArgument(String),
    /// The requested variable name is not an identifier or collides with a builtin
    #[error("invalid variable name '{0}'")]
    InvalidVariable(String),
    /// Nesting or tree height beyond what the parser allows
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Errors raised when an operation is undefined at a specific evaluation point.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DomainError {
    /// Division by an exact zero, including `0^b` with a negative exponent
    #[error("division by zero")]
    DivisionByZero,
    /// Logarithm of a non-positive real or of complex zero
    #[error("logarithm undefined at {0}")]
    Logarithm(Number),
    /// A real function evaluated outside its real domain
    #[error("{function} undefined at {argument}")]
    OutOfDomain {
        function: &'static str,
        argument: Number,
    },
    /// The evaluation produced NaN or an infinity
    #[error("evaluation produced a non-finite value {0}")]
    NonFinite(Number),
}

/// Errors produced by the numeric routines built on top of compiled functions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculusError {
    /// The sampled function raised a domain error at `point`
    #[error("evaluation failed at {point}")]
    Evaluation {
        point: Number,
        #[source]
        source: DomainError,
    },
    /// A caller-supplied argument is out of range
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Newton iteration exhausted its iteration budget
    #[error(
        "root search did not converge after {iterations} iterations (last step {last_step:e}, last iterate {last_iterate})"
    )]
    NonConvergence {
        iterations: usize,
        last_step: f64,
        last_iterate: Number,
    },
    /// The estimated derivative vanished, so the Newton update is undefined
    #[error("derivative {derivative} is numerically zero at {point}")]
    SingularDerivative { point: Number, derivative: Number },
}

/// Which budget of the adaptive quadrature ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCause {
    /// A subinterval reached the maximum bisection depth
    DepthLimit,
    /// The total number of evaluated subintervals reached its limit
    SubintervalLimit,
}

/// Non-fatal note attached to a quadrature result that did not meet its tolerance.
///
/// The integral value it accompanies is still the best available estimate.
#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "quadrature stopped by {cause:?} after {intervals} subintervals (estimated error {error_estimate:e})"
)]
pub struct ConvergenceWarning {
    pub cause: WarningCause,
    pub intervals: usize,
    pub error_estimate: f64,
}

/// High-level error covering every fatal failure of the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Error when parsing the expression text
    #[error("failed to compile expression")]
    Parse(#[from] ParseError),
    /// Error when evaluating a compiled function directly
    #[error("failed to evaluate expression")]
    Domain(#[from] DomainError),
    /// Error inside a differentiation, integration or root-finding routine
    #[error("numeric routine failed")]
    Calculus(#[from] CalculusError),
}
