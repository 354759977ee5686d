//! Compilation of expression text into an evaluable function of one variable.
//!
//! This module provides the `CompiledFunction` type, which pairs the operator tree of an
//! expression with the name of its free variable and the normalized source text.
//! Compilation runs the whole front end once:
//!
//! 1. implicit multiplication is made explicit (`2x` → `2*x`)
//! 2. the normalized text is tokenized
//! 3. the tokens are parsed into an [`Expr`] tree
//!
//! A compiled function is immutable. Evaluating it never changes it, so it can be shared
//! freely between threads and handed to any number of numeric routines.
//!
//! # Example
//!
//! ```
//! use numcalc::{compile, Number};
//!
//! let f = compile("3t^2 + 1", "t").unwrap();
//! assert_eq!(f.eval(2.0).unwrap(), Number::Real(13.0));
//! assert_eq!(f.eval(Number::complex(1.0, 1.0)).unwrap(), Number::complex(1.0, 6.0));
//! ```

use colored::Colorize;
use rayon::prelude::*;
use tracing::debug;

use crate::errors::{DomainError, ParseError};
use crate::expr::Expr;
use crate::lexer::{scan, tokenize, LexemeKind};
use crate::number::Number;
use crate::parser::parse_expression;
use crate::preprocess::implicit_mul;
use crate::registry::is_reserved;
use crate::types::NumericFn;

/// Variable name used by [`CompiledFunction::new`].
pub const DEFAULT_VARIABLE: &str = "x";

/// A mathematical expression compiled into a function of a single variable.
///
/// Holds:
/// - the normalized expression text (implicit products made explicit)
/// - the name of the free variable
/// - the operator tree walked on every evaluation
///
/// Two compilations of the same text with the same variable compare equal.
#[derive(Clone, PartialEq)]
pub struct CompiledFunction {
    expression: String,
    variable: String,
    ast: Expr,
}

impl std::fmt::Debug for CompiledFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{{\n")?;
        writeln!(f, "    {}: {}\n", "Expression".cyan(), self.expression)?;
        writeln!(f, "    {}: {}\n", "Variable".cyan(), self.variable)?;
        writeln!(f, "    {}: {}\n", "Tree".cyan(), self.ast)?;
        writeln!(f, "}}")?;
        Ok(())
    }
}

impl std::fmt::Display for CompiledFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} = {}",
            format!("f({})", self.variable).cyan(),
            self.expression
        )
    }
}

impl CompiledFunction {
    /// Compiles `expression` as a function of `x`.
    ///
    /// # Example
    /// ```
    /// # use numcalc::{CompiledFunction, Number};
    /// let f = CompiledFunction::new("2x + 1").unwrap();
    /// assert_eq!(f.eval(3.0).unwrap(), Number::Real(7.0));
    /// ```
    pub fn new(expression: &str) -> Result<Self, ParseError> {
        Self::with_variable(expression, DEFAULT_VARIABLE)
    }

    /// Compiles `expression` as a function of `variable`.
    ///
    /// # Errors
    /// Returns `ParseError` if:
    /// - `variable` is not an identifier, or is a builtin function or constant name
    /// - the expression is empty or malformed
    /// - the expression uses an identifier other than `variable`, a constant or a function
    pub fn with_variable(expression: &str, variable: &str) -> Result<Self, ParseError> {
        validate_variable(variable)?;

        let normalized = implicit_mul(expression);
        let tokens = tokenize(&normalized)?;
        let ast = parse_expression(&tokens, variable)?;

        debug!(
            expression = %normalized,
            variable,
            nodes = ast.node_count(),
            "compiled expression"
        );

        Ok(Self {
            expression: normalized,
            variable: variable.to_string(),
            ast,
        })
    }

    /// Evaluates the function at `x`.
    ///
    /// Real inputs on real-only paths give Real results; a Complex input, or any step
    /// that leaves the reals, gives a Complex result.
    ///
    /// # Errors
    /// Returns `DomainError` if an operation is undefined at `x`, or if the result is
    /// NaN or infinite.
    pub fn eval(&self, x: impl Into<Number>) -> Result<Number, DomainError> {
        let value = self.ast.eval(x.into())?;
        if !value.is_finite() {
            return Err(DomainError::NonFinite(value));
        }
        Ok(value)
    }

    /// Evaluates the function at every point of `points` in parallel.
    ///
    /// Results come back in the order of `points`, one `Result` per point, so a domain
    /// error at one point does not hide the values at the others.
    ///
    /// # Example
    /// ```
    /// # use numcalc::{CompiledFunction, Number};
    /// let f = CompiledFunction::new("1/x").unwrap();
    /// let results = f.eval_parallel(&[Number::Real(2.0), Number::ZERO]);
    /// assert_eq!(results[0], Ok(Number::Real(0.5)));
    /// assert!(results[1].is_err());
    /// ```
    pub fn eval_parallel(&self, points: &[Number]) -> Vec<Result<Number, DomainError>> {
        let num_threads = rayon::current_num_threads();
        let chunk_size = (points.len() / (num_threads * 4)).max(1);

        points
            .par_chunks(chunk_size)
            .flat_map_iter(|chunk| chunk.iter().map(|&x| self.eval(x)))
            .collect()
    }

    /// Returns the normalized expression text.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns the name of the free variable.
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Returns the operator tree.
    pub fn ast(&self) -> &Expr {
        &self.ast
    }
}

impl NumericFn for CompiledFunction {
    fn evaluate(&self, x: Number) -> Result<Number, DomainError> {
        self.eval(x)
    }
}

/// Compiles `expression` as a function of `variable`.
///
/// Shorthand for [`CompiledFunction::with_variable`].
pub fn compile(expression: &str, variable: &str) -> Result<CompiledFunction, ParseError> {
    CompiledFunction::with_variable(expression, variable)
}

/// A variable must be a single identifier that does not shadow the registry.
fn validate_variable(variable: &str) -> Result<(), ParseError> {
    let lexemes = scan(variable);
    let is_identifier = matches!(
        lexemes.as_slice(),
        [lexeme] if lexeme.kind == LexemeKind::Ident
    );

    if !is_identifier || is_reserved(variable) {
        return Err(ParseError::InvalidVariable(variable.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_compile_and_eval() {
        let f = compile("x^2", "x").unwrap();
        assert_eq!(f.eval(3.0), Ok(Number::Real(9.0)));
        assert_eq!(f.eval(Number::complex(1.0, 1.0)), Ok(Number::complex(0.0, 2.0)));
    }

    #[test]
    fn test_implicit_multiplication_is_normalized() {
        let f = CompiledFunction::new("2x(x+1)").unwrap();
        assert_eq!(f.expression(), "2*x*(x+1)");
        assert_eq!(f.variable(), "x");
        assert_eq!(f.eval(2.0), Ok(Number::Real(12.0)));
    }

    #[test]
    fn test_custom_variable() {
        let f = compile("sin(t)cos(t)", "t").unwrap();
        let value = f.eval(0.3).unwrap();
        assert_relative_eq!(value.re(), 0.3f64.sin() * 0.3f64.cos(), max_relative = 1e-15);
    }

    #[test]
    fn test_constants() {
        let f = CompiledFunction::new("e^(i pi) + 1").unwrap();
        let value = f.eval(0.0).unwrap();
        assert!(!value.is_real());
        assert!(value.abs() < 1e-15);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(compile("2x+", "x"), Err(ParseError::UnexpectedEnd));
        assert_eq!(compile("", "x"), Err(ParseError::Empty));
        assert!(matches!(
            compile("y^2", "x"),
            Err(ParseError::UnknownIdentifier { .. })
        ));
    }

    #[test]
    fn test_invalid_variable_names() {
        for name in ["", "2x", "x y", "sin", "pi", "i", "x+"] {
            assert_eq!(
                compile("1", name),
                Err(ParseError::InvalidVariable(name.to_string()))
            );
        }
        assert!(compile("theta_1^2", "theta_1").is_ok());
    }

    #[test]
    fn test_domain_errors() {
        let f = compile("1/x", "x").unwrap();
        assert_eq!(f.eval(0.0), Err(DomainError::DivisionByZero));

        let f = compile("exp(x)", "x").unwrap();
        assert!(matches!(f.eval(1000.0), Err(DomainError::NonFinite(_))));
    }

    #[test]
    fn test_display_reparses_to_same_tree() {
        for source in ["-x^2 + 3sin(pi x)/2", "(-x)^2", "--x", "2^-x^2", "-(x + 1)(x - 1)"] {
            let f = compile(source, "x").unwrap();
            let printed = f.ast().to_string();
            let g = compile(&printed, "x").unwrap();
            assert_eq!(g.ast(), f.ast(), "{source} printed as {printed}");
            assert_eq!(g.eval(3.0), f.eval(3.0));
        }

        let f = compile("(-x)^2", "x").unwrap();
        assert_eq!(f.eval(3.0), Ok(Number::Real(9.0)));
    }

    #[test]
    fn test_overlong_chains_are_rejected() {
        let sum = format!("1{}", "+1".repeat(20_000));
        assert!(matches!(compile(&sum, "x"), Err(ParseError::TooDeep(_))));

        let tower = format!("x{}", "^x".repeat(50_000));
        assert!(matches!(compile(&tower, "x"), Err(ParseError::TooDeep(_))));

        let sum = format!("x{}", "+x".repeat(999));
        assert_eq!(compile(&sum, "x").unwrap().eval(2.0), Ok(Number::Real(2000.0)));
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(compile("2x", "x").unwrap(), compile("2x", "x").unwrap());
        assert_ne!(compile("2x", "x").unwrap(), compile("2x+0", "x").unwrap());
    }

    #[test]
    fn test_eval_parallel_preserves_order() {
        let f = CompiledFunction::new("sqrt(x)").unwrap();
        let points: Vec<Number> = (0..100).map(|k| Number::Real(k as f64 - 50.0)).collect();
        let results = f.eval_parallel(&points);

        assert_eq!(results.len(), points.len());
        for (point, result) in points.iter().zip(&results) {
            assert_eq!(*result, f.eval(*point));
        }
    }

    #[test]
    fn test_formatting() {
        let f = compile("t^2", "t").unwrap();
        assert!(f.to_string().contains("t^2"));
        assert!(format!("{f:?}").contains("(t^2)"));
    }
}
