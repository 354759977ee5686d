//! Numerical calculus over compiled real and complex expressions.
//!
//! This crate turns free-form math text into a function of one variable and runs numeric
//! methods on it. It provides its own parser and a tree-walking evaluator over a
//! real/complex [`Number`] type, so every function can be evaluated at complex points.
//!
//! # Features
//!
//! - Implicit multiplication (`2x`, `3sin(x)`, `(x+1)(x-1)`)
//! - Real and complex evaluation with typed domain errors instead of NaN
//! - Complex-step and central-difference derivatives
//! - Adaptive Gauss-Kronrod quadrature and contour integrals
//! - Newton root finding with automatic derivatives
//!
//! # Example
//!
//! ```rust
//! use numcalc::{compile, differentiate, find_root, integrate, DiffMode};
//!
//! let f = compile("x^2 - 2", "x").unwrap();
//!
//! // f(3) = 7
//! assert_eq!(f.eval(3.0).unwrap().re(), 7.0);
//!
//! // f'(3) = 6
//! let slope = differentiate(&f, 3.0, DiffMode::Auto).unwrap();
//! assert!((slope.re() - 6.0).abs() < 1e-8);
//!
//! // ∫ f over [0, 3] = 3
//! let integral = integrate(&f, 0.0, 3.0).unwrap();
//! assert!((integral.value.re() - 3.0).abs() < 1e-10);
//!
//! // f(x) = 0 at sqrt(2)
//! let root = find_root(&f, 1.0).unwrap();
//! assert!((root.re() - 2f64.sqrt()).abs() < 1e-12);
//! ```

pub use compiler::{compile, CompiledFunction};
pub use differentiation::{complex_diff, differentiate, real_diff, DiffMode};
pub use errors::{
    CalculusError, ConvergenceWarning, DomainError, Error, ParseError, WarningCause,
};
pub use integration::{
    contour_int, integrate, integrate_contour, interval_int, interval_int_with, Integral,
    QuadratureOptions,
};
pub use number::Number;
pub use preprocess::implicit_mul;
pub use root::{find_root, find_root_with, NewtonOptions};
pub use types::{numeric_fn, NumericFn};

pub mod prelude {
    pub use crate::compiler::{compile, CompiledFunction};
    pub use crate::differentiation::{differentiate, DiffMode};
    pub use crate::errors::Error;
    pub use crate::expr::Expr;
    pub use crate::integration::{integrate, integrate_contour, Integral};
    pub use crate::number::Number;
    pub use crate::root::find_root;
    pub use crate::types::NumericFn;
}

/// Compilation of expression text into callable functions
pub mod compiler;
/// Complex-step and central-difference derivatives
pub mod differentiation;
/// Error types for the various failure modes
pub mod errors;
/// Expression tree representation and evaluation
pub mod expr;
/// Interval and contour integration
pub mod integration;
/// Lexeme scanning shared by the preprocessor and the parser
pub mod lexer;
/// The real/complex scalar type
pub mod number;
/// Pratt parser producing expression trees
pub(crate) mod parser;
/// Implicit multiplication rewriting
pub mod preprocess;
/// Builtin functions and constants
pub mod registry;
/// Newton root finding
pub mod root;
/// The function seam shared by the numeric routines
pub mod types;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_errors_chain_into_umbrella() {
        fn slope_of(text: &str) -> Result<Number, Error> {
            let f = compile(text, "x")?;
            Ok(differentiate(&f, 1.0, DiffMode::Auto)?)
        }

        assert!(matches!(slope_of("2x+"), Err(Error::Parse(_))));
        assert!(matches!(slope_of("ln(x - 1)"), Err(Error::Calculus(_))));
        assert!(slope_of("x^2").is_ok());
    }

    #[test]
    fn test_compiled_function_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledFunction>();
    }

    #[test]
    fn test_closures_and_compiled_functions_share_routines() {
        let compiled = compile("3x^2", "x").unwrap();
        let closure = crate::types::numeric_fn(|x: Number| Ok(x * x * 3.0));

        let a = integrate(&compiled, 0.0, 1.0).unwrap();
        let b = integrate(&closure, 0.0, 1.0).unwrap();
        assert!((a.value.re() - b.value.re()).abs() < 1e-14);
    }
}
