//! Newton root finding with automatic derivatives.
//!
//! The update is `x_{n+1} = x_n - f(x_n) / f'(x_n)` where `f'` comes from
//! [`complex_diff`], so callers never supply a derivative. Iteration happens in
//! [`Number`]: a Real guess on a real function stays on the real line, and a Complex
//! guess searches the complex plane.

use tracing::{debug, trace};

use crate::differentiation::complex_diff;
use crate::errors::CalculusError;
use crate::number::Number;
use crate::types::NumericFn;

/// Default step tolerance, relative to `max(1, |x|)`.
pub const TOLERANCE: f64 = 1e-15;

/// Default iteration budget.
pub const MAX_ITERATIONS: usize = 100;

/// Derivatives at or below this magnitude are treated as zero.
pub const DERIVATIVE_FLOOR: f64 = 1e-15;

/// Tuning knobs of the Newton iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonOptions {
    /// Converged once `|x_{n+1} - x_n| <= tolerance * max(1, |x_n|)`
    pub tolerance: f64,
    pub max_iterations: usize,
    pub derivative_floor: f64,
}

impl Default for NewtonOptions {
    fn default() -> Self {
        Self {
            tolerance: TOLERANCE,
            max_iterations: MAX_ITERATIONS,
            derivative_floor: DERIVATIVE_FLOOR,
        }
    }
}

impl NewtonOptions {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_derivative_floor(mut self, derivative_floor: f64) -> Self {
        self.derivative_floor = derivative_floor;
        self
    }
}

/// Finds a root of `f` near `guess` with the default [`NewtonOptions`].
///
/// # Example
/// ```
/// # use numcalc::{compile, find_root};
/// let f = compile("x^2 - 2", "x").unwrap();
/// let root = find_root(&f, 1.0).unwrap();
/// assert!((root.re() - 2f64.sqrt()).abs() < 1e-12);
/// ```
pub fn find_root<F>(f: &F, guess: impl Into<Number>) -> Result<Number, CalculusError>
where
    F: NumericFn + ?Sized,
{
    find_root_with(f, guess, &NewtonOptions::default())
}

/// Finds a root of `f` near `guess` with Newton's method.
///
/// # Errors
/// - `InvalidArgument` if `guess` is not finite
/// - `SingularDerivative` if `|f'(x_n)| <= derivative_floor` at some iterate
/// - `NonConvergence` if the step is still above tolerance after `max_iterations`, or
///   if an iterate leaves the finite numbers
/// - `Evaluation` if `f` fails at an iterate or at a derivative sample
pub fn find_root_with<F>(
    f: &F,
    guess: impl Into<Number>,
    options: &NewtonOptions,
) -> Result<Number, CalculusError>
where
    F: NumericFn + ?Sized,
{
    let mut x = guess.into();
    if !x.is_finite() {
        return Err(CalculusError::InvalidArgument(format!(
            "initial guess {x} is not finite"
        )));
    }

    let mut last_step = f64::INFINITY;

    for iteration in 1..=options.max_iterations {
        let fx = f.sample(x)?;
        if fx.is_zero() {
            debug!(iterations = iteration, root = %x, "found exact root");
            return Ok(x);
        }

        let derivative = complex_diff(f, x)?;
        if derivative.abs() <= options.derivative_floor {
            return Err(CalculusError::SingularDerivative {
                point: x,
                derivative,
            });
        }

        let step = fx
            .checked_div(derivative)
            .map_err(|source| CalculusError::Evaluation { point: x, source })?;
        let next = x - step;
        last_step = step.abs();
        trace!(iteration, x = %x, f = %fx, step = last_step, "newton step");

        if !next.is_finite() {
            return Err(CalculusError::NonConvergence {
                iterations: iteration,
                last_step,
                last_iterate: x,
            });
        }
        if last_step <= options.tolerance * x.abs().max(1.0) {
            debug!(iterations = iteration, root = %next, "newton converged");
            return Ok(next);
        }

        x = next;
    }

    Err(CalculusError::NonConvergence {
        iterations: options.max_iterations,
        last_step,
        last_iterate: x,
    })
}
