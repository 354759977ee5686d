//! Numerical derivatives of compiled functions.
//!
//! Two estimators are provided:
//!
//! - [`real_diff`]: the complex-step derivative `Im(f(x + ih)) / h`. There is no
//!   subtraction, so the step can be tiny and the result is accurate to machine
//!   precision for functions that are real-analytic at `x`.
//! - [`complex_diff`]: the central difference `(f(z + h) - f(z - h)) / 2h`. Second order
//!   accurate and valid at complex points, at the cost of some cancellation.
//!
//! [`differentiate`] picks between them according to a [`DiffMode`].

use crate::errors::CalculusError;
use crate::number::Number;
use crate::types::NumericFn;

/// Imaginary step of the complex-step derivative.
pub const REAL_STEP: f64 = 1e-20;

/// Real step of the central difference.
pub const COMPLEX_STEP: f64 = 1e-8;

/// Largest relative gap allowed between `Re f(x + ih)` and `f(x)`.
pub const BRANCH_TOLERANCE: f64 = 1e-8;

/// Which estimator [`differentiate`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffMode {
    /// Complex-step derivative; the point must be Real
    Real,
    /// Central difference, valid anywhere in the complex plane
    Complex,
    /// Complex-step where it applies, central difference otherwise
    #[default]
    Auto,
}

/// Complex-step derivative of `f` at the real point `x0`.
///
/// `f` is sampled at `x0` first, so a domain error at `x0` is reported even when the
/// shifted complex point would evaluate.
///
/// The shifted sample must be an analytic continuation of `f` through `x0`: it has to
/// carry the Complex tag (a Real sample means `f` dropped the imaginary step, as `abs`
/// does) and its real part has to agree with `f(x0)` (a jump means a branch cut
/// crosses the real axis at `x0`, as with `cbrt` of a negative number).
///
/// # Errors
/// - `Evaluation` if `f` fails at `x0` or at `x0 + ih`
/// - `InvalidArgument` if `x0` is not finite, if `f(x0)` is not real, or if the shifted
///   sample is not a valid continuation; use [`complex_diff`] for such functions
pub fn real_diff<F>(f: &F, x0: f64) -> Result<f64, CalculusError>
where
    F: NumericFn + ?Sized,
{
    if !x0.is_finite() {
        return Err(CalculusError::InvalidArgument(format!(
            "differentiation point {x0} is not finite"
        )));
    }

    let value = f.sample(Number::Real(x0))?;
    if !value.is_real() {
        return Err(CalculusError::InvalidArgument(format!(
            "function is not real-valued at {x0}"
        )));
    }

    let shifted = f.sample(Number::complex(x0, REAL_STEP))?;
    if shifted.is_real() {
        return Err(CalculusError::InvalidArgument(format!(
            "function drops the imaginary step at {x0}"
        )));
    }
    let gap = (shifted.re() - value.re()).abs();
    if gap > BRANCH_TOLERANCE * value.abs().max(1.0) {
        return Err(CalculusError::InvalidArgument(format!(
            "function is not analytic across the real axis at {x0}"
        )));
    }

    Ok(shifted.im() / REAL_STEP)
}

/// Central-difference derivative of `f` at `z0`.
///
/// The step is taken along the real axis. For a holomorphic `f` this is the complex
/// derivative; for a real function at a real point the result stays Real.
///
/// # Errors
/// - `Evaluation` if `f` fails at `z0 + h` or `z0 - h`
/// - `InvalidArgument` if `z0` is not finite
pub fn complex_diff<F>(f: &F, z0: Number) -> Result<Number, CalculusError>
where
    F: NumericFn + ?Sized,
{
    if !z0.is_finite() {
        return Err(CalculusError::InvalidArgument(format!(
            "differentiation point {z0} is not finite"
        )));
    }

    let step = Number::Real(COMPLEX_STEP);
    let high = f.sample(z0 + step)?;
    let low = f.sample(z0 - step)?;
    Ok((high - low) / (2.0 * COMPLEX_STEP))
}

/// Derivative of `f` at `point` using the estimator selected by `mode`.
///
/// With [`DiffMode::Auto`], a Real point uses the complex-step derivative when
/// [`real_diff`] accepts `f` there, and every other case uses the central difference.
///
/// # Errors
/// - `InvalidArgument` if `mode` is `Real` and `point` is Complex
/// - any error of the selected estimator
///
/// # Example
/// ```
/// # use numcalc::{compile, differentiate, DiffMode, Number};
/// let f = compile("x^3", "x").unwrap();
/// let slope = differentiate(&f, 2.0, DiffMode::Auto).unwrap();
/// assert!((slope.re() - 12.0).abs() < 1e-12);
/// ```
pub fn differentiate<F>(
    f: &F,
    point: impl Into<Number>,
    mode: DiffMode,
) -> Result<Number, CalculusError>
where
    F: NumericFn + ?Sized,
{
    let point = point.into();
    match (mode, point) {
        (DiffMode::Real, Number::Real(x0)) => real_diff(f, x0).map(Number::Real),
        (DiffMode::Real, Number::Complex(_)) => Err(CalculusError::InvalidArgument(format!(
            "real differentiation needs a real point, got {point}"
        ))),
        (DiffMode::Complex, _) => complex_diff(f, point),
        (DiffMode::Auto, Number::Real(x0)) => match real_diff(f, x0) {
            Ok(slope) => Ok(Number::Real(slope)),
            // Complex step does not apply at x0
            Err(CalculusError::InvalidArgument(_)) if x0.is_finite() => complex_diff(f, point),
            Err(err) => Err(err),
        },
        (DiffMode::Auto, Number::Complex(_)) => complex_diff(f, point),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::errors::DomainError;
    use crate::types::numeric_fn;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_real_diff_square() {
        let f = compile("x^2", "x").unwrap();
        let slope = real_diff(&f, 3.0).unwrap();
        assert_abs_diff_eq!(slope, 6.0, epsilon = 1e-8);
    }

    #[test]
    fn test_real_diff_polynomials() {
        let x0: f64 = 1.23;
        for degree in 1..=5 {
            let f = compile(&format!("x^{degree}"), "x").unwrap();
            let expected = f64::from(degree) * x0.powi(degree - 1);
            assert_relative_eq!(real_diff(&f, x0).unwrap(), expected, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_real_diff_transcendental() {
        let f = compile("sin(x)exp(x)", "x").unwrap();
        let x0: f64 = 0.5;
        let expected = x0.cos() * x0.exp() + x0.sin() * x0.exp();
        assert_relative_eq!(real_diff(&f, x0).unwrap(), expected, max_relative = 1e-14);
    }

    #[test]
    fn test_constant_has_zero_slope() {
        // A constant never sees the imaginary step
        let f = compile("5", "x").unwrap();
        assert!(matches!(
            real_diff(&f, 2.0),
            Err(CalculusError::InvalidArgument(_))
        ));
        assert_eq!(differentiate(&f, 2.0, DiffMode::Auto), Ok(Number::Real(0.0)));

        let f = compile("x - x + 5", "x").unwrap();
        assert_eq!(real_diff(&f, 2.0), Ok(0.0));
    }

    #[test]
    fn test_real_diff_rejects_non_analytic_builtins() {
        let f = compile("abs(x)", "x").unwrap();
        assert!(matches!(
            real_diff(&f, 3.0),
            Err(CalculusError::InvalidArgument(_))
        ));
        let slope = differentiate(&f, 3.0, DiffMode::Auto).unwrap();
        assert!(slope.is_real());
        assert_abs_diff_eq!(slope.re(), 1.0, epsilon = 1e-6);

        // Principal cube root has a branch cut along the negative axis
        let f = compile("cbrt(x)", "x").unwrap();
        assert!(matches!(
            real_diff(&f, -8.0),
            Err(CalculusError::InvalidArgument(_))
        ));
        let slope = differentiate(&f, -8.0, DiffMode::Auto).unwrap();
        assert!(slope.is_real());
        assert_abs_diff_eq!(slope.re(), 1.0 / 12.0, epsilon = 1e-6);

        // Away from the cut the complex step still applies
        assert_relative_eq!(real_diff(&f, 8.0).unwrap(), 1.0 / 12.0, max_relative = 1e-12);
    }

    #[test]
    fn test_real_diff_rejects_points_outside_domain() {
        let f = compile("ln(x)", "x").unwrap();
        assert!(matches!(
            real_diff(&f, -1.0),
            Err(CalculusError::Evaluation {
                source: DomainError::Logarithm(_),
                ..
            })
        ));

        let f = compile("1/x", "x").unwrap();
        assert_eq!(
            real_diff(&f, 0.0),
            Err(CalculusError::Evaluation {
                point: Number::Real(0.0),
                source: DomainError::DivisionByZero,
            })
        );
    }

    #[test]
    fn test_real_diff_needs_real_values() {
        let f = compile("sqrt(x)", "x").unwrap();
        assert!(matches!(
            real_diff(&f, -4.0),
            Err(CalculusError::InvalidArgument(_))
        ));
        assert!(matches!(
            real_diff(&f, f64::NAN),
            Err(CalculusError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_complex_diff_cube() {
        let f = compile("z^3", "z").unwrap();
        let z0 = Number::complex(1.0, 1.0);
        let expected = (z0.pow(Number::Real(2.0)).unwrap()) * 3.0;

        let slope = complex_diff(&f, z0).unwrap();
        assert!(!slope.is_real());
        assert_abs_diff_eq!(slope.re(), expected.re(), epsilon = 1e-6);
        assert_abs_diff_eq!(slope.im(), expected.im(), epsilon = 1e-6);
    }

    #[test]
    fn test_complex_diff_at_real_point_stays_real() {
        let f = compile("x^2 - 2", "x").unwrap();
        let slope = complex_diff(&f, Number::Real(1.5)).unwrap();
        assert!(slope.is_real());
        assert_abs_diff_eq!(slope.re(), 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_complex_diff_propagates_domain_errors() {
        // Undefined left of the origin
        let f = numeric_fn(|x: Number| {
            if x.re() < 0.0 {
                Err(DomainError::DivisionByZero)
            } else {
                Ok(x)
            }
        });
        assert!(matches!(
            complex_diff(&f, Number::Real(0.0)),
            Err(CalculusError::Evaluation {
                source: DomainError::DivisionByZero,
                ..
            })
        ));
    }

    #[test]
    fn test_differentiate_modes() {
        let f = compile("x^2", "x").unwrap();

        let real = differentiate(&f, 3.0, DiffMode::Real).unwrap();
        assert!(real.is_real());
        assert_abs_diff_eq!(real.re(), 6.0, epsilon = 1e-12);

        assert!(matches!(
            differentiate(&f, Number::complex(1.0, 1.0), DiffMode::Real),
            Err(CalculusError::InvalidArgument(_))
        ));

        let auto = differentiate(&f, Number::complex(1.0, 1.0), DiffMode::Auto).unwrap();
        assert_abs_diff_eq!(auto.re(), 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(auto.im(), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_auto_falls_back_to_central_difference() {
        // sqrt leaves the reals for negative x
        let f = compile("sqrt(x)", "x").unwrap();
        let slope = differentiate(&f, -4.0, DiffMode::Auto).unwrap();
        // d/dx sqrt(x) = 1 / (2 sqrt(x)) = 1 / 4i = -i/4
        assert_abs_diff_eq!(slope.re(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(slope.im(), -0.25, epsilon = 1e-6);
    }
}
