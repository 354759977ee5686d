//! Definite and contour integration.
//!
//! # Interval integrals
//!
//! [`interval_int`] uses adaptive Gauss(7)-Kronrod(15) quadrature. On each subinterval the
//! 15-point Kronrod rule gives the estimate K and the embedded 7-point Gauss rule gives
//! G, using the same function samples; `|K - G|` is the local error estimate.
//! Subintervals that miss the tolerance are bisected.
//!
//! Pending subintervals are kept on an explicit stack, and two counters bound the work:
//! the bisection depth of each subinterval and the total number of evaluated
//! subintervals. When either runs out the current estimate is accepted as is and the
//! result carries a [`ConvergenceWarning`].
//!
//! # Contour integrals
//!
//! [`contour_int`] rewrites `∫_C f(z) dz` over a parametrized curve `z(t)` as
//! `∫ f(z(t)) z'(t) dt` and applies the composite trapezoidal rule. `z'(t)` is
//! estimated with [`complex_diff`] at every sample.

use std::ops::Neg;

use itertools::izip;
use tracing::warn;

use crate::differentiation::complex_diff;
use crate::errors::{CalculusError, ConvergenceWarning, WarningCause};
use crate::number::Number;
use crate::types::NumericFn;

/// Nodes of the 15-point Kronrod rule on [-1, 1]. Odd indices are the 7 Gauss nodes.
pub const GAUSS_KRONROD_NODES: [f64; 15] = [
    -0.9914553711208126,
    -0.9491079123427585,
    -0.8648644233597691,
    -0.7415311855993944,
    -0.5860872354676911,
    -0.4058451513773972,
    -0.2077849550078985,
    0.0,
    0.2077849550078985,
    0.4058451513773972,
    0.5860872354676911,
    0.7415311855993944,
    0.8648644233597691,
    0.9491079123427585,
    0.9914553711208126,
];

/// Weights of the 15-point Kronrod rule.
pub const KRONROD_WEIGHTS: [f64; 15] = [
    0.02293532201052922,
    0.06309209262997855,
    0.1047900103222502,
    0.1406532597155259,
    0.1690047266392679,
    0.1903505780647854,
    0.2044329400752989,
    0.2094821410847278,
    0.2044329400752989,
    0.1903505780647854,
    0.1690047266392679,
    0.1406532597155259,
    0.1047900103222502,
    0.06309209262997855,
    0.02293532201052922,
];

/// Weights of the 7-point Gauss rule, zero at the Kronrod-only nodes.
pub const GAUSS_WEIGHTS: [f64; 15] = [
    0.0,
    0.1294849661688697,
    0.0,
    0.2797053914892767,
    0.0,
    0.3818300505051189,
    0.0,
    0.4179591836734694,
    0.0,
    0.3818300505051189,
    0.0,
    0.2797053914892767,
    0.0,
    0.1294849661688697,
    0.0,
];

/// Default absolute tolerance of a subinterval estimate.
pub const ABS_TOLERANCE: f64 = 1e-15;

/// Default relative tolerance of a subinterval estimate.
pub const REL_TOLERANCE: f64 = 1e-15;

/// Subintervals narrower than this are accepted without further bisection.
pub const MIN_WIDTH: f64 = 1e-15;

/// Default bisection depth limit.
pub const MAX_DEPTH: usize = 50;

/// Default limit on the number of evaluated subintervals.
pub const MAX_SUBINTERVALS: usize = 100_000;

/// Default number of trapezoidal subdivisions of a contour integral.
pub const DEFAULT_SUBDIVISIONS: usize = 1000;

/// Smallest accepted number of contour subdivisions.
pub const MIN_SUBDIVISIONS: usize = 2;

/// Tuning knobs of the adaptive quadrature.
///
/// # Example
/// ```
/// # use numcalc::QuadratureOptions;
/// let options = QuadratureOptions::default()
///     .with_rel_tol(1e-10)
///     .with_max_depth(20);
/// assert_eq!(options.max_depth, 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadratureOptions {
    /// A subinterval is accepted when `|K - G| <= max(abs_tol, rel_tol * |K|)`
    pub abs_tol: f64,
    pub rel_tol: f64,
    /// Subintervals narrower than this are accepted as is
    pub min_width: f64,
    /// Bisection depth at which a subinterval is accepted with a warning
    pub max_depth: usize,
    /// Total number of evaluated subintervals after which bisection stops
    pub max_subintervals: usize,
}

impl Default for QuadratureOptions {
    fn default() -> Self {
        Self {
            abs_tol: ABS_TOLERANCE,
            rel_tol: REL_TOLERANCE,
            min_width: MIN_WIDTH,
            max_depth: MAX_DEPTH,
            max_subintervals: MAX_SUBINTERVALS,
        }
    }
}

impl QuadratureOptions {
    pub fn with_abs_tol(mut self, abs_tol: f64) -> Self {
        self.abs_tol = abs_tol;
        self
    }

    pub fn with_rel_tol(mut self, rel_tol: f64) -> Self {
        self.rel_tol = rel_tol;
        self
    }

    pub fn with_min_width(mut self, min_width: f64) -> Self {
        self.min_width = min_width;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_subintervals(mut self, max_subintervals: usize) -> Self {
        self.max_subintervals = max_subintervals;
        self
    }
}

/// Result of an interval integral.
#[derive(Debug, Clone, PartialEq)]
pub struct Integral {
    /// Sum of the accepted Kronrod estimates
    pub value: Number,
    /// Sum of the local error estimates `|K - G|`
    pub error_estimate: f64,
    /// Number of subintervals the rule was applied to
    pub intervals: usize,
    /// Set when a budget ran out before every subinterval met the tolerance
    pub warning: Option<ConvergenceWarning>,
}

impl Integral {
    fn zero() -> Self {
        Self {
            value: Number::ZERO,
            error_estimate: 0.0,
            intervals: 0,
            warning: None,
        }
    }

    /// True when every subinterval met the tolerance.
    pub fn is_converged(&self) -> bool {
        self.warning.is_none()
    }
}

impl Neg for Integral {
    type Output = Integral;

    fn neg(self) -> Integral {
        Integral {
            value: -self.value,
            ..self
        }
    }
}

/// A pending subinterval of the work list.
#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    depth: usize,
}

/// Applies the Gauss-Kronrod pair to `[a, b]`, returning `(K, |K - G|)`.
fn gauss_kronrod<F>(f: &F, a: f64, b: f64) -> Result<(Number, f64), CalculusError>
where
    F: NumericFn + ?Sized,
{
    let half_length = 0.5 * (b - a);
    let midpoint = 0.5 * (a + b);

    let mut kronrod = Number::ZERO;
    let mut gauss = Number::ZERO;
    for (node, wk, wg) in izip!(&GAUSS_KRONROD_NODES, &KRONROD_WEIGHTS, &GAUSS_WEIGHTS) {
        let fx = f.sample(Number::Real(midpoint + half_length * node))?;
        kronrod += fx * *wk;
        gauss += fx * *wg;
    }

    let kronrod = kronrod * half_length;
    let gauss = gauss * half_length;
    Ok((kronrod, (kronrod - gauss).abs()))
}

/// Integrates `f` over `[a, b]` with the default [`QuadratureOptions`].
pub fn interval_int<F>(f: &F, a: f64, b: f64) -> Result<Integral, CalculusError>
where
    F: NumericFn + ?Sized,
{
    interval_int_with(f, a, b, &QuadratureOptions::default())
}

/// Integrates `f` over `[a, b]` with adaptive Gauss-Kronrod quadrature.
///
/// - `a == b` gives zero without sampling `f`
/// - `b < a` gives the negated integral over `[b, a]`
/// - a Complex-valued `f` gives a Complex result
///
/// # Errors
/// - `InvalidArgument` if a bound is not finite
/// - `Evaluation` if `f` fails at any node
///
/// # Example
/// ```
/// # use numcalc::{compile, interval_int};
/// let f = compile("x^2", "x").unwrap();
/// let integral = interval_int(&f, 0.0, 3.0).unwrap();
/// assert!((integral.value.re() - 9.0).abs() < 1e-12);
/// assert!(integral.is_converged());
/// ```
pub fn interval_int_with<F>(
    f: &F,
    a: f64,
    b: f64,
    options: &QuadratureOptions,
) -> Result<Integral, CalculusError>
where
    F: NumericFn + ?Sized,
{
    if !a.is_finite() || !b.is_finite() {
        return Err(CalculusError::InvalidArgument(format!(
            "integration bounds [{a}, {b}] must be finite"
        )));
    }
    if a == b {
        return Ok(Integral::zero());
    }
    if b < a {
        return interval_int_with(f, b, a, options).map(Neg::neg);
    }

    let mut stack = vec![Segment { a, b, depth: 0 }];
    let mut result = Integral::zero();
    let mut cause = None;

    while let Some(segment) = stack.pop() {
        let (estimate, error) = gauss_kronrod(f, segment.a, segment.b)?;
        result.intervals += 1;

        let tolerance = options.abs_tol.max(options.rel_tol * estimate.abs());
        let converged = error <= tolerance || segment.b - segment.a < options.min_width;
        // Bisection adds two subintervals to the ones already evaluated or pending
        let within_budget = result.intervals + stack.len() + 2 <= options.max_subintervals;

        if !converged && segment.depth < options.max_depth && within_budget {
            let midpoint = 0.5 * (segment.a + segment.b);
            let depth = segment.depth + 1;
            stack.push(Segment {
                a: midpoint,
                b: segment.b,
                depth,
            });
            stack.push(Segment {
                a: segment.a,
                b: midpoint,
                depth,
            });
            continue;
        }

        if !converged && cause.is_none() {
            cause = Some(if segment.depth >= options.max_depth {
                WarningCause::DepthLimit
            } else {
                WarningCause::SubintervalLimit
            });
        }
        result.value += estimate;
        result.error_estimate += error;
    }

    if let Some(cause) = cause {
        warn!(
            ?cause,
            intervals = result.intervals,
            error_estimate = result.error_estimate,
            "quadrature budget exhausted before reaching tolerance"
        );
        result.warning = Some(ConvergenceWarning {
            cause,
            intervals: result.intervals,
            error_estimate: result.error_estimate,
        });
    }

    Ok(result)
}

/// Integrates `f` over `[a, b]`.
///
/// Shorthand for [`interval_int`].
pub fn integrate<F>(f: &F, a: f64, b: f64) -> Result<Integral, CalculusError>
where
    F: NumericFn + ?Sized,
{
    interval_int(f, a, b)
}

/// Integrates `f` along the curve `t -> curve(t)` for `t` in `[t0, t1]`.
///
/// The parameter interval is split into `n` equal subdivisions and the trapezoidal rule
/// is applied to `f(z(t)) z'(t)` on the `n + 1` samples. The error decreases as `1/n²`
/// on open arcs and much faster on closed smooth curves.
///
/// # Errors
/// - `InvalidArgument` if `n` is below [`MIN_SUBDIVISIONS`] or a bound is not finite
/// - `Evaluation` if `f` or `curve` fails at a sample
///
/// # Example
/// ```
/// # use numcalc::{compile, contour_int};
/// # use std::f64::consts::PI;
/// // Residue of 1/z at the origin
/// let f = compile("1/z", "z").unwrap();
/// let circle = compile("exp(i t)", "t").unwrap();
/// let value = contour_int(&f, &circle, 0.0, 2.0 * PI, 1000).unwrap();
/// assert!(value.re().abs() < 1e-6);
/// assert!((value.im() - 2.0 * PI).abs() < 1e-6);
/// ```
pub fn contour_int<F, C>(
    f: &F,
    curve: &C,
    t0: f64,
    t1: f64,
    n: usize,
) -> Result<Number, CalculusError>
where
    F: NumericFn + ?Sized,
    C: NumericFn + ?Sized,
{
    if n < MIN_SUBDIVISIONS {
        return Err(CalculusError::InvalidArgument(format!(
            "contour integral needs at least {MIN_SUBDIVISIONS} subdivisions, got {n}"
        )));
    }
    if !t0.is_finite() || !t1.is_finite() {
        return Err(CalculusError::InvalidArgument(format!(
            "parameter bounds [{t0}, {t1}] must be finite"
        )));
    }
    if t0 == t1 {
        return Ok(Number::ZERO);
    }

    let dt = (t1 - t0) / n as f64;
    let mut total = Number::ZERO;

    for k in 0..=n {
        let t = if k == n { t1 } else { t0 + k as f64 * dt };
        let weight = if k == 0 || k == n { 0.5 } else { 1.0 };

        let z = curve.sample(Number::Real(t))?;
        let dz = complex_diff(curve, Number::Real(t))?;
        let fz = f.sample(z)?;
        total += fz * dz * weight;
    }

    Ok(total * dt)
}

/// Contour integral with [`DEFAULT_SUBDIVISIONS`] when `subdivisions` is `None`.
pub fn integrate_contour<F, C>(
    f: &F,
    curve: &C,
    t0: f64,
    t1: f64,
    subdivisions: Option<usize>,
) -> Result<Number, CalculusError>
where
    F: NumericFn + ?Sized,
    C: NumericFn + ?Sized,
{
    contour_int(f, curve, t0, t1, subdivisions.unwrap_or(DEFAULT_SUBDIVISIONS))
}
