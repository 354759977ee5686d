//! The numeric value type shared by the compiler and the numeric engines.
//!
//! A `Number` is either a real `f64` or a `Complex64`. The tag of every result is
//! fixed by the tags of the operands:
//!
//! - Real ⊕ Real stays Real for `+ - * /`; any Complex operand makes the result Complex
//! - Complex results are never demoted back to Real, even with a zero imaginary part
//! - `a^b` with a negative real base and a non-integral real exponent is promoted to
//!   its complex principal value
//! - Integral real exponents use repeated multiplication, so `(1+i)^2 == 2i` exactly
//!
//! Division and power check for exact zeros and report a `DomainError` instead of
//! producing an infinity.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

use num_complex::Complex64;

use crate::errors::DomainError;

/// A real or complex scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Real(f64),
    Complex(Complex64),
}

impl Number {
    pub const ZERO: Number = Number::Real(0.0);
    pub const ONE: Number = Number::Real(1.0);

    /// Builds a Complex number from its parts.
    pub fn complex(re: f64, im: f64) -> Self {
        Number::Complex(Complex64::new(re, im))
    }

    /// Real part.
    pub fn re(&self) -> f64 {
        match self {
            Number::Real(x) => *x,
            Number::Complex(z) => z.re,
        }
    }

    /// Imaginary part; zero for a Real.
    pub fn im(&self) -> f64 {
        match self {
            Number::Real(_) => 0.0,
            Number::Complex(z) => z.im,
        }
    }

    /// Widens the value to a `Complex64`.
    pub fn to_complex(self) -> Complex64 {
        match self {
            Number::Real(x) => Complex64::new(x, 0.0),
            Number::Complex(z) => z,
        }
    }

    /// True when the value carries the Real tag.
    pub fn is_real(&self) -> bool {
        matches!(self, Number::Real(_))
    }

    /// True when every part is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            Number::Real(x) => x.is_finite(),
            Number::Complex(z) => z.is_finite(),
        }
    }

    /// True for an exact zero of either tag.
    pub fn is_zero(&self) -> bool {
        match self {
            Number::Real(x) => *x == 0.0,
            Number::Complex(z) => z.re == 0.0 && z.im == 0.0,
        }
    }

    /// Modulus (absolute value for a Real).
    pub fn abs(&self) -> f64 {
        match self {
            Number::Real(x) => x.abs(),
            Number::Complex(z) => z.norm(),
        }
    }

    /// Division that refuses an exact zero divisor.
    pub fn checked_div(self, rhs: Number) -> Result<Number, DomainError> {
        if rhs.is_zero() {
            return Err(DomainError::DivisionByZero);
        }
        Ok(match (self, rhs) {
            (Number::Real(a), Number::Real(b)) => Number::Real(a / b),
            (a, b) => Number::Complex(a.to_complex() / b.to_complex()),
        })
    }

    /// Raises `self` to `exponent`, promoting to Complex where the real power is undefined.
    pub fn pow(self, exponent: Number) -> Result<Number, DomainError> {
        match (self, exponent) {
            (Number::Real(base), Number::Real(exp)) => {
                if base == 0.0 && exp < 0.0 {
                    return Err(DomainError::DivisionByZero);
                }
                if let Some(n) = integral_exponent(exp) {
                    return Ok(Number::Real(base.powi(n)));
                }
                if base < 0.0 {
                    return Ok(Number::Complex(Complex64::new(base, 0.0).powf(exp)));
                }
                Ok(Number::Real(base.powf(exp)))
            }
            (base, exp) => {
                let z = base.to_complex();
                let w = exp.to_complex();
                if base.is_zero() {
                    return if w.re == 0.0 && w.im == 0.0 {
                        Ok(Number::complex(1.0, 0.0))
                    } else if w.re > 0.0 {
                        Ok(Number::complex(0.0, 0.0))
                    } else if w.re < 0.0 {
                        Err(DomainError::DivisionByZero)
                    } else {
                        Err(DomainError::OutOfDomain {
                            function: "pow",
                            argument: exp,
                        })
                    };
                }
                if w.im == 0.0 {
                    if let Some(n) = integral_exponent(w.re) {
                        return Ok(Number::Complex(z.powi(n)));
                    }
                    return Ok(Number::Complex(z.powf(w.re)));
                }
                Ok(Number::Complex(z.powc(w)))
            }
        }
    }
}

/// Returns the exponent as an `i32` when it is an exact integer in range.
fn integral_exponent(exp: f64) -> Option<i32> {
    if exp.fract() == 0.0 && exp.abs() <= f64::from(i32::MAX) {
        Some(exp as i32)
    } else {
        None
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Real(value)
    }
}

impl From<Complex64> for Number {
    fn from(value: Complex64) -> Self {
        Number::Complex(value)
    }
}

impl Add for Number {
    type Output = Number;

    fn add(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Real(a), Number::Real(b)) => Number::Real(a + b),
            (a, b) => Number::Complex(a.to_complex() + b.to_complex()),
        }
    }
}

impl AddAssign for Number {
    fn add_assign(&mut self, rhs: Number) {
        *self = *self + rhs;
    }
}

impl Sub for Number {
    type Output = Number;

    fn sub(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Real(a), Number::Real(b)) => Number::Real(a - b),
            (a, b) => Number::Complex(a.to_complex() - b.to_complex()),
        }
    }
}

impl Mul for Number {
    type Output = Number;

    fn mul(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Real(a), Number::Real(b)) => Number::Real(a * b),
            (a, b) => Number::Complex(a.to_complex() * b.to_complex()),
        }
    }
}

/// Scaling by a real factor keeps the tag.
impl Mul<f64> for Number {
    type Output = Number;

    fn mul(self, rhs: f64) -> Number {
        match self {
            Number::Real(a) => Number::Real(a * rhs),
            Number::Complex(z) => Number::Complex(z * rhs),
        }
    }
}

/// Division by a real step size; callers guarantee a nonzero divisor.
impl Div<f64> for Number {
    type Output = Number;

    fn div(self, rhs: f64) -> Number {
        match self {
            Number::Real(a) => Number::Real(a / rhs),
            Number::Complex(z) => Number::Complex(z / rhs),
        }
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self {
            Number::Real(a) => Number::Real(-a),
            Number::Complex(z) => Number::Complex(-z),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Real(x) => write!(f, "{}", x),
            Number::Complex(z) => {
                if z.im.is_sign_negative() {
                    write!(f, "{}-{}i", z.re, -z.im)
                } else {
                    write!(f, "{}+{}i", z.re, z.im)
                }
            }
        }
    }
}
