//! The fixed registry of named functions and constants.
//!
//! Every builtin function has a real implementation and a complex implementation; the
//! one used is picked by the tag of the argument. Real implementations either return a
//! Real, promote to Complex where the principal value exists (`sqrt` of a negative
//! number), or fail with a `DomainError` where the real operation is undefined.
//! Complex implementations use principal branches throughout.

use std::f64::consts::{E, LN_10, LN_2, PI};

use num_complex::Complex64;

use crate::errors::DomainError;
use crate::number::Number;

/// Unary functions callable as `name(expr)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Exp,
    /// Natural logarithm, spelled `ln` or `log`
    Ln,
    Log10,
    Log2,
    Sqrt,
    /// Real cube root for Real arguments, principal cube root for Complex ones
    Cbrt,
    Abs,
}

impl Builtin {
    pub const ALL: [Builtin; 19] = [
        Builtin::Sin,
        Builtin::Cos,
        Builtin::Tan,
        Builtin::Asin,
        Builtin::Acos,
        Builtin::Atan,
        Builtin::Sinh,
        Builtin::Cosh,
        Builtin::Tanh,
        Builtin::Asinh,
        Builtin::Acosh,
        Builtin::Atanh,
        Builtin::Exp,
        Builtin::Ln,
        Builtin::Log10,
        Builtin::Log2,
        Builtin::Sqrt,
        Builtin::Cbrt,
        Builtin::Abs,
    ];

    /// Looks a function up by the name used in expressions.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "log" {
            return Some(Builtin::Ln);
        }
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Tan => "tan",
            Builtin::Asin => "asin",
            Builtin::Acos => "acos",
            Builtin::Atan => "atan",
            Builtin::Sinh => "sinh",
            Builtin::Cosh => "cosh",
            Builtin::Tanh => "tanh",
            Builtin::Asinh => "asinh",
            Builtin::Acosh => "acosh",
            Builtin::Atanh => "atanh",
            Builtin::Exp => "exp",
            Builtin::Ln => "ln",
            Builtin::Log10 => "log10",
            Builtin::Log2 => "log2",
            Builtin::Sqrt => "sqrt",
            Builtin::Cbrt => "cbrt",
            Builtin::Abs => "abs",
        }
    }

    /// Applies the function, dispatching on the argument's tag.
    pub fn apply(&self, arg: Number) -> Result<Number, DomainError> {
        match arg {
            Number::Real(x) => self.apply_real(x),
            Number::Complex(z) => self.apply_complex(z),
        }
    }

    fn apply_real(&self, x: f64) -> Result<Number, DomainError> {
        let out_of_domain = || DomainError::OutOfDomain {
            function: self.name(),
            argument: Number::Real(x),
        };
        let value = match self {
            Builtin::Sin => x.sin(),
            Builtin::Cos => x.cos(),
            Builtin::Tan => x.tan(),
            Builtin::Asin if x.abs() > 1.0 => return Err(out_of_domain()),
            Builtin::Asin => x.asin(),
            Builtin::Acos if x.abs() > 1.0 => return Err(out_of_domain()),
            Builtin::Acos => x.acos(),
            Builtin::Atan => x.atan(),
            Builtin::Sinh => x.sinh(),
            Builtin::Cosh => x.cosh(),
            Builtin::Tanh => x.tanh(),
            Builtin::Asinh => x.asinh(),
            Builtin::Acosh if x < 1.0 => return Err(out_of_domain()),
            Builtin::Acosh => x.acosh(),
            Builtin::Atanh if x.abs() >= 1.0 => return Err(out_of_domain()),
            Builtin::Atanh => x.atanh(),
            Builtin::Exp => x.exp(),
            Builtin::Ln | Builtin::Log10 | Builtin::Log2 if x <= 0.0 => {
                return Err(DomainError::Logarithm(Number::Real(x)))
            }
            Builtin::Ln => x.ln(),
            Builtin::Log10 => x.log10(),
            Builtin::Log2 => x.log2(),
            // Principal root of a negative real
            Builtin::Sqrt if x < 0.0 => return Ok(Number::complex(0.0, (-x).sqrt())),
            Builtin::Sqrt => x.sqrt(),
            Builtin::Cbrt => x.cbrt(),
            Builtin::Abs => x.abs(),
        };
        Ok(Number::Real(value))
    }

    fn apply_complex(&self, z: Complex64) -> Result<Number, DomainError> {
        let is_zero = z.re == 0.0 && z.im == 0.0;
        let value = match self {
            Builtin::Sin => z.sin(),
            Builtin::Cos => z.cos(),
            Builtin::Tan => z.tan(),
            Builtin::Asin => z.asin(),
            Builtin::Acos => z.acos(),
            Builtin::Atan => z.atan(),
            Builtin::Sinh => z.sinh(),
            Builtin::Cosh => z.cosh(),
            Builtin::Tanh => z.tanh(),
            Builtin::Asinh => z.asinh(),
            Builtin::Acosh => z.acosh(),
            Builtin::Atanh => z.atanh(),
            Builtin::Exp => z.exp(),
            Builtin::Ln | Builtin::Log10 | Builtin::Log2 if is_zero => {
                return Err(DomainError::Logarithm(Number::Complex(z)))
            }
            Builtin::Ln => z.ln(),
            Builtin::Log10 => z.ln() / LN_10,
            Builtin::Log2 => z.ln() / LN_2,
            Builtin::Sqrt => z.sqrt(),
            Builtin::Cbrt => z.cbrt(),
            Builtin::Abs => return Ok(Number::Real(z.norm())),
        };
        Ok(Number::Complex(value))
    }
}

/// Named constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    Pi,
    E,
    /// The imaginary unit
    I,
}

impl Constant {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pi" | "π" => Some(Constant::Pi),
            "e" => Some(Constant::E),
            "i" => Some(Constant::I),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "e",
            Constant::I => "i",
        }
    }

    pub fn value(&self) -> Number {
        match self {
            Constant::Pi => Number::Real(PI),
            Constant::E => Number::Real(E),
            Constant::I => Number::complex(0.0, 1.0),
        }
    }
}

/// True for names that belong to the registry and cannot be used as variables.
pub fn is_reserved(name: &str) -> bool {
    Builtin::from_name(name).is_some() || Constant::from_name(name).is_some()
}
