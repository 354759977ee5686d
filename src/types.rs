use crate::errors::{CalculusError, DomainError};
use crate::number::Number;

/// A scalar function the numeric routines can sample.
///
/// This is the seam between the compiler and the numeric engines:
/// - `CompiledFunction` implements it
/// - Every closure `Fn(Number) -> Result<Number, DomainError>` implements it
pub trait NumericFn {
    /// Evaluates the function at `x`.
    fn evaluate(&self, x: Number) -> Result<Number, DomainError>;

    /// Evaluates the function at `x`, tagging a domain error with the sample point.
    fn sample(&self, x: Number) -> Result<Number, CalculusError> {
        self.evaluate(x)
            .map_err(|source| CalculusError::Evaluation { point: x, source })
    }
}

impl<F> NumericFn for F
where
    F: Fn(Number) -> Result<Number, DomainError>,
{
    fn evaluate(&self, x: Number) -> Result<Number, DomainError> {
        self(x)
    }
}

/// Pins a closure's signature to the one the numeric routines expect.
///
/// Closures passed straight to a generic routine sometimes fail type inference on
/// their argument; wrapping them in `numeric_fn` fixes the signature up front.
pub fn numeric_fn<F>(f: F) -> F
where
    F: Fn(Number) -> Result<Number, DomainError>,
{
    f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_numeric_fn() {
        let double = numeric_fn(|x| Ok(x * 2.0));
        assert_eq!(double.evaluate(Number::Real(2.0)), Ok(Number::Real(4.0)));
    }

    #[test]
    fn test_sample_tags_the_point() {
        let reciprocal = numeric_fn(|x| Number::ONE.checked_div(x));
        assert_eq!(
            reciprocal.sample(Number::ZERO),
            Err(CalculusError::Evaluation {
                point: Number::ZERO,
                source: DomainError::DivisionByZero,
            })
        );
    }
}
