//! Implicit multiplication insertion for natural notation.
//!
//! Inserts `*` where two adjacent units form an implicit product, e.g. `2x` → `2*x`.
//! Units come from the lossless lexer, so a multi-character name such as `sin`,
//! `log10` or `pi` is always one unit and never gets split.

use itertools::Itertools;

use crate::lexer::{scan, Lexeme, LexemeKind};
use crate::registry::Builtin;

/// Check if implicit multiplication should be inserted between two lexemes
fn should_insert_mul(current: &Lexeme<'_>, next: &Lexeme<'_>) -> bool {
    let is_function = |lexeme: &Lexeme<'_>| {
        lexeme.kind == LexemeKind::Ident && Builtin::from_name(lexeme.text).is_some()
    };

    match (current.kind, next.kind) {
        // Number * Number is not an implicit product: `2 3` stays a parse error
        (LexemeKind::Number, LexemeKind::Number) => false,

        // Function operator * ( is NOT multiplication (it's a function call)
        (LexemeKind::Ident, _) if is_function(current) => false,

        // Coalesced arms for standard multiplication cases:
        // Number * Identifier: 2x, 2sin(x), 2pi
        // Number * (: 2(x)
        // ) * Number / Identifier / (: (x)2, (x)y, (a)(b)
        // Identifier * Number / Identifier / (: x 2, i t, x(x+1)
        (
            LexemeKind::Number | LexemeKind::Ident | LexemeKind::RightParen,
            LexemeKind::Number | LexemeKind::Ident | LexemeKind::LeftParen,
        ) => true,

        _ => false,
    }
}

/// Insert implicit multiplication operators between appropriate units.
///
/// Rules:
/// - Number * Identifier or `(`: `2x` → `2*x`, `2(x)` → `2*(x)`
/// - `)` * Number, Identifier or `(`: `(x+1)(x-1)` → `(x+1)*(x-1)`
/// - Variable or constant * Number, Identifier or `(`: `x(x+1)` → `x*(x+1)`
///
/// Exception: a function name followed by `(` is a call, not a product.
///
/// Whitespace between two units does not prevent insertion; the `*` goes directly after
/// the first unit. The rewrite is idempotent.
pub fn implicit_mul(expr: &str) -> String {
    let lexemes = scan(expr);
    let significant: Vec<&Lexeme<'_>> = lexemes
        .iter()
        .filter(|lexeme| lexeme.kind != LexemeKind::Whitespace)
        .collect();

    // Optimization: check if any insertion is needed before allocating a new string
    let insert_after: Vec<usize> = significant
        .iter()
        .tuple_windows()
        .filter(|(current, next)| should_insert_mul(current, next))
        .map(|(current, _)| current.start)
        .collect();

    if insert_after.is_empty() {
        return expr.to_string();
    }

    let mut result = String::with_capacity(expr.len() + insert_after.len());
    let mut pending = insert_after.into_iter().peekable();
    for lexeme in &lexemes {
        result.push_str(lexeme.text);
        if pending.next_if_eq(&lexeme.start).is_some() {
            result.push('*');
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_number_identifier() {
        assert_eq!(implicit_mul("30x"), "30*x");
        assert_eq!(implicit_mul("2x+3"), "2*x+3");
        assert_eq!(implicit_mul("2pi"), "2*pi");
    }

    #[test]
    fn test_parenthesized_products() {
        assert_eq!(implicit_mul("(1+2)x"), "(1+2)*x");
        assert_eq!(implicit_mul("2(1+2)"), "2*(1+2)");
        assert_eq!(implicit_mul("(x+1)(x-1)"), "(x+1)*(x-1)");
        assert_eq!(implicit_mul("(x)2"), "(x)*2");
        assert_eq!(implicit_mul("x(x+1)"), "x*(x+1)");
    }

    #[test]
    fn test_number_function() {
        assert_eq!(implicit_mul("5sin(x)"), "5*sin(x)");
        assert_eq!(implicit_mul("(x)cos(x)"), "(x)*cos(x)");
        assert_eq!(implicit_mul("2log10(x)"), "2*log10(x)");
    }

    #[test]
    fn test_function_no_multiplication() {
        assert_eq!(implicit_mul("sin(x)"), "sin(x)");
        assert_eq!(implicit_mul("sqrt(2)"), "sqrt(2)");
        assert_eq!(implicit_mul("exp (x)"), "exp (x)");
    }

    #[test]
    fn test_whitespace_separated_units() {
        assert_eq!(implicit_mul("exp(i t)"), "exp(i* t)");
        assert_eq!(implicit_mul("2 x"), "2* x");
    }

    #[test]
    fn test_exponent_and_constant_e() {
        assert_eq!(implicit_mul("2e3x"), "2e3*x");
        assert_eq!(implicit_mul("2e"), "2*e");
        assert_eq!(implicit_mul("2e-x"), "2*e-x");
    }

    #[test]
    fn test_edge_cases() {
        assert_eq!(implicit_mul(""), "");
        assert_eq!(implicit_mul("42"), "42");
        assert_eq!(implicit_mul("2 3"), "2 3");
        assert_eq!(implicit_mul("2*x"), "2*x");
    }

    proptest! {
        #[test]
        fn implicit_mul_is_idempotent(src in "[0-9a-z_().*+/^ eπ-]{0,32}") {
            let once = implicit_mul(&src);
            prop_assert_eq!(implicit_mul(&once), once);
        }

        #[test]
        fn implicit_mul_is_idempotent_on_any_text(src in any::<String>()) {
            let once = implicit_mul(&src);
            prop_assert_eq!(implicit_mul(&once), once);
        }

        #[test]
        fn implicit_mul_only_adds_stars(src in "[0-9a-z().+ -]{0,32}") {
            let rewritten = implicit_mul(&src);
            let stripped: String = rewritten.chars().filter(|c| *c != '*').collect();
            prop_assert_eq!(stripped, src);
        }
    }
}
