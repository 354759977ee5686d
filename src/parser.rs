//! Pratt parser turning a token stream into an [`Expr`] tree.
//!
//! Binding powers, lowest first: `+ -` (10), `* /` (20), unary minus and plus (25),
//! `^` (30, right-associative). Unary minus binds looser than `^`, so `-x^2` parses as
//! `-(x^2)`, and `2^3^2` parses as `2^(3^2)`.
//!
//! Evaluation, printing and dropping all recurse over the tree, so the parser bounds
//! both its own recursion ([`MAX_NESTING`]) and the height of the tree it builds
//! ([`MAX_HEIGHT`]).

use crate::errors::ParseError;
use crate::expr::Expr;
use crate::lexer::{Operator, Spanned, Token};
use crate::registry::{Builtin, Constant};

/// Binding power of a prefix `-` or `+`.
const UNARY_PRECEDENCE: u8 = 25;

/// Maximum nesting of parentheses, unary operators and right operands.
pub const MAX_NESTING: usize = 256;

/// Maximum height of a parsed tree.
pub const MAX_HEIGHT: usize = 1024;

/// A parsed subtree and its height.
type Parsed = (Expr, usize);

/// Parses `tokens` into a tree whose only free identifier is `variable`.
pub(crate) fn parse_expression(tokens: &[Spanned<'_>], variable: &str) -> Result<Expr, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        variable,
        depth: 0,
    };
    let (expr, _) = parser.parse_expr(0)?;

    // Anything left over is either a stray `)` or two operands with nothing between them
    match parser.current() {
        None => Ok(expr),
        Some((Token::RightParen, position)) => Err(ParseError::UnbalancedParen { position }),
        Some((token, position)) => Err(ParseError::UnexpectedToken {
            token: token.to_string(),
            position,
        }),
    }
}

struct Parser<'a> {
    tokens: &'a [Spanned<'a>],
    pos: usize,
    variable: &'a str,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn current(&self) -> Option<Spanned<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn parse_expr(&mut self, min_precedence: u8) -> Result<Parsed, ParseError> {
        let (mut left, mut height) = self.parse_prefix()?;

        while let Some((Token::Op(op), _)) = self.current() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();

            let next_min = if op.is_right_associative() {
                precedence
            } else {
                precedence + 1
            };
            let (right, right_height) = self.nested(|parser| parser.parse_expr(next_min))?;
            height = grow(height.max(right_height))?;
            left = binary(op, left, right);
        }

        Ok((left, height))
    }

    fn parse_prefix(&mut self) -> Result<Parsed, ParseError> {
        let (token, position) = self.current().ok_or(ParseError::UnexpectedEnd)?;

        match token {
            Token::Number(value) => {
                self.advance();
                Ok((Expr::Const(value), 1))
            }

            Token::Ident(name) => {
                self.advance();
                if name == self.variable {
                    return Ok((Expr::Var(name.to_string()), 1));
                }
                if let Some(constant) = Constant::from_name(name) {
                    return Ok((Expr::Constant(constant), 1));
                }
                if let Some(builtin) = Builtin::from_name(name) {
                    // Function must be followed by (
                    return match self.current() {
                        Some((Token::LeftParen, open)) => {
                            self.advance();
                            let (arg, height) = self.parse_group(open)?;
                            Ok((Expr::Call(builtin, Box::new(arg)), grow(height)?))
                        }
                        _ => Err(ParseError::MissingArgument(name.to_string())),
                    };
                }
                Err(ParseError::UnknownIdentifier {
                    name: name.to_string(),
                    position,
                })
            }

            Token::LeftParen => {
                self.advance();
                self.parse_group(position)
            }

            // Unary minus: precedence between Mul (20) and Pow (30)
            Token::Op(Operator::Sub) => {
                self.advance();
                let (expr, height) = self.nested(|parser| parser.parse_expr(UNARY_PRECEDENCE))?;
                Ok((Expr::Neg(Box::new(expr)), grow(height)?))
            }

            // Unary plus: same precedence as unary minus, just returns the expression
            Token::Op(Operator::Add) => {
                self.advance();
                self.nested(|parser| parser.parse_expr(UNARY_PRECEDENCE))
            }

            Token::RightParen | Token::Op(_) => Err(ParseError::UnexpectedToken {
                token: token.to_string(),
                position,
            }),
        }
    }

    /// Parses the inside of a group whose `(` at `open` was already consumed.
    fn parse_group(&mut self, open: usize) -> Result<Parsed, ParseError> {
        let parsed = self.nested(|parser| parser.parse_expr(0))?;

        match self.current() {
            Some((Token::RightParen, _)) => {
                self.advance();
                Ok(parsed)
            }
            None => Err(ParseError::UnbalancedParen { position: open }),
            Some((token, position)) => Err(ParseError::UnexpectedToken {
                token: token.to_string(),
                position,
            }),
        }
    }

    fn nested<T, F>(&mut self, parse: F) -> Result<T, ParseError>
    where
        F: FnOnce(&mut Self) -> Result<T, ParseError>,
    {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::TooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }
}

/// Height of a node over a child of height `child`.
fn grow(child: usize) -> Result<usize, ParseError> {
    if child >= MAX_HEIGHT {
        return Err(ParseError::TooDeep(MAX_HEIGHT));
    }
    Ok(child + 1)
}

fn binary(op: Operator, left: Expr, right: Expr) -> Expr {
    let (left, right) = (Box::new(left), Box::new(right));
    match op {
        Operator::Add => Expr::Add(left, right),
        Operator::Sub => Expr::Sub(left, right),
        Operator::Mul => Expr::Mul(left, right),
        Operator::Div => Expr::Div(left, right),
        Operator::Pow => Expr::Pow(left, right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(src: &str) -> Result<Expr, ParseError> {
        parse_expression(&tokenize(src)?, "x")
    }

    fn var() -> Box<Expr> {
        Box::new(Expr::Var("x".to_string()))
    }

    fn num(value: f64) -> Box<Expr> {
        Box::new(Expr::Const(value))
    }

    #[test]
    fn test_precedence() {
        // 1 + 2*x
        assert_eq!(
            parse("1 + 2*x").unwrap(),
            Expr::Add(num(1.0), Box::new(Expr::Mul(num(2.0), var())))
        );
        // Left associativity of - and /
        assert_eq!(
            parse("8 - 4 - 2").unwrap(),
            Expr::Sub(Box::new(Expr::Sub(num(8.0), num(4.0))), num(2.0))
        );
        assert_eq!(
            parse("8 / 4 / 2").unwrap(),
            Expr::Div(Box::new(Expr::Div(num(8.0), num(4.0))), num(2.0))
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(
            parse("2^3^2").unwrap(),
            Expr::Pow(num(2.0), Box::new(Expr::Pow(num(3.0), num(2.0))))
        );
        // `**` is the same operator
        assert_eq!(parse("2**3**2").unwrap(), parse("2^3^2").unwrap());
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        assert_eq!(
            parse("-x^2").unwrap(),
            Expr::Neg(Box::new(Expr::Pow(var(), num(2.0))))
        );
        // But tighter than multiplication
        assert_eq!(
            parse("-x*2").unwrap(),
            Expr::Mul(Box::new(Expr::Neg(var())), num(2.0))
        );
        // And it is allowed in an exponent
        assert_eq!(
            parse("2^-x").unwrap(),
            Expr::Pow(num(2.0), Box::new(Expr::Neg(var())))
        );
        assert_eq!(parse("+x").unwrap(), *var());
    }

    #[test]
    fn test_function_calls_and_constants() {
        assert_eq!(
            parse("sin(pi*x)").unwrap(),
            Expr::Call(
                Builtin::Sin,
                Box::new(Expr::Mul(Box::new(Expr::Constant(Constant::Pi)), var()))
            )
        );
        assert_eq!(
            parse("sin x"),
            Err(ParseError::MissingArgument("sin".to_string()))
        );
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert_eq!(
            parse("(x + 1"),
            Err(ParseError::UnbalancedParen { position: 0 })
        );
        assert_eq!(
            parse("x + 1)"),
            Err(ParseError::UnbalancedParen { position: 5 })
        );
        assert_eq!(
            parse("sqrt(x"),
            Err(ParseError::UnbalancedParen { position: 4 })
        );
    }

    #[test]
    fn test_missing_operands() {
        assert_eq!(parse("2*x+"), Err(ParseError::UnexpectedEnd));
        assert!(matches!(
            parse("*3"),
            Err(ParseError::UnexpectedToken { position: 0, .. })
        ));
        assert!(matches!(
            parse("()"),
            Err(ParseError::UnexpectedToken { position: 1, .. })
        ));
        assert_eq!(parse(""), Err(ParseError::Empty));
    }

    #[test]
    fn test_unknown_identifier() {
        assert_eq!(
            parse("x + y"),
            Err(ParseError::UnknownIdentifier {
                name: "y".to_string(),
                position: 4
            })
        );
    }

    #[test]
    fn test_adjacent_operands_are_rejected() {
        assert!(matches!(
            parse("2 3"),
            Err(ParseError::UnexpectedToken { position: 2, .. })
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}x{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert_eq!(parse(&deep), Err(ParseError::TooDeep(MAX_NESTING)));

        let shallow = format!("{}x{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(parse(&shallow).unwrap(), *var());
    }

    #[test]
    fn test_long_power_chain_is_too_deep() {
        let chain = format!("x{}", "^x".repeat(50_000));
        assert_eq!(parse(&chain), Err(ParseError::TooDeep(MAX_NESTING)));

        let chain = format!("x{}", "^x".repeat(MAX_NESTING - 1));
        assert!(parse(&chain).is_ok());
    }

    #[test]
    fn test_tree_height_limit() {
        // A left-leaning sum grows one level per term
        let sum = format!("1{}", "+1".repeat(20_000));
        assert_eq!(parse(&sum), Err(ParseError::TooDeep(MAX_HEIGHT)));

        let sum = format!("1{}", "+1".repeat(MAX_HEIGHT - 1));
        assert!(parse(&sum).is_ok());
        let sum = format!("1{}", "+1".repeat(MAX_HEIGHT));
        assert_eq!(parse(&sum), Err(ParseError::TooDeep(MAX_HEIGHT)));
    }
}
