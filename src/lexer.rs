//! Lexeme scanning shared by the preprocessor and the parser.
//!
//! `scan` is lossless and never fails: concatenating the text of every lexeme gives
//! back the input, and characters it does not understand become `Unknown` lexemes.
//! The preprocessor relies on this to rewrite strings without disturbing them.
//! `tokenize` is the strict variant used by the compiler; it drops whitespace,
//! reads numerals and rejects anything unknown.
//!
//! Numerals are `digits[.digits][(e|E)[+-]digits]` or `.digits...`. An `e` that is not
//! followed by digits is not an exponent, so `2e` scans as the numeral `2` followed by
//! the identifier `e`.

use crate::errors::ParseError;

/// Category of a scanned lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexemeKind {
    Number,
    Ident,
    LeftParen,
    RightParen,
    Operator,
    Whitespace,
    Unknown,
}

/// A slice of the source together with its category and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'src> {
    pub kind: LexemeKind,
    pub text: &'src str,
    pub start: usize,
}

/// Binary and unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl Operator {
    /// Binding power used by the Pratt parser.
    pub fn precedence(&self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 10,
            Operator::Mul | Operator::Div => 20,
            Operator::Pow => 30,
        }
    }

    pub fn is_right_associative(&self) -> bool {
        matches!(self, Operator::Pow)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Pow => "^",
        }
    }
}

/// Token produced by the strict tokenizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'src> {
    Number(f64),
    Ident(&'src str),
    Op(Operator),
    LeftParen,
    RightParen,
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Op(op) => write!(f, "{}", op.symbol()),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
        }
    }
}

/// A token and the byte offset it starts at.
pub type Spanned<'src> = (Token<'src>, usize);

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Splits `src` into lexemes without ever failing.
pub fn scan(src: &str) -> Vec<Lexeme<'_>> {
    let bytes = src.as_bytes();
    let mut lexemes = Vec::new();
    let mut pos = 0;

    while let Some(c) = src[pos..].chars().next() {
        let start = pos;
        let kind = if c.is_whitespace() {
            pos += c.len_utf8();
            while let Some(next) = src[pos..].chars().next().filter(|n| n.is_whitespace()) {
                pos += next.len_utf8();
            }
            LexemeKind::Whitespace
        } else if c.is_ascii_digit()
            || (c == '.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit))
        {
            pos = scan_number(bytes, pos);
            LexemeKind::Number
        } else if is_ident_start(c) {
            pos += 1;
            while bytes.get(pos).is_some_and(|b| is_ident_continue(*b as char)) {
                pos += 1;
            }
            LexemeKind::Ident
        } else if c == 'π' {
            pos += c.len_utf8();
            LexemeKind::Ident
        } else if c == '(' {
            pos += 1;
            LexemeKind::LeftParen
        } else if c == ')' {
            pos += 1;
            LexemeKind::RightParen
        } else if c == '*' && bytes.get(pos + 1) == Some(&b'*') {
            pos += 2;
            LexemeKind::Operator
        } else if matches!(c, '+' | '-' | '*' | '/' | '^') {
            pos += 1;
            LexemeKind::Operator
        } else {
            pos += c.len_utf8();
            LexemeKind::Unknown
        };

        lexemes.push(Lexeme {
            kind,
            text: &src[start..pos],
            start,
        });
    }

    lexemes
}

/// Returns the end offset of the numeral starting at `pos`.
fn scan_number(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
        pos += 1;
    }
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut exp = pos + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        if bytes.get(exp).is_some_and(u8::is_ascii_digit) {
            pos = exp;
            while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
                pos += 1;
            }
        }
    }
    pos
}

/// Converts `src` into parser tokens, rejecting unknown characters and bad numerals.
pub fn tokenize(src: &str) -> Result<Vec<Spanned<'_>>, ParseError> {
    let mut tokens = Vec::new();

    for lexeme in scan(src) {
        let token = match lexeme.kind {
            LexemeKind::Whitespace => continue,
            LexemeKind::Number => {
                let value: f64 = lexeme
                    .text
                    .parse()
                    .map_err(|_| ParseError::InvalidNumber(lexeme.text.to_string()))?;
                if !value.is_finite() {
                    return Err(ParseError::InvalidNumber(lexeme.text.to_string()));
                }
                Token::Number(value)
            }
            LexemeKind::Ident => Token::Ident(lexeme.text),
            LexemeKind::LeftParen => Token::LeftParen,
            LexemeKind::RightParen => Token::RightParen,
            LexemeKind::Operator => Token::Op(match lexeme.text {
                "+" => Operator::Add,
                "-" => Operator::Sub,
                "*" => Operator::Mul,
                "/" => Operator::Div,
                _ => Operator::Pow, // "^" or "**"
            }),
            LexemeKind::Unknown => {
                let ch = lexeme.text.chars().next().unwrap_or_default();
                return Err(ParseError::InvalidCharacter {
                    ch,
                    position: lexeme.start,
                });
            }
        };
        tokens.push((token, lexeme.start));
    }

    Ok(tokens)
}
