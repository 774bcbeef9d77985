//! Tokens of the QC expression language
//!
//! Keywords and operators are fixed tokens; identifiers, numbers and string
//! literals carry their parsed payload. Whitespace is skipped.

use super::ExprError;
use logos::Logos;
use std::fmt;
use std::ops::Range;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // Logical
    #[token("or")]
    #[token("||")]
    Or,
    #[token("and")]
    #[token("&&")]
    And,
    #[token("not")]
    #[token("!")]
    Not,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Comparison
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,

    // Arithmetic
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,

    /// Number literal (e.g. 3, -70.5 after unary minus, 1e-3, .5)
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    /// Quoted text, double or single quotes, no escapes
    #[regex(r#""[^"]*""#, |lex| unquote(lex.slice()))]
    #[regex(r"'[^']*'", |lex| unquote(lex.slice()))]
    Text(String),

    /// Field or function name
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

fn unquote(slice: &str) -> String {
    slice[1..slice.len() - 1].to_string()
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Or => f.write_str("or"),
            Self::And => f.write_str("and"),
            Self::Not => f.write_str("not"),
            Self::True => f.write_str("true"),
            Self::False => f.write_str("false"),
            Self::EqEq => f.write_str("=="),
            Self::BangEq => f.write_str("!="),
            Self::Lt => f.write_str("<"),
            Self::LtEq => f.write_str("<="),
            Self::Gt => f.write_str(">"),
            Self::GtEq => f.write_str(">="),
            Self::Plus => f.write_str("+"),
            Self::Minus => f.write_str("-"),
            Self::Star => f.write_str("*"),
            Self::Slash => f.write_str("/"),
            Self::Percent => f.write_str("%"),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
            Self::Comma => f.write_str(","),
            Self::Number(value) => write!(f, "{}", value),
            Self::Text(text) => write!(f, "\"{}\"", text),
            Self::Ident(name) => f.write_str(name),
        }
    }
}

/// Split an expression into tokens with their byte spans
pub fn tokenize(source: &str) -> Result<Vec<(Token, Range<usize>)>, ExprError> {
    Token::lexer(source)
        .spanned()
        .map(|(token, span)| match token {
            Ok(token) => Ok((token, span)),
            Err(()) => Err(ExprError::new(
                format!(
                    "unrecognised input '{}' at offset {}",
                    source.get(span.clone()).unwrap_or_default(),
                    span.start
                ),
            )),
        })
        .collect()
}
