//! Pratt parser for QC expressions

use super::ExprError;
use super::lexer::{Token, tokenize};
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        };
        f.write_str(symbol)
    }
}

/// Built-in functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    IsNan,
    Min,
    Max,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "abs" => Some(Self::Abs),
            "isnan" => Some(Self::IsNan),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Self::Abs | Self::IsNan => 1,
            Self::Min | Self::Max => 2,
        }
    }
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Bool(bool),
    Field(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Names of all fields referenced by the expression
    pub fn fields(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_fields(&mut names);
        names
    }

    fn collect_fields<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Field(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Self::Unary { operand, .. } => operand.collect_fields(names),
            Self::Binary { left, right, .. } => {
                left.collect_fields(names);
                right.collect_fields(names);
            }
            Self::Call { args, .. } => args.iter().for_each(|arg| arg.collect_fields(names)),
            Self::Number(_) | Self::Text(_) | Self::Bool(_) => {}
        }
    }
}

/// Parse a complete expression; trailing tokens are an error
pub fn parse_expression(source: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ExprError::new("empty expression"));
    }

    let mut stream = TokenStream::new(&tokens);
    let expr = parse_pratt(&mut stream, 0)?;

    match stream.peek_spanned() {
        None => Ok(expr),
        Some((token, span)) => Err(ExprError::unexpected(Some(token), "end of expression", span)),
    }
}

/// Token cursor with lookahead
struct TokenStream<'src> {
    tokens: &'src [(Token, Range<usize>)],
    pos: usize,
}

impl<'src> TokenStream<'src> {
    fn new(tokens: &'src [(Token, Range<usize>)]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'src Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn peek_spanned(&self) -> Option<(&'src Token, Range<usize>)> {
        self.tokens
            .get(self.pos)
            .map(|(token, span)| (token, span.clone()))
    }

    fn advance(&mut self) -> Option<(&'src Token, Range<usize>)> {
        let current = self.peek_spanned();
        if current.is_some() {
            self.pos += 1;
        }
        current
    }

    /// Offset just past the last token, for errors at end of input
    fn end_span(&self) -> Range<usize> {
        let end = self.tokens.last().map(|(_, span)| span.end).unwrap_or(0);
        end..end
    }

    fn expect(&mut self, expected: Token, context: &str) -> Result<(), ExprError> {
        match self.advance() {
            Some((token, _)) if *token == expected => Ok(()),
            Some((token, span)) => Err(ExprError::unexpected(Some(token), context, span)),
            None => Err(ExprError::unexpected(None, context, self.end_span())),
        }
    }
}

/// Precedence of binary operators; higher binds tighter. All are left associative.
fn binary_op_info(token: &Token) -> Option<(u8, BinaryOp)> {
    match token {
        Token::Or => Some((10, BinaryOp::Or)),
        Token::And => Some((20, BinaryOp::And)),
        Token::EqEq => Some((30, BinaryOp::Eq)),
        Token::BangEq => Some((30, BinaryOp::Ne)),
        Token::Lt => Some((30, BinaryOp::Lt)),
        Token::LtEq => Some((30, BinaryOp::Le)),
        Token::Gt => Some((30, BinaryOp::Gt)),
        Token::GtEq => Some((30, BinaryOp::Ge)),
        Token::Plus => Some((40, BinaryOp::Add)),
        Token::Minus => Some((40, BinaryOp::Sub)),
        Token::Star => Some((50, BinaryOp::Mul)),
        Token::Slash => Some((50, BinaryOp::Div)),
        Token::Percent => Some((50, BinaryOp::Mod)),
        _ => None,
    }
}

fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ExprError> {
    let mut left = parse_prefix(stream)?;

    while let Some((prec, op)) = stream.peek().and_then(binary_op_info) {
        if prec < min_prec {
            break;
        }
        stream.advance();

        let right = parse_pratt(stream, prec + 1)?;
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
    }

    Ok(left)
}

fn parse_prefix(stream: &mut TokenStream) -> Result<Expr, ExprError> {
    let op = match stream.peek() {
        Some(Token::Minus) => UnaryOp::Neg,
        Some(Token::Not) => UnaryOp::Not,
        _ => return parse_atom(stream),
    };
    stream.advance();

    let operand = parse_prefix(stream)?;
    Ok(Expr::Unary {
        op,
        operand: Box::new(operand),
    })
}

fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ExprError> {
    let end = stream.end_span();
    let (token, span) = stream
        .advance()
        .ok_or_else(|| ExprError::unexpected(None, "a value", end))?;

    match token {
        Token::Number(value) => Ok(Expr::Number(*value)),
        Token::Text(text) => Ok(Expr::Text(text.clone())),
        Token::True => Ok(Expr::Bool(true)),
        Token::False => Ok(Expr::Bool(false)),
        Token::LParen => {
            let inner = parse_pratt(stream, 0)?;
            stream.expect(Token::RParen, "')'")?;
            Ok(inner)
        }
        Token::Ident(name) if matches!(stream.peek(), Some(Token::LParen)) => {
            parse_call(stream, name, span)
        }
        Token::Ident(name) => Ok(Expr::Field(name.clone())),
        other => Err(ExprError::unexpected(Some(other), "a value", span)),
    }
}

fn parse_call(
    stream: &mut TokenStream,
    name: &str,
    span: Range<usize>,
) -> Result<Expr, ExprError> {
    let function = Function::from_name(name).ok_or_else(|| {
        ExprError::new(format!("unknown function '{}' at offset {}", name, span.start))
    })?;
    stream.expect(Token::LParen, "'('")?;

    let mut args = Vec::new();
    if !matches!(stream.peek(), Some(Token::RParen)) {
        loop {
            args.push(parse_pratt(stream, 0)?);
            if matches!(stream.peek(), Some(Token::Comma)) {
                stream.advance();
            } else {
                break;
            }
        }
    }
    stream.expect(Token::RParen, "')'")?;

    if args.len() != function.arity() {
        return Err(ExprError::new(format!(
            "function '{}' takes {} argument(s), got {}",
            name,
            function.arity(),
            args.len()
        )));
    }

    Ok(Expr::Call { function, args })
}
