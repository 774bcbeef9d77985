//! Series interpreter for parsed QC expressions
//!
//! Every value is a series. A series of length 1 broadcasts against any other
//! length; two longer series must have equal lengths.

use super::ExprError;
use super::parser::{BinaryOp, Expr, Function, UnaryOp};
use crate::app::models::{ArrayData, SampleData, Value};
use std::collections::HashMap;

/// Evaluated value of an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    Numeric(Vec<f64>),
    Boolean(Vec<bool>),
    Text(Vec<String>),
}

impl Series {
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Boolean(values) => values.len(),
            Self::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::Boolean(_) => "boolean",
            Self::Text(_) => "text",
        }
    }

    /// Series view of stored cells; temporal cells become days since epoch
    pub fn from_array(data: &ArrayData) -> Self {
        match data {
            ArrayData::Text(values) => Self::Text(values.clone()),
            other => Self::Numeric(other.to_f64().unwrap_or_default()),
        }
    }

    /// Length-1 series for a scalar attribute
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Text(text) => Self::Text(vec![text.clone()]),
            other => Self::Numeric(vec![other.as_f64().unwrap_or(f64::NAN)]),
        }
    }

    /// Booleans count as 1/0
    fn to_numeric(&self) -> Result<Vec<f64>, ExprError> {
        match self {
            Self::Numeric(values) => Ok(values.clone()),
            Self::Boolean(values) => Ok(values.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()),
            Self::Text(_) => Err(ExprError::new("text cannot be used as a number")),
        }
    }

    /// Numbers are true when non-zero and not NaN
    fn to_truth(&self) -> Result<Vec<bool>, ExprError> {
        match self {
            Self::Boolean(values) => Ok(values.clone()),
            Self::Numeric(values) => Ok(values.iter().map(|&v| v != 0.0 && !v.is_nan()).collect()),
            Self::Text(_) => Err(ExprError::new("text cannot be used as a condition")),
        }
    }
}

/// Read-only name -> series bindings for one dataset
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    fields: HashMap<String, Series>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every dimension, variable and scalar attribute of `sample`.
    /// Dimensions and variables shadow attributes of the same name.
    pub fn from_sample(sample: &SampleData) -> Self {
        let mut context = Self::new();
        for (name, value) in &sample.attributes {
            context.bind(name, Series::from_value(value));
        }
        for dimension in &sample.dimensions {
            context.bind(&dimension.name, Series::from_array(&dimension.data()));
        }
        for variable in &sample.variables {
            context.bind(&variable.name, Series::from_array(&variable.data));
        }
        context
    }

    pub fn bind(&mut self, name: impl Into<String>, series: Series) {
        self.fields.insert(name.into(), series);
    }

    pub fn get(&self, name: &str) -> Option<&Series> {
        self.fields.get(name)
    }

    /// Evaluate an expression against the bound fields
    pub fn evaluate(&self, expr: &Expr) -> Result<Series, ExprError> {
        match expr {
            Expr::Number(value) => Ok(Series::Numeric(vec![*value])),
            Expr::Text(text) => Ok(Series::Text(vec![text.clone()])),
            Expr::Bool(value) => Ok(Series::Boolean(vec![*value])),
            Expr::Field(name) => self
                .get(name)
                .cloned()
                .ok_or_else(|| ExprError::new(format!("unknown field '{}'", name))),
            Expr::Unary { op, operand } => unary(*op, self.evaluate(operand)?),
            Expr::Binary { op, left, right } => {
                binary(*op, self.evaluate(left)?, self.evaluate(right)?)
            }
            Expr::Call { function, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                call(*function, &args)
            }
        }
    }
}

/// Result length of combining two series
fn broadcast_len(left: usize, right: usize) -> Result<usize, ExprError> {
    match (left, right) {
        (l, r) if l == r => Ok(l),
        (1, r) => Ok(r),
        (l, 1) => Ok(l),
        (l, r) => Err(ExprError::new(format!(
            "cannot combine series of length {} and {}",
            l, r
        ))),
    }
}

fn zip_with<T, U, R>(left: &[T], right: &[U], f: impl Fn(&T, &U) -> R) -> Result<Vec<R>, ExprError> {
    let len = broadcast_len(left.len(), right.len())?;
    let pick = |len: usize, index: usize| if len == 1 { 0 } else { index };

    Ok((0..len)
        .map(|i| f(&left[pick(left.len(), i)], &right[pick(right.len(), i)]))
        .collect())
}

fn unary(op: UnaryOp, operand: Series) -> Result<Series, ExprError> {
    match op {
        UnaryOp::Neg => Ok(Series::Numeric(
            operand.to_numeric()?.into_iter().map(|v| -v).collect(),
        )),
        UnaryOp::Not => Ok(Series::Boolean(
            operand.to_truth()?.into_iter().map(|b| !b).collect(),
        )),
    }
}

fn binary(op: BinaryOp, left: Series, right: Series) -> Result<Series, ExprError> {
    match op {
        BinaryOp::Or => Ok(Series::Boolean(zip_with(
            &left.to_truth()?,
            &right.to_truth()?,
            |a, b| *a || *b,
        )?)),
        BinaryOp::And => Ok(Series::Boolean(zip_with(
            &left.to_truth()?,
            &right.to_truth()?,
            |a, b| *a && *b,
        )?)),
        op if op.is_comparison() => compare(op, &left, &right),
        op => {
            let (l, r) = (left.to_numeric()?, right.to_numeric()?);
            let values = zip_with(&l, &r, |a, b| match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            })?;
            Ok(Series::Numeric(values))
        }
    }
}

fn compare(op: BinaryOp, left: &Series, right: &Series) -> Result<Series, ExprError> {
    let flags = match (left, right) {
        (Series::Text(l), Series::Text(r)) => match op {
            BinaryOp::Eq => zip_with(l, r, |a, b| a == b)?,
            BinaryOp::Ne => zip_with(l, r, |a, b| a != b)?,
            _ => {
                return Err(ExprError::new(format!(
                    "operator '{}' is not defined for text",
                    op
                )));
            }
        },
        (Series::Text(_), other) | (other, Series::Text(_)) => {
            return Err(ExprError::new(format!(
                "cannot compare text with {}",
                other.kind()
            )));
        }
        _ => {
            let (l, r) = (left.to_numeric()?, right.to_numeric()?);
            zip_with(&l, &r, |a, b| match op {
                BinaryOp::Eq => a == b,
                BinaryOp::Ne => a != b,
                BinaryOp::Lt => a < b,
                BinaryOp::Le => a <= b,
                BinaryOp::Gt => a > b,
                _ => a >= b,
            })?
        }
    };
    Ok(Series::Boolean(flags))
}

fn call(function: Function, args: &[Series]) -> Result<Series, ExprError> {
    match (function, args) {
        (Function::Abs, [x]) => Ok(Series::Numeric(
            x.to_numeric()?.into_iter().map(f64::abs).collect(),
        )),
        (Function::IsNan, [x]) => Ok(Series::Boolean(
            x.to_numeric()?.into_iter().map(f64::is_nan).collect(),
        )),
        (Function::Min, [x, y]) => Ok(Series::Numeric(zip_with(
            &x.to_numeric()?,
            &y.to_numeric()?,
            |a, b| f64::min(*a, *b),
        )?)),
        (Function::Max, [x, y]) => Ok(Series::Numeric(zip_with(
            &x.to_numeric()?,
            &y.to_numeric()?,
            |a, b| f64::max(*a, *b),
        )?)),
        (function, args) => Err(ExprError::new(format!(
            "{:?} called with {} argument(s)",
            function,
            args.len()
        ))),
    }
}
