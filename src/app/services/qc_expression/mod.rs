//! QC flag evaluation
//!
//! Each field descriptor may carry a QC formula. Formulas are written in a small
//! expression language (comparisons, arithmetic, boolean combinators and a few
//! numeric functions) over the assembled dataset: every dimension, variable and
//! promoted scalar attribute is bound by name as a read-only series.
//!
//! ```text
//! Sv_mean > -90 and Sv_mean < 0
//! isnan(NASC) or abs(LATITUDE) <= 90
//! REGION != "Surface"
//! ```
//!
//! Evaluation runs once per field after collapse, producing a flag array aligned
//! with the field's data. Formulas cannot reach the host environment; there is no
//! assignment, no loops and no user-defined functions.

pub mod eval;
pub mod lexer;
pub mod parser;

#[cfg(test)]
pub mod tests;

use crate::app::models::{FieldDescriptor, FlagArray, SampleData};
use crate::{Error, Result};
use std::ops::Range;
use tracing::{debug, info};

// Re-export main types for easy access
pub use eval::{EvalContext, Series};
pub use lexer::Token;
pub use parser::{BinaryOp, Expr, Function, UnaryOp, parse_expression};

/// Lexing, parsing or evaluation failure, without the field context
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ExprError {
    pub message: String,
}

impl ExprError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Token mismatch at a source offset; `None` means end of input
    pub fn unexpected(found: Option<&Token>, expected: &str, span: Range<usize>) -> Self {
        let message = match found {
            Some(token) => format!(
                "expected {}, found '{}' at offset {}",
                expected, token, span.start
            ),
            None => format!("expected {}, found end of expression", expected),
        };
        Self { message }
    }
}

/// Where a descriptor's flags will be stored
enum FlagTarget {
    Dimension(usize),
    Variable(usize),
}

/// Evaluate one formula and shape the result for a field of `len` elements
pub fn evaluate_flags(
    context: &EvalContext,
    source: &str,
    len: usize,
) -> std::result::Result<FlagArray, ExprError> {
    let expr = parse_expression(source)?;
    let series = context.evaluate(&expr)?;

    let count = series.len();
    if count != 1 && count != len {
        return Err(ExprError::new(format!(
            "result has {} elements, field has {}",
            count, len
        )));
    }
    let repeat = count == 1 && len != 1;

    match series {
        Series::Boolean(flags) if repeat => Ok(FlagArray::Boolean(vec![flags[0]; len])),
        Series::Boolean(flags) => Ok(FlagArray::Boolean(flags)),
        Series::Numeric(flags) if repeat => Ok(FlagArray::Numeric(vec![flags[0]; len])),
        Series::Numeric(flags) => Ok(FlagArray::Numeric(flags)),
        Series::Text(_) => Err(ExprError::new("expression produced text, not flags")),
    }
}

/// Attach QC flags to every field whose descriptor carries a formula.
///
/// Fields collapsed to scalar attributes get no flags. Returns the number of
/// fields flagged.
pub fn apply_qc(sample: &mut SampleData, descriptors: &[FieldDescriptor]) -> Result<usize> {
    let formulas: Vec<(&FieldDescriptor, &str)> = descriptors
        .iter()
        .filter_map(|d| {
            d.qc_expression
                .as_deref()
                .map(str::trim)
                .filter(|expr| !expr.is_empty())
                .map(|expr| (d, expr))
        })
        .collect();

    if formulas.is_empty() {
        return Ok(0);
    }

    let context = EvalContext::from_sample(sample);
    let mut results = Vec::with_capacity(formulas.len());

    for (descriptor, source) in formulas {
        let (target, len) = if let Some(index) = sample.dimension_index(&descriptor.name) {
            (FlagTarget::Dimension(index), sample.dimensions[index].len())
        } else if let Some(index) = sample.variables.iter().position(|v| v.name == descriptor.name) {
            (FlagTarget::Variable(index), sample.variables[index].data.len())
        } else {
            debug!("No array for '{}', QC expression not applied", descriptor.name);
            continue;
        };

        let flags = evaluate_flags(&context, source, len)
            .map_err(|e| Error::qc_expression(&descriptor.name, e.message))?;
        debug!("Evaluated QC for '{}': {}", descriptor.name, source);
        results.push((target, flags));
    }

    let flagged = results.len();
    for (target, flags) in results {
        match target {
            FlagTarget::Dimension(index) => sample.dimensions[index].flags = Some(flags),
            FlagTarget::Variable(index) => sample.variables[index].flags = Some(flags),
        }
    }

    info!("Applied QC expressions to {} fields", flagged);
    Ok(flagged)
}
