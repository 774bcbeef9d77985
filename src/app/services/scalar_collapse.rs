//! Promotion of single-valued dimensions and variables to global attributes
//!
//! A dimension with exactly one coordinate carries no axis information, so it
//! becomes a scalar attribute named after the dimension. Variables lose their
//! references to collapsed dimensions; a variable left with no dimensions
//! becomes a scalar attribute holding its lone cell.
//!
//! The removal set is computed up front and the surviving collections are
//! rebuilt through an old-to-new index table, so the result never depends on
//! the order dimensions are visited.

use crate::app::models::{SampleData, Value, Variable};
use tracing::{debug, warn};

/// Names of the fields promoted to attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollapseSummary {
    pub dimensions: Vec<String>,
    pub variables: Vec<String>,
}

/// Collapse single-valued dimensions and fully collapsed variables in place
pub fn collapse_scalars(sample: &mut SampleData) -> CollapseSummary {
    let mut summary = CollapseSummary::default();

    // Old dimension index -> new index, None when collapsed
    let mut remap = Vec::with_capacity(sample.dimensions.len());
    let mut kept_dimensions = Vec::with_capacity(sample.dimensions.len());

    for dimension in std::mem::take(&mut sample.dimensions) {
        if dimension.len() == 1 {
            remap.push(None);
            let value = dimension.values[0].clone();
            promote(sample, &dimension.name, value);
            summary.dimensions.push(dimension.name);
        } else {
            remap.push(Some(kept_dimensions.len()));
            kept_dimensions.push(dimension);
        }
    }
    sample.dimensions = kept_dimensions;

    let mut kept_variables = Vec::with_capacity(sample.variables.len());
    for variable in std::mem::take(&mut sample.variables) {
        match remap_variable(variable, &remap) {
            Ok(variable) => kept_variables.push(variable),
            Err(variable) => {
                match variable.data.get(0) {
                    Some(value) => promote(sample, &variable.name, value),
                    None => debug!("Variable '{}' has no value to promote", variable.name),
                }
                summary.variables.push(variable.name);
            }
        }
    }
    sample.variables = kept_variables;

    if !summary.dimensions.is_empty() || !summary.variables.is_empty() {
        debug!(
            "Collapsed dimensions {:?} and variables {:?} to attributes",
            summary.dimensions, summary.variables
        );
    }

    summary
}

/// Rewrite dimension references; `Err` returns a variable with nothing left
fn remap_variable(
    mut variable: Variable,
    remap: &[Option<usize>],
) -> std::result::Result<Variable, Variable> {
    let (dimensions, shape): (Vec<usize>, Vec<usize>) = variable
        .dimensions
        .iter()
        .zip(&variable.shape)
        .filter_map(|(&old, &extent)| remap.get(old).copied().flatten().map(|new| (new, extent)))
        .unzip();

    if dimensions.is_empty() {
        return Err(variable);
    }

    // Dropped axes all had extent 1, so the row-major cell order is unchanged
    variable.dimensions = dimensions;
    variable.shape = shape;
    Ok(variable)
}

fn promote(sample: &mut SampleData, name: &str, value: Value) {
    if let Some(previous) = sample.attributes.insert(name.to_string(), value) {
        warn!("Collapsed field '{}' replaced attribute value '{}'", name, previous);
    }
}
