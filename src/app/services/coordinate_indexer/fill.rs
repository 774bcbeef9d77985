//! Pass 2: dense variable arrays

use super::discovery::Discovery;
use super::{FieldLayout, for_each_data_row};
use crate::app::models::Variable;
use crate::app::services::csv_codec::parse_field;
use crate::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Allocate every variable from the discovered cardinalities
pub fn allocate_variables(layout: &FieldLayout, discovery: &Discovery) -> Result<Vec<Variable>> {
    let cardinalities = discovery.cardinalities();

    layout
        .variables
        .iter()
        .map(|(column, dims)| {
            let shape = dims.iter().map(|&dim| cardinalities[dim]).collect();
            let mut variable = Variable::allocate(
                &column.descriptor.name,
                column.descriptor.field_type,
                dims.clone(),
                shape,
            )?;
            variable.comment = Some(format!(
                "Read from column '{}'",
                column.descriptor.column_name
            ));
            Ok(variable)
        })
        .collect()
}

/// Re-read the file and write every variable cell at its coordinate tuple.
///
/// Coordinate values are looked up, never inserted. When two rows share a
/// coordinate tuple the later row wins.
pub fn fill_variables(
    path: &Path,
    layout: &FieldLayout,
    discovery: &Discovery,
) -> Result<Vec<Variable>> {
    let file = path.display().to_string();
    let mut variables = allocate_variables(layout, discovery)?;
    let mut tuple = vec![0usize; layout.dimensions.len()];
    let mut projected = Vec::new();

    let rows = for_each_data_row(path, |row, line_number, record| {
        let valid = discovery.plan.is_valid(row).ok_or_else(|| {
            Error::consistency(&file, line_number, "row was not seen during discovery")
        })?;
        if !valid {
            return Ok(());
        }

        if !layout.is_valid_row(record) {
            return Err(Error::consistency(
                &file,
                line_number,
                format!("row now has {} fields", record.len()),
            ));
        }

        for (slot, (column, set)) in layout
            .dimensions
            .iter()
            .zip(&discovery.coordinates)
            .enumerate()
        {
            let value = parse_field(record, column)?;
            tuple[slot] = set.position(&value).ok_or_else(|| {
                Error::consistency(
                    &file,
                    line_number,
                    format!(
                        "value '{}' of dimension '{}' was not discovered",
                        value, column.descriptor.name
                    ),
                )
            })?;
        }

        for ((column, dims), variable) in layout.variables.iter().zip(variables.iter_mut()) {
            projected.clear();
            projected.extend(dims.iter().map(|&dim| tuple[dim]));

            let index = variable.flat_index(&projected).ok_or_else(|| {
                Error::consistency(
                    &file,
                    line_number,
                    format!("coordinates out of range for '{}'", variable.name),
                )
            })?;
            variable.data.set(index, parse_field(record, column)?)?;
        }
        Ok(())
    })?;

    if rows != discovery.plan.len() {
        return Err(Error::consistency(
            &file,
            rows + 1,
            format!(
                "file has {} data rows, discovery saw {}",
                rows,
                discovery.plan.len()
            ),
        ));
    }

    debug!("Filled {} variables from {}", variables.len(), file);
    Ok(variables)
}
