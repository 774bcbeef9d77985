//! Two-pass coordinate discovery and dense array filling
//!
//! The indexer turns a flat CSV export into gridded data without knowing the
//! grid in advance:
//!
//! 1. **Discovery** ([`discovery`]) reads every row once, records which rows are
//!    valid, and collects each dimension's distinct values in first-seen order.
//!    After this pass every dimension's cardinality is fixed.
//! 2. **Fill** ([`fill`]) allocates one dense row-major array per variable, re-reads
//!    the file, looks each row's dimension values up (never inserting) and writes
//!    the variable cells at the projected coordinate tuple.
//!
//! Both passes share the same [`RowPlan`], so a row is valid in the fill pass
//! exactly when it was valid during discovery. If the file changes between the
//! passes the fill pass fails with a consistency error instead of growing a
//! dimension.

pub mod coordinates;
pub mod discovery;
pub mod fill;

#[cfg(test)]
pub mod tests;

use crate::app::models::{Dimension, ResolvedColumn, Variable};
use crate::app::services::csv_codec::{decode_record, is_blank, reader_builder};
use crate::constants::MIN_ROW_FIELDS;
use crate::{Error, Result};
use csv::StringRecord;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

// Re-export main types for easy access
pub use coordinates::{CoordinateKey, CoordinateSet};
pub use discovery::{Discovery, RowPlan};

/// Resolved fields split into dimensions and variables
#[derive(Debug, Clone)]
pub struct FieldLayout {
    /// Dimension fields in mapping order; position is the output dimension index
    pub dimensions: Vec<ResolvedColumn>,

    /// Variable fields with the dimension indices they vary over, in declared order
    pub variables: Vec<(ResolvedColumn, Vec<usize>)>,

    /// Minimum field count for a row to be indexed
    pub min_row_fields: usize,

    /// Rows must also reach the last column any field reads
    pub max_column: usize,
}

impl FieldLayout {
    /// Split resolved columns by role.
    ///
    /// `header_columns` lowers the row minimum for narrow exports: a row needs
    /// `min(MIN_ROW_FIELDS, header_columns)` fields and a cell for every mapped column.
    pub fn new(resolved: Vec<ResolvedColumn>, header_columns: usize) -> Result<Self> {
        let max_column = resolved.iter().map(|r| r.last_column()).max().unwrap_or(0);

        let (dimensions, variable_columns): (Vec<_>, Vec<_>) = resolved
            .into_iter()
            .partition(|r| r.descriptor.is_dimension());

        let mut variables = Vec::with_capacity(variable_columns.len());
        for column in variable_columns {
            let dims = column
                .descriptor
                .dimension_group
                .iter()
                .map(|name| {
                    dimensions
                        .iter()
                        .position(|dim| &dim.descriptor.name == name)
                        .ok_or_else(|| {
                            Error::configuration(format!(
                                "Field '{}' varies over unknown dimension '{}'",
                                column.descriptor.name, name
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            variables.push((column, dims));
        }

        Ok(Self {
            dimensions,
            variables,
            min_row_fields: MIN_ROW_FIELDS.min(header_columns.max(1)),
            max_column,
        })
    }

    /// Row validity, decided once during discovery. Blank rows are never valid.
    pub fn is_valid_row(&self, record: &StringRecord) -> bool {
        let field_count = record.len();
        field_count >= self.min_row_fields && field_count > self.max_column && !is_blank(record)
    }
}

/// Output of both passes
#[derive(Debug, Clone)]
pub struct IndexedData {
    pub dimensions: Vec<Dimension>,
    pub variables: Vec<Variable>,
    pub total_rows: usize,
    pub rows_indexed: usize,
    pub rows_skipped: usize,
}

/// Two-pass indexer over one CSV file
#[derive(Debug)]
pub struct CoordinateIndexer<'a> {
    path: &'a Path,
    layout: FieldLayout,
}

impl<'a> CoordinateIndexer<'a> {
    pub fn new(path: &'a Path, layout: FieldLayout) -> Self {
        Self { path, layout }
    }

    /// Run discovery then fill
    pub fn run(&self) -> Result<IndexedData> {
        let discovery = self.discover()?;
        let dimensions = discovery.to_dimensions(&self.layout);
        let variables = self.fill(&discovery)?;

        info!(
            "Indexed {} of {} rows into {} dimensions and {} variables",
            discovery.plan.valid_count(),
            discovery.plan.len(),
            dimensions.len(),
            variables.len()
        );

        Ok(IndexedData {
            dimensions,
            variables,
            total_rows: discovery.plan.len(),
            rows_indexed: discovery.plan.valid_count(),
            rows_skipped: discovery.plan.skipped_count(),
        })
    }

    /// Pass 1: row plan and distinct dimension values
    pub fn discover(&self) -> Result<Discovery> {
        discovery::discover(self.path, &self.layout)
    }

    /// Pass 2: dense variable arrays
    pub fn fill(&self, discovery: &Discovery) -> Result<Vec<Variable>> {
        fill::fill_variables(self.path, &self.layout, discovery)
    }
}

/// Call `visit` with the zero-based data-row number, the file line number and
/// the fields of every record after the header. Empty lines are not records.
/// Returns the number of data rows read.
///
/// The file handle lives only for the duration of this call, so it is closed
/// on every exit path including errors returned by `visit`.
pub fn for_each_data_row<F>(path: &Path, mut visit: F) -> Result<usize>
where
    F: FnMut(usize, usize, &StringRecord) -> Result<()>,
{
    let file_name = path.display().to_string();
    let file = File::open(path).map_err(|e| Error::io(format!("Failed to open {}", file_name), e))?;
    let mut records = reader_builder().from_reader(file).into_byte_records();

    // Header record
    if let Some(result) = records.next() {
        result.map_err(|e| Error::csv_parsing(&file_name, "Failed to read header", Some(e)))?;
    }

    let mut row = 0;
    for result in records {
        let raw = result.map_err(|e| {
            Error::csv_parsing(&file_name, format!("Failed to read data row {}", row + 1), Some(e))
        })?;
        let line = raw
            .position()
            .map_or(row + 2, |position| position.line() as usize);

        visit(row, line, &decode_record(raw))?;
        row += 1;
    }

    debug!("Read {} data rows from {}", row, file_name);
    Ok(row)
}
