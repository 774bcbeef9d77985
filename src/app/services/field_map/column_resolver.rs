//! Header analysis and column resolution
//!
//! Binds every descriptor to the index of its column in a particular file.
//! The result is only valid for files sharing that exact header order.

use crate::app::models::{FieldDescriptor, ResolvedColumn};
use crate::app::services::csv_codec::split_record;
use crate::{Error, Result};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Column labels of one header line
#[derive(Debug, Clone)]
pub struct HeaderColumns {
    /// Label to index; a repeated label maps to its last occurrence
    pub name_to_index: HashMap<String, usize>,

    /// Number of labels on the header line
    pub column_count: usize,
}

impl HeaderColumns {
    /// Analyze an already sanitized header line
    pub fn analyze(header_line: &str) -> Self {
        let labels = split_record(header_line);
        let mut name_to_index = HashMap::new();

        for (index, label) in labels.iter().enumerate() {
            if let Some(previous) = name_to_index.insert(label.to_string(), index) {
                warn!(
                    "Header label '{}' repeated at columns {} and {}; using the last",
                    label,
                    previous + 1,
                    index + 1
                );
            }
        }

        Self {
            name_to_index,
            column_count: labels.len(),
        }
    }

    /// Get the index for a given column label
    pub fn get_index(&self, column_name: &str) -> Option<usize> {
        self.name_to_index.get(column_name).copied()
    }
}

/// Resolve every descriptor against the header, failing on the first missing column.
///
/// A `DT` field also needs the unlabelled time-of-day column after its date column.
pub fn resolve_columns(
    descriptors: &[FieldDescriptor],
    header: &HeaderColumns,
    file: &str,
) -> Result<Vec<ResolvedColumn>> {
    descriptors
        .iter()
        .map(|descriptor| {
            let column = header
                .get_index(&descriptor.column_name)
                .ok_or_else(|| Error::missing_column(file, &descriptor.column_name))?;

            debug!(
                "Field '{}' reads column {} ('{}')",
                descriptor.name,
                column + 1,
                descriptor.column_name
            );

            let resolved = ResolvedColumn {
                descriptor: descriptor.clone(),
                column,
            };
            if resolved.last_column() >= header.column_count {
                return Err(Error::missing_column(
                    file,
                    format!("time of day after {}", descriptor.column_name),
                ));
            }
            Ok(resolved)
        })
        .collect()
}
