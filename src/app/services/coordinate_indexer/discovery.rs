//! Pass 1: row validity and coordinate discovery

use super::coordinates::CoordinateSet;
use super::{FieldLayout, for_each_data_row};
use crate::app::models::Dimension;
use crate::app::services::csv_codec::parse_field;
use crate::Result;
use std::path::Path;
use tracing::debug;

/// Validity of every data row, decided once and shared by both passes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPlan {
    valid: Vec<bool>,
    valid_count: usize,
}

impl RowPlan {
    pub fn push(&mut self, valid: bool) {
        self.valid.push(valid);
        if valid {
            self.valid_count += 1;
        }
    }

    /// `None` for rows beyond those seen in discovery
    pub fn is_valid(&self, row: usize) -> Option<bool> {
        self.valid.get(row).copied()
    }

    /// Total data rows seen
    pub fn len(&self) -> usize {
        self.valid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }

    pub fn valid_count(&self) -> usize {
        self.valid_count
    }

    pub fn skipped_count(&self) -> usize {
        self.valid.len() - self.valid_count
    }
}

/// Result of the discovery pass
#[derive(Debug, Clone)]
pub struct Discovery {
    pub plan: RowPlan,

    /// One set per layout dimension, same order
    pub coordinates: Vec<CoordinateSet>,
}

impl Discovery {
    /// Fixed cardinality of each dimension
    pub fn cardinalities(&self) -> Vec<usize> {
        self.coordinates.iter().map(CoordinateSet::len).collect()
    }

    /// Frozen dimensions in layout order
    pub fn to_dimensions(&self, layout: &FieldLayout) -> Vec<Dimension> {
        layout
            .dimensions
            .iter()
            .zip(&self.coordinates)
            .map(|(column, set)| {
                let mut dimension =
                    Dimension::new(&column.descriptor.name, column.descriptor.field_type);
                dimension.values = set.values().to_vec();
                dimension
            })
            .collect()
    }
}

/// Read the file once, recording row validity and distinct dimension values
pub fn discover(path: &Path, layout: &FieldLayout) -> Result<Discovery> {
    let mut plan = RowPlan::default();
    let mut coordinates = vec![CoordinateSet::new(); layout.dimensions.len()];

    for_each_data_row(path, |_, line, record| {
        let valid = layout.is_valid_row(record);
        plan.push(valid);

        if !valid {
            debug!("Skipping line {}: {} fields", line, record.len());
            return Ok(());
        }

        for (column, set) in layout.dimensions.iter().zip(coordinates.iter_mut()) {
            set.insert(parse_field(record, column)?);
        }
        Ok(())
    })?;

    for (column, set) in layout.dimensions.iter().zip(&coordinates) {
        debug!(
            "Dimension '{}' has {} distinct values",
            column.descriptor.name,
            set.len()
        );
    }

    Ok(Discovery { plan, coordinates })
}
