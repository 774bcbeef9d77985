//! Parsing statistics and result structures

use crate::app::models::SampleData;
use serde::{Deserialize, Serialize};

/// Parsed dataset with basic statistics
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub sample_data: SampleData,
    pub stats: ParseStats,
}

/// Row and field counts for one parsed file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Data lines after the header
    pub total_rows: usize,

    /// Rows that contributed coordinates and cells
    pub rows_indexed: usize,

    /// Blank or short rows
    pub rows_skipped: usize,

    pub dimensions_collapsed: usize,
    pub variables_collapsed: usize,

    /// Fields that received QC flags
    pub fields_flagged: usize,
}

impl ParseStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            (self.rows_indexed as f64 / self.total_rows as f64) * 100.0
        }
    }

    /// Check if parsing was mostly successful (>90% of rows indexed)
    pub fn is_successful(&self) -> bool {
        self.success_rate() > 90.0
    }
}
