//! Test utilities for the two-pass coordinate indexer

use std::io::Write;
use tempfile::NamedTempFile;

use crate::app::services::coordinate_indexer::FieldLayout;
use crate::app::services::csv_codec::sanitize_header;
use crate::app::services::field_map::{HeaderColumns, parse_field_map, resolve_columns};

mod fill_tests;

/// Helper to create a temporary CSV file with given content
pub fn create_csv_file(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{}", content).unwrap();
    temp_file
}

/// Helper to build a layout from mapping text and the file's own header
pub fn layout_for(mapping: &str, csv: &str) -> FieldLayout {
    let descriptors = parse_field_map(mapping).unwrap();
    let header_line = sanitize_header(csv.lines().next().unwrap().as_bytes());
    let header = HeaderColumns::analyze(&header_line);
    let resolved = resolve_columns(&descriptors, &header, "test.csv").unwrap();
    FieldLayout::new(resolved, header.column_count).unwrap()
}

/// Mapping for a depth-binned Sv export
pub fn create_grid_mapping() -> String {
    r#"TIME,Ping_date,,DT
DEPTH,Layer_depth_min,,N
REGION,Region_name,,S
SV,Sv_mean,TIME DEPTH,N
NASC,NASC,DEPTH TIME,N
"#
    .to_string()
}

/// Export with two intervals and two layers, an empty line and one short row
pub fn create_grid_csv() -> String {
    r#"Ping_date,Ping_time,Layer_depth_min,Region_name,Sv_mean,NASC
20210305,10:00:00.00,5,Transect1,-70.5,12.5
20210305,10:00:00.00,10,Transect1,-72.0,8.0

20210305,10:05:00.00,5,Transect1,-68.25,15.0
20210305,10:05:00.00,10,Transect1,-71.0,9.5
short,row
"#
    .to_string()
}
