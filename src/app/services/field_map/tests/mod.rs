//! Test utilities for field-map loading and column resolution

use std::io::Write;
use tempfile::NamedTempFile;


/// Helper to create a representative mapping file
pub fn create_test_field_map() -> String {
    r#"% Echoview integration export mapping
# name, column, dimensions, type, qc
TIME,Date_M,,DT
DEPTH,Layer_depth_min,,N
REGION,Region_name,,S
LATITUDE,Lat_M,TIME,N,LATITUDE >= -90 and LATITUDE <= 90
SV,Sv_mean,TIME DEPTH,N,SV > -999

PROCESS_ID,Process_ID,TIME
"#
    .to_string()
}

/// Helper to create a temporary file with given content
pub fn create_temp_file(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{}", content).unwrap();
    temp_file
}
