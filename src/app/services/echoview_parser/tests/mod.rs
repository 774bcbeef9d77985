//! Test utilities for the Echoview parser

use std::io::Write;
use tempfile::NamedTempFile;

use crate::app::services::echoview_parser::{EchoviewParser, ParserOptions};


/// Helper to create a temporary file with given content
pub fn create_temp_file(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{}", content).unwrap();
    temp_file
}

/// Parser over a mapping file written to disk
pub fn create_parser(mapping: &str) -> (EchoviewParser, NamedTempFile) {
    let mapping_file = create_temp_file(mapping);
    let parser = EchoviewParser::from_mapping_file(
        mapping_file.path(),
        ParserOptions::default().with_platform("Aurora"),
    )
    .unwrap();
    (parser, mapping_file)
}

/// Depth-binned export over one region, with QC on Sv
pub fn create_transect_mapping() -> String {
    r#"% Echoview Sv export
TIME,Ping_date,,DT
DEPTH,Layer_depth_min,,N
REGION,Region_name,,S
SV,Sv_mean,TIME DEPTH,N,SV > -71
NASC,NASC,TIME DEPTH,N
"#
    .to_string()
}

pub fn create_transect_csv() -> String {
    r#"Ping_date,Ping_time,Layer_depth_min,Region_name,Sv_mean,NASC
20210305,10:00:00.00,5,Transect1,-70.5,12.5
20210305,10:00:00.00,10,Transect1,-72.0,8.0
20210305,10:05:00.00,5,Transect1,-68.25,15.0
20210305,10:05:00.00,10,Transect1,-71.0,9.5

"#
    .to_string()
}
