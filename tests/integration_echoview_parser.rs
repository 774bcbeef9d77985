//! End-to-end tests for the Echoview parser through the public API
//!
//! Each test writes a mapping file and a CSV export to a temporary directory
//! and runs the full pipeline: column resolution, two-pass indexing, scalar
//! collapse, QC evaluation, coverage bounds and attribute merging.

use chrono::NaiveDate;
use echoview_processor::app::models::FlagArray;
use echoview_processor::app::services::attribute_file::{AttributeFileReader, merge_attributes};
use echoview_processor::app::services::deployment_db::{DeploymentDb, record_attributes};
use echoview_processor::app::services::echoview_parser::ParserOptions;
use echoview_processor::app::services::field_map::load_field_map;
use echoview_processor::{EchoviewParser, Error, SampleData, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const VOYAGE_MAPPING: &str = "\
% Tasman Sea crossing, 38 kHz
# positions are per ping
TIME,Ping_date,,DT
DEPTH,Layer_depth_min,,N
CHANNEL,Frequency,,N
LATITUDE,Latitude,TIME,N
LONGITUDE,Longitude,TIME,N
SV,Sv_mean,TIME DEPTH,N,SV > -75
";

const VOYAGE_HEADER: &str =
    "Ping_date,Ping_time,Layer_depth_min,Frequency,Latitude,Longitude,Sv_mean";

const VOYAGE_ROWS: [&str; 6] = [
    "20210305,10:00:00.00,5,38,-43.0,179.5,-70.0",
    "20210305,10:00:00.00,10,38,-43.0,179.5,-80.0",
    "20210305,10:05:00.00,5,38,-43.1,179.9,-72.0",
    "20210305,10:05:00.00,10,38,-43.1,179.9,-76.0",
    "20210305,10:10:00.00,5,38,-43.2,-179.8,-60.0",
    "20210305,10:10:00.00,10,38,-43.2,-179.8,-90.0",
];

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn csv(&self, name: &str, header: &str, rows: &[&str]) -> PathBuf {
        let mut content = format!("{}\n", header);
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        self.write(name, &content)
    }

    fn parser(&self) -> EchoviewParser {
        let mapping = self.write("echoview_Aurora.txt", VOYAGE_MAPPING);
        EchoviewParser::from_mapping_file(&mapping, ParserOptions::default().with_platform("Aurora"))
            .unwrap()
    }
}

fn at(hour: u32, minute: u32) -> Value {
    Value::DateTime(
        NaiveDate::from_ymd_opt(2021, 3, 5)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap(),
    )
}

/// SV keyed by its (TIME, DEPTH) coordinate values rather than indices
fn sv_by_coordinates(sample: &SampleData) -> HashMap<(String, String), f64> {
    let time = sample.dimension("TIME").unwrap();
    let depth = sample.dimension("DEPTH").unwrap();
    let sv = sample.variable("SV").unwrap();

    let mut cells = HashMap::new();
    for (t, time_value) in time.values.iter().enumerate() {
        for (d, depth_value) in depth.values.iter().enumerate() {
            let value = sv.get(&[t, d]).and_then(|v| v.as_f64()).unwrap();
            cells.insert((time_value.to_string(), depth_value.to_string()), value);
        }
    }
    cells
}

#[test]
fn test_voyage_export_end_to_end() {
    let workspace = Workspace::new();
    let csv = workspace.csv("transect.csv", VOYAGE_HEADER, &VOYAGE_ROWS);

    let result = workspace.parser().parse_file(&csv).unwrap();
    let sample = &result.sample_data;

    // CHANNEL has one value and becomes an attribute
    let names: Vec<&str> = sample.dimensions.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["TIME", "DEPTH"]);
    assert_eq!(sample.attribute("CHANNEL"), Some(&Value::Number(38.0)));
    assert_eq!(result.stats.dimensions_collapsed, 1);

    let time = sample.dimension("TIME").unwrap();
    assert_eq!(time.values, vec![at(10, 0), at(10, 5), at(10, 10)]);

    let sv = sample.variable("SV").unwrap();
    assert_eq!(sv.shape, vec![3, 2]);
    assert_eq!(
        sv.data.to_f64().unwrap(),
        vec![-70.0, -80.0, -72.0, -76.0, -60.0, -90.0]
    );
    assert_eq!(
        sv.flags,
        Some(FlagArray::Boolean(vec![true, false, true, false, true, false]))
    );
    assert_eq!(result.stats.fields_flagged, 1);

    assert_eq!(sample.attribute("time_coverage_start"), Some(&at(10, 0)));
    assert_eq!(sample.attribute("time_coverage_end"), Some(&at(10, 10)));
    assert_eq!(sample.attribute("geospatial_lat_min"), Some(&Value::Number(-43.2)));
    assert_eq!(sample.attribute("geospatial_lat_max"), Some(&Value::Number(-43.0)));
    // Track crosses the antimeridian
    assert_eq!(sample.attribute("geospatial_lon_min"), Some(&Value::Number(179.5)));
    assert_eq!(sample.attribute("geospatial_lon_max"), Some(&Value::Number(-179.8)));
    assert_eq!(sample.attribute("geospatial_vertical_min"), Some(&Value::Number(5.0)));
    assert_eq!(sample.attribute("geospatial_vertical_max"), Some(&Value::Number(10.0)));

    assert_eq!(sample.meta.platform.as_deref(), Some("Aurora"));
    assert_eq!(sample.meta.input_file.as_deref(), Some("transect.csv"));
    assert_eq!(result.stats.rows_indexed, 6);
    assert!(result.stats.is_successful());
}

#[test]
fn test_row_order_does_not_change_meaning() {
    let workspace = Workspace::new();
    let parser = workspace.parser();

    let forward = workspace.csv("forward.csv", VOYAGE_HEADER, &VOYAGE_ROWS);
    let shuffled_rows = [
        VOYAGE_ROWS[5],
        VOYAGE_ROWS[2],
        VOYAGE_ROWS[0],
        VOYAGE_ROWS[4],
        VOYAGE_ROWS[1],
        VOYAGE_ROWS[3],
    ];
    let shuffled = workspace.csv("shuffled.csv", VOYAGE_HEADER, &shuffled_rows);

    let first = parser.parse_file(&forward).unwrap().sample_data;
    let second = parser.parse_file(&shuffled).unwrap().sample_data;

    // Coordinate numbering follows first appearance
    assert_eq!(second.dimension("TIME").unwrap().values[0], at(10, 10));
    assert_eq!(sv_by_coordinates(&first), sv_by_coordinates(&second));

    for name in ["geospatial_lat_min", "geospatial_lon_min", "time_coverage_end"] {
        assert_eq!(first.attribute(name), second.attribute(name));
    }
}

#[test]
fn test_repeated_parse_is_identical() {
    let workspace = Workspace::new();
    let parser = workspace.parser();
    let csv = workspace.csv("transect.csv", VOYAGE_HEADER, &VOYAGE_ROWS);

    let first = parser.parse_file(&csv).unwrap();
    let second = parser.parse_file(&csv).unwrap();

    assert_eq!(first.sample_data, second.sample_data);
    assert_eq!(first.stats, second.stats);
}

#[test]
fn test_missing_column_is_reported() {
    let workspace = Workspace::new();
    let header = "Ping_date,Ping_time,Layer_depth_min,Frequency,Latitude,Longitude";
    let rows: Vec<&str> = VOYAGE_ROWS
        .iter()
        .map(|row| row.rsplit_once(',').unwrap().0)
        .collect();
    let csv = workspace.csv("no_sv.csv", header, &rows);

    let error = workspace.parser().parse_file(&csv).unwrap_err();

    match error {
        Error::MissingColumn { column, .. } => assert_eq!(column, "Sv_mean"),
        other => panic!("expected missing column, got {:?}", other),
    }
}

#[test]
fn test_field_map_keeps_line_order() {
    let workspace = Workspace::new();
    let mapping = workspace.write(
        "echoview_fieldmap.txt",
        &format!("{}\nincomplete,line\n\nNASC,NASC,TIME DEPTH,N\n", VOYAGE_MAPPING),
    );

    let descriptors = load_field_map(&mapping).unwrap();

    let names: Vec<&str> = descriptors.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["TIME", "DEPTH", "CHANNEL", "LATITUDE", "LONGITUDE", "SV", "NASC"]
    );
    assert_eq!(descriptors[5].qc_expression.as_deref(), Some("SV > -75"));
}

#[test]
fn test_attribute_sources_do_not_override_computed_values() {
    let workspace = Workspace::new();
    let csv = workspace.csv("transect.csv", VOYAGE_HEADER, &VOYAGE_ROWS);
    let attributes_file = workspace.write(
        "global_attributes.txt",
        "% project-wide\n\
         S, title = Tasman Sea crossing\n\
         N, geospatial_lat_min = 0\n\
         D, date_created = 2021-03-06T00:00:00\n",
    );
    let tables = TempDir::new().unwrap();
    std::fs::write(
        tables.path().join("DeploymentData.csv"),
        "DeploymentId,Vessel,title\nSOOP-01,Aurora Australis,Deployment title\n",
    )
    .unwrap();

    let mut sample = workspace.parser().parse_file(&csv).unwrap().sample_data;

    let reader = AttributeFileReader::new().unwrap();
    let from_file = reader.load(&attributes_file).unwrap();
    assert_eq!(merge_attributes(&mut sample, from_file), 2);

    let mut db = DeploymentDb::new(tables.path());
    let records = db
        .execute_query("DeploymentData", "DeploymentId", "SOOP-01")
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(merge_attributes(&mut sample, record_attributes(&records[0])), 2);

    assert_eq!(sample.attribute("geospatial_lat_min"), Some(&Value::Number(-43.2)));
    assert_eq!(
        sample.attribute("title"),
        Some(&Value::Text("Tasman Sea crossing".to_string()))
    );
    assert_eq!(
        sample.attribute("Vessel"),
        Some(&Value::Text("Aurora Australis".to_string()))
    );
    assert!(matches!(sample.attribute("date_created"), Some(Value::DateTime(_))));
}

#[test]
fn test_missing_input_file() {
    let workspace = Workspace::new();
    let error = workspace
        .parser()
        .parse_file(Path::new("/nonexistent/transect.csv"))
        .unwrap_err();
    assert!(matches!(error, Error::FileNotFound { .. }));
}
