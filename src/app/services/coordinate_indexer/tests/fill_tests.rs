//! Tests for the fill pass and the complete two-pass run

use super::*;
use crate::Error;
use crate::app::models::{ArrayData, Value};
use crate::app::services::coordinate_indexer::CoordinateIndexer;
use chrono::NaiveDate;

#[test]
fn test_time_series_scenario() {
    let mapping = "TIME,Time,, DT\nDEPTH,Depth,TIME,N\n";
    let csv = "Time,TimeOfDay,Depth\n\
               20200101,12:00:00.00,10\n\
               20200101,12:01:00.00,20\n\
               20200101,12:02:00.00,30\n";
    let file = create_csv_file(csv);

    let indexed = CoordinateIndexer::new(file.path(), layout_for(mapping, csv))
        .run()
        .unwrap();

    assert_eq!(indexed.dimensions.len(), 1);
    let time = &indexed.dimensions[0];
    assert_eq!(time.name, "TIME");
    let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    assert_eq!(
        time.values,
        vec![
            Value::DateTime(day.and_hms_opt(12, 0, 0).unwrap()),
            Value::DateTime(day.and_hms_opt(12, 1, 0).unwrap()),
            Value::DateTime(day.and_hms_opt(12, 2, 0).unwrap()),
        ]
    );

    let depth = &indexed.variables[0];
    assert_eq!(depth.name, "DEPTH");
    assert_eq!(depth.shape, vec![3]);
    assert_eq!(depth.data, ArrayData::Numeric(vec![10.0, 20.0, 30.0]));
    assert_eq!(indexed.rows_indexed, 3);
}

#[test]
fn test_grid_is_filled_in_declared_dimension_order() {
    let csv = create_grid_csv();
    let file = create_csv_file(&csv);

    let indexed = CoordinateIndexer::new(file.path(), layout_for(&create_grid_mapping(), &csv))
        .run()
        .unwrap();

    let sv = &indexed.variables[0];
    assert_eq!(sv.dimensions, vec![0, 1]);
    assert_eq!(sv.shape, vec![2, 2]);
    assert_eq!(
        sv.data,
        ArrayData::Numeric(vec![-70.5, -72.0, -68.25, -71.0])
    );

    // Same data, transposed dimension order
    let nasc = &indexed.variables[1];
    assert_eq!(nasc.dimensions, vec![1, 0]);
    assert_eq!(nasc.get(&[0, 1]), Some(Value::Number(15.0)));
    assert_eq!(nasc.get(&[1, 0]), Some(Value::Number(8.0)));
    assert_eq!(indexed.rows_skipped, 1);
}

#[test]
fn test_missing_cells_stay_nan() {
    let mapping = "TIME,Time,,N\nDEPTH,Depth,,N\nSV,Sv,TIME DEPTH,N\n";
    let csv = "Time,Depth,Sv,Extra\n1,5,-70,x\n2,10,-71,x\n";
    let file = create_csv_file(csv);

    let indexed = CoordinateIndexer::new(file.path(), layout_for(mapping, csv))
        .run()
        .unwrap();

    match &indexed.variables[0].data {
        ArrayData::Numeric(values) => {
            assert_eq!(values[0], -70.0);
            assert!(values[1].is_nan());
            assert!(values[2].is_nan());
            assert_eq!(values[3], -71.0);
        }
        other => panic!("Expected numeric data, got {:?}", other),
    }
}

#[test]
fn test_text_variable_placeholders() {
    let mapping = "TIME,Time,,N\nDEPTH,Depth,,N\nNOTE,Note,TIME DEPTH,S\n";
    let csv = "Time,Depth,Note,Extra\n1,5,\"ok\",x\n2,10,bad,x\n";
    let file = create_csv_file(csv);

    let indexed = CoordinateIndexer::new(file.path(), layout_for(mapping, csv))
        .run()
        .unwrap();

    assert_eq!(
        indexed.variables[0].data,
        ArrayData::Text(vec![
            "ok".to_string(),
            String::new(),
            String::new(),
            "bad".to_string()
        ])
    );
}

#[test]
fn test_row_order_changes_numbering_not_meaning() {
    let mapping = create_grid_mapping();
    let csv = create_grid_csv();
    let mut lines: Vec<&str> = csv.lines().collect();
    let header = lines.remove(0);
    lines.reverse();
    let shuffled = format!("{}\n{}\n", header, lines.join("\n"));

    let original_file = create_csv_file(&csv);
    let shuffled_file = create_csv_file(&shuffled);
    let original = CoordinateIndexer::new(original_file.path(), layout_for(&mapping, &csv))
        .run()
        .unwrap();
    let reordered = CoordinateIndexer::new(shuffled_file.path(), layout_for(&mapping, &shuffled))
        .run()
        .unwrap();

    assert_ne!(original.dimensions[0].values, reordered.dimensions[0].values);

    for (t, time) in original.dimensions[0].values.iter().enumerate() {
        for (d, depth) in original.dimensions[1].values.iter().enumerate() {
            let rt = reordered.dimensions[0].values.iter().position(|v| v == time).unwrap();
            let rd = reordered.dimensions[1].values.iter().position(|v| v == depth).unwrap();
            assert_eq!(
                original.variables[0].get(&[t, d]),
                reordered.variables[0].get(&[rt, rd])
            );
        }
    }
}

#[test]
fn test_fill_against_changed_file_is_consistency_error() {
    let mapping = "TIME,Time,,N\nSV,Sv,TIME,N\n";
    let csv = "Time,Sv,A,B\n1,-70,x,x\n2,-71,x,x\n";
    let changed = "Time,Sv,A,B\n1,-70,x,x\n3,-71,x,x\n";

    let original_file = create_csv_file(csv);
    let changed_file = create_csv_file(changed);
    let layout = layout_for(mapping, csv);
    let discovery = CoordinateIndexer::new(original_file.path(), layout.clone())
        .discover()
        .unwrap();

    let result = CoordinateIndexer::new(changed_file.path(), layout).fill(&discovery);
    match result {
        Err(Error::Consistency { line, message, .. }) => {
            assert_eq!(line, 3);
            assert!(message.contains("TIME"));
        }
        other => panic!("Expected consistency error, got {:?}", other),
    }
}

#[test]
fn test_quoted_commas_split_like_any_other() {
    let mapping = "TIME,Time,,N\nNOTE,Note,TIME,S\n";
    let csv = "Time,Note,A,B\n1,\"a,b\",x\n";
    let file = create_csv_file(csv);

    let indexed = CoordinateIndexer::new(file.path(), layout_for(mapping, csv))
        .run()
        .unwrap();

    assert_eq!(
        indexed.variables[0].data,
        ArrayData::Text(vec!["\"a".to_string()])
    );
}

#[test]
fn test_fill_against_longer_file_is_consistency_error() {
    let mapping = "TIME,Time,,N\nSV,Sv,TIME,N\n";
    let csv = "Time,Sv,A,B\n1,-70,x,x\n";
    let longer = "Time,Sv,A,B\n1,-70,x,x\n1,-71,x,x\n";

    let original_file = create_csv_file(csv);
    let longer_file = create_csv_file(longer);
    let layout = layout_for(mapping, csv);
    let discovery = CoordinateIndexer::new(original_file.path(), layout.clone())
        .discover()
        .unwrap();

    let result = CoordinateIndexer::new(longer_file.path(), layout).fill(&discovery);
    assert!(matches!(result, Err(Error::Consistency { .. })));
}

#[test]
fn test_repeated_runs_are_identical() {
    let csv = create_grid_csv();
    let file = create_csv_file(&csv);
    let layout = layout_for(&create_grid_mapping(), &csv);

    let first = CoordinateIndexer::new(file.path(), layout.clone()).run().unwrap();
    let second = CoordinateIndexer::new(file.path(), layout).run().unwrap();

    assert_eq!(first.dimensions, second.dimensions);
    assert_eq!(
        format!("{:?}", first.variables),
        format!("{:?}", second.variables)
    );
}
