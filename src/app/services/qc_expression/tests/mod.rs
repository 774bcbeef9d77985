//! Tests for the QC expression language

pub mod parser_tests;

use crate::app::models::{
    ArrayData, Dimension, FieldDescriptor, FieldType, SampleData, Value, Variable,
};

/// Dataset with a 3-ping TIME axis, a 2-layer DEPTH axis, an SV grid,
/// a REGION text variable and a collapsed LATITUDE attribute
pub fn create_qc_sample() -> SampleData {
    let mut time = Dimension::new("TIME", FieldType::Numeric);
    time.values = vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)];

    let mut depth = Dimension::new("DEPTH", FieldType::Numeric);
    depth.values = vec![Value::Number(5.0), Value::Number(10.0)];

    let mut sv = Variable::allocate("SV", FieldType::Numeric, vec![0, 1], vec![3, 2]).unwrap();
    sv.data = ArrayData::Numeric(vec![-70.0, -95.0, f64::NAN, -60.0, 5.0, -80.0]);

    let mut region = Variable::allocate("REGION", FieldType::String, vec![0], vec![3]).unwrap();
    region.data = ArrayData::Text(vec![
        "Layer".to_string(),
        "Surface".to_string(),
        "Layer".to_string(),
    ]);

    let mut sample = SampleData {
        dimensions: vec![time, depth],
        variables: vec![sv, region],
        ..Default::default()
    };
    sample
        .attributes
        .insert("LATITUDE".to_string(), Value::Number(-42.5));
    sample
}

/// Descriptor carrying only what QC evaluation reads
pub fn descriptor(name: &str, qc: Option<&str>) -> FieldDescriptor {
    FieldDescriptor {
        name: name.to_string(),
        column_name: name.to_string(),
        dimension_group: Vec::new(),
        field_type: FieldType::Numeric,
        qc_expression: qc.map(str::to_string),
    }
}
