//! Temporal and geospatial coverage attributes
//!
//! TIME, LATITUDE, LONGITUDE and DEPTH are looked up by exact name among the
//! dimensions, then the variables, then the scalar attributes left behind by
//! collapse. Coverage attributes are only written when absent and never as NaN.
//!
//! Longitude uses a dateline heuristic: when the in-range values span more than
//! 350 degrees the track is assumed to cross the antimeridian, so the minimum is
//! the smallest positive longitude and the maximum the largest negative one.

use crate::app::models::{ArrayData, SampleData, Value};
use crate::constants::{
    ANTIMERIDIAN_SPAN_DEGREES, LATITUDE_RANGE, LONGITUDE_RANGE, coordinate_names,
    coverage_attributes,
};
use chrono::NaiveDateTime;
use tracing::debug;

/// Values of one coordinate field, with missing cells dropped
#[derive(Debug, Clone, PartialEq)]
enum FieldValues {
    Numbers(Vec<f64>),
    Instants(Vec<NaiveDateTime>),
}

impl FieldValues {
    fn from_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<Self> {
        let values: Vec<&Value> = values.into_iter().collect();
        if values.iter().all(|v| matches!(v, Value::DateTime(_))) && !values.is_empty() {
            return Some(Self::Instants(
                values.iter().filter_map(|v| v.as_datetime()).collect(),
            ));
        }

        let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
        (!numbers.is_empty()).then_some(Self::Numbers(numbers))
    }

    fn from_array(data: &ArrayData) -> Option<Self> {
        match data {
            ArrayData::Text(_) => None,
            ArrayData::Numeric(values) => Some(Self::Numbers(values.clone())),
            ArrayData::Temporal(values) => {
                Some(Self::Instants(values.iter().flatten().copied().collect()))
            }
        }
    }

    /// Numeric view; instants become days since epoch
    fn numbers(&self) -> Vec<f64> {
        match self {
            Self::Numbers(values) => values.clone(),
            Self::Instants(values) => values
                .iter()
                .map(|&ts| Value::DateTime(ts).as_f64().unwrap_or(f64::NAN))
                .collect(),
        }
    }
}

/// Locate a coordinate field: dimension, then variable, then scalar attribute
fn find_field(sample: &SampleData, name: &str) -> Option<FieldValues> {
    if let Some(dimension) = sample.dimension(name) {
        return FieldValues::from_values(&dimension.values);
    }
    if let Some(variable) = sample.variable(name) {
        return FieldValues::from_array(&variable.data);
    }
    sample
        .attribute(name)
        .and_then(|value| FieldValues::from_values([value]))
}

/// Smallest and largest non-NaN values
fn min_max(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn in_range(values: &[f64], (lo, hi): (f64, f64)) -> Vec<f64> {
    values
        .iter()
        .copied()
        .filter(|v| *v >= lo && *v <= hi)
        .collect()
}

/// Longitude bounds with the antimeridian heuristic applied
pub fn longitude_bounds(values: &[f64]) -> Option<(f64, f64)> {
    let valid = in_range(values, LONGITUDE_RANGE);
    let (lo, hi) = min_max(valid.iter().copied())?;

    if hi - lo > ANTIMERIDIAN_SPAN_DEGREES {
        let east = min_max(valid.iter().copied().filter(|v| *v > 0.0));
        let west = min_max(valid.iter().copied().filter(|v| *v < 0.0));
        if let (Some((east_min, _)), Some((_, west_max))) = (east, west) {
            return Some((east_min, west_max));
        }
    }
    Some((lo, hi))
}

/// Latitude bounds over the valid range only
pub fn latitude_bounds(values: &[f64]) -> Option<(f64, f64)> {
    min_max(in_range(values, LATITUDE_RANGE))
}

/// Depth bounds, unfiltered
pub fn vertical_bounds(values: &[f64]) -> Option<(f64, f64)> {
    min_max(values.iter().copied())
}

type BoundsFn = fn(&[f64]) -> Option<(f64, f64)>;

/// Write coverage attributes that are missing. Returns how many were written.
pub fn calculate_bounds(sample: &mut SampleData) -> usize {
    let mut pending: Vec<(&str, Value)> = Vec::new();

    match find_field(sample, coordinate_names::TIME) {
        Some(FieldValues::Instants(instants)) => {
            if let (Some(start), Some(end)) = (instants.iter().min(), instants.iter().max()) {
                pending.push((coverage_attributes::TIME_START, Value::DateTime(*start)));
                pending.push((coverage_attributes::TIME_END, Value::DateTime(*end)));
            }
        }
        Some(FieldValues::Numbers(numbers)) => {
            if let Some((start, end)) = min_max(numbers) {
                pending.push((coverage_attributes::TIME_START, Value::Number(start)));
                pending.push((coverage_attributes::TIME_END, Value::Number(end)));
            }
        }
        None => {}
    }

    let numeric: [(&str, BoundsFn, &str, &str); 3] = [
        (
            coordinate_names::LATITUDE,
            latitude_bounds,
            coverage_attributes::LAT_MIN,
            coverage_attributes::LAT_MAX,
        ),
        (
            coordinate_names::LONGITUDE,
            longitude_bounds,
            coverage_attributes::LON_MIN,
            coverage_attributes::LON_MAX,
        ),
        (
            coordinate_names::DEPTH,
            vertical_bounds,
            coverage_attributes::VERTICAL_MIN,
            coverage_attributes::VERTICAL_MAX,
        ),
    ];

    for (name, bounds, min_attr, max_attr) in numeric {
        let Some(field) = find_field(sample, name) else {
            continue;
        };
        if let Some((lo, hi)) = bounds(&field.numbers()) {
            pending.push((min_attr, Value::Number(lo)));
            pending.push((max_attr, Value::Number(hi)));
        }
    }

    let mut written = 0;
    for (name, value) in pending {
        if sample.set_attribute_if_absent(name, value) {
            written += 1;
        } else {
            debug!("Keeping existing '{}' attribute", name);
        }
    }

    debug!("Wrote {} coverage attributes", written);
    written
}
