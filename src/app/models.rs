//! Core data structures for Echoview sample data
//!
//! Defines the field-mapping types, the typed cell values, and the
//! dimension/variable containers that make up a parsed `SampleData`.

use crate::constants::{TIME_EPOCH, type_tags};
use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value type of a mapped field, taken from the mapping file's type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// `S` - free text, one layer of surrounding quotes stripped
    String,
    /// `N` - floating point, unparsable values become NaN
    Numeric,
    /// `D` - `yyyymmdd`
    Date,
    /// `T` - `HH:MM:SS.fff`
    Time,
    /// `DT` - `yyyymmdd` followed by a time-of-day column
    DateTime,
}

impl FieldType {
    /// Parse a mapping-file type tag (surrounding whitespace ignored)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            type_tags::STRING => Some(Self::String),
            type_tags::NUMERIC => Some(Self::Numeric),
            type_tags::DATE => Some(Self::Date),
            type_tags::TIME => Some(Self::Time),
            type_tags::DATETIME => Some(Self::DateTime),
            _ => None,
        }
    }

    /// Date, time and date-time fields all produce timestamps
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::DateTime)
    }

    /// Number of physical CSV columns a field of this type consumes
    pub fn column_span(&self) -> usize {
        match self {
            Self::DateTime => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Numeric => "numeric",
            Self::Date => "date (yyyymmdd)",
            Self::Time => "time (HH:MM:SS.fff)",
            Self::DateTime => "date-time (yyyymmdd + HH:MM:SS.fff)",
        };
        f.write_str(name)
    }
}

/// Reference instant for numeric views of temporal data
pub fn time_epoch() -> NaiveDateTime {
    let (year, month, day) = TIME_EPOCH;
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Fractional days between `time_epoch()` and `timestamp`
pub fn days_since_epoch(timestamp: NaiveDateTime) -> f64 {
    let delta = timestamp - time_epoch();
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 86_400_000_000.0,
        None => delta.num_milliseconds() as f64 / 86_400_000.0,
    }
}

/// A single typed cell, coordinate value or scalar attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Numeric view; timestamps become days since 1950-01-01
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::DateTime(timestamp) => Some(days_since_epoch(*timestamp)),
            Self::Text(_) => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(timestamp) => Some(*timestamp),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(value) => write!(f, "{}", value),
            Self::DateTime(timestamp) => write!(f, "{}", timestamp.format("%Y-%m-%dT%H:%M:%S%.3f")),
        }
    }
}

/// One entry of a field-mapping file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Output identifier
    pub name: String,

    /// Source header label
    pub column_name: String,

    /// Dimensions this field varies over; empty means the field is a dimension
    pub dimension_group: Vec<String>,

    pub field_type: FieldType,

    /// Optional QC formula evaluated after the data is assembled
    pub qc_expression: Option<String>,
}

impl FieldDescriptor {
    /// Fields with an empty dimension group are dimensions
    pub fn is_dimension(&self) -> bool {
        self.dimension_group.is_empty()
    }
}

/// A field descriptor bound to a concrete column of one file's header
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    pub descriptor: FieldDescriptor,

    /// Zero-based index of the first column this field reads
    pub column: usize,
}

impl ResolvedColumn {
    /// Index of the last physical column read (the time column for `DT`)
    pub fn last_column(&self) -> usize {
        self.column + self.descriptor.field_type.column_span() - 1
    }
}

/// Dense cell storage for a variable, in row-major order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum ArrayData {
    Text(Vec<String>),
    Numeric(Vec<f64>),
    Temporal(Vec<Option<NaiveDateTime>>),
}

impl ArrayData {
    /// Placeholder-filled storage: empty strings, NaN or no timestamp
    pub fn filled(field_type: FieldType, len: usize) -> Self {
        match field_type {
            FieldType::String => Self::Text(vec![String::new(); len]),
            FieldType::Numeric => Self::Numeric(vec![f64::NAN; len]),
            _ => Self::Temporal(vec![None; len]),
        }
    }

    /// Build storage from a dimension's coordinate values.
    ///
    /// Values of another kind are converted where a conversion exists (text
    /// storage takes the display form, numeric storage takes timestamps as days
    /// since epoch) and otherwise become the placeholder.
    pub fn from_values(field_type: FieldType, values: &[Value]) -> Self {
        match field_type {
            FieldType::String => Self::Text(values.iter().map(Value::to_string).collect()),
            FieldType::Numeric => Self::Numeric(
                values
                    .iter()
                    .map(|value| value.as_f64().unwrap_or(f64::NAN))
                    .collect(),
            ),
            _ => Self::Temporal(values.iter().map(Value::as_datetime).collect()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Text(values) => values.len(),
            Self::Numeric(values) => values.len(),
            Self::Temporal(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell at a flat index; unset timestamps read back as `None`
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            Self::Text(values) => values.get(index).cloned().map(Value::Text),
            Self::Numeric(values) => values.get(index).copied().map(Value::Number),
            Self::Temporal(values) => values.get(index).copied().flatten().map(Value::DateTime),
        }
    }

    /// Store a value at a flat index
    pub fn set(&mut self, index: usize, value: Value) -> Result<()> {
        let len = self.len();
        if index >= len {
            return Err(Error::configuration(format!(
                "Cell index {} out of bounds for array of {} cells",
                index, len
            )));
        }

        match (self, value) {
            (Self::Text(values), Value::Text(text)) => values[index] = text,
            (Self::Numeric(values), Value::Number(number)) => values[index] = number,
            (Self::Temporal(values), Value::DateTime(timestamp)) => values[index] = Some(timestamp),
            (_, value) => {
                return Err(Error::configuration(format!(
                    "Value '{}' does not match the array's storage type",
                    value
                )));
            }
        }
        Ok(())
    }

    /// Numeric view (timestamps as days since epoch, missing as NaN); text has none
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            Self::Text(_) => None,
            Self::Numeric(values) => Some(values.clone()),
            Self::Temporal(values) => Some(
                values
                    .iter()
                    .map(|ts| ts.map(days_since_epoch).unwrap_or(f64::NAN))
                    .collect(),
            ),
        }
    }
}

/// QC result aligned with a field's data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum FlagArray {
    Boolean(Vec<bool>),
    Numeric(Vec<f64>),
}

impl FlagArray {
    pub fn len(&self) -> usize {
        match self {
            Self::Boolean(flags) => flags.len(),
            Self::Numeric(flags) => flags.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named coordinate axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub field_type: FieldType,

    /// Distinct values in first-seen order; position is the coordinate index
    pub values: Vec<Value>,

    pub flags: Option<FlagArray>,
}

impl Dimension {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            values: Vec::new(),
            flags: None,
        }
    }

    /// Cardinality
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Coordinate values as array storage
    pub fn data(&self) -> ArrayData {
        ArrayData::from_values(self.field_type, &self.values)
    }
}

/// A named field varying over one or more dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub field_type: FieldType,

    /// Indices into `SampleData::dimensions`, in declared order
    pub dimensions: Vec<usize>,

    /// Cardinality of each referenced dimension, same order as `dimensions`
    pub shape: Vec<usize>,

    pub data: ArrayData,
    pub comment: Option<String>,
    pub flags: Option<FlagArray>,
}

impl Variable {
    /// Dense, placeholder-filled variable over the given dimensions.
    ///
    /// Fails when the cell count does not fit in `usize`.
    pub fn allocate(
        name: impl Into<String>,
        field_type: FieldType,
        dimensions: Vec<usize>,
        shape: Vec<usize>,
    ) -> Result<Self> {
        let name = name.into();
        let len = shape
            .iter()
            .try_fold(1usize, |cells, &extent| cells.checked_mul(extent))
            .ok_or_else(|| {
                Error::configuration(format!(
                    "Variable '{}' with shape {:?} has too many cells",
                    name, shape
                ))
            })?;

        Ok(Self {
            name,
            field_type,
            dimensions,
            shape,
            data: ArrayData::filled(field_type, len),
            comment: None,
            flags: None,
        })
    }

    /// Row-major flat index for a coordinate tuple, `None` when out of range
    pub fn flat_index(&self, coordinates: &[usize]) -> Option<usize> {
        if coordinates.len() != self.shape.len() {
            return None;
        }

        let mut index = 0;
        for (&coordinate, &extent) in coordinates.iter().zip(&self.shape) {
            if coordinate >= extent {
                return None;
            }
            index = index * extent + coordinate;
        }
        Some(index)
    }

    /// Cell at a coordinate tuple
    pub fn get(&self, coordinates: &[usize]) -> Option<Value> {
        self.flat_index(coordinates)
            .and_then(|index| self.data.get(index))
    }
}

/// Provenance and instrument information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub input_file: Option<String>,
    pub field_map_file: Option<String>,
    pub platform: Option<String>,
    pub instrument_make: String,
    pub instrument_model: String,
}

/// Parsed contents of one input file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleData {
    pub meta: Metadata,
    pub dimensions: Vec<Dimension>,
    pub variables: Vec<Variable>,

    /// Global scalar attributes, including collapsed fields
    pub attributes: BTreeMap<String, Value>,
}

impl SampleData {
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|dim| dim.name == name)
    }

    pub fn dimension_index(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|dim| dim.name == name)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|var| var.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Insert an attribute unless one with that name already exists.
    /// Returns whether the value was stored.
    pub fn set_attribute_if_absent(&mut self, name: impl Into<String>, value: Value) -> bool {
        match self.attributes.entry(name.into()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }
}
