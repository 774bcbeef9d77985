//! Record reading and typed field conversion for Echoview CSV exports
//!
//! Records are split on every comma with quoting disabled. Quoted fields
//! containing commas are not supported: Echoview exports never quote numeric
//! columns, and a quoted string with an embedded comma will be split into two
//! fields.

use crate::app::models::{FieldType, ResolvedColumn, Value, time_epoch};
use crate::constants::{DATE_FORMAT, DATETIME_DATE_WIDTH, FIELD_DELIMITER, TIME_FORMAT};
use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};

/// Reader settings shared by header and data records
pub fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .delimiter(FIELD_DELIMITER as u8);
    builder
}

/// Decode a raw record, tolerating invalid UTF-8
pub fn decode_record(raw: ByteRecord) -> StringRecord {
    StringRecord::from_byte_record_lossy(raw)
}

/// Split one line of text into trimmed fields
pub fn split_record(line: &str) -> StringRecord {
    let mut reader = reader_builder().from_reader(line.as_bytes());
    let mut raw = ByteRecord::new();
    match reader.read_byte_record(&mut raw) {
        Ok(true) => decode_record(raw),
        // Empty input, and in-memory reads have no I/O failure
        _ => StringRecord::new(),
    }
}

/// A record whose every field is empty after trimming
pub fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

/// Decode a header line, replacing every non-ASCII byte with a space
pub fn sanitize_header(raw: &[u8]) -> String {
    raw.iter()
        .map(|&byte| if byte.is_ascii() { byte as char } else { ' ' })
        .collect()
}

/// Read the value of a resolved field from a data record.
///
/// `DT` fields read two adjacent cells: the date in `column` and the time of
/// day in `column + 1`. Callers guarantee the row is long enough.
pub fn parse_field(record: &StringRecord, resolved: &ResolvedColumn) -> Result<Value> {
    let descriptor = &resolved.descriptor;
    let raw = cell(record, resolved.column, &descriptor.name)?;

    match descriptor.field_type {
        FieldType::DateTime => {
            let time = cell(record, resolved.column + 1, &descriptor.name)?;
            parse_datetime(raw, time, &descriptor.name).map(Value::DateTime)
        }
        field_type => parse_value(raw, field_type, &descriptor.name),
    }
}

/// Convert a single cell to a typed value.
///
/// Numeric cells that fail to parse degrade to NaN. Temporal cells control
/// indexing, so a bad date or time is an error. `DateTime` given a single
/// cell expects the date and time separated by whitespace.
pub fn parse_value(raw: &str, field_type: FieldType, field_name: &str) -> Result<Value> {
    match field_type {
        FieldType::String => Ok(Value::Text(strip_quotes(raw).to_string())),
        FieldType::Numeric => Ok(Value::Number(parse_numeric(raw))),
        FieldType::Date => parse_date(raw, field_name).map(Value::DateTime),
        FieldType::Time => parse_time(raw, field_name)
            .map(|time| Value::DateTime(time_epoch().date().and_time(time))),
        FieldType::DateTime => {
            let mut parts = raw.split_whitespace();
            let date = parts.next().unwrap_or_default();
            let time = parts.next().unwrap_or_default();
            parse_datetime(date, time, field_name).map(Value::DateTime)
        }
    }
}

/// Remove one layer of surrounding double quotes
pub fn strip_quotes(raw: &str) -> &str {
    raw.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(raw)
}

/// Parse a floating point cell; anything unparsable is NaN
pub fn parse_numeric(raw: &str) -> f64 {
    strip_quotes(raw).trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// `yyyymmdd` at midnight
pub fn parse_date(raw: &str, field_name: &str) -> Result<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| Error::type_conversion(field_name, raw, FieldType::Date.to_string()))?;
    date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::type_conversion(field_name, raw, FieldType::Date.to_string()))
}

/// `HH:MM:SS` with optional fractional seconds
pub fn parse_time(raw: &str, field_name: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT)
        .map_err(|_| Error::type_conversion(field_name, raw, FieldType::Time.to_string()))
}

/// Combine the first eight characters of `date_raw` with a time-of-day cell
pub fn parse_datetime(date_raw: &str, time_raw: &str, field_name: &str) -> Result<NaiveDateTime> {
    let date_raw = date_raw.trim();
    let date_part = date_raw.get(..DATETIME_DATE_WIDTH).ok_or_else(|| {
        Error::type_conversion(field_name, date_raw, FieldType::DateTime.to_string())
    })?;

    let date = parse_date(date_part, field_name)?.date();
    let time = parse_time(time_raw, field_name)?;
    Ok(date.and_time(time))
}

fn cell<'a>(record: &'a StringRecord, index: usize, field_name: &str) -> Result<&'a str> {
    record.get(index).ok_or_else(|| {
        Error::configuration(format!(
            "Row has no column {} for field '{}'",
            index + 1,
            field_name
        ))
    })
}
