//! Global attribute files
//!
//! One attribute per line, prefixed with its type:
//!
//! ```text
//! % deployment attributes
//! S, project = IMOS Bio-Acoustic Ships of Opportunity
//! N, frequency = 38
//! D, date_created = 2021-03-05T10:00:00
//! ```
//!
//! `S` is text, `N` numeric, `D` a date-time (`yyyy-mm-ddTHH:MM:SS` or
//! `yyyymmdd`). Lines that do not match are logged and skipped.

use crate::app::models::{SampleData, Value};
use crate::app::services::csv_codec::strip_quotes;
use crate::constants::{ATTRIBUTE_COMMENT_PREFIXES, DATE_FORMAT};
use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

const ATTRIBUTE_LINE_PATTERN: &str = r"^\s*([SND])\s*,\s*([^=]*?)\s*=\s*(.*?)\s*$";
const ISO_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Reader for typed attribute files
#[derive(Debug, Clone)]
pub struct AttributeFileReader {
    line_pattern: Regex,
}

impl AttributeFileReader {
    pub fn new() -> Result<Self> {
        let line_pattern = Regex::new(ATTRIBUTE_LINE_PATTERN).map_err(|e| {
            Error::configuration(format!("Invalid attribute line pattern: {}", e))
        })?;
        Ok(Self { line_pattern })
    }

    /// Read one attribute file
    pub fn load(&self, path: &Path) -> Result<BTreeMap<String, Value>> {
        if !path.exists() {
            return Err(Error::file_not_found(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read attribute file {}", path.display()), e)
        })?;

        let attributes = self.parse(&content);
        info!(
            "Loaded {} attributes from {}",
            attributes.len(),
            path.display()
        );
        Ok(attributes)
    }

    /// Parse attribute-file content; a repeated name keeps its last value
    pub fn parse(&self, content: &str) -> BTreeMap<String, Value> {
        let mut attributes = BTreeMap::new();

        for (line_num, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(ATTRIBUTE_COMMENT_PREFIXES) {
                continue;
            }

            match self.parse_line(trimmed) {
                Some((name, value)) => {
                    if attributes.insert(name.clone(), value).is_some() {
                        debug!("Attribute '{}' redefined on line {}", name, line_num + 1);
                    }
                }
                None => warn!("Skipping attribute line {}: '{}'", line_num + 1, trimmed),
            }
        }

        attributes
    }

    fn parse_line(&self, line: &str) -> Option<(String, Value)> {
        let captures = self.line_pattern.captures(line)?;
        let name = captures.get(2)?.as_str();
        let raw = captures.get(3)?.as_str();
        if name.is_empty() {
            return None;
        }

        let value = match captures.get(1)?.as_str() {
            "S" => Value::Text(strip_quotes(raw).to_string()),
            "N" => Value::Number(raw.parse::<f64>().ok()?),
            _ => Value::DateTime(parse_attribute_datetime(raw)?),
        };
        Some((name.to_string(), value))
    }
}

fn parse_attribute_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, ISO_DATETIME_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Insert attributes whose names are not already present. Returns how many were added.
pub fn merge_attributes(
    sample: &mut SampleData,
    attributes: impl IntoIterator<Item = (String, Value)>,
) -> usize {
    let mut added = 0;
    for (name, value) in attributes {
        if sample.set_attribute_if_absent(name.as_str(), value) {
            added += 1;
        } else {
            debug!("Attribute '{}' already set, not overwritten", name);
        }
    }
    added
}
