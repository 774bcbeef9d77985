//! Deployment database lookups
//!
//! The deployment database is a directory of CSV tables, one file per table
//! (`<dir>/<table>.csv`) with a header row. Queries select the rows whose
//! `field` column equals a value. Results are memoised in a [`QueryCache`]
//! owned by the [`DeploymentDb`], so repeated lookups across the files of one
//! run read each table once per distinct query.

use crate::app::models::Value;
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::debug;

/// One table row, column name to trimmed cell text
pub type DbRecord = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub table_file: PathBuf,
    pub field: String,
    pub value: String,
}

/// Memoised query results
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, Vec<DbRecord>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QueryKey) -> Option<&Vec<DbRecord>> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: QueryKey, records: Vec<DbRecord>) {
        self.entries.insert(key, records);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-through access to a directory of deployment tables
#[derive(Debug, Clone)]
pub struct DeploymentDb {
    dir: PathBuf,
    cache: QueryCache,
}

impl DeploymentDb {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: QueryCache::new(),
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Rows of `table` whose `field` equals `value` (trimmed text comparison)
    pub fn execute_query(&mut self, table: &str, field: &str, value: &str) -> Result<Vec<DbRecord>> {
        let key = QueryKey {
            table_file: self.dir.join(format!("{}.csv", table)),
            field: field.to_string(),
            value: value.trim().to_string(),
        };

        if let Some(records) = self.cache.get(&key) {
            debug!("Cache hit for {}.{} = '{}'", table, field, key.value);
            return Ok(records.clone());
        }

        let records = query_table(&key)?;
        debug!(
            "Query {}.{} = '{}' matched {} rows",
            table,
            field,
            key.value,
            records.len()
        );
        self.cache.insert(key, records.clone());
        Ok(records)
    }
}

fn query_table(key: &QueryKey) -> Result<Vec<DbRecord>> {
    let path = &key.table_file;
    let file = path.display().to_string();
    if !path.exists() {
        return Err(Error::file_not_found(file));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::csv_parsing(&file, "Failed to open table", Some(e)))?;

    let headers = reader
        .headers()
        .map_err(|e| Error::csv_parsing(&file, "Failed to read table header", Some(e)))?
        .clone();

    let column = headers.iter().position(|h| h == key.field).ok_or_else(|| {
        Error::configuration(format!(
            "Field '{}' not found in deployment table {}",
            key.field, file
        ))
    })?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            Error::csv_parsing(&file, format!("Failed to read row {}", row + 2), Some(e))
        })?;

        if record.get(column).map(str::trim) == Some(key.value.as_str()) {
            records.push(
                headers
                    .iter()
                    .zip(record.iter())
                    .map(|(name, cell)| (name.to_string(), cell.trim().to_string()))
                    .collect(),
            );
        }
    }

    Ok(records)
}

/// Attribute values for a record: numbers where the cell parses, text otherwise.
/// Empty cells are left out.
pub fn record_attributes(record: &DbRecord) -> Vec<(String, Value)> {
    record
        .iter()
        .filter(|(_, cell)| !cell.is_empty())
        .map(|(name, cell)| {
            let value = cell
                .parse::<f64>()
                .map(Value::Number)
                .unwrap_or_else(|_| Value::Text(cell.clone()));
            (name.clone(), value)
        })
        .collect()
}
