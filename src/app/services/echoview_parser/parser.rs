//! Parse orchestration for one Echoview CSV file

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::stats::{ParseResult, ParseStats};
use crate::app::models::{FieldDescriptor, Metadata, SampleData};
use crate::app::services::bounds::calculate_bounds;
use crate::app::services::coordinate_indexer::{CoordinateIndexer, FieldLayout};
use crate::app::services::csv_codec::sanitize_header;
use crate::app::services::field_map::{HeaderColumns, load_field_map, resolve_columns};
use crate::app::services::qc_expression::apply_qc;
use crate::app::services::scalar_collapse::collapse_scalars;
use crate::constants::{DEFAULT_INSTRUMENT_MAKE, DEFAULT_INSTRUMENT_MODEL};
use crate::{Error, Result};

/// Caller-supplied identifiers copied into the output metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ParserOptions {
    pub platform: Option<String>,
    pub instrument_make: String,
    pub instrument_model: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            platform: None,
            instrument_make: DEFAULT_INSTRUMENT_MAKE.to_string(),
            instrument_model: DEFAULT_INSTRUMENT_MODEL.to_string(),
        }
    }
}

impl ParserOptions {
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_instrument(mut self, make: impl Into<String>, model: impl Into<String>) -> Self {
        self.instrument_make = make.into();
        self.instrument_model = model.into();
        self
    }
}

/// Parser for Echoview CSV exports sharing one field map
#[derive(Debug, Clone)]
pub struct EchoviewParser {
    descriptors: Vec<FieldDescriptor>,
    field_map_file: Option<PathBuf>,
    options: ParserOptions,
}

impl EchoviewParser {
    /// Create a parser from already loaded descriptors
    pub fn new(descriptors: Vec<FieldDescriptor>, options: ParserOptions) -> Self {
        Self {
            descriptors,
            field_map_file: None,
            options,
        }
    }

    /// Load the mapping file and create a parser for it
    pub fn from_mapping_file(path: &Path, options: ParserOptions) -> Result<Self> {
        let descriptors = load_field_map(path)?;
        Ok(Self {
            descriptors,
            field_map_file: Some(path.to_path_buf()),
            options,
        })
    }

    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    /// Bind the field map to this file's header without reading any data
    pub fn resolve(&self, file_path: &Path) -> Result<FieldLayout> {
        let header = read_header(file_path)?;
        let file = file_path.display().to_string();
        let resolved = resolve_columns(&self.descriptors, &header, &file)?;
        debug!(
            "Resolved {} fields against {} header columns",
            resolved.len(),
            header.column_count
        );
        FieldLayout::new(resolved, header.column_count)
    }

    /// Parse one CSV export into sample data with statistics
    pub fn parse_file(&self, file_path: &Path) -> Result<ParseResult> {
        info!("Parsing Echoview CSV file: {}", file_path.display());

        let layout = self.resolve(file_path)?;
        let indexed = CoordinateIndexer::new(file_path, layout).run()?;

        let mut stats = ParseStats {
            total_rows: indexed.total_rows,
            rows_indexed: indexed.rows_indexed,
            rows_skipped: indexed.rows_skipped,
            ..ParseStats::new()
        };

        let mut sample_data = SampleData {
            meta: self.metadata(file_path),
            dimensions: indexed.dimensions,
            variables: indexed.variables,
            attributes: BTreeMap::new(),
        };

        let collapsed = collapse_scalars(&mut sample_data);
        stats.dimensions_collapsed = collapsed.dimensions.len();
        stats.variables_collapsed = collapsed.variables.len();

        stats.fields_flagged = apply_qc(&mut sample_data, &self.descriptors)?;
        calculate_bounds(&mut sample_data);

        info!(
            "Parsed {} with {} dimensions, {} variables, {} attributes",
            file_path.display(),
            sample_data.dimensions.len(),
            sample_data.variables.len(),
            sample_data.attributes.len()
        );

        Ok(ParseResult { sample_data, stats })
    }

    fn metadata(&self, file_path: &Path) -> Metadata {
        Metadata {
            input_file: file_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            field_map_file: self
                .field_map_file
                .as_ref()
                .map(|path| path.display().to_string()),
            platform: self.options.platform.clone(),
            instrument_make: self.options.instrument_make.clone(),
            instrument_model: self.options.instrument_model.clone(),
        }
    }
}

/// Read and sanitize the first line of a CSV file
pub fn read_header(file_path: &Path) -> Result<HeaderColumns> {
    if !file_path.exists() {
        return Err(Error::file_not_found(file_path.display().to_string()));
    }

    let file = File::open(file_path)
        .map_err(|e| Error::io(format!("Failed to open {}", file_path.display()), e))?;
    let mut reader = BufReader::new(file);
    let mut buffer = Vec::new();
    reader
        .read_until(b'\n', &mut buffer)
        .map_err(|e| Error::io(format!("Failed to read header of {}", file_path.display()), e))?;

    while matches!(buffer.last(), Some(b'\n' | b'\r')) {
        buffer.pop();
    }

    Ok(HeaderColumns::analyze(&sanitize_header(&buffer)))
}
