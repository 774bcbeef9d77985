//! Echoview Processor Library
//!
//! A Rust library for converting echo-sounder CSV exports into a gridded,
//! self-describing `SampleData` structure ready for quality control and
//! NetCDF export.
//!
//! This library provides tools for:
//! - Loading field-mapping files that describe dimensions, variables and QC formulas
//! - Resolving mapped fields against the CSV header (fail fast on missing columns)
//! - Two-pass coordinate discovery and dense array filling
//! - Collapsing single-valued dimensions and variables into global attributes
//! - Evaluating QC expressions with a small, sandboxed expression language
//! - Computing temporal and geospatial coverage attributes
//! - Merging attribute files and deployment-database records

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod attribute_file;
        pub mod bounds;
        pub mod coordinate_indexer;
        pub mod csv_codec;
        pub mod deployment_db;
        pub mod echoview_parser;
        pub mod field_map;
        pub mod qc_expression;
        pub mod scalar_collapse;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{Dimension, FieldDescriptor, FieldType, SampleData, Value, Variable};
pub use app::services::echoview_parser::{EchoviewParser, ParseResult, ParseStats};
pub use config::ProcessorConfig;

/// Result type alias for the Echoview processor
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Echoview parsing operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Configuration or field-mapping error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A mapped column is absent from the CSV header
    #[error("Column '{column}' not found in header of '{file}'")]
    MissingColumn { file: String, column: String },

    /// The fill pass disagrees with the discovery pass
    #[error("Consistency error in '{file}' at line {line}: {message}")]
    Consistency {
        file: String,
        line: usize,
        message: String,
    },

    /// A field that controls indexing could not be converted
    #[error("Cannot convert '{value}' in field '{field}' to {expected}")]
    TypeConversion {
        field: String,
        value: String,
        expected: String,
    },

    /// QC expression failed to parse or evaluate
    #[error("QC expression error for field '{field}': {message}")]
    QcExpression { field: String, message: String },

    /// CSV parsing error (data files and deployment database tables)
    #[error("CSV parsing error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a missing column error
    pub fn missing_column(file: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            file: file.into(),
            column: column.into(),
        }
    }

    /// Create a consistency error
    pub fn consistency(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::Consistency {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// Create a type conversion error
    pub fn type_conversion(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::TypeConversion {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Create a QC expression error
    pub fn qc_expression(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QcExpression {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a CSV parsing error
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }

    /// Whether this error should stop a multi-file run rather than skip the file
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::QcExpression { .. } | Self::ProcessingInterrupted { .. }
        )
    }
}
