//! Application constants for the Echoview processor
//!
//! This module contains the configuration constants, default values and
//! attribute names used throughout the parsing pipeline.

// =============================================================================
// Field-mapping Files
// =============================================================================

/// Line prefixes that mark a mapping-file line as a comment
pub const MAPPING_COMMENT_PREFIXES: &[char] = &['#', '%'];

/// Minimum number of comma-separated tokens for a mapping line to be a field
pub const MIN_MAPPING_FIELDS: usize = 4;

/// Default mapping file name, looked up inside the mapping directory
pub const DEFAULT_MAPPING_FILE: &str = "echoview_fieldmap.txt";

/// Prefix for platform-specific mapping files (`echoview_<platform>.txt`)
pub const PLATFORM_MAPPING_PREFIX: &str = "echoview_";

/// Type tags accepted in the fourth mapping column
pub mod type_tags {
    pub const STRING: &str = "S";
    pub const NUMERIC: &str = "N";
    pub const DATE: &str = "D";
    pub const TIME: &str = "T";
    pub const DATETIME: &str = "DT";
}

// =============================================================================
// CSV Input
// =============================================================================

/// Rows with fewer fields than this are blank or malformed and are skipped
pub const MIN_ROW_FIELDS: usize = 4;

/// Field delimiter for both mapping files and data files
pub const FIELD_DELIMITER: char = ',';

/// Date layout used by `D` fields and the date half of `DT` fields
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Time-of-day layout used by `T` fields and the time half of `DT` fields.
/// `%.f` also accepts a value with no fractional part.
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Number of leading characters of a `DT` field that hold the date
pub const DATETIME_DATE_WIDTH: usize = 8;

/// Reference epoch for numeric views of temporal data (days since)
pub const TIME_EPOCH: (i32, u32, u32) = (1950, 1, 1);

// =============================================================================
// Coverage Attributes
// =============================================================================

/// Well-known coordinate names scanned for coverage bounds
pub mod coordinate_names {
    pub const TIME: &str = "TIME";
    pub const LATITUDE: &str = "LATITUDE";
    pub const LONGITUDE: &str = "LONGITUDE";
    pub const DEPTH: &str = "DEPTH";
}

/// Global attribute names written by the bounds calculator
pub mod coverage_attributes {
    pub const TIME_START: &str = "time_coverage_start";
    pub const TIME_END: &str = "time_coverage_end";
    pub const LAT_MIN: &str = "geospatial_lat_min";
    pub const LAT_MAX: &str = "geospatial_lat_max";
    pub const LON_MIN: &str = "geospatial_lon_min";
    pub const LON_MAX: &str = "geospatial_lon_max";
    pub const VERTICAL_MIN: &str = "geospatial_vertical_min";
    pub const VERTICAL_MAX: &str = "geospatial_vertical_max";
}

/// Valid latitude range in degrees
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);

/// Valid longitude range in degrees (0-360 and -180-180 conventions both pass)
pub const LONGITUDE_RANGE: (f64, f64) = (-360.0, 360.0);

/// A longitude span wider than this is treated as crossing the antimeridian
pub const ANTIMERIDIAN_SPAN_DEGREES: f64 = 350.0;

// =============================================================================
// Instrument Metadata Defaults
// =============================================================================

pub const DEFAULT_INSTRUMENT_MAKE: &str = "Echoview";
pub const DEFAULT_INSTRUMENT_MODEL: &str = "Echoview CSV export";

// =============================================================================
// Configuration & Environment
// =============================================================================

/// Application directory name under the user's config directory
pub const APP_CONFIG_DIR: &str = "echoview-processor";

/// Configuration file name inside the application config directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Environment variable overrides
pub mod env_vars {
    pub const MAPPING_DIR: &str = "ECHOVIEW_MAPPING_DIR";
    pub const DEFAULT_MAPPING: &str = "ECHOVIEW_DEFAULT_MAPPING";
    pub const LOG_LEVEL: &str = "ECHOVIEW_LOG_LEVEL";
}

/// Accepted log levels
pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Default deployment-database table and key column
pub const DEFAULT_DEPLOYMENT_TABLE: &str = "DeploymentData";
pub const DEFAULT_DEPLOYMENT_KEY_FIELD: &str = "DeploymentId";

// =============================================================================
// Attribute Files
// =============================================================================

/// Line prefixes that mark an attribute-file line as a comment
pub const ATTRIBUTE_COMMENT_PREFIXES: &[char] = &['%', '#'];
