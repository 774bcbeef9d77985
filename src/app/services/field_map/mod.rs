//! Field-mapping configuration for Echoview CSV exports
//!
//! A field map says which CSV columns become dimensions and which become
//! variables, what type each holds and which QC formula applies to it.
//!
//! ## Architecture
//!
//! - [`loader`] - Mapping-file reading and descriptor validation
//! - [`column_resolver`] - Binding descriptors to the columns of one file's header
//!
//! ## Mapping file format
//!
//! ```text
//! # name, column, dimensions, type, [qc expression]
//! TIME,Date_M,,DT
//! DEPTH,Layer_depth_min,,N
//! SV,Sv_mean,TIME DEPTH,N,SV > -999
//! ```

pub mod column_resolver;
pub mod loader;

#[cfg(test)]
pub mod tests;

// Re-export main entry points
pub use column_resolver::{HeaderColumns, resolve_columns};
pub use loader::{load_field_map, parse_field_map};
