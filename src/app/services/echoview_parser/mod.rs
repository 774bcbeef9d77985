//! Echoview CSV parser
//!
//! Runs the full conversion of one CSV export into [`SampleData`]:
//!
//! 1. the field map is loaded once, when the parser is built;
//! 2. the file's header is sanitized and every mapped field bound to a column;
//! 3. the two-pass coordinate indexer builds dimensions and dense variables;
//! 4. single-valued fields collapse to attributes, QC flags are evaluated and
//!    coverage bounds written;
//! 5. provenance and instrument metadata are filled in.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use echoview_processor::app::services::echoview_parser::{EchoviewParser, ParserOptions};
//!
//! # fn example() -> echoview_processor::Result<()> {
//! let parser = EchoviewParser::from_mapping_file(
//!     std::path::Path::new("echoview_fieldmap.txt"),
//!     ParserOptions::default().with_platform("Aurora"),
//! )?;
//! let result = parser.parse_file(std::path::Path::new("transect.csv"))?;
//!
//! println!("Indexed {} of {} rows",
//!          result.stats.rows_indexed,
//!          result.stats.total_rows);
//! # Ok(())
//! # }
//! ```
//!
//! [`SampleData`]: crate::app::models::SampleData

pub mod parser;
pub mod stats;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use parser::{EchoviewParser, ParserOptions};
pub use stats::{ParseResult, ParseStats};
