//! Mapping-file loading
//!
//! Each non-comment line with at least four comma-separated tokens yields one
//! descriptor: `name, column, dimension group, type[, qc expression]`.
//! Everything after the fourth comma is the QC expression, so expressions may
//! contain commas themselves.

use crate::app::models::{FieldDescriptor, FieldType};
use crate::constants::{FIELD_DELIMITER, MAPPING_COMMENT_PREFIXES, MIN_MAPPING_FIELDS};
use crate::{Error, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Load and validate a mapping file
pub fn load_field_map(path: &Path) -> Result<Vec<FieldDescriptor>> {
    if !path.exists() {
        return Err(Error::file_not_found(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::io(
            format!("Failed to read field map {}", path.display()),
            e,
        )
    })?;

    let descriptors = parse_field_map(&content)?;
    info!(
        "Loaded {} field descriptors from {}",
        descriptors.len(),
        path.display()
    );

    Ok(descriptors)
}

/// Parse mapping-file content, preserving line order
pub fn parse_field_map(content: &str) -> Result<Vec<FieldDescriptor>> {
    let mut descriptors = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with(MAPPING_COMMENT_PREFIXES) {
            continue;
        }

        let tokens: Vec<&str> = line.splitn(MIN_MAPPING_FIELDS + 1, FIELD_DELIMITER).collect();
        if tokens.len() < MIN_MAPPING_FIELDS {
            if !trimmed.is_empty() {
                debug!("Skipping mapping line {}: too few fields", line_num + 1);
            }
            continue;
        }

        descriptors.push(parse_descriptor(&tokens, line_num + 1)?);
    }

    validate_descriptors(&descriptors)?;
    Ok(descriptors)
}

fn parse_descriptor(tokens: &[&str], line_num: usize) -> Result<FieldDescriptor> {
    let name = tokens[0].trim();
    let column_name = tokens[1].trim();

    if name.is_empty() || column_name.is_empty() {
        return Err(Error::configuration(format!(
            "Mapping line {}: field name and column name must not be empty",
            line_num
        )));
    }

    let field_type = FieldType::from_tag(tokens[3]).ok_or_else(|| {
        Error::configuration(format!(
            "Mapping line {}: unknown type tag '{}' for field '{}'",
            line_num,
            tokens[3].trim(),
            name
        ))
    })?;

    let dimension_group = tokens[2].split_whitespace().map(str::to_string).collect();

    let qc_expression = tokens
        .get(MIN_MAPPING_FIELDS)
        .map(|expr| expr.trim())
        .filter(|expr| !expr.is_empty())
        .map(str::to_string);

    Ok(FieldDescriptor {
        name: name.to_string(),
        column_name: column_name.to_string(),
        dimension_group,
        field_type,
        qc_expression,
    })
}

/// Names are unique and every dimension group entry names a declared dimension
fn validate_descriptors(descriptors: &[FieldDescriptor]) -> Result<()> {
    let mut names = HashSet::new();
    for descriptor in descriptors {
        if !names.insert(descriptor.name.as_str()) {
            return Err(Error::configuration(format!(
                "Field '{}' is declared more than once",
                descriptor.name
            )));
        }
    }

    let dimensions: HashSet<&str> = descriptors
        .iter()
        .filter(|d| d.is_dimension())
        .map(|d| d.name.as_str())
        .collect();

    for descriptor in descriptors.iter().filter(|d| !d.is_dimension()) {
        let mut seen = HashSet::new();
        for dim in &descriptor.dimension_group {
            if !dimensions.contains(dim.as_str()) {
                return Err(Error::configuration(format!(
                    "Field '{}' varies over '{}', which is not a declared dimension",
                    descriptor.name, dim
                )));
            }
            if !seen.insert(dim.as_str()) {
                return Err(Error::configuration(format!(
                    "Field '{}' lists dimension '{}' twice",
                    descriptor.name, dim
                )));
            }
        }
    }

    Ok(())
}
