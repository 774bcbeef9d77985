//! Configuration management and validation.
//!
//! Settings are layered, lowest precedence first: built-in defaults, a YAML
//! file, `ECHOVIEW_*` environment variables, then command-line flags.
//!
//! ```yaml
//! mapping_dir: /etc/echoview/mappings
//! default_mapping: echoview_fieldmap.txt
//! instrument_make: Simrad
//! instrument_model: EK60
//! attribute_files:
//!   - /etc/echoview/global_attributes.txt
//! deployment_db:
//!   dir: /data/deployments
//!   table: DeploymentData
//!   key_field: DeploymentId
//! logging:
//!   level: info
//! ```

use crate::app::services::echoview_parser::ParserOptions;
use crate::constants::{
    APP_CONFIG_DIR, CONFIG_FILE_NAME, DEFAULT_DEPLOYMENT_KEY_FIELD, DEFAULT_DEPLOYMENT_TABLE,
    DEFAULT_INSTRUMENT_MAKE, DEFAULT_INSTRUMENT_MODEL, DEFAULT_MAPPING_FILE, LOG_LEVELS,
    PLATFORM_MAPPING_PREFIX, env_vars,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Processor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Directory holding field-mapping files
    pub mapping_dir: PathBuf,

    /// Mapping file used when no platform is given
    pub default_mapping: String,

    pub instrument_make: String,
    pub instrument_model: String,

    /// Attribute files merged into every result
    pub attribute_files: Vec<PathBuf>,

    pub deployment_db: Option<DeploymentDbConfig>,

    pub logging: LoggingConfig,
}

/// Location of the deployment database tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentDbConfig {
    pub dir: PathBuf,
    pub table: String,
    pub key_field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            mapping_dir: PathBuf::from("."),
            default_mapping: DEFAULT_MAPPING_FILE.to_string(),
            instrument_make: DEFAULT_INSTRUMENT_MAKE.to_string(),
            instrument_model: DEFAULT_INSTRUMENT_MODEL.to_string(),
            attribute_files: Vec::new(),
            deployment_db: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DeploymentDbConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            table: DEFAULT_DEPLOYMENT_TABLE.to_string(),
            key_field: DEFAULT_DEPLOYMENT_KEY_FIELD.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ProcessorConfig {
    /// `<config dir>/echoview-processor/config.yaml`, when the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_CONFIG_DIR).join(CONFIG_FILE_NAME))
    }

    /// Defaults, then the YAML file (explicit path, else the default location
    /// if it exists), then environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|path| path.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        Ok(config.apply_env())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::file_not_found(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("Failed to read config {}", path.display()), e))?;

        debug!("Loaded configuration from {}", path.display());
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::configuration(format!("Invalid configuration: {}", e)))
    }

    /// Apply `ECHOVIEW_*` overrides from the process environment
    pub fn apply_env(self) -> Self {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable lookup
    pub fn apply_env_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(env_vars::MAPPING_DIR) {
            self.mapping_dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup(env_vars::DEFAULT_MAPPING) {
            self.default_mapping = name;
        }
        if let Some(level) = lookup(env_vars::LOG_LEVEL) {
            self.logging.level = level.to_lowercase();
        }
        self
    }

    pub fn with_mapping_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.mapping_dir = dir.into();
        self
    }

    pub fn with_attribute_files(mut self, files: impl IntoIterator<Item = PathBuf>) -> Self {
        self.attribute_files.extend(files);
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.default_mapping.trim().is_empty() {
            return Err(Error::configuration("default_mapping must not be empty"));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(Error::configuration(format!(
                "Unknown log level '{}', expected one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        if let Some(db) = &self.deployment_db {
            if db.key_field.trim().is_empty() {
                return Err(Error::configuration(
                    "deployment_db.key_field must not be empty",
                ));
            }
            if db.table.trim().is_empty() {
                return Err(Error::configuration("deployment_db.table must not be empty"));
            }
        }

        Ok(())
    }

    /// Mapping file for a run: an explicit path wins, then the platform's
    /// `echoview_<platform>.txt`, then the default mapping
    pub fn mapping_path(&self, explicit: Option<&Path>, platform: Option<&str>) -> PathBuf {
        match (explicit, platform) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(platform)) => self
                .mapping_dir
                .join(format!("{}{}.txt", PLATFORM_MAPPING_PREFIX, platform)),
            (None, None) => self.mapping_dir.join(&self.default_mapping),
        }
    }

    /// Parser options carrying the configured instrument
    pub fn parser_options(&self, platform: Option<&str>) -> ParserOptions {
        let options = ParserOptions::default()
            .with_instrument(&self.instrument_make, &self.instrument_model);
        match platform {
            Some(platform) => options.with_platform(platform),
            None => options,
        }
    }
}
