//! Command implementations for the Echoview processor CLI
//!
//! This module contains the command execution logic, input discovery,
//! progress reporting and result reports.

use crate::app::models::{SampleData, Value};
use crate::app::services::attribute_file::{AttributeFileReader, merge_attributes};
use crate::app::services::deployment_db::{DeploymentDb, record_attributes};
use crate::app::services::echoview_parser::{EchoviewParser, ParseStats};
use crate::cli::args::{Args, Commands, OutputFormat, ParseArgs, ValidateArgs};
use crate::config::ProcessorConfig;
use crate::{Error, Result};
use anyhow::Context;
use colored::Colorize;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Run statistics for reporting
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub files_processed: usize,
    pub files_failed: usize,
    pub total_rows: usize,
    pub rows_indexed: usize,
    pub fields_flagged: usize,
    pub processing_time: std::time::Duration,
}

impl RunSummary {
    fn record(&mut self, stats: &ParseStats) {
        self.files_processed += 1;
        self.total_rows += stats.total_rows;
        self.rows_indexed += stats.rows_indexed;
        self.fields_flagged += stats.fields_flagged;
    }
}

/// Report for one successfully parsed file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub stats: ParseStats,
    pub sample_data: SampleData,
}

/// Main command runner
pub async fn run(args: Args) -> anyhow::Result<RunSummary> {
    match args.command {
        Some(Commands::Parse(parse)) => run_parse(&parse).await,
        Some(Commands::Validate(validate)) => run_validate(&validate).await,
        None => Ok(RunSummary::default()),
    }
}

/// Parse every input file and print the report
pub async fn run_parse(args: &ParseArgs) -> anyhow::Result<RunSummary> {
    let start_time = Instant::now();

    let config = load_configuration(args.config_file.as_deref(), args.get_log_level())?;
    setup_logging(&config.logging.level, args.quiet);
    debug!("Command line arguments: {:?}", args);

    args.validate()?;
    let config = config.with_attribute_files(args.attribute_files.iter().cloned());

    let mapping = config.mapping_path(args.mapping.as_deref(), args.platform.as_deref());
    let parser = EchoviewParser::from_mapping_file(
        &mapping,
        config.parser_options(args.platform.as_deref()),
    )
    .with_context(|| format!("Failed to load field map {}", mapping.display()))?;
    info!(
        "Loaded {} field descriptors from {}",
        parser.descriptors().len(),
        mapping.display()
    );

    let extra_attributes = load_extra_attributes(&config, args.deployment_id.as_deref())
        .context("Failed to load global attributes")?;

    let files = collect_inputs(&args.inputs)?;
    info!("Found {} CSV files to process", files.len());

    let progress = (args.show_progress() && files.len() > 1)
        .then(|| create_progress_bar(files.len() as u64, "Parsing"));

    let parser = Arc::new(parser);
    let mut summary = RunSummary::default();
    let mut reports = Vec::with_capacity(files.len());

    for file in &files {
        if let Some(pb) = &progress {
            pb.set_message(display_name(file));
        }

        match parse_one(Arc::clone(&parser), file.clone()).await? {
            Ok(mut result) => {
                merge_attributes(&mut result.sample_data, extra_attributes.iter().cloned());
                summary.record(&result.stats);
                reports.push(FileReport {
                    file: file.display().to_string(),
                    stats: result.stats,
                    sample_data: result.sample_data,
                });
            }
            Err(e) if e.is_critical() => {
                if let Some(pb) = &progress {
                    pb.abandon_with_message("Aborted");
                }
                return Err(e).with_context(|| format!("Failed to parse {}", file.display()));
            }
            Err(e) => {
                error!("Skipping {}: {}", file.display(), e);
                summary.files_failed += 1;
            }
        }

        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message("Done");
    }

    summary.processing_time = start_time.elapsed();
    match args.output_format {
        OutputFormat::Human => generate_human_report(&reports, &summary, args.quiet),
        OutputFormat::Json => generate_json_report(&reports, &summary)?,
    }

    Ok(summary)
}

/// Resolve the mapped columns against a CSV header without reading data
pub async fn run_validate(args: &ValidateArgs) -> anyhow::Result<RunSummary> {
    let config = load_configuration(args.config_file.as_deref(), args.get_log_level())?;
    setup_logging(&config.logging.level, false);

    let mapping = config.mapping_path(args.mapping.as_deref(), args.platform.as_deref());
    let parser = EchoviewParser::from_mapping_file(
        &mapping,
        config.parser_options(args.platform.as_deref()),
    )
    .with_context(|| format!("Failed to load field map {}", mapping.display()))?;

    let layout = parser
        .resolve(&args.csv)
        .with_context(|| format!("Header check failed for {}", args.csv.display()))?;

    println!(
        "{} {} mapped fields found in {}",
        "✓".bright_green().bold(),
        layout.dimensions.len() + layout.variables.len(),
        args.csv.display()
    );
    let variables = layout.variables.iter().map(|(column, _)| column);
    for column in layout.dimensions.iter().chain(variables) {
        println!(
            "   • {:<24} column {}",
            column.descriptor.name, column.column
        );
    }

    Ok(RunSummary {
        files_processed: 1,
        ..Default::default()
    })
}

/// Parse one file on the blocking pool. The outer result only fails when the
/// task itself could not complete.
async fn parse_one(
    parser: Arc<EchoviewParser>,
    path: PathBuf,
) -> anyhow::Result<Result<crate::ParseResult>> {
    tokio::task::spawn_blocking(move || parser.parse_file(&path))
        .await
        .context("Parse task failed")
}

/// Set up structured logging at the given level
fn setup_logging(level: &str, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("echoview_processor={}", level)));

    let initialised = if quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    // A subscriber is already installed when commands run more than once per process
    if initialised.is_ok() {
        debug!("Logging initialized at level: {}", level);
    }
}

/// Configuration file and environment, then command-line overrides
fn load_configuration(config_file: Option<&Path>, log_level: Option<&str>) -> Result<ProcessorConfig> {
    let mut config = ProcessorConfig::load(config_file)?;
    if let Some(level) = log_level {
        config = config.with_log_level(level);
    }
    config.validate()?;
    Ok(config)
}

/// Attribute files in order, then the deployment record
fn load_extra_attributes(
    config: &ProcessorConfig,
    deployment_id: Option<&str>,
) -> Result<Vec<(String, Value)>> {
    let mut attributes = Vec::new();

    if !config.attribute_files.is_empty() {
        let reader = AttributeFileReader::new()?;
        for path in &config.attribute_files {
            attributes.extend(reader.load(path)?);
        }
    }

    if let Some(id) = deployment_id {
        let db_config = config.deployment_db.as_ref().ok_or_else(|| {
            Error::configuration("--deployment-id requires a deployment_db section in the configuration")
        })?;

        let mut db = DeploymentDb::new(&db_config.dir);
        let records = db.execute_query(&db_config.table, &db_config.key_field, id)?;
        match records.first() {
            Some(record) => {
                if records.len() > 1 {
                    warn!(
                        "{} deployment records match '{}', using the first",
                        records.len(),
                        id
                    );
                }
                attributes.extend(record_attributes(record));
            }
            None => warn!("No deployment record found for '{}'", id),
        }
    }

    Ok(attributes)
}

/// Expand inputs into an ordered, de-duplicated list of CSV files
///
/// Each input is a file, a directory (searched recursively for `*.csv`) or a
/// glob pattern.
pub fn collect_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for input in inputs {
        let path = Path::new(input);
        let found = if path.is_dir() {
            discover_csv_files(path)
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else if input.contains(['*', '?', '[']) {
            expand_glob(input)?
        } else {
            return Err(Error::file_not_found(input.as_str()));
        };

        if found.is_empty() {
            warn!("No CSV files matched '{}'", input);
        }
        for file in found {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }

    if files.is_empty() {
        return Err(Error::configuration("No CSV files found in the given inputs"));
    }
    Ok(files)
}

fn discover_csv_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_csv(path))
        .collect();

    files.sort();
    debug!("Discovered {} CSV files in {}", files.len(), dir.display());
    files
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern)
        .map_err(|e| Error::configuration(format!("Invalid glob pattern '{}': {}", pattern, e)))?;

    let mut files: Vec<PathBuf> = paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Unreadable glob match: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();

    files.sort();
    Ok(files)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

fn generate_human_report(reports: &[FileReport], summary: &RunSummary, quiet: bool) {
    if quiet {
        return;
    }

    for report in reports {
        let sample = &report.sample_data;
        println!(
            "\n{} {} ({}/{} rows, {:.1}%)",
            "✓".bright_green().bold(),
            report.file.bold(),
            report.stats.rows_indexed,
            report.stats.total_rows,
            report.stats.success_rate()
        );

        let dimensions: Vec<String> = sample
            .dimensions
            .iter()
            .map(|d| format!("{}[{}]", d.name, d.len()))
            .collect();
        println!("   • Dimensions: {}", join_or_none(&dimensions));

        let variables: Vec<String> = sample
            .variables
            .iter()
            .map(|v| {
                let dims: Vec<&str> = v
                    .dimensions
                    .iter()
                    .filter_map(|&i| sample.dimensions.get(i).map(|d| d.name.as_str()))
                    .collect();
                format!("{}({})", v.name, dims.join(", "))
            })
            .collect();
        println!("   • Variables: {}", join_or_none(&variables));
        println!("   • Attributes: {}", sample.attributes.len());

        if report.stats.dimensions_collapsed + report.stats.variables_collapsed > 0 {
            println!(
                "   • Collapsed: {} dimensions, {} variables",
                report.stats.dimensions_collapsed, report.stats.variables_collapsed
            );
        }
        if report.stats.fields_flagged > 0 {
            println!("   • QC flags: {} fields", report.stats.fields_flagged);
        }
    }

    println!("\n🎉 {}", "Echoview Processing Complete!".bright_green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📊 Summary:");
    println!("   • Files processed: {}", summary.files_processed);
    println!(
        "   • Rows indexed: {} of {}",
        summary.rows_indexed, summary.total_rows
    );
    println!(
        "   • Processing time: {}",
        HumanDuration(summary.processing_time)
    );
    if summary.files_failed > 0 {
        println!(
            "{}",
            format!("⚠️  Files skipped: {}", summary.files_failed).yellow()
        );
    }
    println!();
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn generate_json_report(reports: &[FileReport], summary: &RunSummary) -> anyhow::Result<()> {
    let document = serde_json::json!({
        "files": reports,
        "summary": {
            "files_processed": summary.files_processed,
            "files_failed": summary.files_failed,
            "total_rows": summary.total_rows,
            "rows_indexed": summary.rows_indexed,
            "fields_flagged": summary.fields_flagged,
            "processing_time_seconds": summary.processing_time.as_secs_f64(),
        }
    });

    let json = serde_json::to_string_pretty(&document).context("Failed to serialise report")?;
    println!("{}", json);
    Ok(())
}
