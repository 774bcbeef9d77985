use clap::Parser;
use echoview_processor::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let shutdown_signal = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                // Without a handler the run is simply not interruptible
                eprintln!("Failed to install CTRL+C signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = commands::run(args) => result,
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(echoview_processor::Error::processing_interrupted(
                    "Processing interrupted by user",
                )
                .into())
            }
        }
    });

    match result {
        Ok(summary) if summary.files_failed > 0 => process::exit(2),
        Ok(_) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Echoview Processor - Echo-sounder CSV to gridded sample data");
    println!("============================================================");
    println!();
    println!("Convert Echoview CSV exports into dimensioned, QC-flagged sample data");
    println!("using a field-mapping file.");
    println!();
    println!("USAGE:");
    println!("    echoview-processor <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    parse       Parse CSV files, directories or glob patterns");
    println!("    validate    Check that a CSV header contains every mapped column");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Parse a voyage directory with the Aurora mapping:");
    println!("    echoview-processor parse data/ --platform Aurora");
    println!();
    println!("    # Parse with extra attributes and a deployment record, as JSON:");
    println!("    echoview-processor parse 'exports/*.csv' -a global.txt \\");
    println!("                             --deployment-id SOOP-01 --format json");
    println!();
    println!("    # Check a header before a long run:");
    println!("    echoview-processor validate transect.csv --mapping echoview_fieldmap.txt");
    println!();
    println!("For detailed help on any command, use:");
    println!("    echoview-processor <COMMAND> --help");
}
