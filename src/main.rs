//! TSC Trace Studio CLI
//!
//! Finds compile-time hot spots in traces written by
//! `tsc --generateTrace` and summarizes the accompanying type dump.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::{Path, PathBuf};

use tsc_trace_studio::commands::{
    execute_analyze, execute_type, execute_types, validate_args, AnalyzeArgs, TypeArgs, TypeQuery,
    TypesArgs,
};
use tsc_trace_studio::utils::config::{load_options, AnalyzeTraceOptions, SCHEMA_VERSION};

/// TSC Trace Studio - Compile-time profiling for TypeScript projects
#[derive(Parser, Debug)]
#[command(name = "tsc-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a trace directory (or a single trace/types pair)
    Analyze {
        /// Directory written by `tsc --generateTrace`
        dir: Option<PathBuf>,

        /// Trace file (use with --types)
        #[arg(long)]
        trace: Option<PathBuf>,

        /// Type dump (use with --trace)
        #[arg(long)]
        types: Option<PathBuf>,

        /// Output path for the JSON report (single trace only)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML file with analysis options
        #[arg(short, long, env = "TSC_TRACE_CONFIG")]
        config: Option<PathBuf>,

        /// Spans at least this long (ms) are always reported
        #[arg(long)]
        force_millis: Option<f64>,

        /// Lower duration bound (ms); may not exceed --force-millis
        #[arg(long)]
        skip_millis: Option<f64>,

        /// Spans taking at least this share of their parent are reported
        #[arg(long)]
        min_span_parent_percentage: Option<f64>,

        /// Do not expand the relationships of types in hot spots
        #[arg(long)]
        no_expand_types: bool,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,

        /// Top-level hot spots shown in the summary
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Summarize type relationships in a type dump
    Types {
        /// Path to types.json
        #[arg(long)]
        types: PathBuf,

        /// Output path for the JSON summary (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Display one type, or search types by name
    Type {
        /// Path to types.json
        #[arg(long)]
        types: PathBuf,

        /// Type id to display
        #[arg(long, allow_hyphen_values = true, required_unless_present = "search")]
        id: Option<i64>,

        /// Case-insensitive name search
        #[arg(long, conflicts_with = "id")]
        search: Option<String>,

        /// Show the type without its relationships
        #[arg(long)]
        no_expand: bool,
    },

    /// Validate an analysis report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Analyze {
            dir,
            trace,
            types,
            output,
            config,
            force_millis,
            skip_millis,
            min_span_parent_percentage,
            no_expand_types,
            summary,
            top,
        } => {
            let mut options = match &config {
                Some(path) => load_options(path)
                    .with_context(|| format!("Failed to load options from {}", path.display()))?,
                None => AnalyzeTraceOptions::default(),
            };
            if let Some(value) = force_millis {
                options.force_millis = value;
            }
            if let Some(value) = skip_millis {
                options.skip_millis = value;
            }
            if let Some(value) = min_span_parent_percentage {
                options.min_span_parent_percentage = value;
            }
            if no_expand_types {
                options.expand_types = false;
            }

            let args = AnalyzeArgs {
                trace_dir: dir,
                trace_file: trace,
                types_file: types,
                output,
                options,
                print_summary: summary,
                top_hot_spots: top,
            };

            // Validate args first
            validate_args(&args)?;

            execute_analyze(args)?;
        }

        Commands::Types { types, output } => {
            execute_types(TypesArgs {
                types_file: types,
                output,
            })?;
        }

        Commands::Type {
            types,
            id,
            search,
            no_expand,
        } => {
            let query = match (id, search) {
                (Some(id), _) => TypeQuery::Id(id),
                (None, Some(text)) => TypeQuery::Search(text),
                (None, None) => anyhow::bail!("Give --id or --search"),
            };
            execute_type(TypeArgs {
                types_file: types,
                query,
                expand: !no_expand,
            })?;
        }

        Commands::Validate { file } => {
            validate_report_file(&file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Validate an analysis report JSON file
///
/// **Private** - internal command implementation
fn validate_report_file(file_path: &Path) -> Result<()> {
    use tsc_trace_studio::output::read_report;

    println!("Validating report: {}", file_path.display());

    let report = read_report(file_path)?;
    if report.version != SCHEMA_VERSION {
        println!(
            "⚠ Report schema v{} differs from this tool's v{}",
            report.version, SCHEMA_VERSION
        );
    }

    println!("✓ Valid analysis report");
    println!("  Version: {}", report.version);
    println!("  Generated: {}", report.generated_at);
    println!("  Trace: {}", report.trace_path);
    println!("  Hot Spots: {}", report.result.hot_spots.len());
    println!(
        "  Unterminated Events: {}",
        report.result.unterminated_events.len()
    );
    println!("  Packages: {}", report.result.node_module_paths.len());
    println!(
        "  Duplicate Packages: {}",
        report.result.duplicate_packages.len()
    );

    Ok(())
}

/// Display version information
///
/// **Private** - internal command implementation
fn display_version() {
    println!("TSC Trace Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Compile-time hot spot analysis for `tsc --generateTrace` output.");
}
