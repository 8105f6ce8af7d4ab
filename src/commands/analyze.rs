//! Analyze command implementation.
//!
//! The analyze command, per trace/types pair:
//! 1. Reads and classifies the trace
//! 2. Reads the type dump
//! 3. Reconstructs spans
//! 4. Builds the pruned span tree
//! 5. Extracts hot spots
//! 6. Scans node_modules for duplicate packages
//!
//! and writes one JSON report per pair.

use crate::aggregator::{build_span_tree, extract_hot_spots, reconstruct_spans};
use crate::output::{render_summary, write_report};
use crate::packages::{get_duplicate_node_modules, get_node_module_paths};
use crate::parser::events::TraceEvent;
use crate::parser::schema::{AnalyzeTraceResult, TraceReport};
use crate::parser::trace::{find_trace_pairs, read_trace_file, read_types_file, TracePair};
use crate::parser::types::TypeRegistry;
use crate::utils::config::{AnalyzeTraceOptions, SCHEMA_VERSION};
use crate::utils::error::AnalysisError;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Suffix of the report written next to each trace
pub const REPORT_SUFFIX: &str = "analysis.json";

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Directory written by `tsc --generateTrace`
    pub trace_dir: Option<PathBuf>,

    /// Explicit trace file (requires `types_file`)
    pub trace_file: Option<PathBuf>,

    /// Explicit type dump (requires `trace_file`)
    pub types_file: Option<PathBuf>,

    /// Report path; only valid when a single pair is analyzed
    pub output: Option<PathBuf>,

    pub options: AnalyzeTraceOptions,

    /// Print text summary to stdout
    pub print_summary: bool,

    /// Top-level hot spots shown in the summary
    pub top_hot_spots: usize,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            trace_dir: None,
            trace_file: None,
            types_file: None,
            output: None,
            options: AnalyzeTraceOptions::default(),
            print_summary: false,
            top_hot_spots: 10,
        }
    }
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    match (&args.trace_dir, &args.trace_file, &args.types_file) {
        (Some(_), None, None) | (None, Some(_), Some(_)) => {}
        (Some(_), _, _) => {
            anyhow::bail!("Give either a trace directory or --trace/--types, not both")
        }
        (None, Some(_), None) | (None, None, Some(_)) => {
            anyhow::bail!("--trace and --types must be given together")
        }
        (None, None, None) => anyhow::bail!("No trace directory or --trace/--types given"),
    }

    if args.top_hot_spots == 0 {
        anyhow::bail!("top must be greater than 0");
    }

    args.options
        .validate()
        .context("Invalid analysis options")?;

    Ok(())
}

/// Run the analysis pipeline over already-loaded inputs
///
/// **Public** - pure core of the analyze command; touches the filesystem
/// only to read `package.json` files and source files for positions
///
/// # Errors
/// * `AnalysisError::Config` - Options are inconsistent (checked first)
/// * `AnalysisError::UnmatchedEnd` - The trace closes an event it never opened
/// * `AnalysisError::TypeNotFound` - A hot spot references a missing type
///
/// # Example
/// ```ignore
/// let events = read_trace_file("trace.json")?;
/// let registry = read_types_file("types.json")?;
/// let result = analyze_trace(&events, &registry, &AnalyzeTraceOptions::default())?;
/// ```
pub fn analyze_trace(
    events: &[TraceEvent],
    registry: &TypeRegistry,
    options: &AnalyzeTraceOptions,
) -> Result<AnalyzeTraceResult, AnalysisError> {
    options.validate()?;

    info!("Step 3/6: Reconstructing spans from {} events...", events.len());
    let parsed = reconstruct_spans(events)?;
    let unterminated_events: Vec<TraceEvent> = parsed.unterminated_events().cloned().collect();

    info!("Step 4/6: Building span tree...");
    let tree = build_span_tree(parsed, options)?;

    info!("Step 5/6: Extracting hot spots...");
    let hot_spots = extract_hot_spots(&tree, registry, options)?;

    info!("Step 6/6: Scanning node_modules...");
    let node_module_paths = get_node_module_paths(events);
    let duplicate_packages = get_duplicate_node_modules(&node_module_paths);

    debug!(
        "Analysis found {} hot spots, {} unterminated events, {} duplicate packages",
        hot_spots.len(),
        unterminated_events.len(),
        duplicate_packages.len()
    );

    Ok(AnalyzeTraceResult {
        node_module_paths,
        unterminated_events,
        hot_spots,
        duplicate_packages,
    })
}

/// Read one trace/types pair and analyze it
///
/// **Public** - each pair is an independent run
pub fn analyze_pair(pair: &TracePair, options: &AnalyzeTraceOptions) -> Result<AnalyzeTraceResult> {
    info!("Step 1/6: Reading trace {}...", pair.trace_path.display());
    let events = read_trace_file(&pair.trace_path)
        .with_context(|| format!("Failed to read trace {}", pair.trace_path.display()))?;

    info!("Step 2/6: Reading types {}...", pair.types_path.display());
    let registry = read_types_file(&pair.types_path)
        .with_context(|| format!("Failed to read types {}", pair.types_path.display()))?;
    debug!("Type registry holds {} types", registry.len());

    let result = analyze_trace(&events, &registry, options)
        .with_context(|| format!("Failed to analyze {}", pair.trace_path.display()))?;

    Ok(result)
}

/// Wrap a result in the versioned report envelope
pub fn build_report(pair: &TracePair, result: AnalyzeTraceResult) -> TraceReport {
    TraceReport {
        version: SCHEMA_VERSION.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        config_file_path: pair.config_file_path.clone(),
        trace_path: pair.trace_path.display().to_string(),
        types_path: pair.types_path.display().to_string(),
        result,
    }
}

/// `<dir>/trace.3.json` -> `<dir>/trace.3.analysis.json`
pub fn default_output_path(trace_path: &Path) -> PathBuf {
    let stem = trace_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "trace".to_string());
    trace_path.with_file_name(format!("{}.{}", stem, REPORT_SUFFIX))
}

/// Resolve the pairs named by the arguments
fn resolve_pairs(args: &AnalyzeArgs) -> Result<Vec<TracePair>> {
    if let (Some(trace_path), Some(types_path)) = (&args.trace_file, &args.types_file) {
        return Ok(vec![TracePair {
            config_file_path: None,
            trace_path: trace_path.clone(),
            types_path: types_path.clone(),
        }]);
    }

    let dir = args
        .trace_dir
        .as_ref()
        .context("No trace directory given")?;
    find_trace_pairs(dir).with_context(|| format!("Failed to find traces in {}", dir.display()))
}

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// The reports written, in pair order
///
/// # Errors
/// * Missing or malformed trace/types files
/// * Structural trace errors (unmatched end events, dangling type ids)
/// * File write errors
pub fn execute_analyze(args: AnalyzeArgs) -> Result<Vec<PathBuf>> {
    let start_time = Instant::now();
    args.options
        .validate()
        .context("Invalid analysis options")?;

    let pairs = resolve_pairs(&args)?;
    if args.output.is_some() && pairs.len() > 1 {
        anyhow::bail!(
            "--output names a single file but {} trace pairs were found",
            pairs.len()
        );
    }

    let mut written = Vec::with_capacity(pairs.len());
    for pair in &pairs {
        if let Some(config) = &pair.config_file_path {
            info!("Analyzing project {}", config);
        }

        let result = analyze_pair(pair, &args.options)?;

        if args.print_summary {
            println!("\n{}", "=".repeat(80));
            println!("TRACE SUMMARY: {}", pair.trace_path.display());
            println!("{}", "=".repeat(80));
            println!("{}", render_summary(&result, args.top_hot_spots));
            println!("{}", "=".repeat(80));
        }

        let output_path = args
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&pair.trace_path));
        let report = build_report(pair, result);
        write_report(&report, &output_path).context("Failed to write analysis report")?;

        info!("✓ Report written to: {}", output_path.display());
        written.push(output_path);
    }

    let elapsed = start_time.elapsed();
    info!(
        "Analyzed {} trace(s) in {:.2}s",
        written.len(),
        elapsed.as_secs_f64()
    );

    Ok(written)
}
