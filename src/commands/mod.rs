//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod analyze;
pub mod types;

// Re-export main command functions
pub use analyze::{
    analyze_pair, analyze_trace, build_report, default_output_path, execute_analyze,
    validate_args, AnalyzeArgs,
};
pub use types::{execute_type, execute_types, TypeArgs, TypeQuery, TypesArgs};
