//! Utility modules for configuration, error handling and paths.

pub mod config;
pub mod error;
pub mod paths;

// Re-export commonly used types for convenience
pub use config::{load_options, AnalyzeTraceOptions};
pub use error::{AnalysisError, ConfigError, OutputError, ParseError};
pub use paths::normalize_path;
