//! Configuration and constants for the analyzer.
//!
//! `AnalyzeTraceOptions` can come from defaults, a TOML options file,
//! or CLI flags (in increasing precedence).

use super::error::ConfigError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current analysis report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Type id the compiler writes when a relation could not be resolved
pub const NOT_FOUND_TYPE_ID: i64 = -1;

// Conventional file names written by `tsc --generateTrace <dir>`
pub const TRACE_FILE_NAME: &str = "trace.json";
pub const TYPES_FILE_NAME: &str = "types.json";
pub const LEGACY_FILE_NAME: &str = "legacy.json";
pub const PACKAGE_JSON_FILE_NAME: &str = "package.json";

/// Version reported for a package whose package.json is missing or unreadable
pub const UNKNOWN_VERSION: &str = "unknown";

/// Matches one `node_modules/<name>` or `node_modules/@scope/<name>` segment
pub const PACKAGE_PATH_PATTERN: &str = r"/node_modules/((?:[^@][^/]+)|(?:@[^/]+/[^/]+))";

pub const DEFAULT_FORCE_MILLIS: f64 = 500.0;
pub const DEFAULT_SKIP_MILLIS: f64 = 100.0;
pub const DEFAULT_MIN_SPAN_PARENT_PERCENTAGE: f64 = 0.6;
pub const DEFAULT_IMPORT_EXPRESSION_THRESHOLD: f64 = 10.0;

/// Options controlling span pruning and type expansion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeTraceOptions {
    /// Spans at least this long (ms) are always kept
    pub force_millis: f64,

    /// Must not exceed `force_millis`
    pub skip_millis: f64,

    /// Expand the relationship tree of types attached to hot spots
    pub expand_types: bool,

    /// Spans at least this fraction of their parent are kept
    pub min_span_parent_percentage: f64,

    /// Accepted for interface compatibility; no algorithm here reads it
    pub import_expression_threshold: f64,
}

impl Default for AnalyzeTraceOptions {
    fn default() -> Self {
        Self {
            force_millis: DEFAULT_FORCE_MILLIS,
            skip_millis: DEFAULT_SKIP_MILLIS,
            expand_types: true,
            min_span_parent_percentage: DEFAULT_MIN_SPAN_PARENT_PERCENTAGE,
            import_expression_threshold: DEFAULT_IMPORT_EXPRESSION_THRESHOLD,
        }
    }
}

impl AnalyzeTraceOptions {
    /// Reject inconsistent options before any trace is processed
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("forceMillis", self.force_millis),
            ("skipMillis", self.skip_millis),
            ("minSpanParentPercentage", self.min_span_parent_percentage),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidOptions(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.force_millis < self.skip_millis {
            return Err(ConfigError::InvalidOptions(format!(
                "forceMillis ({}) cannot be less than skipMillis ({})",
                self.force_millis, self.skip_millis
            )));
        }

        if self.min_span_parent_percentage > 1.0 {
            return Err(ConfigError::InvalidOptions(format!(
                "minSpanParentPercentage must be within [0, 1], got {}",
                self.min_span_parent_percentage
            )));
        }

        Ok(())
    }

    /// Absolute admission threshold in trace units (microseconds)
    pub fn force_micros(&self) -> f64 {
        self.force_millis * 1000.0
    }
}

/// Load options from a TOML file
///
/// Missing fields take their defaults. The result is not validated here;
/// callers apply CLI overrides first and validate the merged options.
///
/// # Example
/// ```ignore
/// let options = load_options("analyze.toml")?;
/// ```
pub fn load_options(path: impl AsRef<Path>) -> Result<AnalyzeTraceOptions, ConfigError> {
    let path = path.as_ref();
    debug!("Loading analysis options from: {}", path.display());

    let contents = fs::read_to_string(path)?;
    let options: AnalyzeTraceOptions = toml::from_str(&contents)?;
    Ok(options)
}
