//! Trace document loading.
//!
//! Reads the files written by `tsc --generateTrace <dir>`:
//! - `trace.json` (or `trace.N.json`): array of trace event records
//! - `types.json` (or `types.N.json`): array of type records
//! - `legacy.json`: in build mode, the list of trace/types pairs

use super::events::{classify_events, TraceEvent};
use super::types::TypeRegistry;
use crate::utils::config::{LEGACY_FILE_NAME, TRACE_FILE_NAME, TYPES_FILE_NAME};
use crate::utils::error::ParseError;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// One trace/types pair produced by a single compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracePair {
    pub config_file_path: Option<String>,
    pub trace_path: PathBuf,
    pub types_path: PathBuf,
}

/// Entry of `legacy.json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegendEntry {
    #[serde(default)]
    config_file_path: Option<String>,
    trace_path: PathBuf,
    types_path: PathBuf,
}

/// Parse the text of a trace document into its raw records
///
/// Accepts a top-level array or a `{"traceEvents": [...]}` container.
/// A document cut off mid-write (no closing `]`) is repaired first.
///
/// # Errors
/// * `ParseError::JsonError` - Invalid JSON even after repair
/// * `ParseError::InvalidFormat` - Document is neither array nor container
pub fn parse_trace_document(text: &str) -> Result<Vec<Value>, ParseError> {
    let repaired = repair_truncated_array(text);
    let document: Value = serde_json::from_str(repaired.as_deref().unwrap_or(text))?;

    match document {
        Value::Array(records) => Ok(records),
        Value::Object(mut obj) => match obj.remove("traceEvents") {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(ParseError::InvalidFormat(
                "Trace object must contain a 'traceEvents' array".to_string(),
            )),
        },
        _ => Err(ParseError::InvalidFormat(
            "Trace must be a JSON array or an object with 'traceEvents'".to_string(),
        )),
    }
}

/// Close an array the compiler never finished writing
///
/// Returns `None` when the text needs no repair.
fn repair_truncated_array(text: &str) -> Option<String> {
    let trimmed = text.trim_end();
    if !trimmed.trim_start().starts_with('[') || trimmed.ends_with(']') {
        return None;
    }

    warn!("Trace document is not terminated; assuming the compiler stopped mid-write");
    let body = trimmed.strip_suffix(',').unwrap_or(trimmed).trim_end();
    Some(format!("{}\n]", body))
}

/// Read and classify a trace file
pub fn read_trace_file(path: impl AsRef<Path>) -> Result<Vec<TraceEvent>, ParseError> {
    let path = path.as_ref();
    debug!("Reading trace from: {}", path.display());

    let text = fs::read_to_string(path)?;
    let records = parse_trace_document(&text)?;
    classify_events(&records)
}

/// Read a type dump into a registry
pub fn read_types_file(path: impl AsRef<Path>) -> Result<TypeRegistry, ParseError> {
    let path = path.as_ref();
    debug!("Reading types from: {}", path.display());

    let text = fs::read_to_string(path)?;
    TypeRegistry::from_json_str(&text)
}

/// Find the trace/types pairs written into a trace directory
///
/// Uses `legacy.json` when present (build mode, one pair per project),
/// otherwise the single `trace.json`/`types.json` pair.
///
/// # Errors
/// * `ParseError::IoError` - Directory or legacy file unreadable
/// * `ParseError::InvalidFormat` - No trace files found
pub fn find_trace_pairs(dir: impl AsRef<Path>) -> Result<Vec<TracePair>, ParseError> {
    let dir = dir.as_ref();
    let legacy_path = dir.join(LEGACY_FILE_NAME);

    if legacy_path.is_file() {
        let text = fs::read_to_string(&legacy_path)?;
        let legend: Vec<LegendEntry> = serde_json::from_str(&text)?;
        info!("Found {} trace pairs in {}", legend.len(), legacy_path.display());

        return Ok(legend
            .into_iter()
            .map(|entry| TracePair {
                config_file_path: entry.config_file_path,
                trace_path: dir.join(entry.trace_path),
                types_path: dir.join(entry.types_path),
            })
            .collect());
    }

    let trace_path = dir.join(TRACE_FILE_NAME);
    let types_path = dir.join(TYPES_FILE_NAME);
    if !trace_path.is_file() || !types_path.is_file() {
        return Err(ParseError::InvalidFormat(format!(
            "No {} or {}/{} found in {}",
            LEGACY_FILE_NAME,
            TRACE_FILE_NAME,
            TYPES_FILE_NAME,
            dir.display()
        )));
    }

    Ok(vec![TracePair {
        config_file_path: None,
        trace_path,
        types_path,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array_document() {
        let records = parse_trace_document(r#"[{"ph":"M"},{"ph":"B"}]"#).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_container_document() {
        let records = parse_trace_document(r#"{"traceEvents":[{"ph":"M"}]}"#).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_repair_truncated_document() {
        let text = "[\n{\"ph\":\"M\"},\n{\"ph\":\"B\"},\n";
        let records = parse_trace_document(text).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_repair_not_applied_to_complete_document() {
        assert_eq!(repair_truncated_array("[1, 2]\n"), None);
        assert_eq!(repair_truncated_array("{\"a\": 1}"), None);
    }

    #[test]
    fn test_scalar_document_rejected() {
        assert!(matches!(
            parse_trace_document("42"),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_find_single_pair() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TRACE_FILE_NAME), "[]").unwrap();
        fs::write(dir.path().join(TYPES_FILE_NAME), "[]").unwrap();

        let pairs = find_trace_pairs(dir.path()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].trace_path, dir.path().join(TRACE_FILE_NAME));
    }

    #[test]
    fn test_find_legacy_pairs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(LEGACY_FILE_NAME),
            r#"[{"configFilePath":"/p/a/tsconfig.json","tracePath":"trace.1.json","typesPath":"types.1.json"},
                {"tracePath":"trace.2.json","typesPath":"types.2.json"}]"#,
        )
        .unwrap();

        let pairs = find_trace_pairs(dir.path()).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].config_file_path.as_deref(), Some("/p/a/tsconfig.json"));
        assert_eq!(pairs[1].types_path, dir.path().join("types.2.json"));
    }

    #[test]
    fn test_find_pairs_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_trace_pairs(dir.path()).is_err());
    }
}
