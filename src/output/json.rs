//! JSON artifact writer and reader.
//!
//! Writes analysis reports and type summaries as pretty-printed JSON.

use crate::parser::schema::TraceReport;
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Write an analysis report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `report` - Report to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
///
/// # Example
/// ```ignore
/// let report = build_report(&pair, result);
/// write_report(&report, "trace.analysis.json")?;
/// ```
pub fn write_report(report: &TraceReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing analysis report to: {}", output_path.display());

    write_json(report, output_path)?;

    info!(
        "Report written successfully ({} bytes)",
        calculate_file_size(output_path)
    );
    Ok(())
}

/// Write any serializable value as pretty JSON, creating parent directories
///
/// **Public** - shared by the report and type summary writers
pub fn write_json<T: Serialize + ?Sized>(
    value: &T,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, value).map_err(OutputError::SerializationFailed)?;
    writer.write_all(b"\n").map_err(OutputError::WriteFailed)?;
    writer.flush().map_err(OutputError::WriteFailed)?;

    Ok(())
}

/// Serialize a value to a pretty JSON string
///
/// **Public** - used when printing to stdout
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String, OutputError> {
    serde_json::to_string_pretty(value).map_err(OutputError::SerializationFailed)
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Deserialize without serde_json's nesting limit
///
/// Expanded type trees nest two levels per type and outgrow the default
/// limit of 128 on long alias chains. The stack grows as nesting deepens.
fn from_reader_unbounded<T, R>(reader: R) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    deserializer.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    Ok(value)
}

/// Read an analysis report from a JSON file
///
/// **Public** - used by the `validate` command and tests
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_report(input_path: impl AsRef<Path>) -> Result<TraceReport, OutputError> {
    let input_path = input_path.as_ref();
    debug!("Reading report from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report = from_reader_unbounded::<TraceReport, _>(BufReader::new(file))
        .map_err(OutputError::SerializationFailed)?;

    debug!(
        "Report loaded: version {}, {} hot spots",
        report.version,
        report.result.hot_spots.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::{AnalyzeTraceResult, HotSpot, HotType};
    use crate::parser::types::ResolvedType;
    use tempfile::NamedTempFile;

    fn create_test_report() -> TraceReport {
        TraceReport {
            version: "1.0.0".to_string(),
            generated_at: "2024-01-01T00:00:00Z".to_string(),
            config_file_path: None,
            trace_path: "/t/trace.json".to_string(),
            types_path: "/t/types.json".to_string(),
            result: AnalyzeTraceResult {
                hot_spots: vec![HotSpot {
                    description: "Check file /a.ts".to_string(),
                    start: 0.0,
                    end: 1_000_000.0,
                    duration: 1_000_000.0,
                    path: Some("/a.ts".to_string()),
                    range: None,
                    types: None,
                    children: Vec::new(),
                }],
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_write_and_read_report() {
        let report = create_test_report();
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        write_report(&report, path).unwrap();
        let loaded = read_report(path).unwrap();

        assert_eq!(loaded.version, report.version);
        assert_eq!(loaded.trace_path, report.trace_path);
        assert_eq!(loaded.result.hot_spots, report.result.hot_spots);
    }

    #[test]
    fn test_report_uses_camel_case_keys() {
        let json = to_json_string(&create_test_report()).unwrap();

        assert!(json.contains("\"generatedAt\""));
        assert!(json.contains("\"hotSpots\""));
        assert!(json.contains("\"nodeModulePaths\""));
        assert!(json.contains("\"unterminatedEvents\""));
        assert!(json.contains("\"duplicatePackages\""));
        assert!(!json.contains("\"range\""));
        assert!(!json.contains("configFilePath"));
    }

    #[test]
    fn test_validate_output_path_empty() {
        let result = validate_output_path(Path::new(""));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_output_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = validate_output_path(temp_dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/report.json");

        write_report(&create_test_report(), &nested_path).unwrap();
        assert!(nested_path.exists());
    }

    fn alias_chain(depth: i64) -> HotType {
        let resolved = |id| ResolvedType {
            id,
            ..Default::default()
        };
        let mut hot_type = HotType::leaf(&resolved(depth));
        for id in (1..depth).rev() {
            hot_type = HotType {
                resolved_type: resolved(id),
                children: vec![hot_type],
            };
        }
        hot_type
    }

    #[test]
    fn test_read_report_with_deep_type_chain() {
        let mut report = create_test_report();
        report.result.hot_spots[0].types = Some(vec![alias_chain(200)]);
        let temp_file = NamedTempFile::new().unwrap();

        write_report(&report, temp_file.path()).unwrap();
        let loaded = read_report(temp_file.path()).unwrap();

        let mut depth = 0;
        let mut current = &loaded.result.hot_spots[0].types.as_ref().unwrap()[0];
        while let Some(child) = current.children.first() {
            current = child;
            depth += 1;
        }
        assert_eq!(depth, 199);
        assert_eq!(current.resolved_type.id, 200);
    }

    #[test]
    fn test_read_report_rejects_trailing_data() {
        let temp_file = NamedTempFile::new().unwrap();
        write_report(&create_test_report(), temp_file.path()).unwrap();
        let mut contents = std::fs::read_to_string(temp_file.path()).unwrap();
        contents.push_str("{}");
        std::fs::write(temp_file.path(), contents).unwrap();

        assert!(matches!(
            read_report(temp_file.path()),
            Err(OutputError::SerializationFailed(_))
        ));
    }
}
