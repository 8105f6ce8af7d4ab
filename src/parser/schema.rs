//! Output JSON schema definitions for analysis results.
//!
//! This module defines the structure of JSON files we write to disk.
//! Schema is versioned to allow future evolution.

use super::events::TraceEvent;
use super::types::{LineChar, ResolvedType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Package name -> distinct install directories, in first-seen order
pub type NodeModulePaths = IndexMap<String, Vec<String>>;

/// Link kind name -> aggregate statistics, in `LinkKind::ALL` order
pub type LinkKindSummary = IndexMap<String, LinkKindData>;

/// Top-level artifact written next to the trace files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Timestamp when the report was generated
    pub generated_at: String,

    /// Project the trace belongs to (build mode only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file_path: Option<String>,

    pub trace_path: String,
    pub types_path: String,

    #[serde(flatten)]
    pub result: AnalyzeTraceResult,
}

/// Everything one analysis run derives from a trace/types pair
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeTraceResult {
    pub node_module_paths: NodeModulePaths,

    /// Begin events never closed, outermost first
    pub unterminated_events: Vec<TraceEvent>,

    pub hot_spots: Vec<HotSpot>,

    pub duplicate_packages: Vec<DuplicatedPackage>,
}

/// A span promoted into the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotSpot {
    pub description: String,

    /// Microseconds, same clock as the trace
    pub start: f64,
    pub end: f64,
    pub duration: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Source range of a checked expression or declaration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<HotType>>,

    /// Slowest first
    pub children: Vec<HotSpot>,
}

impl HotSpot {
    pub fn duration_millis(&self) -> f64 {
        self.duration / 1000.0
    }
}

/// 1-based start/end positions inside a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: LineChar,
    pub end: LineChar,
}

/// A type implicated in a hot spot, with its relations expanded
///
/// A type already on the path from the root appears with no children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotType {
    pub resolved_type: ResolvedType,
    pub children: Vec<HotType>,
}

/// A package installed at more than one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatedPackage {
    pub name: String,
    pub instances: Vec<PackageInstance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInstance {
    pub path: String,
    pub version: String,
}

/// Aggregate statistics for one relationship field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkKindData {
    pub by_source: LinkCount,
    pub by_target: LinkCount,
    pub link_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkCount {
    pub count: usize,
    pub max: usize,
}
