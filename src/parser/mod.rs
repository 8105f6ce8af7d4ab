//! Trace parsing and schema definitions.
//!
//! This module handles:
//! - Loading trace and type dump documents
//! - Classifying trace records into typed events
//! - Building the type registry
//! - Defining output schema

pub mod events;
pub mod schema;
pub mod source_map;
pub mod trace;
pub mod types;

// Re-export main types
pub use events::{classify_event, classify_events, EventKind, InstantScope, Phase, TraceEvent};
pub use schema::{
    AnalyzeTraceResult, DuplicatedPackage, HotSpot, HotType, LinkKindData, LinkKindSummary,
    NodeModulePaths, PackageInstance, TraceReport,
};
pub use trace::{find_trace_pairs, parse_trace_document, read_trace_file, read_types_file, TracePair};
pub use types::{LinkKind, ResolvedType, TypeId, TypeRegistry};
