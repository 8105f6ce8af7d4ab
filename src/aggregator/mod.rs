//! Aggregation of trace events into spans, hot spots and type statistics.
//!
//! This module transforms classified trace events into:
//! - Timed spans (begin/end pairs and complete events)
//! - A pruned span tree (significant spans only)
//! - The hot-spot hierarchy, with implicated types expanded
//! - Per-relationship statistics over the type registry

pub mod hot_spots;
pub mod hot_types;
pub mod link_kinds;
pub mod span_tree;
pub mod spans;

// Re-export main types and functions
pub use hot_spots::{extract_hot_spots, HotSpotExtractor};
pub use hot_types::{resolve_hot_type, resolve_hot_types};
pub use link_kinds::{compute_link_kind_data, summarize_link_kinds};
pub use span_tree::{build_span_tree, SpanId, SpanTree};
pub use spans::{reconstruct_spans, EventSpan, SpanEvent, SpanParseResult};
