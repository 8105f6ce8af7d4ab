//! Build the pruned span hierarchy.
//!
//! Spans are visited in start order against an explicit ancestor stack.
//! A span enters the tree only when it is significant: slower than the
//! absolute threshold, or a large enough share of its parent.

use super::spans::{EventSpan, SpanEvent, SpanParseResult};
use crate::utils::config::AnalyzeTraceOptions;
use crate::utils::error::AnalysisError;
use log::debug;

/// Index of a span inside a [`SpanTree`]
pub type SpanId = usize;

/// Arena of admitted spans; index 0 is the synthetic root
#[derive(Debug, Clone)]
pub struct SpanTree<'a> {
    nodes: Vec<EventSpan<'a>>,
    dropped: usize,
}

impl<'a> SpanTree<'a> {
    pub const ROOT: SpanId = 0;

    pub fn root(&self) -> &EventSpan<'a> {
        &self.nodes[Self::ROOT]
    }

    pub fn node(&self, id: SpanId) -> &EventSpan<'a> {
        &self.nodes[id]
    }

    pub fn children(&self, id: SpanId) -> &[SpanId] {
        &self.nodes[id].children
    }

    /// Admitted spans, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Spans that failed both admission thresholds
    pub fn dropped_count(&self) -> usize {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpanId, &EventSpan<'a>)> {
        self.nodes.iter().enumerate()
    }
}

/// Build the span tree
///
/// **Public** - Second stage of the analysis pipeline
///
/// # Arguments
/// * `parsed` - Output of span reconstruction
/// * `options` - Admission thresholds
///
/// # Errors
/// * `AnalysisError::Config` - Options are inconsistent; nothing is built
pub fn build_span_tree<'a>(
    parsed: SpanParseResult<'a>,
    options: &AnalyzeTraceOptions,
) -> Result<SpanTree<'a>, AnalysisError> {
    options.validate()?;

    let SpanParseResult {
        first_span_start,
        last_span_end,
        mut spans,
        unclosed_stack,
    } = parsed;

    for event in unclosed_stack.iter().rev() {
        spans.push(EventSpan::new(
            SpanEvent::Event(event),
            event.ts,
            last_span_end.max(event.ts),
        ));
    }

    spans.sort_by(|a, b| {
        a.start
            .total_cmp(&b.start)
            .then_with(|| b.duration.total_cmp(&a.duration))
    });

    let force_micros = options.force_micros();
    let min_share = options.min_span_parent_percentage;

    let mut nodes = Vec::with_capacity(spans.len() + 1);
    nodes.push(EventSpan::new(SpanEvent::Root, first_span_start, last_span_end));
    let mut ancestors: Vec<SpanId> = vec![SpanTree::ROOT];
    let mut dropped = 0;

    for mut span in spans {
        while ancestors.len() > 1 {
            let top = ancestors[ancestors.len() - 1];
            if nodes[top].end > span.start {
                break;
            }
            ancestors.pop();
        }

        let parent = ancestors[ancestors.len() - 1];
        let parent_end = nodes[parent].end;
        if span.end > parent_end {
            span.end = parent_end.max(span.start);
            span.duration = span.end - span.start;
        }

        let significant =
            span.duration >= force_micros || span.duration >= nodes[parent].duration * min_share;
        if !significant {
            dropped += 1;
            continue;
        }

        let id = nodes.len();
        nodes.push(span);
        nodes[parent].children.push(id);
        ancestors.push(id);
    }

    debug!(
        "Span tree holds {} spans, {} dropped as insignificant",
        nodes.len() - 1,
        dropped
    );

    Ok(SpanTree { nodes, dropped })
}
