//! Reconstruct timed spans from the classified event stream.
//!
//! Three lifetime encodings produce spans:
//! - `B` ... `E` pairs, matched through an explicit stack of open begins
//! - `X` events, which carry their own duration
//! - begins still open when the stream ends (reported, then closed by the
//!   tree builder at the end of the trace)
//!
//! Instant and metadata events never produce spans.

use crate::parser::events::{Phase, TraceEvent};
use crate::utils::error::AnalysisError;
use log::{debug, warn};

/// What a span stands for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpanEvent<'a> {
    /// Synthetic span covering the whole trace
    Root,
    Event(&'a TraceEvent),
}

/// A reconstructed time interval, in microseconds
#[derive(Debug, Clone, PartialEq)]
pub struct EventSpan<'a> {
    pub event: SpanEvent<'a>,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    /// Indices into the owning span tree; empty until the tree is built
    pub children: Vec<usize>,
}

impl<'a> EventSpan<'a> {
    pub fn new(event: SpanEvent<'a>, start: f64, end: f64) -> Self {
        let end = end.max(start);
        Self {
            event,
            start,
            end,
            duration: end - start,
            children: Vec::new(),
        }
    }

    pub fn trace_event(&self) -> Option<&'a TraceEvent> {
        match self.event {
            SpanEvent::Root => None,
            SpanEvent::Event(event) => Some(event),
        }
    }
}

/// Output of span reconstruction
#[derive(Debug, Clone)]
pub struct SpanParseResult<'a> {
    pub first_span_start: f64,
    pub last_span_end: f64,
    /// Completed spans, in completion order
    pub spans: Vec<EventSpan<'a>>,
    /// Begin events never matched by an end, in push order
    pub unclosed_stack: Vec<&'a TraceEvent>,
}

impl<'a> SpanParseResult<'a> {
    /// Unclosed begins, outermost first
    pub fn unterminated_events(&self) -> impl Iterator<Item = &'a TraceEvent> + '_ {
        self.unclosed_stack.iter().copied()
    }
}

/// Pair begin/end events and collect complete events into spans
///
/// # Errors
/// * `AnalysisError::UnmatchedEnd` - An `E` record arrived with no open begin
pub fn reconstruct_spans(events: &[TraceEvent]) -> Result<SpanParseResult<'_>, AnalysisError> {
    let mut spans = Vec::new();
    let mut unclosed_stack: Vec<&TraceEvent> = Vec::new();

    for (index, event) in events.iter().enumerate() {
        match event.phase {
            Phase::Begin => unclosed_stack.push(event),
            Phase::End => {
                let begin = unclosed_stack.pop().ok_or_else(|| AnalysisError::UnmatchedEnd {
                    index,
                    name: event.name().to_string(),
                    ts: event.ts,
                })?;
                if begin.name() != event.name() {
                    debug!(
                        "Record {}: end of '{}' closes begin of '{}'",
                        index,
                        event.name(),
                        begin.name()
                    );
                }
                spans.push(EventSpan::new(SpanEvent::Event(begin), begin.ts, event.ts));
            }
            Phase::Complete => {
                let dur = event.dur.unwrap_or(0.0).max(0.0);
                spans.push(EventSpan::new(SpanEvent::Event(event), event.ts, event.ts + dur));
            }
            Phase::Instant | Phase::Metadata => {}
        }
    }

    let mut first_span_start = f64::INFINITY;
    let mut last_span_end = f64::NEG_INFINITY;
    for span in &spans {
        first_span_start = first_span_start.min(span.start);
        last_span_end = last_span_end.max(span.end);
    }

    for event in &unclosed_stack {
        warn!(
            "Unterminated event '{}' began at {}us: {}",
            event.name(),
            event.ts,
            serde_json::to_string(&event.kind).unwrap_or_default()
        );
        first_span_start = first_span_start.min(event.ts);
        last_span_end = last_span_end.max(event.ts);
    }

    if spans.is_empty() && unclosed_stack.is_empty() {
        first_span_start = 0.0;
        last_span_end = 0.0;
    }

    debug!(
        "Reconstructed {} spans ({} unterminated) over [{}, {}]",
        spans.len(),
        unclosed_stack.len(),
        first_span_start,
        last_span_end
    );

    Ok(SpanParseResult {
        first_span_start,
        last_span_end,
        spans,
        unclosed_stack,
    })
}
