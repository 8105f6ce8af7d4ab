//! Promote interesting spans into the hot-spot hierarchy.
//!
//! The walk is post-order over the pruned span tree. Spans for file checks,
//! type comparisons, variance computation and expression checks become
//! [`HotSpot`]s. Every other span is transparent: its hot spots are spliced
//! into its parent's list where the span itself would have been.

use super::hot_types::resolve_hot_types;
use super::span_tree::{SpanId, SpanTree};
use super::spans::EventSpan;
use crate::parser::events::{EventKind, NodeArgs, TraceEvent};
use crate::parser::schema::{HotSpot, HotType, SourceRange};
use crate::parser::source_map::SourceFileCache;
use crate::parser::types::TypeRegistry;
use crate::utils::config::AnalyzeTraceOptions;
use crate::utils::error::AnalysisError;
use crate::utils::paths::normalize_path;
use log::debug;

/// What a promoted span contributes besides its timing and children
#[derive(Debug)]
struct Promotion {
    description: String,
    path: Option<String>,
    range: Option<SourceRange>,
    types: Option<Vec<HotType>>,
}

/// Pending node of the post-order walk
struct Frame<'a> {
    id: SpanId,
    current_file: Option<&'a str>,
    children: Vec<SpanId>,
    next: usize,
    collected: Vec<HotSpot>,
}

impl<'a> Frame<'a> {
    fn new(tree: &SpanTree<'a>, id: SpanId, inherited_file: Option<&'a str>) -> Self {
        let current_file = tree
            .node(id)
            .trace_event()
            .filter(|event| event.is_check())
            .and_then(TraceEvent::path)
            .or(inherited_file);

        let mut children = tree.children(id).to_vec();
        children.sort_by(|&a, &b| tree.node(b).duration.total_cmp(&tree.node(a).duration));

        Self {
            id,
            current_file,
            children,
            next: 0,
            collected: Vec::new(),
        }
    }
}

/// Walks one span tree and builds its hot spots
pub struct HotSpotExtractor<'t, 'a> {
    tree: &'t SpanTree<'a>,
    registry: &'t TypeRegistry,
    expand_types: bool,
    sources: SourceFileCache,
}

impl<'t, 'a> HotSpotExtractor<'t, 'a> {
    pub fn new(
        tree: &'t SpanTree<'a>,
        registry: &'t TypeRegistry,
        options: &AnalyzeTraceOptions,
    ) -> Self {
        Self {
            tree,
            registry,
            expand_types: options.expand_types,
            sources: SourceFileCache::new(),
        }
    }

    /// Hot spots directly under the root, slowest first
    pub fn extract(mut self) -> Result<Vec<HotSpot>, AnalysisError> {
        let tree = self.tree;
        let mut stack = vec![Frame::new(tree, SpanTree::ROOT, None)];

        while let Some(mut frame) = stack.pop() {
            if let Some(&child) = frame.children.get(frame.next) {
                frame.next += 1;
                let inherited = frame.current_file;
                stack.push(frame);
                stack.push(Frame::new(tree, child, inherited));
                continue;
            }

            let span = tree.node(frame.id);
            let produced = match span.trace_event() {
                None => frame.collected,
                Some(event) => match self.promote(event, frame.current_file)? {
                    Some(promotion) => vec![hot_spot(span, promotion, frame.collected)],
                    None => frame.collected,
                },
            };

            match stack.last_mut() {
                Some(parent) => parent.collected.extend(produced),
                None => return Ok(produced),
            }
        }

        Ok(Vec::new())
    }

    fn promote(
        &mut self,
        event: &TraceEvent,
        current_file: Option<&str>,
    ) -> Result<Option<Promotion>, AnalysisError> {
        let promotion = match &event.kind {
            EventKind::CheckSourceFile(args) => {
                let path = normalize_path(&args.path);
                Promotion {
                    description: format!("Check file {}", path),
                    path: Some(path),
                    range: None,
                    types: None,
                }
            }
            EventKind::StructuredTypeRelatedTo(args) => Promotion {
                description: format!("Compare types {} and {}", args.source_id, args.target_id),
                path: None,
                range: None,
                types: Some(resolve_hot_types(
                    self.registry,
                    &[args.source_id, args.target_id],
                    self.expand_types,
                )?),
            },
            EventKind::GetVariancesWorker(args) => Promotion {
                description: format!("Determine variance of type {}", args.id),
                path: None,
                range: None,
                types: Some(resolve_hot_types(self.registry, &[args.id], self.expand_types)?),
            },
            EventKind::CheckExpression(args) => {
                self.node_promotion("Check expression", args, current_file)
            }
            EventKind::CheckVariableDeclaration(args) => {
                self.node_promotion("Check variable declaration", args, current_file)
            }
            _ => return Ok(None),
        };

        Ok(Some(promotion))
    }

    fn node_promotion(
        &mut self,
        label: &str,
        args: &NodeArgs,
        current_file: Option<&str>,
    ) -> Promotion {
        let path = args.path.as_deref().or(current_file).map(normalize_path);
        let range = path
            .as_deref()
            .and_then(|path| self.sources.node_range(path, args.pos, args.end));

        let description = match range {
            Some(range) => format!(
                "{} from (line {}, char {}) to (line {}, char {})",
                label, range.start.line, range.start.character, range.end.line, range.end.character
            ),
            None => format!("{} from offset {} to offset {}", label, args.pos, args.end),
        };

        Promotion {
            description,
            path,
            range,
            types: None,
        }
    }
}

fn hot_spot(span: &EventSpan<'_>, promotion: Promotion, children: Vec<HotSpot>) -> HotSpot {
    HotSpot {
        description: promotion.description,
        start: span.start,
        end: span.end,
        duration: span.duration,
        path: promotion.path,
        range: promotion.range,
        types: promotion.types,
        children,
    }
}

/// Extract the hot-spot hierarchy of a span tree
///
/// **Public** - Third stage of the analysis pipeline
///
/// # Errors
/// * `AnalysisError::TypeNotFound` - A promoted span references a type id
///   missing from the registry
pub fn extract_hot_spots(
    tree: &SpanTree<'_>,
    registry: &TypeRegistry,
    options: &AnalyzeTraceOptions,
) -> Result<Vec<HotSpot>, AnalysisError> {
    let hot_spots = HotSpotExtractor::new(tree, registry, options).extract()?;
    debug!("Extracted {} top-level hot spots", hot_spots.len());
    Ok(hot_spots)
}
