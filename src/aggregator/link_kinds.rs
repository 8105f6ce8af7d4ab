//! Aggregate statistics over the relationship fields of the type registry.
//!
//! Each relationship kind is accumulated independently: how many types carry
//! the field, how many distinct types it points at, and how many edges it
//! contributes in total.

use crate::parser::schema::{LinkCount, LinkKindData, LinkKindSummary};
use crate::parser::types::{LinkKind, TypeId, TypeRegistry};
use log::debug;
use std::collections::HashMap;

/// Running totals for one relationship kind
#[derive(Debug, Default)]
struct LinkKindAccumulator {
    data: LinkKindData,
    /// Target id -> number of distinct sources pointing at it
    targets: HashMap<TypeId, usize>,
}

impl LinkKindAccumulator {
    fn add(&mut self, ids: &[TypeId]) {
        self.data.by_source.count += 1;
        self.data.by_source.max = self.data.by_source.max.max(ids.len());
        self.data.link_count += ids.len();

        let mut distinct = ids.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        for target in distinct {
            *self.targets.entry(target).or_default() += 1;
        }
    }

    fn finish(self) -> LinkKindData {
        LinkKindData {
            by_target: LinkCount {
                count: self.targets.len(),
                max: self.targets.values().copied().max().unwrap_or(0),
            },
            ..self.data
        }
    }
}

/// Statistics for a single relationship kind
///
/// **Public** - used by the `types` command and tests
///
/// # Example
/// ```ignore
/// let unions = compute_link_kind_data(&registry, LinkKind::UnionTypes);
/// println!("{} union types", unions.by_source.count);
/// ```
pub fn compute_link_kind_data(registry: &TypeRegistry, kind: LinkKind) -> LinkKindData {
    let mut accumulator = LinkKindAccumulator::default();
    for ty in registry.iter() {
        if let Some(ids) = ty.link(kind) {
            accumulator.add(ids);
        }
    }
    accumulator.finish()
}

/// Statistics for every relationship kind, keyed by field name
///
/// Every kind is present, in `LinkKind::ALL` order, even when no type
/// carries it. The registry is read once.
pub fn summarize_link_kinds(registry: &TypeRegistry) -> LinkKindSummary {
    let mut accumulators: HashMap<LinkKind, LinkKindAccumulator> = HashMap::new();

    for ty in registry.iter() {
        for (kind, ids) in ty.links() {
            accumulators.entry(kind).or_default().add(ids);
        }
    }

    debug!(
        "Aggregated {} relationship kinds over {} types",
        accumulators.len(),
        registry.len()
    );

    LinkKind::ALL
        .iter()
        .map(|&kind| {
            let data = accumulators
                .remove(&kind)
                .map(LinkKindAccumulator::finish)
                .unwrap_or_default();
            (kind.as_str().to_string(), data)
        })
        .collect()
}
