//! Expand type ids into [`HotType`] trees.
//!
//! Every relationship field of a type contributes children. Walks are
//! iterative; a type that already appears on the path from the root is
//! emitted as a leaf so self-referential and mutually recursive types
//! terminate.

use crate::parser::schema::HotType;
use crate::parser::types::{ResolvedType, TypeId, TypeRegistry};
use crate::utils::error::AnalysisError;
use std::collections::HashSet;

impl HotType {
    /// A type with no expanded relations
    pub fn leaf(resolved_type: &ResolvedType) -> Self {
        Self {
            resolved_type: resolved_type.clone(),
            children: Vec::new(),
        }
    }
}

/// Partially expanded node of the walk; `ty` is `None` for the sink that
/// collects the requested roots
struct Frame<'r> {
    ty: Option<&'r ResolvedType>,
    child_ids: Vec<TypeId>,
    next: usize,
    children: Vec<HotType>,
}

impl<'r> Frame<'r> {
    fn expanding(ty: &'r ResolvedType) -> Self {
        let child_ids: Vec<TypeId> = ty
            .links()
            .into_iter()
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        Self {
            ty: Some(ty),
            children: Vec::with_capacity(child_ids.len()),
            child_ids,
            next: 0,
        }
    }
}

/// Resolve each id into a [`HotType`], in order
///
/// With `expand` unset the returned types have no children.
///
/// # Errors
/// * `AnalysisError::TypeNotFound` - An id (root or related) is not in the
///   registry. The `-1` placeholder id always resolves.
///
/// # Example
/// ```ignore
/// let types = resolve_hot_types(&registry, &[source_id, target_id], true)?;
/// ```
pub fn resolve_hot_types(
    registry: &TypeRegistry,
    ids: &[TypeId],
    expand: bool,
) -> Result<Vec<HotType>, AnalysisError> {
    let mut stack = vec![Frame {
        ty: None,
        child_ids: ids.to_vec(),
        next: 0,
        children: Vec::with_capacity(ids.len()),
    }];
    let mut on_path: HashSet<TypeId> = HashSet::new();

    while let Some(mut frame) = stack.pop() {
        if let Some(&child_id) = frame.child_ids.get(frame.next) {
            frame.next += 1;
            let child = registry.resolve(child_id)?;

            if expand && on_path.insert(child.id) {
                stack.push(frame);
                stack.push(Frame::expanding(child));
            } else {
                frame.children.push(HotType::leaf(child));
                stack.push(frame);
            }
            continue;
        }

        match (frame.ty, stack.last_mut()) {
            (Some(ty), Some(parent)) => {
                on_path.remove(&ty.id);
                parent.children.push(HotType {
                    resolved_type: ty.clone(),
                    children: frame.children,
                });
            }
            _ => return Ok(frame.children),
        }
    }

    Ok(Vec::new())
}

/// Resolve a single id; see [`resolve_hot_types`]
pub fn resolve_hot_type(
    registry: &TypeRegistry,
    id: TypeId,
    expand: bool,
) -> Result<HotType, AnalysisError> {
    resolve_hot_types(registry, &[id], expand)?
        .pop()
        .ok_or(AnalysisError::TypeNotFound(id))
}
