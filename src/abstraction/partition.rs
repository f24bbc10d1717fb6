//! The precise-operator partition: the one algorithm shared by initial
//! decomposition and by lazy Action/ActionSupport construction.
//!
//! Given an iterable of items and an operator mapping each item to a
//! `PolytopeUnion`, this associates every maximal sub-region with exactly
//! the subset of items whose operator-image covers it. Both the predicate
//! decomposition (`items` = predicates, `op` = `p -> X ∩ p`) and the Action
//! construction (`items` = reachable states, `op` = `ActionPolytope`)
//! depend on this same associativity property, so it lives here once
//! rather than being reimplemented at each call site.

use crate::error::Result;
use crate::polytope::union::PolytopeUnion;

/// One maximal sub-region of the space being partitioned, tagged with the
/// items whose operator-image covers it.
#[derive(Clone, Debug)]
pub struct Part<T> {
    pub region: PolytopeUnion,
    pub items: Vec<T>,
}

/// Sweep `items` through `op`, building the precise-operator partition.
///
/// For each item: compute `remaining = op(item)`. For every existing part,
/// intersect `remaining` with the part's region; if the intersection is
/// non-empty, either fold the item into the part (if the part's region is
/// wholly consumed) or split the part into a shrunk remainder plus a new
/// part covering the common region, tagged with the old part's items plus
/// this one. Subtract the common region from `remaining` as we go. Any
/// leftover `remaining` becomes a fresh part for this item alone. New parts
/// are queued and only appended after the full sweep over existing parts,
/// so an item is never re-tested against a part it just created.
pub fn precise_partition<T, F>(items: impl IntoIterator<Item = T>, mut op: F) -> Result<Vec<Part<T>>>
where
    T: Clone,
    F: FnMut(&T) -> Result<PolytopeUnion>,
{
    let mut parts: Vec<Part<T>> = Vec::new();
    for item in items {
        let mut remaining = op(&item)?;
        let mut queued: Vec<Part<T>> = Vec::new();
        for part in parts.iter_mut() {
            if remaining.is_empty() {
                break;
            }
            let common = remaining.intersect(&part.region)?;
            if common.is_empty() {
                continue;
            }
            let not_common = PolytopeUnion::remove(&part.region, &common)?;
            if not_common.is_empty() {
                part.items.push(item.clone());
            } else {
                part.region = not_common;
                let mut new_items = part.items.clone();
                new_items.push(item.clone());
                queued.push(Part {
                    region: common.clone(),
                    items: new_items,
                });
            }
            remaining = PolytopeUnion::remove(&remaining, &common)?;
        }
        if !remaining.is_empty() {
            queued.push(Part {
                region: remaining,
                items: vec![item],
            });
        }
        parts.extend(queued);
    }
    Ok(parts)
}
