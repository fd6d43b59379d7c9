#![forbid(unsafe_code)]

//! Layout persistence: a flat, order-independent list of geometry records.
//!
//! One [`LayoutRecord`] per node, joined by id/parent-id rather than tree
//! order. Exactly one record has a null parent id; its id must match the
//! live tree's root. Relative fields use a `-1.0` sentinel so files written
//! before fractional layout existed still load: missing fractions are
//! derived from the absolute fields divided by the parent's current box.
//!
//! Loading validates the whole record set *before* mutating anything, so a
//! fatal error ([`LayoutError::MissingNodeId`], [`LayoutError::MissingRoot`],
//! [`LayoutError::RootMismatch`], ...) leaves the previously displayed tree
//! intact instead of a half-applied one.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::tree::{ComponentId, ComponentTree};

/// Sentinel for relative fields that are not governed by relative layout.
pub const UNSET: f64 = -1.0;

fn unset() -> f64 {
    UNSET
}

/// One persisted row: a node's id, parent, and geometry.
///
/// Absolute fields are the parent-local frame in design units; relative
/// fields are fractions of the parent's box, [`UNSET`] when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRecord {
    pub id: ComponentId,
    #[serde(default)]
    pub parent_id: Option<ComponentId>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "unset")]
    pub relative_x: f64,
    #[serde(default = "unset")]
    pub relative_y: f64,
    #[serde(default = "unset")]
    pub relative_width: f64,
    #[serde(default = "unset")]
    pub relative_height: f64,
}

impl LayoutRecord {
    /// Whether both fractional position fields are present.
    #[must_use]
    pub fn has_relative_position(&self) -> bool {
        self.relative_x >= 0.0 && self.relative_y >= 0.0
    }

    /// Whether both fractional size fields are present.
    #[must_use]
    pub fn has_relative_size(&self) -> bool {
        self.relative_width >= 0.0 && self.relative_height >= 0.0
    }
}

/// Capture the attached tree as a flat record list, root first.
#[must_use]
pub fn snapshot(tree: &ComponentTree) -> Vec<LayoutRecord> {
    let mut records = Vec::with_capacity(tree.len());
    let mut stack = vec![tree.root().clone()];
    while let Some(id) = stack.pop() {
        let Some(node) = tree.node(&id) else {
            continue;
        };
        let frame = node.frame();
        let relative = node.relative();
        let (rx, ry) = relative.position.unwrap_or((UNSET, UNSET));
        let (rw, rh) = relative.size.unwrap_or((UNSET, UNSET));
        records.push(LayoutRecord {
            id: id.clone(),
            parent_id: node.parent().cloned(),
            x: frame.x,
            y: frame.y,
            width: frame.width,
            height: frame.height,
            relative_x: rx,
            relative_y: ry,
            relative_width: rw,
            relative_height: rh,
        });
        for child in node.children().iter().rev() {
            stack.push(child.clone());
        }
    }
    records
}

/// Apply a record list to a live tree whose nodes already exist.
///
/// The caller supplies the tree (it knows what the components are and do);
/// the records supply structure and geometry. Fatal errors are detected
/// before any mutation.
pub fn apply(tree: &mut ComponentTree, records: &[LayoutRecord]) -> Result<(), LayoutError> {
    let root_record = validate(tree, records)?;

    let mut children: FxHashMap<&ComponentId, Vec<&LayoutRecord>> = FxHashMap::default();
    for record in records {
        if let Some(parent_id) = &record.parent_id {
            children.entry(parent_id).or_default().push(record);
        }
    }

    // Walk parents before children so derived fractions always divide by an
    // already-applied parent box. Records unreachable from the root are
    // ignored, as the original loader did.
    let mut queue: VecDeque<&LayoutRecord> = VecDeque::new();
    queue.push_back(root_record);
    let mut applied = 0usize;
    while let Some(parent) = queue.pop_front() {
        let Some(kids) = children.get(&parent.id) else {
            continue;
        };
        for &record in kids {
            let parent_size = tree
                .node(&parent.id)
                .map(|node| node.frame().size())
                .unwrap_or_default();

            if record.has_relative_size() {
                tree.set_relative_size(&record.id, record.relative_width, record.relative_height)?;
            } else if !parent_size.is_degenerate() {
                tree.set_relative_size(
                    &record.id,
                    record.width / parent_size.width,
                    record.height / parent_size.height,
                )?;
            }
            if record.has_relative_position() {
                tree.set_relative_position(&record.id, record.relative_x, record.relative_y)?;
            } else if !parent_size.is_degenerate() {
                tree.set_relative_position(
                    &record.id,
                    record.x / parent_size.width,
                    record.y / parent_size.height,
                )?;
            }
            tree.attach(&parent.id, &record.id)?;
            applied += 1;
            queue.push_back(record);
        }
    }
    tracing::debug!(records = records.len(), applied, "applied layout records");
    Ok(())
}

/// Structural validation; returns the single root record.
fn validate<'a>(
    tree: &ComponentTree,
    records: &'a [LayoutRecord],
) -> Result<&'a LayoutRecord, LayoutError> {
    if records.is_empty() {
        return Err(LayoutError::EmptyLayout);
    }

    let mut seen: FxHashSet<&ComponentId> = FxHashSet::default();
    let mut root: Option<&LayoutRecord> = None;
    for record in records {
        if !seen.insert(&record.id) {
            return Err(LayoutError::DuplicateRecord {
                id: record.id.clone(),
            });
        }
        if !tree.contains(&record.id) {
            return Err(LayoutError::MissingNodeId {
                id: record.id.clone(),
            });
        }
        if record.parent_id.is_none() {
            if let Some(first) = root {
                return Err(LayoutError::MultipleRoots {
                    first: first.id.clone(),
                    second: record.id.clone(),
                });
            }
            root = Some(record);
        }
    }
    let root = root.ok_or(LayoutError::MissingRoot)?;
    if &root.id != tree.root() {
        return Err(LayoutError::RootMismatch {
            expected: tree.root().clone(),
            found: root.id.clone(),
        });
    }

    // Every node a record will be attached under must be able to host
    // children; checking up front keeps failed loads side-effect free.
    for record in records {
        let Some(parent_id) = &record.parent_id else {
            continue;
        };
        if !seen.contains(parent_id) {
            // Orphan subtree: never walked, never attached.
            continue;
        }
        let Some(parent) = tree.node(parent_id) else {
            continue;
        };
        if !parent.region().can_host_children() {
            return Err(LayoutError::InvalidContainer {
                id: parent_id.clone(),
            });
        }
    }
    Ok(root)
}

/// Write the attached tree to a geometry file as a JSON record list.
pub fn save(path: &Path, tree: &ComponentTree) -> Result<(), LayoutError> {
    let records = snapshot(tree);
    let json = serde_json::to_string_pretty(&records)?;
    fs::write(path, json)?;
    tracing::debug!(records = records.len(), path = %path.display(), "saved layout");
    Ok(())
}

/// Read a geometry file and apply it to the live tree.
pub fn load(path: &Path, tree: &mut ComponentTree) -> Result<(), LayoutError> {
    let json = fs::read_to_string(path)?;
    let records: Vec<LayoutRecord> = serde_json::from_str(&json)?;
    apply(tree, &records)?;
    tracing::debug!(records = records.len(), path = %path.display(), "loaded layout");
    Ok(())
}
