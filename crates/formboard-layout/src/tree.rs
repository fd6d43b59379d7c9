#![forbid(unsafe_code)]

//! The component geometry tree and relative layout propagation.
//!
//! [`ComponentTree`] is an id-keyed arena owning every [`ComponentNode`].
//! It doubles as the hit-testing registry: nodes are registered on
//! [`ComponentTree::insert`] and purged on [`ComponentTree::remove`], so the
//! id→node index is ownership-scoped rather than ambient global state.
//!
//! # Coordinate spaces
//!
//! Every node's `frame` is expressed in its parent's local space, in design
//! units. Scene (root-space) coordinates are derived by summing ancestor
//! frame origins; see [`ComponentTree::scene_origin`] and
//! [`ComponentTree::world_to_local`].
//!
//! # Invariants
//!
//! 1. The node graph is a tree: attach always detaches from the prior parent
//!    first, and attaching a node under its own descendant is rejected.
//! 2. A node with unset relative geometry is never touched by the
//!    propagator; its frame is caller-controlled.
//! 3. Once relative geometry is set it is the source of truth: the frame is
//!    recomputed as `parent.size * relative` whenever the parent's box
//!    changes.
//! 4. When both relative position and size are set, the position is clamped
//!    so the far edge stays inside the parent (`x ≤ 1 − w`, `y ≤ 1 − h`).
//! 5. The propagator visits a node's children only when that node's own
//!    frame actually changed, so a pass never reads its own output as input
//!    and always terminates.

use std::collections::VecDeque;
use std::fmt;

use formboard_core::geometry::{Point, Rect, Size};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::region::Region;

/// Stable identifier for components.
///
/// Globally unique within a tree and stable across save/load; the join key
/// between live nodes and persisted layout records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Create a new id.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for ComponentId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Interaction mode of the whole tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Components can be moved, resized, and reparented.
    Design,
    /// The tree is fixed and behaves as ordinary UI.
    #[default]
    Use,
}

/// Fractional geometry relative to the parent's box.
///
/// `None` means unset: the node is not governed by relative layout and its
/// absolute frame is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RelativeGeometry {
    /// Fraction of the parent's box for the top-left corner, in `[0, 1]`.
    pub position: Option<(f64, f64)>,
    /// Fraction of the parent's box for the extent, in `[0, 1]`.
    pub size: Option<(f64, f64)>,
}

impl RelativeGeometry {
    /// Whether neither position nor size is governed by relative layout.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.position.is_none() && self.size.is_none()
    }
}

/// One entry in the layout tree: an identified region with a parent-local
/// frame, relative geometry, and an ordered child list.
///
/// Child order is insertion order and is used only for z-order (later
/// children render and hit-test on top), never for semantics.
pub struct ComponentNode {
    id: ComponentId,
    region: Box<dyn Region>,
    parent: Option<ComponentId>,
    children: Vec<ComponentId>,
    frame: Rect,
    relative: RelativeGeometry,
}

impl ComponentNode {
    fn new(id: ComponentId, region: Box<dyn Region>) -> Self {
        Self {
            id,
            region,
            parent: None,
            children: Vec::new(),
            frame: Rect::ZERO,
            relative: RelativeGeometry::default(),
        }
    }

    /// The node's id.
    #[must_use]
    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    /// The parent id, or `None` for the root and detached nodes.
    #[must_use]
    pub fn parent(&self) -> Option<&ComponentId> {
        self.parent.as_ref()
    }

    /// Child ids in z-order (back to front).
    #[must_use]
    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    /// Parent-local frame in design units.
    #[must_use]
    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// The node's fractional geometry.
    #[must_use]
    pub fn relative(&self) -> RelativeGeometry {
        self.relative
    }

    /// The host widget's region.
    #[must_use]
    pub fn region(&self) -> &dyn Region {
        &*self.region
    }
}

/// The component tree: registry, structure, and layout in one place.
pub struct ComponentTree {
    nodes: FxHashMap<ComponentId, ComponentNode>,
    root: ComponentId,
    mode: Mode,
}

impl ComponentTree {
    /// Create a tree whose root owns the given region and frame.
    ///
    /// The root must be able to host children.
    pub fn new(
        id: ComponentId,
        region: Box<dyn Region>,
        frame: Rect,
    ) -> Result<Self, LayoutError> {
        if !region.can_host_children() {
            return Err(LayoutError::InvalidContainer { id });
        }
        let mut node = ComponentNode::new(id.clone(), region);
        node.frame = frame;
        let mut nodes = FxHashMap::default();
        nodes.insert(id.clone(), node);
        Ok(Self {
            nodes,
            root: id,
            mode: Mode::Use,
        })
    }

    /// Register a new, detached component.
    pub fn insert(&mut self, id: ComponentId, region: Box<dyn Region>) -> Result<(), LayoutError> {
        if self.nodes.contains_key(&id) {
            return Err(LayoutError::DuplicateId { id });
        }
        self.nodes.insert(id.clone(), ComponentNode::new(id, region));
        Ok(())
    }

    /// The root id.
    #[must_use]
    pub fn root(&self) -> &ComponentId {
        &self.root
    }

    /// Current interaction mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of registered components, attached or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the registry is empty (never true: the root is permanent).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a component with this id is registered.
    #[must_use]
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: &ComponentId) -> Option<&ComponentNode> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's region, for host-side wiring.
    pub fn region_mut(&mut self, id: &ComponentId) -> Result<&mut dyn Region, LayoutError> {
        let node = self.get_mut(id)?;
        Ok(&mut *node.region)
    }

    fn get(&self, id: &ComponentId) -> Result<&ComponentNode, LayoutError> {
        self.nodes
            .get(id)
            .ok_or_else(|| LayoutError::UnknownId { id: id.clone() })
    }

    fn get_mut(&mut self, id: &ComponentId) -> Result<&mut ComponentNode, LayoutError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| LayoutError::UnknownId { id: id.clone() })
    }

    // -----------------------------------------------------------------
    // Structure
    // -----------------------------------------------------------------

    /// Attach `child` under `parent`, detaching it from any prior parent
    /// first.
    ///
    /// Fails with [`LayoutError::InvalidContainer`] when the parent's region
    /// cannot host children and [`LayoutError::CycleRejected`] when the
    /// attachment would make the child an ancestor of itself. On success,
    /// relative geometry (if set) is immediately recomputed against the new
    /// parent's current box, and in design mode the attached subtree is told
    /// to become interactive along with the rest of the tree.
    pub fn attach(&mut self, parent: &ComponentId, child: &ComponentId) -> Result<(), LayoutError> {
        self.get(parent)?;
        self.get(child)?;
        if child == &self.root || parent == child || self.is_descendant(parent, child) {
            return Err(LayoutError::CycleRejected {
                source: child.clone(),
                destination: parent.clone(),
            });
        }
        if !self.get(parent)?.region.can_host_children() {
            return Err(LayoutError::InvalidContainer { id: parent.clone() });
        }

        self.detach(child)?;

        self.get_mut(parent)?.children.push(child.clone());
        self.get_mut(child)?.parent = Some(parent.clone());
        tracing::debug!(child = %child, parent = %parent, "attached component");

        if !self.get(child)?.relative.is_unset() {
            self.refresh_from_parent(child);
        }
        if self.mode == Mode::Design {
            self.notify_subtree_mode(child, true);
        }
        Ok(())
    }

    /// Detach `child` from its parent, if it has one.
    ///
    /// The frame is left as last computed: a detached node keeps its
    /// on-screen box until re-attached or removed.
    pub fn detach(&mut self, child: &ComponentId) -> Result<(), LayoutError> {
        let node = self.get(child)?;
        let Some(parent_id) = node.parent.clone() else {
            return Ok(());
        };
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.retain(|c| c != child);
        }
        self.get_mut(child)?.parent = None;
        tracing::debug!(child = %child, parent = %parent_id, "detached component");
        if self.mode == Mode::Design {
            self.notify_subtree_mode(child, false);
        }
        Ok(())
    }

    /// Detach `id` and purge it and its whole subtree from the registry.
    ///
    /// The root cannot be removed.
    pub fn remove(&mut self, id: &ComponentId) -> Result<(), LayoutError> {
        if id == &self.root {
            return Err(LayoutError::DetachedNode { id: id.clone() });
        }
        self.detach(id)?;
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
            }
        }
        tracing::debug!(id = %id, "removed component subtree");
        Ok(())
    }

    /// Whether `node` lies strictly below `ancestor` in the tree.
    #[must_use]
    pub fn is_descendant(&self, node: &ComponentId, ancestor: &ComponentId) -> bool {
        let mut current = self.nodes.get(node).and_then(|n| n.parent.as_ref());
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent.as_ref());
        }
        false
    }

    // -----------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------

    /// Place the node's frame directly, in parent-local design units.
    ///
    /// Relative geometry is left untouched; this is the live-feedback path
    /// used mid-gesture. Descendants reflow when the frame actually changed.
    pub fn set_frame(&mut self, id: &ComponentId, frame: Rect) -> Result<(), LayoutError> {
        let node = self.get_mut(id)?;
        if frame.approx_eq(node.frame) {
            return Ok(());
        }
        node.frame = frame;
        node.region.frame_changed(frame);
        self.propagate(id);
        Ok(())
    }

    /// Resize the root's box and reflow every relative descendant.
    pub fn resize_root(&mut self, size: Size) {
        let root = self.root.clone();
        let frame = match self.nodes.get(&root) {
            Some(node) => node.frame,
            None => return,
        };
        let resized = Rect::from_origin_size(frame.origin(), size);
        // Root always exists; ignore the impossible lookup failure.
        let _ = self.set_frame(&root, resized);
    }

    /// Reflow the whole tree from the root's current box.
    pub fn relayout(&mut self) {
        let root = self.root.clone();
        self.propagate(&root);
    }

    /// Set fractional position, clamped to keep the node inside its parent.
    ///
    /// If attached, the frame is recomputed immediately and the node's own
    /// children reflow.
    pub fn set_relative_position(
        &mut self,
        id: &ComponentId,
        x: f64,
        y: f64,
    ) -> Result<(), LayoutError> {
        let node = self.get_mut(id)?;
        let (max_x, max_y) = match node.relative.size {
            Some((w, h)) => (1.0 - w, 1.0 - h),
            None => (1.0, 1.0),
        };
        node.relative.position = Some((x.clamp(0.0, max_x), y.clamp(0.0, max_y)));
        self.refresh_from_parent(id);
        Ok(())
    }

    /// Set fractional size, clamped to `[0, 1]`, re-clamping any stored
    /// position so the far edge stays inside the parent.
    pub fn set_relative_size(
        &mut self,
        id: &ComponentId,
        w: f64,
        h: f64,
    ) -> Result<(), LayoutError> {
        let node = self.get_mut(id)?;
        let w = w.clamp(0.0, 1.0);
        let h = h.clamp(0.0, 1.0);
        node.relative.size = Some((w, h));
        if let Some((x, y)) = node.relative.position {
            node.relative.position = Some((x.min(1.0 - w), y.min(1.0 - h)));
        }
        self.refresh_from_parent(id);
        Ok(())
    }

    /// Set fractional position and size in one call.
    pub fn set_relative_geometry(
        &mut self,
        id: &ComponentId,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    ) -> Result<(), LayoutError> {
        self.set_relative_size(id, w, h)?;
        self.set_relative_position(id, x, y)
    }

    /// Scene-space origin of the node (sum of ancestor frame origins).
    pub fn scene_origin(&self, id: &ComponentId) -> Result<Point, LayoutError> {
        let mut node = self.get(id)?;
        let mut origin = node.frame.origin();
        while let Some(parent_id) = &node.parent {
            node = self.get(parent_id)?;
            origin = origin.translate(node.frame.x, node.frame.y);
        }
        Ok(origin)
    }

    /// The node's frame expressed in scene space.
    pub fn world_rect(&self, id: &ComponentId) -> Result<Rect, LayoutError> {
        let origin = self.scene_origin(id)?;
        Ok(self.get(id)?.frame.with_origin(origin))
    }

    /// Convert a scene point into the node's local space.
    pub fn world_to_local(&self, id: &ComponentId, point: Point) -> Result<Point, LayoutError> {
        let origin = self.scene_origin(id)?;
        Ok(Point::new(point.x - origin.x, point.y - origin.y))
    }

    /// Move an attached node so its top-left corner lands on a scene point.
    pub fn place_in_world(&mut self, id: &ComponentId, position: Point) -> Result<(), LayoutError> {
        let node = self.get(id)?;
        let Some(parent_id) = node.parent.clone() else {
            return Err(LayoutError::DetachedNode { id: id.clone() });
        };
        let local = self.world_to_local(&parent_id, position)?;
        let frame = self.get(id)?.frame.with_origin(local);
        self.set_frame(id, frame)
    }

    /// The deepest node whose box contains the scene point.
    ///
    /// Later-inserted (topmost) siblings win at each level; `None` when the
    /// point misses the root's box entirely. Gestures use this so they act
    /// on the true topmost visual target rather than whichever region
    /// happened to capture the event.
    #[must_use]
    pub fn find_deepest_at(&self, point: Point) -> Option<ComponentId> {
        self.descend(&self.root, point, Point::ZERO)
    }

    fn descend(&self, id: &ComponentId, point: Point, parent_origin: Point) -> Option<ComponentId> {
        let node = self.nodes.get(id)?;
        let scene_rect = node.frame.translate(parent_origin.x, parent_origin.y);
        if !scene_rect.contains(point) {
            return None;
        }
        let origin = scene_rect.origin();
        for child in node.children.iter().rev() {
            if let Some(found) = self.descend(child, point, origin) {
                return Some(found);
            }
        }
        Some(id.clone())
    }

    // -----------------------------------------------------------------
    // Modes
    // -----------------------------------------------------------------

    /// Switch the tree into design mode (gestures active).
    pub fn enter_design_mode(&mut self) {
        self.set_mode(Mode::Design);
    }

    /// Switch the tree into use mode (fixed, ordinary UI).
    pub fn exit_design_mode(&mut self) {
        self.set_mode(Mode::Use);
    }

    /// Set the interaction mode, notifying every attached region on change.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        tracing::debug!(?mode, "switched tree mode");
        let root = self.root.clone();
        self.notify_subtree_mode(&root, mode == Mode::Design);
    }

    fn notify_subtree_mode(&mut self, id: &ComponentId, active: bool) {
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(&current) {
                node.region.design_mode_changed(active);
                stack.extend(node.children.iter().cloned());
            }
        }
    }

    // -----------------------------------------------------------------
    // Propagation
    // -----------------------------------------------------------------

    /// Recompute the frame of an attached node from its relative geometry
    /// and the parent's current box, then reflow its own children.
    fn refresh_from_parent(&mut self, id: &ComponentId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let Some(parent_id) = node.parent.clone() else {
            return;
        };
        let Some(parent) = self.nodes.get(&parent_id) else {
            return;
        };
        let frame = relative_frame(node.frame, node.relative, parent.frame.size());
        // id was just looked up; the frame write cannot fail.
        let _ = self.set_frame(id, frame);
    }

    /// One explicit top-down pass: recompute every directly
    /// relative-governed child of each node whose box changed.
    ///
    /// A child re-enters the worklist only when its own frame actually
    /// changed, so no node ever reads its own output as input in the same
    /// pass and the walk terminates on any tree.
    fn propagate(&mut self, start: &ComponentId) {
        let mut queue: VecDeque<ComponentId> = VecDeque::new();
        queue.push_back(start.clone());
        while let Some(parent_id) = queue.pop_front() {
            let Some(parent) = self.nodes.get(&parent_id) else {
                continue;
            };
            let parent_size = parent.frame.size();
            let children = parent.children.clone();
            for child_id in children {
                let Some(child) = self.nodes.get_mut(&child_id) else {
                    continue;
                };
                if child.relative.is_unset() {
                    continue;
                }
                let frame = relative_frame(child.frame, child.relative, parent_size);
                if !frame.approx_eq(child.frame) {
                    child.frame = frame;
                    child.region.frame_changed(frame);
                    queue.push_back(child_id);
                }
            }
        }
    }
}

/// Frame derived from relative geometry against a parent extent; axes with
/// unset relative values keep their current absolute value.
fn relative_frame(current: Rect, relative: RelativeGeometry, parent: Size) -> Rect {
    let mut frame = current;
    if let Some((rx, ry)) = relative.position {
        frame.x = parent.width * rx;
        frame.y = parent.height * ry;
    }
    if let Some((rw, rh)) = relative.size {
        frame.width = parent.width * rw;
        frame.height = parent.height * rh;
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{Panel, Surface};
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn id(raw: &str) -> ComponentId {
        ComponentId::from(raw)
    }

    fn tree() -> ComponentTree {
        ComponentTree::new(
            id("root"),
            Box::new(Panel),
            Rect::from_size(800.0, 600.0),
        )
        .expect("root panel is a container")
    }

    fn insert_panel(tree: &mut ComponentTree, raw: &str) -> ComponentId {
        let cid = id(raw);
        tree.insert(cid.clone(), Box::new(Panel)).expect("fresh id");
        cid
    }

    fn insert_surface(tree: &mut ComponentTree, raw: &str) -> ComponentId {
        let cid = id(raw);
        tree.insert(cid.clone(), Box::new(Surface))
            .expect("fresh id");
        cid
    }

    #[test]
    fn attach_detach_postconditions() {
        let mut t = tree();
        let child = insert_panel(&mut t, "child");
        t.attach(&id("root"), &child).expect("attach");

        let node = t.node(&child).expect("registered");
        assert_eq!(node.parent(), Some(&id("root")));
        let count = t
            .node(&id("root"))
            .expect("root")
            .children()
            .iter()
            .filter(|c| **c == child)
            .count();
        assert_eq!(count, 1);

        t.detach(&child).expect("detach");
        assert_eq!(t.node(&child).expect("still registered").parent(), None);
        assert!(!t.node(&id("root")).expect("root").children().contains(&child));
    }

    #[test]
    fn attach_detaches_from_prior_parent_first() {
        let mut t = tree();
        let a = insert_panel(&mut t, "a");
        let b = insert_panel(&mut t, "b");
        let child = insert_panel(&mut t, "child");
        t.attach(&id("root"), &a).expect("attach a");
        t.attach(&id("root"), &b).expect("attach b");
        t.attach(&a, &child).expect("attach child under a");

        t.attach(&b, &child).expect("attach child under b");
        assert!(!t.node(&a).expect("a").children().contains(&child));
        assert!(t.node(&b).expect("b").children().contains(&child));
        assert_eq!(t.node(&child).expect("child").parent(), Some(&b));
    }

    #[test]
    fn attach_rejects_leaf_destination() {
        let mut t = tree();
        let leaf = insert_surface(&mut t, "leaf");
        let other = insert_panel(&mut t, "other");
        t.attach(&id("root"), &leaf).expect("leaves attach fine");

        let err = t.attach(&leaf, &other).expect_err("leaf cannot host");
        assert!(matches!(err, LayoutError::InvalidContainer { .. }));
        assert_eq!(t.node(&other).expect("other").parent(), None);
    }

    #[test]
    fn attach_rejects_cycles() {
        let mut t = tree();
        let a = insert_panel(&mut t, "a");
        let b = insert_panel(&mut t, "b");
        t.attach(&id("root"), &a).expect("attach a");
        t.attach(&a, &b).expect("attach b");

        let err = t.attach(&b, &a).expect_err("a under its own descendant");
        assert!(matches!(err, LayoutError::CycleRejected { .. }));
        assert_eq!(t.node(&a).expect("a").parent(), Some(&id("root")));
        assert_eq!(t.node(&b).expect("b").parent(), Some(&a));

        let err = t.attach(&a, &a).expect_err("self attach");
        assert!(matches!(err, LayoutError::CycleRejected { .. }));
    }

    #[test]
    fn relative_reflow_follows_root_resize() {
        let mut t = tree();
        let child = insert_panel(&mut t, "child");
        t.attach(&id("root"), &child).expect("attach");
        t.set_relative_size(&child, 0.5, 0.5).expect("size");
        t.set_relative_position(&child, 0.1, 0.1).expect("position");

        assert!(t
            .node(&child)
            .expect("child")
            .frame()
            .approx_eq(Rect::new(80.0, 60.0, 400.0, 300.0)));

        t.resize_root(Size::new(400.0, 300.0));
        assert!(t
            .node(&child)
            .expect("child")
            .frame()
            .approx_eq(Rect::new(40.0, 30.0, 200.0, 150.0)));
    }

    #[test]
    fn reflow_cascades_through_deep_subtrees() {
        let mut t = tree();
        let mid = insert_panel(&mut t, "mid");
        let leaf = insert_surface(&mut t, "leaf");
        t.attach(&id("root"), &mid).expect("attach mid");
        t.attach(&mid, &leaf).expect("attach leaf");
        t.set_relative_size(&mid, 0.5, 0.5).expect("mid size");
        t.set_relative_position(&mid, 0.0, 0.0).expect("mid pos");
        t.set_relative_size(&leaf, 0.5, 0.5).expect("leaf size");
        t.set_relative_position(&leaf, 0.5, 0.5).expect("leaf pos");

        t.resize_root(Size::new(400.0, 400.0));
        // mid: 200×200 at origin; leaf: half of mid, anchored at its center.
        assert!(t
            .node(&leaf)
            .expect("leaf")
            .frame()
            .approx_eq(Rect::new(100.0, 100.0, 100.0, 100.0)));
    }

    #[test]
    fn unset_relative_geometry_is_never_overwritten() {
        let mut t = tree();
        let child = insert_panel(&mut t, "child");
        t.attach(&id("root"), &child).expect("attach");
        t.set_frame(&child, Rect::new(5.0, 6.0, 70.0, 80.0))
            .expect("frame");

        t.resize_root(Size::new(1600.0, 1200.0));
        assert!(t
            .node(&child)
            .expect("child")
            .frame()
            .approx_eq(Rect::new(5.0, 6.0, 70.0, 80.0)));
        assert!(t.node(&child).expect("child").relative().is_unset());
    }

    #[test]
    fn position_is_clamped_against_size() {
        let mut t = tree();
        let child = insert_panel(&mut t, "child");
        t.attach(&id("root"), &child).expect("attach");

        t.set_relative_size(&child, 0.6, 0.6).expect("size");
        t.set_relative_position(&child, 0.9, 0.9).expect("position");
        let rel = t.node(&child).expect("child").relative();
        let (x, y) = rel.position.expect("position set");
        assert!((x - 0.4).abs() < 1e-9);
        assert!((y - 0.4).abs() < 1e-9);

        // Growing the size afterwards re-clamps the stored position.
        t.set_relative_size(&child, 0.8, 0.8).expect("size");
        let (x, y) = t
            .node(&child)
            .expect("child")
            .relative()
            .position
            .expect("position set");
        assert!((x - 0.2).abs() < 1e-9);
        assert!((y - 0.2).abs() < 1e-9);
    }

    #[test]
    fn find_deepest_prefers_nested_and_topmost() {
        let mut t = tree();
        let back = insert_panel(&mut t, "back");
        let front = insert_panel(&mut t, "front");
        let inner = insert_surface(&mut t, "inner");
        t.attach(&id("root"), &back).expect("attach back");
        t.attach(&id("root"), &front).expect("attach front");
        t.attach(&front, &inner).expect("attach inner");

        // back and front overlap; front is later, so it wins the overlap.
        t.set_frame(&back, Rect::new(0.0, 0.0, 400.0, 400.0))
            .expect("frame");
        t.set_frame(&front, Rect::new(100.0, 100.0, 400.0, 400.0))
            .expect("frame");
        t.set_frame(&inner, Rect::new(50.0, 50.0, 100.0, 100.0))
            .expect("frame");

        assert_eq!(
            t.find_deepest_at(Point::new(50.0, 50.0)),
            Some(back.clone())
        );
        assert_eq!(
            t.find_deepest_at(Point::new(120.0, 120.0)),
            Some(front.clone())
        );
        // (200, 200) lands inside inner (scene box 150..250).
        assert_eq!(t.find_deepest_at(Point::new(200.0, 200.0)), Some(inner));
        // A point inside the root but outside every child hits the root.
        assert_eq!(
            t.find_deepest_at(Point::new(700.0, 50.0)),
            Some(id("root"))
        );
        // A point off the root's box misses entirely.
        assert_eq!(t.find_deepest_at(Point::new(900.0, 50.0)), None);
    }

    #[test]
    fn detached_node_keeps_its_last_frame() {
        let mut t = tree();
        let child = insert_panel(&mut t, "child");
        t.attach(&id("root"), &child).expect("attach");
        t.set_frame(&child, Rect::new(10.0, 20.0, 30.0, 40.0))
            .expect("frame");

        t.detach(&child).expect("detach");
        assert!(t
            .node(&child)
            .expect("child")
            .frame()
            .approx_eq(Rect::new(10.0, 20.0, 30.0, 40.0)));
    }

    #[test]
    fn world_round_trip() {
        let mut t = tree();
        let outer = insert_panel(&mut t, "outer");
        let inner = insert_panel(&mut t, "inner");
        t.attach(&id("root"), &outer).expect("attach outer");
        t.attach(&outer, &inner).expect("attach inner");
        t.set_frame(&outer, Rect::new(100.0, 50.0, 300.0, 300.0))
            .expect("frame");
        t.set_frame(&inner, Rect::new(25.0, 30.0, 100.0, 100.0))
            .expect("frame");

        assert!(t
            .world_rect(&inner)
            .expect("attached")
            .approx_eq(Rect::new(125.0, 80.0, 100.0, 100.0)));
        let local = t
            .world_to_local(&inner, Point::new(150.0, 100.0))
            .expect("attached");
        assert!(local.approx_eq(Point::new(25.0, 20.0)));

        t.place_in_world(&inner, Point::new(200.0, 200.0))
            .expect("place");
        assert!(t
            .world_rect(&inner)
            .expect("attached")
            .approx_eq(Rect::new(200.0, 200.0, 100.0, 100.0)));
    }

    #[derive(Clone, Default)]
    struct Probe {
        design: Rc<Cell<bool>>,
        frame_events: Rc<Cell<u32>>,
    }

    impl Region for Probe {
        fn can_host_children(&self) -> bool {
            true
        }
        fn frame_changed(&mut self, _frame: Rect) {
            self.frame_events.set(self.frame_events.get() + 1);
        }
        fn design_mode_changed(&mut self, active: bool) {
            self.design.set(active);
        }
    }

    #[test]
    fn design_mode_reaches_attached_subtrees() {
        let mut t = tree();
        let probe = Probe::default();
        let observed = probe.clone();
        let child = id("child");
        t.insert(child.clone(), Box::new(probe)).expect("insert");

        t.enter_design_mode();
        // Detached: not part of the interactive tree yet.
        assert!(!observed.design.get());

        t.attach(&id("root"), &child).expect("attach");
        assert!(observed.design.get());

        t.detach(&child).expect("detach");
        assert!(!observed.design.get());

        t.attach(&id("root"), &child).expect("attach");
        t.exit_design_mode();
        assert!(!observed.design.get());
    }

    #[test]
    fn unchanged_frame_does_not_renotify() {
        let mut t = tree();
        let probe = Probe::default();
        let observed = probe.clone();
        let child = id("child");
        t.insert(child.clone(), Box::new(probe)).expect("insert");
        t.attach(&id("root"), &child).expect("attach");

        t.set_frame(&child, Rect::new(1.0, 2.0, 3.0, 4.0))
            .expect("frame");
        let after_first = observed.frame_events.get();
        t.set_frame(&child, Rect::new(1.0, 2.0, 3.0, 4.0))
            .expect("frame");
        assert_eq!(observed.frame_events.get(), after_first);
    }

    proptest! {
        #[test]
        fn propagation_invariant_under_root_resize(
            width in 1.0f64..4000.0,
            height in 1.0f64..4000.0,
            rx in 0.0f64..1.0,
            ry in 0.0f64..1.0,
            rw in 0.0f64..1.0,
            rh in 0.0f64..1.0,
        ) {
            let mut t = tree();
            let child = insert_panel(&mut t, "child");
            t.attach(&id("root"), &child).expect("attach");
            t.set_relative_size(&child, rw, rh).expect("size");
            t.set_relative_position(&child, rx, ry).expect("position");

            t.resize_root(Size::new(width, height));

            let node = t.node(&child).expect("child");
            let rel = node.relative();
            let (px, py) = rel.position.expect("set");
            let (pw, ph) = rel.size.expect("set");
            let frame = node.frame();
            prop_assert!((frame.x - width * px).abs() < 1e-6);
            prop_assert!((frame.y - height * py).abs() < 1e-6);
            prop_assert!((frame.width - width * pw).abs() < 1e-6);
            prop_assert!((frame.height - height * ph).abs() < 1e-6);
        }
    }
}
