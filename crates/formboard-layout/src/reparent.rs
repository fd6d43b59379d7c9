#![forbid(unsafe_code)]

//! Two-click reparenting: pick a node, pick its new parent.
//!
//! The operator arms the controller (hosts bind this to a modal key), then
//! two successive picks select the node to move and its destination. The
//! moved node keeps its on-screen place: its world box is re-expressed in
//! the destination's local space and converted to fractions of the
//! destination's box before attach.
//!
//! Validation order: destination must differ from the source, must be able
//! to host children ([`LayoutError::InvalidContainer`], reported to the
//! operator), and must not be a descendant of the source
//! ([`LayoutError::CycleRejected`]). Any failure aborts with the tree
//! unchanged.

use formboard_core::geometry::Point;

use crate::error::LayoutError;
use crate::tree::{ComponentId, ComponentTree};

/// Result of a completed reparent, for host logging/undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReparentOutcome {
    /// The node that moved.
    pub moved: ComponentId,
    /// Its previous parent.
    pub from: ComponentId,
    /// Its new parent.
    pub to: ComponentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    AwaitSource,
    AwaitDestination {
        source: ComponentId,
    },
}

/// The two-pick reparent protocol.
#[derive(Debug, Default)]
pub struct ReparentController {
    phase: Phase,
}

impl ReparentController {
    /// Create an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the protocol: the next pick selects the node to move.
    pub fn begin(&mut self) {
        self.phase = Phase::AwaitSource;
    }

    /// Abort the protocol without touching the tree.
    pub fn cancel(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Whether a pick is currently expected.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Feed one pick (a primary click in scene coordinates).
    ///
    /// Returns `Ok(Some(..))` when the second pick completes a reparent.
    /// A pick that misses every node, hits the root as source, or selects
    /// the source as its own destination cancels the protocol silently.
    pub fn pick(
        &mut self,
        tree: &mut ComponentTree,
        point: Point,
    ) -> Result<Option<ReparentOutcome>, LayoutError> {
        match std::mem::take(&mut self.phase) {
            Phase::Idle => Ok(None),
            Phase::AwaitSource => {
                let Some(source) = tree.find_deepest_at(point) else {
                    return Ok(None);
                };
                if &source == tree.root() {
                    return Ok(None);
                }
                self.phase = Phase::AwaitDestination { source };
                Ok(None)
            }
            Phase::AwaitDestination { source } => {
                let Some(destination) = tree.find_deepest_at(point) else {
                    return Ok(None);
                };
                if destination == source {
                    return Ok(None);
                }
                reparent(tree, &source, &destination).map(Some)
            }
        }
    }
}

/// Move `source` under `destination`, preserving its on-screen box.
///
/// Usable directly by hosts that select nodes by other means than picking.
pub fn reparent(
    tree: &mut ComponentTree,
    source: &ComponentId,
    destination: &ComponentId,
) -> Result<ReparentOutcome, LayoutError> {
    if destination == source {
        return Err(LayoutError::CycleRejected {
            source: source.clone(),
            destination: destination.clone(),
        });
    }
    let dest_node = tree
        .node(destination)
        .ok_or_else(|| LayoutError::UnknownId {
            id: destination.clone(),
        })?;
    if !dest_node.region().can_host_children() {
        tracing::warn!(destination = %destination, "reparent destination cannot host children");
        return Err(LayoutError::InvalidContainer {
            id: destination.clone(),
        });
    }
    if tree.is_descendant(destination, source) {
        tracing::warn!(source = %source, destination = %destination, "reparent would create a cycle");
        return Err(LayoutError::CycleRejected {
            source: source.clone(),
            destination: destination.clone(),
        });
    }
    let source_node = tree.node(source).ok_or_else(|| LayoutError::UnknownId {
        id: source.clone(),
    })?;
    let Some(old_parent) = source_node.parent().cloned() else {
        return Err(LayoutError::DetachedNode { id: source.clone() });
    };

    // The destination may not have seen a layout pass yet; force one before
    // reading its box.
    if tree.world_rect(destination)?.is_degenerate() {
        tree.relayout();
    }
    let dest_rect = tree.world_rect(destination)?;
    let source_rect = tree.world_rect(source)?;

    let (rx, ry, rw, rh) = if dest_rect.is_degenerate() {
        (0.0, 0.0, 0.0, 0.0)
    } else {
        (
            (source_rect.x - dest_rect.x) / dest_rect.width,
            (source_rect.y - dest_rect.y) / dest_rect.height,
            source_rect.width / dest_rect.width,
            source_rect.height / dest_rect.height,
        )
    };

    tree.attach(destination, source)?;
    tree.set_relative_size(source, rw, rh)?;
    tree.set_relative_position(source, rx, ry)?;

    tracing::debug!(moved = %source, from = %old_parent, to = %destination, "reparented component");
    Ok(ReparentOutcome {
        moved: source.clone(),
        from: old_parent,
        to: destination.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{Panel, Surface};
    use formboard_core::geometry::Rect;

    fn id(raw: &str) -> ComponentId {
        ComponentId::from(raw)
    }

    /// Root 800×600 holding panels `b` (200,0,400,600) and `a` (0,0,400,600)
    /// with `child` (250,50,100,100) under `a`. `a` is attached after `b`,
    /// so it wins hit-tests where the two overlap.
    fn picking_tree() -> ComponentTree {
        let mut t = ComponentTree::new(
            id("root"),
            Box::new(Panel),
            Rect::from_size(800.0, 600.0),
        )
        .expect("root panel");
        for raw in ["a", "b", "child"] {
            t.insert(id(raw), Box::new(Panel)).expect("fresh id");
        }
        t.attach(&id("root"), &id("b")).expect("attach b");
        t.attach(&id("root"), &id("a")).expect("attach a");
        t.attach(&id("a"), &id("child")).expect("attach child");
        t.set_frame(&id("a"), Rect::new(0.0, 0.0, 400.0, 600.0))
            .expect("frame");
        t.set_frame(&id("b"), Rect::new(200.0, 0.0, 400.0, 600.0))
            .expect("frame");
        t.set_frame(&id("child"), Rect::new(250.0, 50.0, 100.0, 100.0))
            .expect("frame");
        t
    }

    #[test]
    fn reparent_preserves_on_screen_box() {
        let mut t = picking_tree();
        let before = t.world_rect(&id("child")).expect("attached");

        let outcome = reparent(&mut t, &id("child"), &id("b")).expect("reparent");
        assert_eq!(outcome.from, id("a"));
        assert_eq!(outcome.to, id("b"));
        assert_eq!(t.node(&id("child")).expect("child").parent(), Some(&id("b")));

        let after = t.world_rect(&id("child")).expect("attached");
        assert!(after.approx_eq(before));

        let rel = t.node(&id("child")).expect("child").relative();
        let (rx, ry) = rel.position.expect("set");
        assert!((rx - 50.0 / 400.0).abs() < 1e-9);
        assert!((ry - 50.0 / 600.0).abs() < 1e-9);
        let (rw, rh) = rel.size.expect("set");
        assert!((rw - 100.0 / 400.0).abs() < 1e-9);
        assert!((rh - 100.0 / 600.0).abs() < 1e-9);
    }

    #[test]
    fn cycle_is_rejected_and_tree_unchanged() {
        let mut t = picking_tree();

        let err = reparent(&mut t, &id("a"), &id("child")).expect_err("cycle");
        assert!(matches!(err, LayoutError::CycleRejected { .. }));
        assert_eq!(t.node(&id("a")).expect("a").parent(), Some(&id("root")));
        assert_eq!(t.node(&id("child")).expect("child").parent(), Some(&id("a")));
    }

    #[test]
    fn leaf_destination_is_rejected() {
        let mut t = picking_tree();
        t.insert(id("leaf"), Box::new(Surface)).expect("fresh id");
        t.attach(&id("root"), &id("leaf")).expect("attach leaf");

        let err = reparent(&mut t, &id("child"), &id("leaf")).expect_err("leaf");
        assert!(matches!(err, LayoutError::InvalidContainer { .. }));
        assert_eq!(t.node(&id("child")).expect("child").parent(), Some(&id("a")));
    }

    #[test]
    fn two_pick_protocol_moves_the_child() {
        let mut t = picking_tree();
        let mut rc = ReparentController::new();

        // Not armed: picks are ignored.
        assert!(rc
            .pick(&mut t, Point::new(300.0, 100.0))
            .expect("idle pick")
            .is_none());

        rc.begin();
        assert!(rc.is_active());
        // First pick lands on the child (topmost at that point).
        assert!(rc
            .pick(&mut t, Point::new(300.0, 100.0))
            .expect("source pick")
            .is_none());
        // Second pick lands on b, clear of the child's box.
        let outcome = rc
            .pick(&mut t, Point::new(500.0, 400.0))
            .expect("destination pick")
            .expect("completed");
        assert_eq!(outcome.moved, id("child"));
        assert_eq!(outcome.to, id("b"));
        assert!(!rc.is_active());
    }

    #[test]
    fn picking_the_source_as_destination_cancels() {
        let mut t = picking_tree();
        let mut rc = ReparentController::new();
        rc.begin();
        rc.pick(&mut t, Point::new(300.0, 100.0)).expect("source");
        let outcome = rc
            .pick(&mut t, Point::new(300.0, 100.0))
            .expect("same pick");
        assert!(outcome.is_none());
        assert!(!rc.is_active());
        assert_eq!(t.node(&id("child")).expect("child").parent(), Some(&id("a")));
    }

    #[test]
    fn picking_the_root_as_source_cancels() {
        let mut t = picking_tree();
        let mut rc = ReparentController::new();
        rc.begin();
        // (700, 500) is inside the root but outside a, b, and child.
        rc.pick(&mut t, Point::new(700.0, 550.0)).expect("pick");
        assert!(!rc.is_active());
    }

    #[test]
    fn zero_sized_destination_yields_zero_fractions() {
        let mut t = picking_tree();
        t.insert(id("empty"), Box::new(Panel)).expect("fresh id");
        t.attach(&id("root"), &id("empty")).expect("attach");

        let outcome = reparent(&mut t, &id("child"), &id("empty")).expect("reparent");
        assert_eq!(outcome.to, id("empty"));
        let rel = t.node(&id("child")).expect("child").relative();
        assert_eq!(rel.position, Some((0.0, 0.0)));
        assert_eq!(rel.size, Some((0.0, 0.0)));
    }
}
