#![forbid(unsafe_code)]

//! Design-mode pointer gestures: drag to move, drag a corner to resize.
//!
//! [`GestureController`] is a stateful processor that converts raw
//! [`PointerEvent`]s into frame mutations on a [`ComponentTree`] and, on
//! release, into durable relative geometry.
//!
//! # State Machine
//!
//! `Idle → (press) → {Move, Resize(corner)} → (release) → Idle`
//!
//! - **Press** resolves the true topmost node under the pointer with
//!   [`ComponentTree::find_deepest_at`], classifies the press position
//!   against the four corner zones (corner beats move), and records the
//!   anchor point in the parent's local space together with the starting
//!   frame.
//! - **Drag** applies `start + delta` to the frame. Resize frames that
//!   would shrink either axis to the minimum or below are dropped; the
//!   previous valid frame stays on screen.
//! - **Release** converts the final frame into fractions of the parent's
//!   current box and stores them through the relative setters. This is the
//!   only durable write: in-flight drags touch the absolute frame only.
//!
//! # Invariants
//!
//! 1. At most one session is live per controller; a press while a session
//!    is active is ignored.
//! 2. Cosmetic feedback (parent highlight, target dim) applied on press is
//!    always reverted on release, whatever the outcome.
//! 3. Release always commits, even for a zero-delta click: an unchanged
//!    fraction write is the specified behavior, not an optimization target.

use formboard_core::event::{PointerEvent, PointerEventKind};
use formboard_core::geometry::{Point, Rect, Size};

use crate::region::GestureFeedback;
use crate::tree::{ComponentId, ComponentTree, Mode, RelativeGeometry};

/// Thresholds for gesture classification, in design units.
#[derive(Debug, Clone, Copy)]
pub struct GestureConfig {
    /// Corner zone thickness for resize classification (default: 8.0).
    pub corner_border: f64,
    /// Minimum width/height a resize may produce (default: 20.0).
    pub min_size: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            corner_border: 8.0,
            min_size: 20.0,
        }
    }
}

/// Which corner a resize gesture grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeCorner {
    /// Top-left.
    Nw,
    /// Top-right.
    Ne,
    /// Bottom-left.
    Sw,
    /// Bottom-right.
    Se,
}

/// What a gesture session is doing with its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureMode {
    /// Translating the frame, size unchanged.
    Move,
    /// Moving one or two edges from the given corner.
    Resize(ResizeCorner),
}

/// Result of a completed (released) gesture, for host logging/undo.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureOutcome {
    /// The node that was moved or resized.
    pub target: ComponentId,
    /// How it was manipulated.
    pub mode: GestureMode,
    /// Final parent-local frame at release time.
    pub frame: Rect,
    /// The relative geometry committed on release.
    pub relative: RelativeGeometry,
}

/// Ephemeral state of one press-drag-release interaction.
///
/// Constructed on press, consumed on release, never persisted. The parent
/// is captured at press time; gestures never reparent.
struct GestureSession {
    target: ComponentId,
    parent: ComponentId,
    mode: GestureMode,
    /// Anchor point in the parent's local space.
    anchor: Point,
    /// Target frame at press time, parent-local.
    start_frame: Rect,
}

/// Per-pointer-device gesture state machine.
#[derive(Default)]
pub struct GestureController {
    config: GestureConfig,
    session: Option<GestureSession>,
}

impl GestureController {
    /// Create a controller with the given thresholds.
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Current configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Whether a press-drag-release session is live.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Process one pointer event against the tree.
    ///
    /// Returns a [`GestureOutcome`] only when a release commits a gesture.
    /// Events are ignored entirely outside design mode.
    pub fn process(
        &mut self,
        tree: &mut ComponentTree,
        event: &PointerEvent,
    ) -> Option<GestureOutcome> {
        if tree.mode() != Mode::Design {
            return None;
        }
        match event.kind {
            PointerEventKind::Down(_) => {
                self.on_press(tree, event.position());
                None
            }
            PointerEventKind::Drag(_) => {
                self.on_drag(tree, event.position());
                None
            }
            PointerEventKind::Up(_) => self.on_release(tree),
            PointerEventKind::Moved => None,
        }
    }

    /// The node and corner zone under a scene point, for cursor feedback.
    ///
    /// `Some((id, None))` means the point is over the node's move area.
    #[must_use]
    pub fn corner_at(
        &self,
        tree: &ComponentTree,
        point: Point,
    ) -> Option<(ComponentId, Option<ResizeCorner>)> {
        let target = tree.find_deepest_at(point)?;
        if &target == tree.root() {
            return None;
        }
        let size = tree.node(&target)?.frame().size();
        let local = tree.world_to_local(&target, point).ok()?;
        Some((target, classify_corner(&self.config, size, local)))
    }

    fn on_press(&mut self, tree: &mut ComponentTree, point: Point) {
        if self.session.is_some() {
            return;
        }
        let Some(target) = tree.find_deepest_at(point) else {
            return;
        };
        if &target == tree.root() {
            return;
        }
        let Some(node) = tree.node(&target) else {
            return;
        };
        let Some(parent) = node.parent().cloned() else {
            return;
        };
        let start_frame = node.frame();
        let Ok(local) = tree.world_to_local(&target, point) else {
            return;
        };
        let Ok(anchor) = tree.world_to_local(&parent, point) else {
            return;
        };
        let mode = match classify_corner(&self.config, start_frame.size(), local) {
            Some(corner) => GestureMode::Resize(corner),
            None => GestureMode::Move,
        };

        if let Ok(region) = tree.region_mut(&parent) {
            region.gesture_feedback(GestureFeedback::Highlighted);
        }
        if let Ok(region) = tree.region_mut(&target) {
            region.gesture_feedback(GestureFeedback::Dimmed);
        }

        tracing::trace!(target = %target, ?mode, "gesture session started");
        self.session = Some(GestureSession {
            target,
            parent,
            mode,
            anchor,
            start_frame,
        });
    }

    fn on_drag(&mut self, tree: &mut ComponentTree, point: Point) {
        let Some(session) = &self.session else {
            return;
        };
        let Ok(current) = tree.world_to_local(&session.parent, point) else {
            return;
        };
        let (dx, dy) = current.delta(session.anchor);
        let start = session.start_frame;
        let frame = match session.mode {
            GestureMode::Move => start.translate(dx, dy),
            GestureMode::Resize(corner) => resize_frame(start, corner, dx, dy),
        };
        if matches!(session.mode, GestureMode::Resize(_))
            && !(frame.width > self.config.min_size && frame.height > self.config.min_size)
        {
            // Degenerate frame: drop this drag sample, keep the last valid one.
            return;
        }
        let target = session.target.clone();
        let _ = tree.set_frame(&target, frame);
    }

    fn on_release(&mut self, tree: &mut ComponentTree) -> Option<GestureOutcome> {
        let session = self.session.take()?;

        if let Ok(region) = tree.region_mut(&session.parent) {
            region.gesture_feedback(GestureFeedback::Cleared);
        }
        if let Ok(region) = tree.region_mut(&session.target) {
            region.gesture_feedback(GestureFeedback::Cleared);
        }

        let frame = tree.node(&session.target)?.frame();
        let parent_size = tree.node(&session.parent)?.frame().size();
        if !parent_size.is_degenerate() {
            let _ = tree.set_relative_size(
                &session.target,
                frame.width / parent_size.width,
                frame.height / parent_size.height,
            );
            let _ = tree.set_relative_position(
                &session.target,
                frame.x / parent_size.width,
                frame.y / parent_size.height,
            );
        }

        let node = tree.node(&session.target)?;
        let outcome = GestureOutcome {
            target: session.target.clone(),
            mode: session.mode,
            frame: node.frame(),
            relative: node.relative(),
        };
        tracing::debug!(
            target = %outcome.target,
            mode = ?outcome.mode,
            "gesture committed"
        );
        Some(outcome)
    }
}

/// Corner classification against a fixed border threshold; corner zones
/// take priority over the move area.
fn classify_corner(config: &GestureConfig, size: Size, local: Point) -> Option<ResizeCorner> {
    let border = config.corner_border;
    let left = local.x <= border;
    let right = local.x >= size.width - border;
    let top = local.y <= border;
    let bottom = local.y >= size.height - border;

    if top && left {
        Some(ResizeCorner::Nw)
    } else if top && right {
        Some(ResizeCorner::Ne)
    } else if bottom && left {
        Some(ResizeCorner::Sw)
    } else if bottom && right {
        Some(ResizeCorner::Se)
    } else {
        None
    }
}

/// Each corner moves exactly one or two edges.
fn resize_frame(start: Rect, corner: ResizeCorner, dx: f64, dy: f64) -> Rect {
    match corner {
        ResizeCorner::Nw => Rect::new(
            start.x + dx,
            start.y + dy,
            start.width - dx,
            start.height - dy,
        ),
        ResizeCorner::Ne => Rect::new(start.x, start.y + dy, start.width + dx, start.height - dy),
        ResizeCorner::Sw => Rect::new(start.x + dx, start.y, start.width - dx, start.height + dy),
        ResizeCorner::Se => Rect::new(start.x, start.y, start.width + dx, start.height + dy),
    }
}
