#![forbid(unsafe_code)]

//! The capability seam between the layout core and host widgets.
//!
//! Collaborator widgets (code editors, terminal tabs, file panels, toolbar
//! buttons) are opaque to the core: they expose a rectangular region that can
//! be placed, resized, and parented. [`Region`] is the only contract they
//! implement. Whether a node may hold children is a capability reported by
//! its region, checked once at attach/reparent time, never via type
//! inspection.

use formboard_core::geometry::Rect;

/// Cosmetic state applied to a region during an active gesture.
///
/// Purely visual; controllers always revert to [`GestureFeedback::Cleared`]
/// on release regardless of the gesture's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureFeedback {
    /// No gesture involves this region.
    #[default]
    Cleared,
    /// This region is the parent of the node being dragged/resized.
    Highlighted,
    /// This region is the node being dragged/resized (rendered translucent).
    Dimmed,
}

/// A host widget's rectangular surface, owned exclusively by one node.
pub trait Region {
    /// Whether this region can host child components.
    fn can_host_children(&self) -> bool;

    /// The owning node's parent-local frame changed.
    fn frame_changed(&mut self, _frame: Rect) {}

    /// The tree entered (`true`) or left (`false`) design mode, or this
    /// node was attached/detached while design mode was active.
    fn design_mode_changed(&mut self, _active: bool) {}

    /// Apply or revert gesture feedback.
    fn gesture_feedback(&mut self, _feedback: GestureFeedback) {}
}

/// A container region: hosts children, draws nothing itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Panel;

impl Region for Panel {
    fn can_host_children(&self) -> bool {
        true
    }
}

/// A leaf region: stands in for an opaque host widget.
#[derive(Debug, Clone, Copy, Default)]
pub struct Surface;

impl Region for Surface {
    fn can_host_children(&self) -> bool {
        false
    }
}
