#![forbid(unsafe_code)]

//! Canonical pointer event types.
//!
//! Hosts translate their native input events (JavaFX mouse events, winit
//! window events, test fixtures) into [`PointerEvent`]s before feeding the
//! gesture machinery. Coordinates are always *scene* coordinates: design
//! units relative to the tree root's top-left corner.

use crate::geometry::Point;

/// A pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Left / primary button.
    Primary,
    /// Right / secondary button.
    Secondary,
    /// Middle button.
    Middle,
}

/// The kind of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    /// Button pressed down.
    Down(PointerButton),

    /// Button released.
    Up(PointerButton),

    /// Pointer dragged while a button is held.
    Drag(PointerButton),

    /// Pointer moved with no button pressed.
    Moved,
}

/// A pointer event in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// What happened.
    pub kind: PointerEventKind,
    /// Horizontal scene coordinate.
    pub x: f64,
    /// Vertical scene coordinate.
    pub y: f64,
}

impl PointerEvent {
    /// Create an event of the given kind.
    #[must_use]
    pub const fn new(kind: PointerEventKind, x: f64, y: f64) -> Self {
        Self { kind, x, y }
    }

    /// Primary-button press at the given scene position.
    #[must_use]
    pub const fn press(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Down(PointerButton::Primary), x, y)
    }

    /// Primary-button drag at the given scene position.
    #[must_use]
    pub const fn drag(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Drag(PointerButton::Primary), x, y)
    }

    /// Primary-button release at the given scene position.
    #[must_use]
    pub const fn release(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Up(PointerButton::Primary), x, y)
    }

    /// Button-less movement at the given scene position.
    #[must_use]
    pub const fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Moved, x, y)
    }

    /// The scene position of the event.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The button involved, if any.
    #[must_use]
    pub const fn button(&self) -> Option<PointerButton> {
        match self.kind {
            PointerEventKind::Down(b) | PointerEventKind::Up(b) | PointerEventKind::Drag(b) => {
                Some(b)
            }
            PointerEventKind::Moved => None,
        }
    }
}
