#![forbid(unsafe_code)]

//! Relative-layout designer core: a tree of positionable, resizable UI
//! regions that can be arranged interactively in *design* mode and frozen
//! in *use* mode.
//!
//! Geometry is stored as fractions of the parent's box, so the whole tree
//! reflows when the window or any ancestor resizes. Arrangements persist to
//! a flat geometry file keyed by stable component ids, independent of tree
//! order.
//!
//! # Architecture
//!
//! - [`tree`] — the component arena: structure, frames, relative geometry,
//!   hit-testing, and the top-down layout propagation pass.
//! - [`gesture`] — the per-pointer press/drag/release state machine for
//!   moving and corner-resizing nodes in design mode.
//! - [`reparent`] — the two-pick protocol that moves a node under a new
//!   parent while keeping its on-screen place.
//! - [`snapshot`] — the geometry-file codec (flat id-keyed records, JSON).
//! - [`region`] — the capability seam host widgets implement.
//!
//! All mutation happens on one event-processing thread; the tree is the
//! only shared resource and is never touched concurrently.
//!
//! # Example
//!
//! ```
//! use formboard_core::geometry::{Point, Rect};
//! use formboard_layout::region::{Panel, Surface};
//! use formboard_layout::tree::{ComponentId, ComponentTree};
//!
//! let root = ComponentId::from("root");
//! let mut tree = ComponentTree::new(
//!     root.clone(),
//!     Box::new(Panel),
//!     Rect::from_size(800.0, 600.0),
//! )?;
//!
//! let editor = ComponentId::from("editor");
//! tree.insert(editor.clone(), Box::new(Surface))?;
//! tree.attach(&root, &editor)?;
//! tree.set_relative_size(&editor, 0.5, 0.5)?;
//! tree.set_relative_position(&editor, 0.1, 0.1)?;
//!
//! assert_eq!(tree.find_deepest_at(Point::new(120.0, 90.0)), Some(editor));
//! # Ok::<(), formboard_layout::error::LayoutError>(())
//! ```

pub mod error;
pub mod gesture;
pub mod region;
pub mod reparent;
pub mod snapshot;
pub mod tree;

pub use error::LayoutError;
pub use gesture::{GestureConfig, GestureController, GestureMode, GestureOutcome, ResizeCorner};
pub use region::{GestureFeedback, Panel, Region, Surface};
pub use reparent::{ReparentController, ReparentOutcome};
pub use snapshot::{LayoutRecord, load, save};
pub use tree::{ComponentId, ComponentNode, ComponentTree, Mode, RelativeGeometry};
