#![forbid(unsafe_code)]

//! Error taxonomy for tree mutation and layout persistence.
//!
//! Interactive-path errors ([`LayoutError::InvalidContainer`],
//! [`LayoutError::CycleRejected`]) are handled locally by the controllers:
//! the operation aborts and the tree is left unchanged. Load-path errors
//! ([`LayoutError::MissingNodeId`], [`LayoutError::MissingRoot`],
//! [`LayoutError::RootMismatch`], ...) are fatal for the whole load; the
//! codec validates before mutating so a failed load never leaves a
//! half-applied tree behind.

use std::fmt;

use crate::tree::ComponentId;

/// Errors produced by tree mutation, gesture plumbing, and the layout codec.
#[derive(Debug)]
pub enum LayoutError {
    /// A component with this id is already registered in the tree.
    DuplicateId { id: ComponentId },
    /// No component with this id is registered in the tree.
    UnknownId { id: ComponentId },
    /// The attach/reparent destination cannot host children.
    InvalidContainer { id: ComponentId },
    /// Reparenting would make a node an ancestor of itself.
    CycleRejected {
        source: ComponentId,
        destination: ComponentId,
    },
    /// A world-space operation was attempted on a node with no parent.
    DetachedNode { id: ComponentId },
    /// A layout record references an id not present in the live tree.
    MissingNodeId { id: ComponentId },
    /// The layout file contains no record with a null parent id.
    MissingRoot,
    /// The layout file contains more than one record with a null parent id.
    MultipleRoots { first: ComponentId, second: ComponentId },
    /// The root record's id does not match the live tree's root.
    RootMismatch {
        expected: ComponentId,
        found: ComponentId,
    },
    /// Two layout records share the same id.
    DuplicateRecord { id: ComponentId },
    /// The layout file contains no records at all.
    EmptyLayout,
    /// Reading or writing the layout file failed.
    Io(std::io::Error),
    /// The layout file is not valid JSON for the record schema.
    Json(serde_json::Error),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { id } => write!(f, "component id {id} is already registered"),
            Self::UnknownId { id } => write!(f, "unknown component id {id}"),
            Self::InvalidContainer { id } => {
                write!(f, "component {id} cannot host children")
            }
            Self::CycleRejected {
                source,
                destination,
            } => write!(
                f,
                "reparenting {source} under {destination} would create a cycle"
            ),
            Self::DetachedNode { id } => {
                write!(f, "component {id} is not attached to a parent")
            }
            Self::MissingNodeId { id } => {
                write!(f, "layout record references id {id} not present in the tree")
            }
            Self::MissingRoot => write!(f, "layout file has no root record (null parent id)"),
            Self::MultipleRoots { first, second } => write!(
                f,
                "layout file has multiple root records: {first} and {second}"
            ),
            Self::RootMismatch { expected, found } => write!(
                f,
                "layout root record {found} does not match tree root {expected}"
            ),
            Self::DuplicateRecord { id } => {
                write!(f, "layout file contains duplicate records for id {id}")
            }
            Self::EmptyLayout => write!(f, "layout file does not contain any records"),
            Self::Io(err) => write!(f, "layout file i/o failed: {err}"),
            Self::Json(err) => write!(f, "layout file is not valid: {err}"),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LayoutError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for LayoutError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
