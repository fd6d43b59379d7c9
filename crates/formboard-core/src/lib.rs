#![forbid(unsafe_code)]

//! Core primitives for the formboard layout designer.
//!
//! This crate is dependency-light on purpose: it holds the geometric
//! vocabulary ([`geometry::Rect`], [`geometry::Point`], [`geometry::Size`])
//! and the canonical pointer event types ([`event::PointerEvent`]) shared by
//! the layout model and by host applications. Everything heavier (the
//! component tree, gesture handling, persistence) lives in
//! `formboard-layout`.

pub mod event;
pub mod geometry;

pub use event::{PointerButton, PointerEvent, PointerEventKind};
pub use geometry::{Point, Rect, Size};
