//! Swimlane - Edge docking and container layout for BPMN diagram editors.
//!
//! The engine keeps a diagram geometrically consistent while it is edited:
//!
//! - **Edges** are polylines of [`docker::Docker`]s. A docker docked to a
//!   shape follows it; free dockers move with the edge's bounds. Nodes living
//!   on an edge keep their relative position along it, and labels keep their
//!   distance and alignment relative to their segment.
//! - **Pools and lanes** stay stacked: every parent is exactly as tall as its
//!   lanes, and free dockers crossing a lane are carried when it moves or
//!   stretches.
//! - **Sub-processes** carry the bends of their inner edges when moved.
//!
//! All of this runs through a [`diagram::Diagram`]: mutations mark edges
//! dirty and queue [`event::LayoutEvent`]s, and [`diagram::Diagram::flush`]
//! lays everything out. The [`command`] module wraps edits as undoable
//! commands.
//!
//! Rendering and persistence are left to the caller; edges expose their
//! geometry as SVG path data through [`edge::Edge::path_data`].

pub mod command;
pub mod config;
pub mod diagram;
pub mod docker;
pub mod edge;
pub mod error;
pub mod event;
pub mod label;
pub mod layout;
pub mod shape;

pub use swimlane_core::{geometry, identifier, stencil};

pub use diagram::{Diagram, FlushReport};
pub use error::{LayoutError, Result};
