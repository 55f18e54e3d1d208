//! Layout events queued by diagram mutations and handled on flush.

use std::fmt;

use swimlane_core::identifier::Id;

use crate::docker::DockerId;

/// A deferred layout request.
///
/// Mutating operations on a [`Diagram`](crate::diagram::Diagram) enqueue
/// events; [`Diagram::flush`](crate::diagram::Diagram::flush) dispatches them
/// after all dirty edges were laid out.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutEvent {
    /// A shape was removed; `parent` is the container it was removed from.
    ShapeRemoved { shape: Id, parent: Option<Id> },
    /// A docker was docked to a shape, or undocked.
    DockerDocked { edge: Id, docker: DockerId },
    /// A shape property changed; only `name` affects layout.
    PropertyChanged { shape: Id, key: String },
    /// The lanes of `pool` need a layout pass; `changed` names the shape
    /// that triggered it.
    LayoutPool { pool: Id, changed: Option<Id> },
    LayoutSubProcess { shape: Id },
}

impl fmt::Display for LayoutEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeRemoved { shape, .. } => write!(f, "shape removed: {shape}"),
            Self::DockerDocked { edge, docker } => write!(f, "{docker} of {edge} docked"),
            Self::PropertyChanged { shape, key } => write!(f, "property {key} of {shape} changed"),
            Self::LayoutPool { pool, .. } => write!(f, "layout pool {pool}"),
            Self::LayoutSubProcess { shape } => write!(f, "layout sub-process {shape}"),
        }
    }
}
