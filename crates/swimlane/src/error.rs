//! Error types for layout operations.
//!
//! [`LayoutError`] covers the structural violations and missing collaborators
//! that are rejected at the API boundary. Geometric degeneracy (zero-length
//! segments, coincident dockers) is never reported here; the algorithms guard
//! against it inline.

use thiserror::Error;

use swimlane_core::{geometry::Point, identifier::Id};

use crate::docker::DockerId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// The main error type for layout operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("edge `{edge}` needs at least two dockers, got {count}")]
    TooFewDockers { edge: Id, count: usize },

    #[error("the first docker of edge `{edge}` cannot be removed")]
    FirstDockerRemoval { edge: Id },

    #[error("edge `{edge}` must keep at least two dockers")]
    MinimumDockers { edge: Id },

    #[error("unknown shape `{0}`")]
    UnknownShape(Id),

    #[error("edge `{edge}` has no {docker}")]
    UnknownDocker { edge: Id, docker: DockerId },

    #[error("shape `{0}` already exists")]
    DuplicateShape(Id),

    #[error("shape `{0}` is not an edge")]
    NotAnEdge(Id),

    #[error("shape `{0}` is not a node")]
    NotANode(Id),

    #[error("shape `{0}` is not a pool, lane or sub-process")]
    NotAContainer(Id),

    #[error("shape `{0}` has no usable stencil")]
    MissingStencil(Id),

    #[error("`{parent}` cannot contain `{child}`")]
    InvalidParent { child: Id, parent: Id },

    #[error("no segment of edge `{edge}` passes through ({}, {})", .point.x(), .point.y())]
    NoSegmentAt { edge: Id, point: Point },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let edge = Id::new("sid-flow");
        assert_eq!(
            LayoutError::FirstDockerRemoval { edge }.to_string(),
            "the first docker of edge `sid-flow` cannot be removed"
        );
        assert_eq!(
            LayoutError::NoSegmentAt {
                edge,
                point: Point::new(10.0, 20.5),
            }
            .to_string(),
            "no segment of edge `sid-flow` passes through (10, 20.5)"
        );
    }
}
