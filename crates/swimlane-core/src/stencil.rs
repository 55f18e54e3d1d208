//! Stencil identification and shape roles.
//!
//! The editor's stencil set names every shape type with a namespaced id such
//! as `http://b3mn.org/stencilset/bpmn2.0#Lane`. The layout engine only
//! cares about a handful of roles, so a [`Stencil`] resolves its id into a
//! [`ShapeRole`] once, when the shape is created.
//!
//! # Example
//!
//! ```
//! # use swimlane_core::stencil::{ShapeKind, ShapeRole, Stencil};
//! let stencil = Stencil::resolve("http://b3mn.org/stencilset/bpmn2.0#Lane").unwrap();
//! assert_eq!(stencil.role(), ShapeRole::Lane);
//! assert_eq!(stencil.kind(), ShapeKind::Node);
//! assert_eq!(stencil.id_without_ns(), "Lane");
//! ```

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::identifier::Id;

/// Errors raised while resolving a stencil.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StencilError {
    #[error("stencil id is empty")]
    Empty,
}

/// Whether a shape is a node (has bounds and children) or an edge (has dockers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Node,
    Edge,
}

/// Layout-relevant role of a shape type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeRole {
    /// A participant container holding lanes.
    Pool,
    /// A swimlane; may contain nested lanes.
    Lane,
    /// An expanded sub-process; its children move with it.
    SubProcess,
    Task,
    Gateway,
    Event,
    /// Text annotations, data objects, groups and other artifacts.
    Artifact,
    SequenceFlow,
    MessageFlow,
    Association,
    /// Any node type the layout engine has no special rules for.
    Other,
}

impl ShapeRole {
    /// Returns the shape kind implied by this role.
    pub fn kind(self) -> ShapeKind {
        match self {
            Self::SequenceFlow | Self::MessageFlow | Self::Association => ShapeKind::Edge,
            _ => ShapeKind::Node,
        }
    }

    /// Pools and lanes take part in the container layout.
    pub fn is_swimlane(self) -> bool {
        matches!(self, Self::Pool | Self::Lane)
    }
}

impl FromStr for ShapeRole {
    type Err = StencilError;

    /// Maps a stencil id without namespace to its role.
    ///
    /// Unknown names map to [`ShapeRole::Other`].
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name.is_empty() {
            return Err(StencilError::Empty);
        }
        let role = match name {
            "Pool" | "CollapsedPool" => Self::Pool,
            "Lane" => Self::Lane,
            "SequenceFlow" => Self::SequenceFlow,
            "MessageFlow" => Self::MessageFlow,
            "TextAnnotation" | "DataObject" | "DataStore" | "Group" | "Message" | "ITSystem" => {
                Self::Artifact
            }
            _ if name.starts_with("Association") => Self::Association,
            _ if name.ends_with("Subprocess") => Self::SubProcess,
            _ if name.ends_with("Task") => Self::Task,
            _ if name.ends_with("Gateway") => Self::Gateway,
            _ if name.contains("Event") => Self::Event,
            _ => Self::Other,
        };
        Ok(role)
    }
}

impl fmt::Display for ShapeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pool => "pool",
            Self::Lane => "lane",
            Self::SubProcess => "sub-process",
            Self::Task => "task",
            Self::Gateway => "gateway",
            Self::Event => "event",
            Self::Artifact => "artifact",
            Self::SequenceFlow => "sequence flow",
            Self::MessageFlow => "message flow",
            Self::Association => "association",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// A resolved stencil: the full stencil id plus its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stencil {
    id: Id,
    local: Id,
    role: ShapeRole,
}

impl Stencil {
    /// Resolves a (possibly namespaced) stencil id.
    ///
    /// # Errors
    ///
    /// Returns [`StencilError::Empty`] when the id, or its part after the
    /// namespace separator, is empty.
    pub fn resolve(id: &str) -> Result<Self, StencilError> {
        let local = id.rsplit_once('#').map_or(id, |(_, local)| local);
        let role = local.parse::<ShapeRole>()?;
        Ok(Self {
            id: Id::new(id),
            local: Id::new(local),
            role,
        })
    }

    /// Full stencil id, including the namespace.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Stencil id with the namespace stripped.
    pub fn id_without_ns(&self) -> Id {
        self.local
    }

    pub fn role(&self) -> ShapeRole {
        self.role
    }

    pub fn kind(&self) -> ShapeKind {
        self.role.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_strips_namespace() {
        let stencil = Stencil::resolve("http://b3mn.org/stencilset/bpmn2.0#Pool").unwrap();
        assert_eq!(stencil.id_without_ns(), "Pool");
        assert_eq!(stencil.id(), "http://b3mn.org/stencilset/bpmn2.0#Pool");
        assert_eq!(stencil.role(), ShapeRole::Pool);
    }

    #[test]
    fn test_resolve_without_namespace() {
        let stencil = Stencil::resolve("Task").unwrap();
        assert_eq!(stencil.role(), ShapeRole::Task);
    }

    #[test]
    fn test_resolve_empty_fails() {
        assert_eq!(Stencil::resolve(""), Err(StencilError::Empty));
        assert_eq!(
            Stencil::resolve("http://b3mn.org/stencilset/bpmn2.0#"),
            Err(StencilError::Empty)
        );
    }

    #[test]
    fn test_role_mapping() {
        let cases = [
            ("Lane", ShapeRole::Lane),
            ("CollapsedPool", ShapeRole::Pool),
            ("Subprocess", ShapeRole::SubProcess),
            ("EventSubprocess", ShapeRole::SubProcess),
            ("UserTask", ShapeRole::Task),
            ("Exclusive_Databased_Gateway", ShapeRole::Gateway),
            ("StartNoneEvent", ShapeRole::Event),
            ("IntermediateTimerEvent", ShapeRole::Event),
            ("TextAnnotation", ShapeRole::Artifact),
            ("SequenceFlow", ShapeRole::SequenceFlow),
            ("MessageFlow", ShapeRole::MessageFlow),
            ("Association_Unidirectional", ShapeRole::Association),
            ("Something", ShapeRole::Other),
        ];
        for (name, role) in cases {
            assert_eq!(name.parse::<ShapeRole>(), Ok(role), "{name}");
        }
    }

    #[test]
    fn test_role_kind() {
        assert_eq!(ShapeRole::SequenceFlow.kind(), ShapeKind::Edge);
        assert_eq!(ShapeRole::Association.kind(), ShapeKind::Edge);
        assert_eq!(ShapeRole::Lane.kind(), ShapeKind::Node);
        assert!(ShapeRole::Pool.is_swimlane());
        assert!(!ShapeRole::SubProcess.is_swimlane());
    }
}
