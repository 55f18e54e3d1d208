//! Shapes of a diagram.
//!
//! A [`Shape`] is a tagged union over its body: a [`Node`], which has bounds
//! and may own child shapes, or an [`Edge`], which owns dockers. The diagram
//! itself is the canvas root, so shapes without a parent live directly on it.

use std::collections::HashMap;

use swimlane_core::{
    geometry::Bounds,
    identifier::Id,
    stencil::{ShapeKind, ShapeRole, Stencil},
};

use crate::edge::Edge;

/// Resolves the current bounds of a shape by id.
///
/// Edge and container layout read node geometry through this trait so they
/// can run against the diagram or, in tests, against a plain map.
pub trait BoundsLookup {
    fn bounds_of(&self, id: Id) -> Option<Bounds>;
}

impl BoundsLookup for HashMap<Id, Bounds> {
    fn bounds_of(&self, id: Id) -> Option<Bounds> {
        self.get(&id).copied()
    }
}

/// Geometry of a node shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    bounds: Bounds,
}

impl Node {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub(crate) fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }
}

#[derive(Debug, Clone)]
pub enum ShapeBody {
    Node(Node),
    Edge(Edge),
}

/// A shape in the diagram's ownership tree.
#[derive(Debug, Clone)]
pub struct Shape {
    id: Id,
    stencil: Stencil,
    parent: Option<Id>,
    children: Vec<Id>,
    name: String,
    show_caption: bool,
    body: ShapeBody,
}

impl Shape {
    pub(crate) fn new(id: Id, stencil: Stencil, parent: Option<Id>, body: ShapeBody) -> Self {
        Self {
            id,
            stencil,
            parent,
            children: Vec::new(),
            name: String::new(),
            show_caption: true,
            body,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn stencil(&self) -> &Stencil {
        &self.stencil
    }

    pub fn role(&self) -> ShapeRole {
        self.stencil.role()
    }

    pub fn kind(&self) -> ShapeKind {
        match self.body {
            ShapeBody::Node(_) => ShapeKind::Node,
            ShapeBody::Edge(_) => ShapeKind::Edge,
        }
    }

    /// Parent shape, or `None` for shapes on the canvas.
    pub fn parent(&self) -> Option<Id> {
        self.parent
    }

    /// Direct children in insertion order.
    pub fn children(&self) -> &[Id] {
        &self.children
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the shape's caption is rendered. Only lanes ever hide it.
    pub fn show_caption(&self) -> bool {
        self.show_caption
    }

    pub fn body(&self) -> &ShapeBody {
        &self.body
    }

    pub fn as_node(&self) -> Option<&Node> {
        match &self.body {
            ShapeBody::Node(node) => Some(node),
            ShapeBody::Edge(_) => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match &self.body {
            ShapeBody::Edge(edge) => Some(edge),
            ShapeBody::Node(_) => None,
        }
    }

    pub(crate) fn as_node_mut(&mut self) -> Option<&mut Node> {
        match &mut self.body {
            ShapeBody::Node(node) => Some(node),
            ShapeBody::Edge(_) => None,
        }
    }

    pub(crate) fn as_edge_mut(&mut self) -> Option<&mut Edge> {
        match &mut self.body {
            ShapeBody::Edge(edge) => Some(edge),
            ShapeBody::Node(_) => None,
        }
    }

    pub fn is_node(&self) -> bool {
        self.as_node().is_some()
    }

    pub fn is_edge(&self) -> bool {
        self.as_edge().is_some()
    }

    /// Current bounds: the node's own bounds, or the edge's docker bounding box.
    pub fn bounds(&self) -> Bounds {
        match &self.body {
            ShapeBody::Node(node) => node.bounds(),
            ShapeBody::Edge(edge) => edge.bounds(),
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Id>) {
        self.parent = parent;
    }

    pub(crate) fn add_child(&mut self, child: Id) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: Id) {
        self.children.retain(|id| *id != child);
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn set_show_caption(&mut self, show: bool) {
        self.show_caption = show;
    }
}

#[cfg(test)]
mod tests {
    use swimlane_core::geometry::{Point, Size};

    use super::*;

    fn task() -> Shape {
        let bounds = Bounds::new_from_top_left(Point::new(10.0, 10.0), Size::new(100.0, 80.0));
        Shape::new(
            Id::new("task-1"),
            Stencil::resolve("Task").unwrap(),
            None,
            ShapeBody::Node(Node::new(bounds)),
        )
    }

    #[test]
    fn test_node_shape_accessors() {
        let shape = task();
        assert_eq!(shape.kind(), ShapeKind::Node);
        assert_eq!(shape.role(), ShapeRole::Task);
        assert!(shape.is_node());
        assert!(shape.as_edge().is_none());
        assert_eq!(shape.bounds().width(), 100.0);
        assert!(shape.show_caption());
    }

    #[test]
    fn test_children_are_unique() {
        let mut shape = task();
        shape.add_child(Id::new("a"));
        shape.add_child(Id::new("a"));
        shape.add_child(Id::new("b"));
        assert_eq!(shape.children(), &[Id::new("a"), Id::new("b")]);

        shape.remove_child(Id::new("a"));
        assert_eq!(shape.children(), &[Id::new("b")]);
    }

    #[test]
    fn test_hash_map_lookup() {
        let bounds = Bounds::new_from_top_left(Point::default(), Size::new(1.0, 1.0));
        let map = HashMap::from([(Id::new("n"), bounds)]);
        assert_eq!(map.bounds_of(Id::new("n")), Some(bounds));
        assert_eq!(map.bounds_of(Id::new("missing")), None);
    }
}
