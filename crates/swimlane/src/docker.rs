//! Dockers: the routing points of an edge.
//!
//! A [`Docker`] is either free, with its own absolute position, or docked to
//! a node. A docked docker stores a reference point relative to the node's
//! upper-left corner and derives its absolute position from the node's
//! current bounds on every [`Docker::update`].

use std::fmt;

use swimlane_core::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

/// Identifier of a docker, unique within its edge.
///
/// Ids are allocated from a per-edge counter and never reused, so label and
/// attached-node references survive insertions and removals that shift
/// docker indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DockerId(u32);

impl DockerId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw counter value of this id.
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DockerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "docker #{}", self.0)
    }
}

/// A routing point of an edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Docker {
    id: DockerId,
    center: Point,
    size: f32,
    docked_shape: Option<Id>,
    reference_point: Option<Point>,
    moved: bool,
}

impl Docker {
    pub(crate) fn new(id: DockerId, center: Point, size: f32) -> Self {
        Self {
            id,
            center,
            size,
            docked_shape: None,
            reference_point: None,
            moved: false,
        }
    }

    pub fn id(&self) -> DockerId {
        self.id
    }

    /// Absolute position of the docker.
    pub fn center(&self) -> Point {
        self.center
    }

    /// Hit area of the docker, centered on its position.
    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_center(self.center, Size::new(self.size, self.size))
    }

    pub fn docked_shape(&self) -> Option<Id> {
        self.docked_shape
    }

    pub fn is_docked(&self) -> bool {
        self.docked_shape.is_some()
    }

    /// Offset from the docked shape's upper-left corner.
    pub fn reference_point(&self) -> Option<Point> {
        self.reference_point
    }

    /// Docks the docker to `shape`, or undocks it with `None`.
    ///
    /// Docking without a reference point anchors the docker at the shape's
    /// center. Undocking leaves the docker where it currently is.
    pub(crate) fn set_docked_shape(&mut self, shape: Option<(Id, Bounds)>) {
        match shape {
            Some((id, shape_bounds)) => {
                self.docked_shape = Some(id);
                let reference = *self.reference_point.get_or_insert_with(|| {
                    Point::new(shape_bounds.width() / 2.0, shape_bounds.height() / 2.0)
                });
                self.center = shape_bounds.upper_left().add_point(reference);
            }
            None => self.docked_shape = None,
        }
    }

    /// Stores the offset used while docked. An undocked docker keeps it for
    /// the next time it is docked.
    pub(crate) fn set_reference_point(&mut self, reference: Point) {
        self.reference_point = Some(reference);
    }

    /// Pulls the absolute position from the docked shape's bounds.
    ///
    /// Returns `true` if the position changed. Free dockers are left alone.
    pub(crate) fn update(&mut self, shape_bounds: Bounds) -> bool {
        if self.docked_shape.is_none() {
            return false;
        }
        let reference = self.reference_point.unwrap_or_else(|| {
            Point::new(shape_bounds.width() / 2.0, shape_bounds.height() / 2.0)
        });
        let center = shape_bounds.upper_left().add_point(reference);
        if center == self.center {
            return false;
        }
        self.center = center;
        true
    }

    /// Moves the docker as a direct user drag.
    pub(crate) fn move_to(&mut self, center: Point) {
        self.center = center;
        self.moved = true;
    }

    /// Repositions the docker on behalf of a layout pass.
    pub(crate) fn place_at(&mut self, center: Point) {
        self.center = center;
    }

    pub(crate) fn shift(&mut self, offset: Point) {
        self.center = self.center.add_point(offset);
    }

    /// Returns whether the docker was dragged since the last call, clearing
    /// the flag.
    pub(crate) fn take_moved(&mut self) -> bool {
        std::mem::take(&mut self.moved)
    }

    pub(crate) fn was_moved(&self) -> bool {
        self.moved
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn shape_bounds() -> Bounds {
        Bounds::new_from_top_left(Point::new(100.0, 100.0), Size::new(80.0, 40.0))
    }

    #[test]
    fn test_new_docker_is_free() {
        let docker = Docker::new(DockerId::new(0), Point::new(10.0, 20.0), 16.0);
        assert_eq!(docker.center(), Point::new(10.0, 20.0));
        assert_eq!(docker.bounds().width(), 16.0);
        assert!(!docker.is_docked());
        assert_eq!(docker.reference_point(), None);
    }

    #[test]
    fn test_dock_defaults_to_shape_center() {
        let mut docker = Docker::new(DockerId::new(0), Point::default(), 16.0);
        docker.set_docked_shape(Some((Id::new("task"), shape_bounds())));

        assert_eq!(docker.docked_shape(), Some(Id::new("task")));
        assert_eq!(docker.reference_point(), Some(Point::new(40.0, 20.0)));
        assert_eq!(docker.center(), Point::new(140.0, 120.0));
    }

    #[test]
    fn test_dock_with_reference_point() {
        let mut docker = Docker::new(DockerId::new(0), Point::default(), 16.0);
        docker.set_reference_point(Point::new(0.0, 20.0));
        docker.set_docked_shape(Some((Id::new("task"), shape_bounds())));

        assert_eq!(docker.center(), Point::new(100.0, 120.0));
    }

    #[test]
    fn test_update_follows_shape() {
        let mut docker = Docker::new(DockerId::new(0), Point::default(), 16.0);
        docker.set_docked_shape(Some((Id::new("task"), shape_bounds())));

        let mut moved = shape_bounds();
        moved.move_by(Point::new(15.0, -5.0));
        assert!(docker.update(moved));
        assert_approx_eq!(f32, docker.center().x(), 155.0);
        assert_approx_eq!(f32, docker.center().y(), 115.0);

        // Second update with the same bounds is a no-op.
        assert!(!docker.update(moved));
    }

    #[test]
    fn test_update_ignores_free_docker() {
        let mut docker = Docker::new(DockerId::new(0), Point::new(5.0, 5.0), 16.0);
        assert!(!docker.update(shape_bounds()));
        assert_eq!(docker.center(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_undock_keeps_position() {
        let mut docker = Docker::new(DockerId::new(0), Point::default(), 16.0);
        docker.set_docked_shape(Some((Id::new("task"), shape_bounds())));
        docker.set_docked_shape(None);

        assert!(!docker.is_docked());
        assert_eq!(docker.center(), Point::new(140.0, 120.0));
        // The reference point survives for the next docking.
        assert_eq!(docker.reference_point(), Some(Point::new(40.0, 20.0)));
    }

    #[test]
    fn test_moved_flag() {
        let mut docker = Docker::new(DockerId::new(3), Point::default(), 16.0);
        docker.place_at(Point::new(1.0, 1.0));
        assert!(!docker.was_moved());

        docker.move_to(Point::new(2.0, 2.0));
        assert!(docker.take_moved());
        assert!(!docker.take_moved());
    }

    #[test]
    fn test_docker_id_display() {
        assert_eq!(DockerId::new(7).to_string(), "docker #7");
    }
}
