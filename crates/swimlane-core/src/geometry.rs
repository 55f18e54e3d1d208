//! Geometric primitives for docking and layout.
//!
//! This module provides the value types every shape, docker and label in a
//! Swimlane diagram is positioned with.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in canvas space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned rectangle defined by its upper-left and lower-right corners
//! - [`LineSegment`] - A directed segment between two points, used for polyline math
//!
//! # Coordinate System
//!
//! Swimlane uses the canvas coordinate system of the editor, which matches SVG:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! - **Origin**: Top-left corner at `(0, 0)`
//! - **X-axis**: Increases rightward
//! - **Y-axis**: Increases downward
//!
//! Angles are measured with `atan2(dy, dx)` in this space and normalized to
//! `[0, 360)`, so a segment pointing straight down has an angle of 90°.
//!
//! None of these operations validate their input: NaN coordinates propagate
//! silently and callers are expected to guard degenerate cases themselves.

/// A 2D point representing a position in canvas coordinate space.
///
/// # Examples
///
/// ```
/// # use swimlane_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
///
/// let mid = p1.midpoint(p2);
/// assert_eq!(mid.x(), 7.5);
/// assert_eq!(mid.y(), 12.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Checks if both x and y coordinates are zero
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Calculates the hypotenuse (Euclidean distance from origin)
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance between this point and another one
    pub fn distance_to(self, other: Point) -> f32 {
        other.sub_point(self).hypot()
    }

    /// Multiplies both coordinates by the given factor.
    ///
    /// # Examples
    ///
    /// ```
    /// # use swimlane_core::geometry::Point;
    /// let point = Point::new(10.0, 20.0);
    ///
    /// let doubled = point.scale(2.0);
    /// assert_eq!(doubled.x(), 20.0);
    /// assert_eq!(doubled.y(), 40.0);
    /// ```
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Linear interpolation towards `other`; `ratio == 0` yields `self`.
    pub fn lerp(self, other: Point, ratio: f32) -> Self {
        Self {
            x: self.x + ratio * (other.x - self.x),
            y: self.y + ratio * (other.y - self.y),
        }
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns true if both width and height are zero
    pub fn is_zero(self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}

/// An axis-aligned rectangle in canvas coordinates.
///
/// Stored as its upper-left and lower-right corners. Every constructor and
/// mutator normalizes the corners so that `upper_left <= lower_right` on both
/// axes; width and height are derived and never negative.
///
/// Unlike most geometry here, `Bounds` has in-place mutators (`move_by`,
/// `move_to`, `set`, `extend`) because shapes and dockers own their bounds
/// and the layout passes adjust them incrementally.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates bounds spanning two arbitrary corners.
    ///
    /// # Examples
    ///
    /// ```
    /// # use swimlane_core::geometry::{Bounds, Point};
    /// let bounds = Bounds::from_corners(Point::new(50.0, 10.0), Point::new(10.0, 40.0));
    /// assert_eq!(bounds.upper_left(), Point::new(10.0, 10.0));
    /// assert_eq!(bounds.lower_right(), Point::new(50.0, 40.0));
    /// ```
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Creates a new bounds from a center point and a size
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self::from_corners(
            Point::new(center.x - half_width, center.y - half_height),
            Point::new(center.x + half_width, center.y + half_height),
        )
    }

    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self::from_corners(
            top_left,
            Point::new(top_left.x + size.width, top_left.y + size.height),
        )
    }

    /// Smallest bounds containing every point, or `None` for an empty iterator.
    pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self::from_corners(first, first);
        for point in points {
            bounds.include(point);
        }
        Some(bounds)
    }

    /// Returns the upper-left corner
    pub fn upper_left(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Returns the lower-right corner
    pub fn lower_right(self) -> Point {
        Point::new(self.max_x, self.max_y)
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        Size {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Returns `true` when both bounds have the same width and height.
    pub fn same_size(self, other: Bounds) -> bool {
        self.width() == other.width() && self.height() == other.height()
    }

    /// Moves the bounds by the given offset, keeping its size.
    pub fn move_by(&mut self, offset: Point) {
        self.min_x += offset.x;
        self.min_y += offset.y;
        self.max_x += offset.x;
        self.max_y += offset.y;
    }

    /// Moves the upper-left corner to `upper_left`, keeping the size.
    pub fn move_to(&mut self, upper_left: Point) {
        let (width, height) = (self.width(), self.height());
        self.min_x = upper_left.x;
        self.min_y = upper_left.y;
        self.max_x = upper_left.x + width;
        self.max_y = upper_left.y + height;
    }

    /// Moves the bounds so that its center lands on `center`.
    pub fn center_move_to(&mut self, center: Point) {
        let offset = center.sub_point(self.center());
        self.move_by(offset);
    }

    /// Replaces both corners, normalizing their order.
    pub fn set(&mut self, a: Point, b: Point) {
        *self = Self::from_corners(a, b);
    }

    /// Grows (or shrinks, for negative deltas) the lower-right corner.
    ///
    /// The upper-left corner stays fixed; a shrink past the upper-left corner
    /// is clamped to zero width/height.
    pub fn extend(&mut self, delta: Point) {
        self.max_x = (self.max_x + delta.x).max(self.min_x);
        self.max_y = (self.max_y + delta.y).max(self.min_y);
    }

    /// Grows the bounds in place so that it contains `point`.
    pub fn include(&mut self, point: Point) {
        self.min_x = self.min_x.min(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_x = self.max_x.max(point.x);
        self.max_y = self.max_y.max(point.y);
    }

    /// Hit test: `true` when `point` lies inside the bounds or within
    /// `tolerance` pixels of its border.
    ///
    /// # Examples
    ///
    /// ```
    /// # use swimlane_core::geometry::{Bounds, Point, Size};
    /// let bounds = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
    /// assert!(bounds.is_included(Point::new(10.0, 5.0), 0.0));
    /// assert!(!bounds.is_included(Point::new(12.0, 5.0), 0.0));
    /// assert!(bounds.is_included(Point::new(12.0, 5.0), 2.0));
    /// ```
    pub fn is_included(self, point: Point, tolerance: f32) -> bool {
        point.x >= self.min_x - tolerance
            && point.x <= self.max_x + tolerance
            && point.y >= self.min_y - tolerance
            && point.y <= self.max_y + tolerance
    }

    /// Merges two bounds to create a larger bounds that contains both.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Returns a copy moved by the specified offset.
    pub fn translate(&self, offset: Point) -> Self {
        let mut moved = *self;
        moved.move_by(offset);
        moved
    }
}

/// A directed segment between two points.
///
/// Used for polyline math on edges: projections, hit tests, and angles.
/// Zero-length segments are tolerated everywhere; they project every point
/// onto `from` and have an angle of 0°.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    from: Point,
    to: Point,
}

impl LineSegment {
    pub fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }

    /// Start point of the segment
    pub fn from(self) -> Point {
        self.from
    }

    /// End point of the segment
    pub fn to(self) -> Point {
        self.to
    }

    /// Length of the segment
    pub fn length(self) -> f32 {
        self.from.distance_to(self.to)
    }

    /// Returns `true` when both endpoints coincide.
    pub fn is_degenerate(self) -> bool {
        self.from == self.to
    }

    /// Point at `ratio` along the segment, `0` being `from` and `1` being `to`.
    pub fn point_at(self, ratio: f32) -> Point {
        self.from.lerp(self.to, ratio)
    }

    /// Normalized projection of `point` onto the segment, clamped to `[0, 1]`.
    ///
    /// A zero-length segment yields `0`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use swimlane_core::geometry::{LineSegment, Point};
    /// let segment = LineSegment::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
    /// assert_eq!(segment.project(Point::new(25.0, 40.0)), 0.25);
    /// assert_eq!(segment.project(Point::new(-10.0, 0.0)), 0.0);
    /// ```
    pub fn project(self, point: Point) -> f32 {
        let direction = self.to.sub_point(self.from);
        let length_sq = direction.x * direction.x + direction.y * direction.y;
        if length_sq == 0.0 || !length_sq.is_finite() {
            return 0.0;
        }
        let offset = point.sub_point(self.from);
        let ratio = (offset.x * direction.x + offset.y * direction.y) / length_sq;
        if ratio.is_nan() {
            return 0.0;
        }
        ratio.clamp(0.0, 1.0)
    }

    /// Distance from `point` to the closest point of the segment.
    pub fn distance_to(self, point: Point) -> f32 {
        self.point_at(self.project(point)).distance_to(point)
    }

    /// Angle of the segment in degrees, normalized to `[0, 360)`.
    ///
    /// Axis-aligned segments return the exact compass values so that
    /// callers can compare against 0/90/180/270 without an epsilon.
    pub fn angle(self) -> f32 {
        let dx = self.to.x - self.from.x;
        let dy = self.to.y - self.from.y;
        match (dx == 0.0, dy == 0.0) {
            (true, true) => 0.0,
            (true, false) => {
                if dy > 0.0 {
                    90.0
                } else {
                    270.0
                }
            }
            (false, true) => {
                if dx > 0.0 {
                    0.0
                } else {
                    180.0
                }
            }
            (false, false) => {
                let degrees = dy.atan2(dx).to_degrees();
                let normalized = if degrees < 0.0 { degrees + 360.0 } else { degrees };
                if normalized >= 360.0 { 0.0 } else { normalized }
            }
        }
    }

    /// Unit normal pointing to the upper side of the segment, or to its left
    /// side when the segment is vertical.
    ///
    /// The choice is independent of the segment's direction, which keeps
    /// labels on the same visual side when an edge is reversed. A
    /// zero-length segment yields `(0, -1)`.
    pub fn upper_normal(self) -> Point {
        let length = self.length();
        if length == 0.0 || !length.is_finite() {
            return Point::new(0.0, -1.0);
        }
        let dx = (self.to.x - self.from.x) / length;
        let dy = (self.to.y - self.from.y) / length;
        let normal = Point::new(dy, -dx);
        if normal.y < 0.0 || (normal.y == 0.0 && normal.x < 0.0) {
            normal
        } else {
            normal.scale(-1.0)
        }
    }

    /// Signed perpendicular offset of `point` from the segment's supporting
    /// line, positive on the [`upper_normal`](Self::upper_normal) side.
    pub fn signed_distance(self, point: Point) -> f32 {
        let normal = self.upper_normal();
        let offset = point.sub_point(self.from);
        offset.x * normal.x + offset.y * normal.y
    }

    /// Returns `true` when `point` lies within `tolerance` pixels of the
    /// segment, including the area around both endpoints.
    ///
    /// # Examples
    ///
    /// ```
    /// # use swimlane_core::geometry::{LineSegment, Point};
    /// let segment = LineSegment::new(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
    /// assert!(segment.contains_point(Point::new(50.0, 50.5), 1.0));
    /// assert!(!segment.contains_point(Point::new(50.0, 60.0), 1.0));
    /// ```
    pub fn contains_point(self, point: Point, tolerance: f32) -> bool {
        self.distance_to(point) <= tolerance
    }
}
