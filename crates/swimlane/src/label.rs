//! Edge labels and their anchoring rules.
//!
//! A [`Label`] is anchored in one of three ways:
//!
//! - [`LabelAnchor::Fixed`] - at a position relative to its owner's bounds,
//!   translated and scaled with them.
//! - [`LabelAnchor::Reference`] - to a [`ReferencePoint`] on one segment of
//!   the edge, keeping its perpendicular distance and relative position along
//!   the segment as the segment's dockers move.
//! - [`LabelAnchor::Keyword`] - to a named position ([`EdgeLabelPosition`])
//!   at the start, middle or end of the edge.
//!
//! Text alignment of referenced labels follows an eight-way compass rule on
//! the segment angle, see [`alignment_for`].

use std::{fmt, str};

use swimlane_core::geometry::{Bounds, LineSegment, Point};

use crate::{config::LabelConfig, docker::DockerId};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl HorizontalAlign {
    fn mirrored(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Center => Self::Center,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for HorizontalAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    Middle,
    #[default]
    Bottom,
}

impl VerticalAlign {
    fn mirrored(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Middle => Self::Middle,
            Self::Bottom => Self::Top,
        }
    }
}

impl fmt::Display for VerticalAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Top => "top",
            Self::Middle => "middle",
            Self::Bottom => "bottom",
        })
    }
}

/// Quadrant occupied by a label's text relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOrientation {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

impl LabelOrientation {
    fn from_alignment(horizontal: HorizontalAlign, vertical: VerticalAlign) -> Self {
        match (horizontal, vertical) {
            (HorizontalAlign::Right, VerticalAlign::Bottom) => Self::UpperLeft,
            (HorizontalAlign::Right, _) => Self::LowerLeft,
            (_, VerticalAlign::Bottom) => Self::UpperRight,
            (_, _) => Self::LowerRight,
        }
    }
}

impl fmt::Display for LabelOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UpperLeft => "ul",
            Self::UpperRight => "ur",
            Self::LowerLeft => "ll",
            Self::LowerRight => "lr",
        })
    }
}

/// Eight-way compass bucket of a segment angle, in screen coordinates
/// (y grows downwards, so 90° points south).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompassBucket {
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    North,
    NorthEast,
}

impl CompassBucket {
    /// Buckets an angle in degrees. The four axis directions are exact
    /// values; everything between them is an open interval.
    pub fn from_angle(angle: f32) -> Self {
        let angle = angle.rem_euclid(360.0);
        if angle == 0.0 {
            Self::East
        } else if angle < 90.0 {
            Self::SouthEast
        } else if angle == 90.0 {
            Self::South
        } else if angle < 180.0 {
            Self::SouthWest
        } else if angle == 180.0 {
            Self::West
        } else if angle < 270.0 {
            Self::NorthWest
        } else if angle == 270.0 {
            Self::North
        } else {
            Self::NorthEast
        }
    }

    /// Alignment of a label placed on the upper (positive distance) side.
    fn alignment(self) -> (HorizontalAlign, VerticalAlign) {
        use HorizontalAlign::{Left, Right};
        use VerticalAlign::{Bottom, Top};
        match self {
            Self::East | Self::SouthEast => (Left, Bottom),
            Self::South => (Right, Top),
            Self::SouthWest | Self::West => (Right, Bottom),
            Self::NorthWest => (Left, Bottom),
            Self::North | Self::NorthEast => (Right, Bottom),
        }
    }
}

/// Text alignment for a label at signed `distance` from a segment with the
/// given angle. A negative distance puts the label on the other side of the
/// line and mirrors both alignments.
///
/// # Examples
///
/// ```
/// # use swimlane::label::{alignment_for, HorizontalAlign, VerticalAlign};
/// assert_eq!(alignment_for(0.0, 10.0), (HorizontalAlign::Left, VerticalAlign::Bottom));
/// assert_eq!(alignment_for(90.0, 10.0), (HorizontalAlign::Right, VerticalAlign::Top));
/// assert_eq!(alignment_for(0.0, -10.0), (HorizontalAlign::Right, VerticalAlign::Top));
/// ```
pub fn alignment_for(angle: f32, distance: f32) -> (HorizontalAlign, VerticalAlign) {
    let (horizontal, vertical) = CompassBucket::from_angle(angle).alignment();
    if distance < 0.0 {
        (horizontal.mirrored(), vertical.mirrored())
    } else {
        (horizontal, vertical)
    }
}

/// The pair of dockers a referenced label hangs off.
///
/// Indices are a cache of the dockers' positions in the edge and are
/// refreshed whenever dockers are inserted or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSegment {
    from: DockerId,
    to: DockerId,
    from_index: usize,
    to_index: usize,
}

impl LabelSegment {
    pub fn new(from: DockerId, to: DockerId, from_index: usize, to_index: usize) -> Self {
        Self {
            from,
            to,
            from_index,
            to_index,
        }
    }

    pub fn from(&self) -> DockerId {
        self.from
    }

    pub fn to(&self) -> DockerId {
        self.to
    }

    pub fn from_index(&self) -> usize {
        self.from_index
    }

    pub fn to_index(&self) -> usize {
        self.to_index
    }

    pub fn contains(&self, docker: DockerId) -> bool {
        self.from == docker || self.to == docker
    }

    pub(crate) fn set_indices(&mut self, from_index: usize, to_index: usize) {
        self.from_index = from_index;
        self.to_index = to_index;
    }
}

/// Anchor of a label on an edge segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePoint {
    segment: LabelSegment,
    intersection: Point,
    distance: f32,
    ratio: f32,
    orientation: LabelOrientation,
    from_position: Point,
    to_position: Point,
}

impl ReferencePoint {
    /// Measures a label at `position` against the segment `from`-`to`.
    pub fn new(segment: LabelSegment, from: Point, to: Point, position: Point) -> Self {
        let mut reference = Self {
            segment,
            intersection: from,
            distance: 0.0,
            ratio: 0.0,
            orientation: LabelOrientation::UpperRight,
            from_position: from,
            to_position: to,
        };
        reference.remeasure(from, to, position);
        reference
    }

    pub fn segment(&self) -> &LabelSegment {
        &self.segment
    }

    /// Foot of the label on the segment.
    pub fn intersection(&self) -> Point {
        self.intersection
    }

    /// Signed perpendicular distance, positive on the segment's upper side.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Position of the intersection along the segment, in `[0, 1]`.
    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn orientation(&self) -> LabelOrientation {
        self.orientation
    }

    /// Segment endpoints seen on the last recompute.
    pub fn from_position(&self) -> Point {
        self.from_position
    }

    pub fn to_position(&self) -> Point {
        self.to_position
    }

    /// Label position implied by the cached intersection and distance.
    pub fn label_position(&self) -> Point {
        let segment = LineSegment::new(self.from_position, self.to_position);
        self.intersection
            .add_point(segment.upper_normal().scale(self.distance))
    }

    /// Alignment for the cached segment and distance.
    pub fn alignment(&self) -> (HorizontalAlign, VerticalAlign) {
        let segment = LineSegment::new(self.from_position, self.to_position);
        alignment_for(segment.angle(), self.distance)
    }

    fn is_stale(&self, from: Point, to: Point) -> bool {
        self.from_position != from || self.to_position != to
    }

    /// Moves the intersection with the segment, keeping ratio and distance.
    fn relocate(&mut self, from: Point, to: Point) {
        self.from_position = from;
        self.to_position = to;
        self.intersection = LineSegment::new(from, to).point_at(self.ratio);
        let (horizontal, vertical) = self.alignment();
        self.orientation = LabelOrientation::from_alignment(horizontal, vertical);
    }

    /// Re-derives ratio and distance from a label position.
    fn remeasure(&mut self, from: Point, to: Point, position: Point) {
        let segment = LineSegment::new(from, to);
        self.ratio = segment.project(position);
        self.distance = segment.signed_distance(position);
        self.relocate(from, to);
    }

    pub(crate) fn set_segment(&mut self, segment: LabelSegment) {
        self.segment = segment;
    }

    pub(crate) fn segment_mut(&mut self) -> &mut LabelSegment {
        &mut self.segment
    }
}

/// Named anchor positions along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeLabelPosition {
    StartTop,
    StartBottom,
    MidTop,
    MidBottom,
    EndTop,
    EndBottom,
}

impl str::FromStr for EdgeLabelPosition {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starttop" => Ok(Self::StartTop),
            "startbottom" => Ok(Self::StartBottom),
            "midtop" => Ok(Self::MidTop),
            "midbottom" => Ok(Self::MidBottom),
            "endtop" => Ok(Self::EndTop),
            "endbottom" => Ok(Self::EndBottom),
            _ => Err("Invalid edge label position"),
        }
    }
}

/// Where a keyword label ends up, as computed by [`EdgeLabelPosition::place`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPlacement {
    pub position: Point,
    pub horizontal_align: HorizontalAlign,
    pub vertical_align: VerticalAlign,
    /// Rotation in degrees around `position`.
    pub rotation: f32,
}

enum Along {
    Start,
    Mid,
    End,
}

impl EdgeLabelPosition {
    fn along(self) -> Along {
        match self {
            Self::StartTop | Self::StartBottom => Along::Start,
            Self::MidTop | Self::MidBottom => Along::Mid,
            Self::EndTop | Self::EndBottom => Along::End,
        }
    }

    fn is_top(self) -> bool {
        matches!(self, Self::StartTop | Self::MidTop | Self::EndTop)
    }

    /// Places a label on the polyline through `points`.
    ///
    /// The reference segment is the first, middle or last one. Its angle
    /// picks one of two mirrored branches, so text on a segment pointing
    /// anywhere into `(90°, 270°]` is rotated by a half turn and still reads
    /// upright. Returns `None` for fewer than two points.
    pub fn place(self, points: &[Point], config: &LabelConfig) -> Option<LabelPlacement> {
        let n = points.len();
        if n < 2 {
            return None;
        }

        let (anchor, from, to, centered) = match self.along() {
            Along::Start => (points[0], points[0], points[1], false),
            Along::End => (points[n - 1], points[n - 2], points[n - 1], false),
            Along::Mid if n % 2 == 0 => {
                let (from, to) = (points[n / 2 - 1], points[n / 2]);
                (from.midpoint(to), from, to, true)
            }
            Along::Mid => (points[n / 2], points[n / 2], points[n / 2 + 1], false),
        };

        let angle = LineSegment::new(from, to).angle();
        let upright = angle <= 90.0 || angle > 270.0;
        let rotation = if upright { angle } else { angle - 180.0 };

        let (offset, vertical_align) = if self.is_top() {
            (config.offset_top(), VerticalAlign::Bottom)
        } else {
            (config.offset_bottom(), VerticalAlign::Top)
        };
        let dy = if self.is_top() { -offset } else { offset };

        let at_end = matches!(self.along(), Along::End);
        let (horizontal_align, dx) = if centered {
            (HorizontalAlign::Center, 0.0)
        } else if upright != at_end {
            (HorizontalAlign::Left, offset)
        } else {
            (HorizontalAlign::Right, -offset)
        };

        Some(LabelPlacement {
            position: anchor.add_point(rotate(Point::new(dx, dy), rotation)),
            horizontal_align,
            vertical_align,
            rotation,
        })
    }
}

fn rotate(vector: Point, degrees: f32) -> Point {
    if degrees == 0.0 {
        return vector;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    Point::new(
        vector.x() * cos - vector.y() * sin,
        vector.x() * sin + vector.y() * cos,
    )
}

/// How a label is anchored to its edge.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelAnchor {
    Fixed,
    Reference(ReferencePoint),
    Keyword(EdgeLabelPosition),
}

/// A text label attached to an edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    text: String,
    anchor: LabelAnchor,
    position: Point,
    horizontal_align: HorizontalAlign,
    vertical_align: VerticalAlign,
    rotation: f32,
    dirty: bool,
}

impl Label {
    /// A label at an absolute position that follows its owner's bounds.
    pub fn fixed(text: impl Into<String>, position: Point) -> Self {
        Self::with_anchor(text, LabelAnchor::Fixed, position)
    }

    /// A label placed by keyword; the position is filled in by the next layout.
    pub fn keyword(text: impl Into<String>, keyword: EdgeLabelPosition) -> Self {
        Self::with_anchor(text, LabelAnchor::Keyword(keyword), Point::default())
    }

    /// A label hanging off a segment.
    pub fn referenced(text: impl Into<String>, reference: ReferencePoint) -> Self {
        let mut label = Self::with_anchor(text, LabelAnchor::Fixed, Point::default());
        label.set_reference_point(reference);
        label
    }

    fn with_anchor(text: impl Into<String>, anchor: LabelAnchor, position: Point) -> Self {
        Self {
            text: text.into(),
            anchor,
            position,
            horizontal_align: HorizontalAlign::default(),
            vertical_align: VerticalAlign::default(),
            rotation: 0.0,
            dirty: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn anchor(&self) -> &LabelAnchor {
        &self.anchor
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn horizontal_align(&self) -> HorizontalAlign {
        self.horizontal_align
    }

    pub fn vertical_align(&self) -> VerticalAlign {
        self.vertical_align
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn reference_point(&self) -> Option<&ReferencePoint> {
        match &self.anchor {
            LabelAnchor::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    pub(crate) fn reference_point_mut(&mut self) -> Option<&mut ReferencePoint> {
        match &mut self.anchor {
            LabelAnchor::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    /// Anchors the label to a segment and places it accordingly.
    pub fn set_reference_point(&mut self, reference: ReferencePoint) {
        self.position = reference.label_position();
        (self.horizontal_align, self.vertical_align) = reference.alignment();
        self.rotation = 0.0;
        self.anchor = LabelAnchor::Reference(reference);
        self.dirty = false;
    }

    /// Forces the next recompute to re-measure the reference from the
    /// label's current position instead of reusing cached values.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Moves the label, as when the user drags it.
    pub(crate) fn move_to(&mut self, position: Point) {
        self.position = position;
        self.dirty = true;
    }

    /// Recomputes a referenced label for the segment's current endpoints.
    ///
    /// Nothing happens when the endpoints are unchanged and the label is not
    /// dirty. Returns `true` if the label was recomputed.
    pub(crate) fn refresh_reference(&mut self, from: Point, to: Point) -> bool {
        let position = self.position;
        let dirty = self.dirty;
        let LabelAnchor::Reference(reference) = &mut self.anchor else {
            return false;
        };
        if dirty {
            reference.remeasure(from, to, position);
        } else if reference.is_stale(from, to) {
            reference.relocate(from, to);
        } else {
            return false;
        }
        self.position = reference.label_position();
        (self.horizontal_align, self.vertical_align) = reference.alignment();
        self.dirty = false;
        true
    }

    /// Hangs a referenced label off another segment, re-measuring ratio and
    /// distance from where the label currently is.
    pub(crate) fn rebind(&mut self, segment: LabelSegment, from: Point, to: Point) {
        let position = self.position;
        if let LabelAnchor::Reference(reference) = &mut self.anchor {
            reference.set_segment(segment);
            reference.remeasure(from, to, position);
            self.position = reference.label_position();
            (self.horizontal_align, self.vertical_align) = reference.alignment();
            self.dirty = false;
        }
    }

    /// Translates and scales a fixed label with its owner's bounds.
    pub(crate) fn follow_owner(&mut self, old: Bounds, new: Bounds) {
        let scale_x = scale_factor(new.width(), old.width());
        let scale_y = scale_factor(new.height(), old.height());
        let offset = self.position.sub_point(old.upper_left());
        self.position = new
            .upper_left()
            .add_point(Point::new(offset.x() * scale_x, offset.y() * scale_y));
    }

    pub(crate) fn apply(&mut self, placement: LabelPlacement) {
        self.position = placement.position;
        self.horizontal_align = placement.horizontal_align;
        self.vertical_align = placement.vertical_align;
        self.rotation = placement.rotation;
        self.dirty = false;
    }
}

/// Ratio between a new and an old extent; `1` when either is zero.
pub(crate) fn scale_factor(new: f32, old: f32) -> f32 {
    if old == 0.0 || new == 0.0 || !old.is_finite() || !new.is_finite() {
        1.0
    } else {
        new / old
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn check_negative_distance_mirrors(angle: f32, distance: f32) -> Result<(), TestCaseError> {
        let (h, v) = alignment_for(angle, distance);
        let (mh, mv) = alignment_for(angle, -distance);
        prop_assert_eq!(h.mirrored(), mh);
        prop_assert_eq!(v.mirrored(), mv);
        Ok(())
    }

    fn check_keyword_rotation_reads_upright(
        x: f32,
        y: f32,
        dx: f32,
        dy: f32,
    ) -> Result<(), TestCaseError> {
        let points = [Point::new(x, y), Point::new(x + dx, y + dy)];
        let placement = EdgeLabelPosition::MidTop
            .place(&points, &LabelConfig::default())
            .unwrap();
        prop_assert!(
            (placement.rotation > -90.0 && placement.rotation <= 90.0) || placement.rotation > 270.0
        );
        Ok(())
    }

    proptest! {
        #[test]
        fn negative_distance_mirrors(angle in 0.0f32..360.0, distance in 0.1f32..100.0) {
            check_negative_distance_mirrors(angle, distance)?;
        }

        #[test]
        fn keyword_rotation_reads_upright(
            x in -500.0f32..500.0,
            y in -500.0f32..500.0,
            dx in -500.0f32..500.0,
            dy in -500.0f32..500.0,
        ) {
            check_keyword_rotation_reads_upright(x, y, dx, dy)?;
        }
    }
}
