//! Edges: ordered docker lists with attached nodes and labels.
//!
//! An [`Edge`] always holds at least two dockers; the first is the source
//! endpoint and the last the target endpoint. Everything between them is a
//! routing point the user can add, drag and remove.
//!
//! Nodes can live on an edge. Each one is recorded as an
//! [`AttachedNodePosition`]: the segment it sits on and the normalized
//! projection of its center onto that segment. Inserting or removing a
//! docker re-segments these entries so that nodes stay where they were.
//!
//! The layout pass that keeps an edge consistent with its docked shapes is
//! in [`crate::layout::edge`].

use indexmap::IndexMap;
use log::{debug, trace};
use svg::node::element::path::Data;

use swimlane_core::{
    geometry::{Bounds, LineSegment, Point},
    identifier::Id,
};

use crate::{
    docker::{Docker, DockerId},
    error::{LayoutError, Result},
    label::{Label, LabelSegment},
};

/// Position of a node living on an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachedNodePosition {
    node: Id,
    docker1: DockerId,
    docker2: DockerId,
    relative_distance: f32,
}

impl AttachedNodePosition {
    pub fn node(&self) -> Id {
        self.node
    }

    /// Segment the node sits on, as its start and end docker.
    pub fn segment(&self) -> (DockerId, DockerId) {
        (self.docker1, self.docker2)
    }

    /// Normalized distance from the segment's first docker, in `[0, 1]`.
    pub fn relative_distance(&self) -> f32 {
        self.relative_distance
    }
}

/// A connector between two shapes.
#[derive(Debug, Clone)]
pub struct Edge {
    id: Id,
    dockers: Vec<Docker>,
    next_docker: u32,
    docker_size: f32,
    bounds: Bounds,
    old_bounds: Bounds,
    changed: bool,
    docker_updated: bool,
    attached: IndexMap<Id, AttachedNodePosition>,
    labels: Vec<Label>,
}

impl Edge {
    /// Creates an edge with one free docker per point.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::TooFewDockers`] for fewer than two points.
    pub fn new(id: Id, points: &[Point], docker_size: f32) -> Result<Self> {
        if points.len() < 2 {
            return Err(LayoutError::TooFewDockers {
                edge: id,
                count: points.len(),
            });
        }
        let dockers: Vec<Docker> = points
            .iter()
            .enumerate()
            .map(|(idx, point)| Docker::new(DockerId::new(idx as u32), *point, docker_size))
            .collect();
        let bounds = Bounds::enclosing(points.iter().copied()).unwrap_or_default();

        Ok(Self {
            id,
            next_docker: dockers.len() as u32,
            dockers,
            docker_size,
            bounds,
            old_bounds: bounds,
            changed: true,
            docker_updated: false,
            attached: IndexMap::new(),
            labels: Vec::new(),
        })
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn dockers(&self) -> &[Docker] {
        &self.dockers
    }

    pub fn docker(&self, id: DockerId) -> Option<&Docker> {
        self.dockers.iter().find(|docker| docker.id() == id)
    }

    pub fn docker_index(&self, id: DockerId) -> Option<usize> {
        self.dockers.iter().position(|docker| docker.id() == id)
    }

    /// Source endpoint.
    pub fn first_docker(&self) -> &Docker {
        &self.dockers[0]
    }

    /// Target endpoint.
    pub fn last_docker(&self) -> &Docker {
        &self.dockers[self.dockers.len() - 1]
    }

    /// Docker centers from source to target.
    pub fn polyline(&self) -> Vec<Point> {
        self.dockers.iter().map(Docker::center).collect()
    }

    /// Segments between consecutive dockers.
    pub fn segments(&self) -> impl Iterator<Item = LineSegment> + '_ {
        self.dockers
            .windows(2)
            .map(|pair| LineSegment::new(pair[0].center(), pair[1].center()))
    }

    pub fn segment(&self, index: usize) -> Option<LineSegment> {
        let from = self.dockers.get(index)?;
        let to = self.dockers.get(index + 1)?;
        Some(LineSegment::new(from.center(), to.center()))
    }

    /// SVG path data through every docker center.
    pub fn path_data(&self) -> Data {
        let mut points = self.dockers.iter().map(Docker::center);
        let mut data = Data::new();
        if let Some(first) = points.next() {
            data = data.move_to((first.x(), first.y()));
        }
        for point in points {
            data = data.line_to((point.x(), point.y()));
        }
        data
    }

    /// Bounding box of the docker centers as of the last layout pass.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Whether the edge is waiting for a layout pass.
    pub fn is_changed(&self) -> bool {
        self.changed
            || self.has_pending_docker_update()
            || self.dockers.iter().any(Docker::was_moved)
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn attached_nodes(&self) -> impl Iterator<Item = &AttachedNodePosition> {
        self.attached.values()
    }

    pub fn attached_position(&self, node: Id) -> Option<&AttachedNodePosition> {
        self.attached.get(&node)
    }

    /// Current center of an attached node according to its segment and ratio.
    pub fn attached_center(&self, position: &AttachedNodePosition) -> Option<Point> {
        let from = self.docker(position.docker1)?.center();
        let to = self.docker(position.docker2)?.center();
        Some(LineSegment::new(from, to).point_at(position.relative_distance))
    }

    /// Index and projection ratio of the segment closest to `point`.
    ///
    /// Ties go to the lowest segment index.
    pub fn nearest_segment(&self, point: Point) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, segment) in self.segments().enumerate() {
            let distance = segment.distance_to(point);
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((idx, distance));
            }
        }
        let (idx, _) = best?;
        Some((idx, self.segment(idx)?.project(point)))
    }

    /// Records a node living on the edge at `center`.
    pub fn attach_node(&mut self, node: Id, center: Point) {
        let Some((idx, ratio)) = self.nearest_segment(center) else {
            return;
        };
        let position = AttachedNodePosition {
            node,
            docker1: self.dockers[idx].id(),
            docker2: self.dockers[idx + 1].id(),
            relative_distance: ratio,
        };
        debug!(edge_id:% = self.id, node_id:% = node, segment = idx, ratio; "Attached node to edge");
        self.attached.insert(node, position);
        self.changed = true;
    }

    pub fn detach_node(&mut self, node: Id) -> Option<AttachedNodePosition> {
        self.attached.shift_remove(&node)
    }

    pub fn add_label(&mut self, label: Label) {
        self.labels.push(label);
        self.changed = true;
    }

    /// Inserts a docker at `point` on the first segment passing within
    /// `tolerance` pixels of it.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NoSegmentAt`] if no segment is close enough.
    pub fn add_docker(&mut self, point: Point, tolerance: f32) -> Result<DockerId> {
        let idx = self
            .segments()
            .position(|segment| segment.contains_point(point, tolerance))
            .ok_or(LayoutError::NoSegmentAt {
                edge: self.id,
                point,
            })?;
        Ok(self.insert_docker(idx + 1, point))
    }

    /// Inserts a free docker at `index`, between the dockers currently at
    /// `index - 1` and `index`.
    ///
    /// Attached nodes and labels on the split segment move to whichever
    /// half they fall into.
    pub(crate) fn insert_docker(&mut self, index: usize, center: Point) -> DockerId {
        let index = index.clamp(1, self.dockers.len() - 1);
        let id = DockerId::new(self.next_docker);
        self.next_docker += 1;

        let start = &self.dockers[index - 1];
        let end = &self.dockers[index];
        let (start_id, start_center) = (start.id(), start.center());
        let (end_id, end_center) = (end.id(), end.center());

        let before = start_center.distance_to(center);
        let after = end_center.distance_to(center);
        let split = ratio_of(before, before + after);

        for position in self.attached.values_mut() {
            if position.segment() != (start_id, end_id) {
                continue;
            }
            let ratio = position.relative_distance;
            if ratio < split {
                position.docker2 = id;
                position.relative_distance = ratio_of(ratio, split);
            } else {
                position.docker1 = id;
                position.relative_distance = ratio_of(ratio - split, 1.0 - split);
            }
        }

        for label in &mut self.labels {
            let Some(reference) = label.reference_point() else {
                continue;
            };
            let segment = reference.segment();
            if (segment.from(), segment.to()) != (start_id, end_id) {
                continue;
            }
            if reference.ratio() < split {
                label.rebind(
                    LabelSegment::new(start_id, id, index - 1, index),
                    start_center,
                    center,
                );
            } else {
                label.rebind(
                    LabelSegment::new(id, end_id, index, index + 1),
                    center,
                    end_center,
                );
            }
        }

        self.dockers
            .insert(index, Docker::new(id, center, self.docker_size));
        self.reindex_labels();
        self.docker_updated = true;
        debug!(edge_id:% = self.id, docker:% = id, index, split; "Inserted docker");
        id
    }

    /// Appends a new target endpoint after the current last docker.
    pub(crate) fn push_docker(&mut self, center: Point) -> DockerId {
        let id = DockerId::new(self.next_docker);
        self.next_docker += 1;
        self.dockers
            .push(Docker::new(id, center, self.docker_size));
        self.docker_updated = true;
        debug!(edge_id:% = self.id, docker:% = id; "Appended docker");
        id
    }

    /// Removes a docker.
    ///
    /// Attached nodes on either adjacent segment are re-expressed on the
    /// merged segment at the same position; labels hanging off the removed
    /// docker move to the nearest remaining segment.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::UnknownDocker`] if the docker is not on this edge.
    /// - [`LayoutError::FirstDockerRemoval`] for the source endpoint.
    /// - [`LayoutError::MinimumDockers`] if only two dockers remain.
    pub fn remove_docker(&mut self, id: DockerId) -> Result<Docker> {
        let index = self.docker_index(id).ok_or(LayoutError::UnknownDocker {
            edge: self.id,
            docker: id,
        })?;
        if index == 0 {
            return Err(LayoutError::FirstDockerRemoval { edge: self.id });
        }
        if self.dockers.len() <= 2 {
            return Err(LayoutError::MinimumDockers { edge: self.id });
        }

        let removed = if index + 1 < self.dockers.len() {
            let prev = &self.dockers[index - 1];
            let next = &self.dockers[index + 1];
            let (prev_id, next_id) = (prev.id(), next.id());
            let center = self.dockers[index].center();
            let before = prev.center().distance_to(center);
            let after = center.distance_to(next.center());
            let split = ratio_of(before, before + after);

            for position in self.attached.values_mut() {
                if position.segment() == (prev_id, id) {
                    position.docker2 = next_id;
                    position.relative_distance *= split;
                } else if position.segment() == (id, next_id) {
                    position.docker1 = prev_id;
                    position.relative_distance =
                        split + position.relative_distance * (1.0 - split);
                }
            }
            self.dockers.remove(index)
        } else {
            // The target endpoint goes away: nodes on the last segment are
            // projected again onto what remains.
            let stranded: Vec<(Id, Point)> = self
                .attached
                .values()
                .filter(|position| position.docker2 == id)
                .filter_map(|position| Some((position.node, self.attached_center(position)?)))
                .collect();
            let removed = self.dockers.remove(index);
            for (node, center) in stranded {
                self.attach_node(node, center);
            }
            removed
        };

        let orphaned: Vec<(usize, Point)> = self
            .labels
            .iter()
            .enumerate()
            .filter_map(|(idx, label)| {
                let reference = label.reference_point()?;
                reference
                    .segment()
                    .contains(id)
                    .then(|| (idx, reference.intersection()))
            })
            .collect();
        for (idx, intersection) in orphaned {
            let Some((segment_idx, _)) = self.nearest_segment(intersection) else {
                continue;
            };
            let from = &self.dockers[segment_idx];
            let to = &self.dockers[segment_idx + 1];
            let segment = LabelSegment::new(from.id(), to.id(), segment_idx, segment_idx + 1);
            let (from, to) = (from.center(), to.center());
            self.labels[idx].rebind(segment, from, to);
        }

        self.reindex_labels();
        self.docker_updated = true;
        debug!(edge_id:% = self.id, docker:% = id, index; "Removed docker");
        Ok(removed)
    }

    /// Removes interior dockers lying within `tolerance` pixels of the line
    /// between their remaining neighbors. Returns the removed ids.
    ///
    /// # Errors
    ///
    /// Propagates [`Edge::remove_docker`] errors, which cannot occur for
    /// interior dockers of a valid edge.
    pub fn remove_unused_dockers(&mut self, tolerance: f32) -> Result<Vec<DockerId>> {
        let mut redundant = Vec::new();
        let mut previous = self.dockers[0].center();
        for window in self.dockers.windows(3) {
            let (docker, next) = (&window[1], window[2].center());
            if LineSegment::new(previous, next).contains_point(docker.center(), tolerance) {
                redundant.push(docker.id());
            } else {
                previous = docker.center();
            }
        }

        for id in &redundant {
            self.remove_docker(*id)?;
        }
        if !redundant.is_empty() {
            debug!(edge_id:% = self.id, removed = redundant.len(); "Pruned redundant dockers");
        }
        Ok(redundant)
    }

    pub(crate) fn docker_mut(&mut self, id: DockerId) -> Result<&mut Docker> {
        let edge = self.id;
        self.dockers
            .iter_mut()
            .find(|docker| docker.id() == id)
            .ok_or(LayoutError::UnknownDocker { edge, docker: id })
    }

    pub(crate) fn dockers_mut(&mut self) -> &mut [Docker] {
        &mut self.dockers
    }

    pub(crate) fn labels_mut(&mut self) -> &mut [Label] {
        &mut self.labels
    }

    pub(crate) fn old_bounds(&self) -> Bounds {
        self.old_bounds
    }

    pub(crate) fn has_pending_docker_update(&self) -> bool {
        self.docker_updated
    }

    /// Marks the edge for the next layout pass.
    pub(crate) fn mark_changed(&mut self) {
        self.changed = true;
    }

    /// Replaces the edge's bounds from outside, as a container resize does.
    /// The next layout pass moves free dockers by the difference.
    pub(crate) fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        self.changed = true;
    }

    pub(crate) fn move_by(&mut self, offset: Point) {
        self.bounds.move_by(offset);
        self.changed = true;
    }

    /// Clears every docker's drag flag, returning whether any was set.
    pub(crate) fn take_dragged(&mut self) -> bool {
        self.dockers
            .iter_mut()
            .fold(false, |dragged, docker| docker.take_moved() || dragged)
    }

    /// Recomputes the bounds from the docker centers.
    pub(crate) fn refresh_bounds(&mut self) {
        if let Some(bounds) = Bounds::enclosing(self.dockers.iter().map(Docker::center)) {
            self.bounds = bounds;
        }
    }

    /// Ends a layout pass: clears change flags and snapshots the bounds.
    pub(crate) fn settle(&mut self) {
        self.changed = false;
        self.docker_updated = false;
        self.old_bounds = self.bounds;
        trace!(edge_id:% = self.id, bounds:? = self.bounds; "Edge settled");
    }

    fn reindex_labels(&mut self) {
        let indices: Vec<Option<(usize, usize)>> = self
            .labels
            .iter()
            .map(|label| {
                let segment = label.reference_point()?.segment();
                Some((
                    self.docker_index(segment.from())?,
                    self.docker_index(segment.to())?,
                ))
            })
            .collect();
        for (label, indices) in self.labels.iter_mut().zip(indices) {
            if let (Some(reference), Some((from, to))) = (label.reference_point_mut(), indices) {
                reference.segment_mut().set_indices(from, to);
            }
        }
    }
}

/// `part / whole`, clamped to `[0, 1]`; `0` when `whole` is zero.
fn ratio_of(part: f32, whole: f32) -> f32 {
    if whole == 0.0 || !whole.is_finite() {
        return 0.0;
    }
    let ratio = part / whole;
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}
