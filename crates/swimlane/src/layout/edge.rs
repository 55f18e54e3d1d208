//! The edge layout pass.
//!
//! [`layout_edge`] brings one edge in line with the shapes it is docked to:
//!
//! 1. Bounds changed from outside (a container reflow, a move of the whole
//!    edge) are turned into a shift and scale of every free docker.
//! 2. Docked dockers pull their position from their shape.
//! 3. The edge's bounds become the bounding box of its docker centers.
//! 4. Labels are placed again.
//! 5. Nodes living on the edge are moved to their recorded segment ratio.
//!
//! The pass is idempotent: running it again without an intervening
//! mutation changes nothing.

use log::{debug, trace, warn};

use swimlane_core::{
    geometry::{Bounds, Point},
    identifier::Id,
};

use crate::{
    config::LayoutConfig,
    edge::Edge,
    label::{LabelAnchor, scale_factor},
    shape::BoundsLookup,
};

/// Attached nodes closer than this to their computed position are left alone.
const SETTLE_EPSILON: f32 = 1e-3;

/// A node living on an edge that has to move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachedMove {
    pub node: Id,
    pub upper_left: Point,
}

/// Result of a layout pass on one edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeLayoutOutcome {
    /// Attached nodes to move, with their new upper-left corners.
    pub attached_moves: Vec<AttachedMove>,
    /// Number of dockers whose position changed.
    pub moved_dockers: usize,
}

/// Runs the layout pass on `edge` if it is marked changed, a docker was
/// dragged or a docker update is pending, or if `force` is set.
///
/// Returns `None` when nothing was due.
pub fn layout_edge(
    edge: &mut Edge,
    shapes: &impl BoundsLookup,
    config: &LayoutConfig,
    force: bool,
) -> Option<EdgeLayoutOutcome> {
    let dragged = edge.take_dragged();
    if !(force || dragged || edge.is_changed()) {
        return None;
    }

    let edge_id = edge.id();
    let mut outcome = EdgeLayoutOutcome::default();

    // Bounds set from outside: carry free dockers along.
    let old = edge.old_bounds();
    let current = edge.bounds();
    let external = (current != old).then_some((old, current));
    if let Some((old, current)) = external {
        let offset = current.upper_left().sub_point(old.upper_left());
        let scale_x = scale_factor(current.width(), old.width());
        let scale_y = scale_factor(current.height(), old.height());
        debug!(
            edge_id:% = edge_id,
            dx = offset.x(),
            dy = offset.y(),
            scale_x,
            scale_y;
            "Propagating external bounds change to free dockers"
        );
        for docker in edge.dockers_mut().iter_mut().filter(|d| !d.is_docked()) {
            let mut center = docker.center().add_point(offset);
            if scale_x != 1.0 || scale_y != 1.0 {
                let relative = center.sub_point(current.upper_left());
                center = current
                    .upper_left()
                    .add_point(Point::new(relative.x() * scale_x, relative.y() * scale_y));
            }
            if center != docker.center() {
                docker.place_at(center);
                outcome.moved_dockers += 1;
            }
        }
    }

    for docker in edge.dockers_mut() {
        let Some(shape) = docker.docked_shape() else {
            continue;
        };
        match shapes.bounds_of(shape) {
            Some(bounds) => {
                if docker.update(bounds) {
                    outcome.moved_dockers += 1;
                }
            }
            None => {
                warn!(
                    edge_id:% = edge_id,
                    docker:% = docker.id(),
                    shape_id:% = shape;
                    "Docked shape not found, leaving docker undocked"
                );
                docker.set_docked_shape(None);
            }
        }
    }

    edge.refresh_bounds();
    layout_labels(edge, external, config);

    for position in edge.attached_nodes() {
        let Some(center) = edge.attached_center(position) else {
            debug!(edge_id:% = edge_id, node_id:% = position.node(); "Attached node lost its segment");
            continue;
        };
        let Some(bounds) = shapes.bounds_of(position.node()) else {
            continue;
        };
        let upper_left = center.sub_point(Point::new(bounds.width() / 2.0, bounds.height() / 2.0));
        if upper_left.distance_to(bounds.upper_left()) > SETTLE_EPSILON {
            outcome.attached_moves.push(AttachedMove {
                node: position.node(),
                upper_left,
            });
        }
    }

    edge.settle();
    debug!(
        edge_id:% = edge_id,
        moved_dockers = outcome.moved_dockers,
        attached_moves = outcome.attached_moves.len();
        "Edge laid out"
    );
    trace!(edge_id:% = edge_id, polyline:? = edge.polyline(); "Edge geometry");
    Some(outcome)
}

fn layout_labels(edge: &mut Edge, external: Option<(Bounds, Bounds)>, config: &LayoutConfig) {
    let polyline = edge.polyline();
    let endpoints: Vec<Option<(Point, Point)>> = edge
        .labels()
        .iter()
        .map(|label| {
            let segment = label.reference_point()?.segment();
            Some((
                edge.docker(segment.from())?.center(),
                edge.docker(segment.to())?.center(),
            ))
        })
        .collect();

    for (label, endpoints) in edge.labels_mut().iter_mut().zip(endpoints) {
        match label.anchor() {
            LabelAnchor::Reference(_) => {
                if let Some((from, to)) = endpoints {
                    label.refresh_reference(from, to);
                }
            }
            LabelAnchor::Fixed => {
                if let Some((old, current)) = external {
                    label.follow_owner(old, current);
                }
            }
            LabelAnchor::Keyword(keyword) => {
                if let Some(placement) = keyword.place(&polyline, config.label()) {
                    label.apply(placement);
                }
            }
        }
    }
}
