//! The shape arena and its mark-dirty / flush protocol.
//!
//! A [`Diagram`] owns every shape of a canvas, keyed by resource id. The
//! diagram itself is the canvas root: top-level shapes have no parent.
//!
//! Mutations never lay anything out directly. They record which edges became
//! dirty and which [`LayoutEvent`]s are pending; [`Diagram::flush`] then
//! runs edge passes, dispatches container events, and repeats until nothing
//! is left dirty or the configured pass cap is reached.
//!
//! # Example
//!
//! ```
//! # use swimlane::{config::LayoutConfig, diagram::Diagram};
//! # use swimlane_core::{geometry::{Bounds, Point, Size}, identifier::Id};
//! let mut diagram = Diagram::new(LayoutConfig::default());
//! let task = Id::new("task");
//! let bounds = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 80.0));
//! diagram.add_node(task, "Task", bounds, None).unwrap();
//!
//! let flow = Id::new("flow");
//! diagram
//!     .add_edge(flow, "SequenceFlow", &[Point::new(50.0, 40.0), Point::new(300.0, 40.0)], None)
//!     .unwrap();
//! let first = diagram.edge(flow).unwrap().first_docker().id();
//! diagram.dock(flow, first, Some(task)).unwrap();
//!
//! diagram.move_shape_by(task, Point::new(0.0, 100.0)).unwrap();
//! diagram.flush();
//! assert_eq!(diagram.edge(flow).unwrap().first_docker().center(), Point::new(50.0, 140.0));
//! ```

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::{IndexMap, IndexSet};
use log::{debug, info, trace, warn};

use swimlane_core::{
    geometry::{Bounds, Point},
    identifier::Id,
    stencil::{ShapeKind, ShapeRole, Stencil},
};

use crate::{
    config::LayoutConfig,
    docker::{Docker, DockerId},
    edge::Edge,
    error::{LayoutError, Result},
    event::LayoutEvent,
    label::Label,
    layout::{ContainerLayout, EdgeLayoutOutcome, layout_edge},
    shape::{BoundsLookup, Node, Shape, ShapeBody},
};

/// Summary of one [`Diagram::flush`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    passes: usize,
    edges_laid_out: usize,
    containers_laid_out: usize,
    errors: Vec<(LayoutEvent, LayoutError)>,
    reordered_pools: Vec<Id>,
    capped: bool,
}

impl FlushReport {
    /// Number of edge-then-event passes run.
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn edges_laid_out(&self) -> usize {
        self.edges_laid_out
    }

    pub fn containers_laid_out(&self) -> usize {
        self.containers_laid_out
    }

    /// Events whose handling failed, with the error each produced. A failing
    /// event does not stop the flush.
    pub fn errors(&self) -> &[(LayoutEvent, LayoutError)] {
        &self.errors
    }

    /// Pools whose lane order changed during the flush.
    pub fn reordered_pools(&self) -> &[Id] {
        &self.reordered_pools
    }

    /// Whether the flush stopped at the pass cap with work left over.
    pub fn is_capped(&self) -> bool {
        self.capped
    }
}

/// A canvas of shapes.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    config: LayoutConfig,
    shapes: IndexMap<Id, Shape>,
    dirty_edges: IndexSet<Id>,
    pending: VecDeque<LayoutEvent>,
    containers: ContainerLayout,
}

impl Diagram {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            shapes: IndexMap::new(),
            dirty_edges: IndexSet::new(),
            pending: VecDeque::new(),
            containers: ContainerLayout::new(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn shape(&self, id: Id) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    /// All shapes, in insertion order.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.values()
    }

    pub fn edge(&self, id: Id) -> Option<&Edge> {
        self.shapes.get(&id)?.as_edge()
    }

    pub fn bounds_of(&self, id: Id) -> Option<Bounds> {
        self.shapes.get(&id).map(Shape::bounds)
    }

    pub fn children(&self, id: Id) -> &[Id] {
        self.shapes.get(&id).map(Shape::children).unwrap_or(&[])
    }

    /// Every shape below `id`, in pre-order. Does not include `id` itself.
    pub fn descendants(&self, id: Id) -> Vec<Id> {
        let mut result = Vec::new();
        let mut stack: Vec<Id> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        result
    }

    /// Edges whose last docker is docked to `node`.
    pub fn incoming_edges(&self, node: Id) -> Vec<Id> {
        self.edges_where(|edge| edge.last_docker().docked_shape() == Some(node))
    }

    /// Edges whose first docker is docked to `node`.
    pub fn outgoing_edges(&self, node: Id) -> Vec<Id> {
        self.edges_where(|edge| edge.first_docker().docked_shape() == Some(node))
    }

    /// The outermost pool containing `id`, or `id` itself if it is one.
    pub fn pool_of(&self, id: Id) -> Option<Id> {
        let mut pool = None;
        let mut current = Some(id);
        while let Some(shape) = current.and_then(|id| self.shapes.get(&id)) {
            if shape.role() == ShapeRole::Pool {
                pool = Some(shape.id());
            }
            current = shape.parent();
        }
        pool
    }

    /// Whether a flush has work to do.
    pub fn needs_flush(&self) -> bool {
        !self.dirty_edges.is_empty() || !self.pending.is_empty()
    }

    /// Adds a node shape.
    ///
    /// A node whose parent is an edge lives on that edge and follows it.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::DuplicateShape`] if `id` is taken.
    /// - [`LayoutError::MissingStencil`] if `stencil` is empty.
    /// - [`LayoutError::NotANode`] if the stencil names an edge type.
    /// - [`LayoutError::InvalidParent`] if `parent` does not exist.
    pub fn add_node(
        &mut self,
        id: Id,
        stencil: &str,
        bounds: Bounds,
        parent: Option<Id>,
    ) -> Result<()> {
        let stencil = self.resolve_new(id, stencil, parent)?;
        if stencil.kind() != ShapeKind::Node {
            return Err(LayoutError::NotANode(id));
        }
        let body = ShapeBody::Node(Node::new(bounds));
        self.insert(Shape::new(id, stencil, parent, body));
        if let Some(parent) = parent {
            self.attach_to_edge(parent, id, bounds.center());
        }
        debug!(shape_id:% = id, role:% = stencil.role(); "Added node");
        self.enqueue_container_events(id);
        Ok(())
    }

    /// Adds an edge shape with one docker per point.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::DuplicateShape`] if `id` is taken.
    /// - [`LayoutError::MissingStencil`] if `stencil` is empty.
    /// - [`LayoutError::NotAnEdge`] if the stencil names a node type.
    /// - [`LayoutError::InvalidParent`] if `parent` does not exist or is an edge.
    /// - [`LayoutError::TooFewDockers`] for fewer than two points.
    pub fn add_edge(
        &mut self,
        id: Id,
        stencil: &str,
        points: &[Point],
        parent: Option<Id>,
    ) -> Result<()> {
        let stencil = self.resolve_new(id, stencil, parent)?;
        if stencil.kind() != ShapeKind::Edge {
            return Err(LayoutError::NotAnEdge(id));
        }
        if let Some(parent) = parent {
            if self.shapes.get(&parent).is_some_and(Shape::is_edge) {
                return Err(LayoutError::InvalidParent { child: id, parent });
            }
        }
        let edge = Edge::new(id, points, self.config.edge().docker_size())?;
        self.insert(Shape::new(id, stencil, parent, ShapeBody::Edge(edge)));
        self.dirty_edges.insert(id);
        debug!(edge_id:% = id, dockers = points.len(); "Added edge");
        Ok(())
    }

    /// Removes `id` and its whole subtree.
    ///
    /// Dockers docked to a removed node are undocked where they are, and
    /// nodes living on a removed edge are dropped with it.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownShape`] if `id` does not exist.
    pub fn remove_shape(&mut self, id: Id) -> Result<()> {
        let parent = self
            .shapes
            .get(&id)
            .ok_or(LayoutError::UnknownShape(id))?
            .parent();
        let removed: HashSet<Id> = std::iter::once(id)
            .chain(self.descendants(id))
            .collect();

        for shape in &removed {
            self.shapes.shift_remove(shape);
            self.dirty_edges.shift_remove(shape);
            self.containers.forget(*shape);
        }
        if let Some(parent) = parent.and_then(|parent| self.shapes.get_mut(&parent)) {
            parent.remove_child(id);
        }

        for shape in self.shapes.values_mut() {
            let shape_id = shape.id();
            let Some(edge) = shape.as_edge_mut() else {
                continue;
            };
            let mut touched = false;
            for docker in edge.dockers_mut() {
                if docker.docked_shape().is_some_and(|s| removed.contains(&s)) {
                    docker.set_docked_shape(None);
                    touched = true;
                }
            }
            for node in &removed {
                touched |= edge.detach_node(*node).is_some();
            }
            if touched {
                edge.mark_changed();
                self.dirty_edges.insert(shape_id);
            }
        }

        debug!(shape_id:% = id, removed = removed.len(); "Removed shape");
        self.pending
            .push_back(LayoutEvent::ShapeRemoved { shape: id, parent });
        Ok(())
    }

    /// Moves `id` under `parent`, or to the canvas root for `None`.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::UnknownShape`] if either shape does not exist.
    /// - [`LayoutError::InvalidParent`] if the move would create a cycle or
    ///   put an edge inside an edge.
    pub fn set_parent(&mut self, id: Id, parent: Option<Id>) -> Result<()> {
        let shape = self.shapes.get(&id).ok_or(LayoutError::UnknownShape(id))?;
        let old_parent = shape.parent();
        let is_edge = shape.is_edge();
        let center = shape.bounds().center();
        if let Some(parent) = parent {
            let target = self
                .shapes
                .get(&parent)
                .ok_or(LayoutError::UnknownShape(parent))?;
            let cycle = parent == id || self.descendants(id).contains(&parent);
            if cycle || (is_edge && target.is_edge()) {
                return Err(LayoutError::InvalidParent { child: id, parent });
            }
        }
        if old_parent == parent {
            return Ok(());
        }

        let old_pool = self.pool_of(id);
        if let Some(old) = old_parent {
            self.detach_from_edge(old, id);
            if let Some(shape) = self.shapes.get_mut(&old) {
                shape.remove_child(id);
            }
        }
        if let Some(new) = parent {
            if let Some(shape) = self.shapes.get_mut(&new) {
                shape.add_child(id);
            }
            if !is_edge {
                self.attach_to_edge(new, id, center);
            }
        }
        if let Some(shape) = self.shapes.get_mut(&id) {
            shape.set_parent(parent);
        }
        debug!(shape_id:% = id, parent:? = parent; "Reparented shape");

        if self.shapes.get(&id).is_some_and(|s| s.role() == ShapeRole::Lane) {
            if let Some(pool) = old_pool.filter(|pool| Some(*pool) != self.pool_of(id)) {
                self.pending
                    .push_back(LayoutEvent::LayoutPool { pool, changed: None });
            }
        }
        self.enqueue_container_events(id);
        Ok(())
    }

    /// Moves a shape. A node carries its subtree along; an edge shifts its
    /// bounds and lets the next pass move its free dockers.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownShape`] if `id` does not exist.
    pub fn move_shape_by(&mut self, id: Id, offset: Point) -> Result<()> {
        let shape = self
            .shapes
            .get_mut(&id)
            .ok_or(LayoutError::UnknownShape(id))?;
        if let Some(edge) = shape.as_edge_mut() {
            edge.move_by(offset);
            self.dirty_edges.insert(id);
            return Ok(());
        }
        self.translate_subtree(id, offset);
        self.reattach(id);
        self.enqueue_container_events(id);
        Ok(())
    }

    /// Gives a node new bounds. Its children keep their absolute position.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::UnknownShape`] if `id` does not exist.
    /// - [`LayoutError::NotANode`] if it is an edge.
    pub fn resize_shape(&mut self, id: Id, bounds: Bounds) -> Result<()> {
        let shape = self.shapes.get(&id).ok_or(LayoutError::UnknownShape(id))?;
        if !shape.is_node() {
            return Err(LayoutError::NotANode(id));
        }
        self.place_node(id, bounds);
        self.reattach(id);
        self.enqueue_container_events(id);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownShape`] if `id` does not exist.
    pub fn set_name(&mut self, id: Id, name: impl Into<String>) -> Result<()> {
        self.shapes
            .get_mut(&id)
            .ok_or(LayoutError::UnknownShape(id))?
            .set_name(name);
        self.pending.push_back(LayoutEvent::PropertyChanged {
            shape: id,
            key: "name".to_owned(),
        });
        Ok(())
    }

    /// Docks `docker` to `target`, or undocks it for `None`. A newly docked
    /// docker keeps its reference point, or takes the shape's center.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::UnknownShape`] if the edge or target does not exist.
    /// - [`LayoutError::NotAnEdge`] / [`LayoutError::NotANode`] on a kind mismatch.
    /// - [`LayoutError::UnknownDocker`] if the edge has no such docker.
    pub fn dock(&mut self, edge: Id, docker: DockerId, target: Option<Id>) -> Result<()> {
        let target = match target {
            Some(target) => {
                let shape = self
                    .shapes
                    .get(&target)
                    .ok_or(LayoutError::UnknownShape(target))?;
                if !shape.is_node() {
                    return Err(LayoutError::NotANode(target));
                }
                Some((target, shape.bounds()))
            }
            None => None,
        };
        let edge_mut = self.edge_mut(edge)?;
        edge_mut.docker_mut(docker)?.set_docked_shape(target);
        edge_mut.mark_changed();
        self.dirty_edges.insert(edge);
        trace!(edge_id:% = edge, docker:% = docker, target:? = target; "Docker docked");
        self.pending
            .push_back(LayoutEvent::DockerDocked { edge, docker });
        Ok(())
    }

    /// Docks by resource id as read from a document. An id naming no shape
    /// leaves the docker undocked.
    ///
    /// # Errors
    ///
    /// As [`Diagram::dock`], except for an unknown target.
    pub fn dock_by_id(&mut self, edge: Id, docker: DockerId, target: &str) -> Result<()> {
        let id = Id::new(target);
        if self.shapes.contains_key(&id) {
            return self.dock(edge, docker, Some(id));
        }
        warn!(
            edge_id:% = edge,
            docker:% = docker,
            target;
            "Unknown docking target, leaving docker undocked"
        );
        self.dock(edge, docker, None)
    }

    /// Sets where a docked docker sits on its shape, relative to the
    /// shape's upper-left corner.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownShape`], [`LayoutError::NotAnEdge`] or
    /// [`LayoutError::UnknownDocker`] for a bad edge or docker.
    pub fn set_reference_point(
        &mut self,
        edge: Id,
        docker: DockerId,
        reference: Point,
    ) -> Result<()> {
        let edge_mut = self.edge_mut(edge)?;
        edge_mut.docker_mut(docker)?.set_reference_point(reference);
        edge_mut.mark_changed();
        self.dirty_edges.insert(edge);
        Ok(())
    }

    /// Drags a docker to `position`. A docked docker stays docked and takes
    /// the new position as its reference point.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownShape`], [`LayoutError::NotAnEdge`] or
    /// [`LayoutError::UnknownDocker`] for a bad edge or docker.
    pub fn move_docker(&mut self, edge: Id, docker: DockerId, position: Point) -> Result<()> {
        let docked = self
            .edge(edge)
            .and_then(|e| e.docker(docker))
            .and_then(Docker::docked_shape)
            .and_then(|shape| self.bounds_of(shape));
        let target = self.edge_mut(edge)?.docker_mut(docker)?;
        if let Some(bounds) = docked {
            target.set_reference_point(position.sub_point(bounds.upper_left()));
        }
        target.move_to(position);
        self.dirty_edges.insert(edge);
        Ok(())
    }

    /// Splits the segment of `edge` passing through `point` with a new
    /// docker.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NoSegmentAt`] if no segment passes within the hit
    /// tolerance, or an edge lookup error.
    pub fn add_docker(&mut self, edge: Id, point: Point) -> Result<DockerId> {
        let tolerance = self.config.edge().docker_hit_tolerance();
        let id = self.edge_mut(edge)?.add_docker(point, tolerance)?;
        self.dirty_edges.insert(edge);
        Ok(id)
    }

    /// # Errors
    ///
    /// See [`Edge::remove_docker`].
    pub fn remove_docker(&mut self, edge: Id, docker: DockerId) -> Result<Docker> {
        let removed = self.edge_mut(edge)?.remove_docker(docker)?;
        self.dirty_edges.insert(edge);
        Ok(removed)
    }

    /// Puts a docker back at `index`, appending it when `index` is past the
    /// last docker.
    pub(crate) fn restore_docker(
        &mut self,
        edge: Id,
        index: usize,
        center: Point,
    ) -> Result<DockerId> {
        let edge_mut = self.edge_mut(edge)?;
        let id = if index >= edge_mut.dockers().len() {
            edge_mut.push_docker(center)
        } else {
            edge_mut.insert_docker(index, center)
        };
        self.dirty_edges.insert(edge);
        Ok(id)
    }

    /// Lays the edge out, then removes interior dockers lying on the line
    /// between their neighbors.
    ///
    /// # Errors
    ///
    /// An edge lookup error.
    pub fn remove_unused_dockers(&mut self, edge: Id) -> Result<Vec<DockerId>> {
        self.edge_mut(edge)?;
        self.run_edge_layout(edge, true);
        let tolerance = self.config.edge().collinear_tolerance();
        let removed = self.edge_mut(edge)?.remove_unused_dockers(tolerance)?;
        if !removed.is_empty() {
            self.dirty_edges.insert(edge);
        }
        Ok(removed)
    }

    /// # Errors
    ///
    /// An edge lookup error.
    pub fn add_label(&mut self, edge: Id, label: Label) -> Result<()> {
        self.edge_mut(edge)?.add_label(label);
        self.dirty_edges.insert(edge);
        Ok(())
    }

    /// Moves the label at `index` of `edge`. Returns `false` if there is no
    /// such label.
    ///
    /// # Errors
    ///
    /// An edge lookup error.
    pub fn move_label(&mut self, edge: Id, index: usize, position: Point) -> Result<bool> {
        let edge_mut = self.edge_mut(edge)?;
        let Some(label) = edge_mut.labels_mut().get_mut(index) else {
            return Ok(false);
        };
        label.move_to(position);
        edge_mut.mark_changed();
        self.dirty_edges.insert(edge);
        Ok(true)
    }

    /// Makes `node` live on `edge`, at the segment position nearest to its
    /// center.
    ///
    /// # Errors
    ///
    /// As [`Diagram::set_parent`], plus [`LayoutError::NotAnEdge`] /
    /// [`LayoutError::NotANode`] on a kind mismatch.
    pub fn attach_node(&mut self, edge: Id, node: Id) -> Result<()> {
        self.edge_mut(edge)?;
        if !self
            .shapes
            .get(&node)
            .ok_or(LayoutError::UnknownShape(node))?
            .is_node()
        {
            return Err(LayoutError::NotANode(node));
        }
        self.set_parent(node, Some(edge))
    }

    /// Queues an event for the next flush.
    pub fn handle_event(&mut self, event: LayoutEvent) {
        trace!(event:% = event; "Queued layout event");
        self.pending.push_back(event);
    }

    /// Runs every pending layout pass.
    ///
    /// Each pass lays out the dirty edges, then dispatches the pending
    /// events. Container passes dirty further edges, so passes repeat until
    /// nothing is left or [`FlushConfig::max_passes`] is reached. A failing
    /// event is logged and recorded in the report; the flush goes on.
    ///
    /// [`FlushConfig::max_passes`]: crate::config::FlushConfig::max_passes
    pub fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();
        let max_passes = self.config.flush().max_passes();
        info!(
            dirty_edges = self.dirty_edges.len(),
            pending_events = self.pending.len();
            "Flushing layout"
        );

        while self.needs_flush() {
            if report.passes >= max_passes {
                warn!(
                    passes = report.passes,
                    dirty_edges = self.dirty_edges.len(),
                    pending_events = self.pending.len();
                    "Flush pass limit reached, leaving work for the next flush"
                );
                report.capped = true;
                break;
            }
            report.passes += 1;

            let edges: Vec<Id> = self.dirty_edges.drain(..).collect();
            for edge in edges {
                if self.run_edge_layout(edge, false).is_some() {
                    report.edges_laid_out += 1;
                }
            }

            let events: Vec<LayoutEvent> = self.pending.drain(..).collect();
            for event in events {
                if let Err(err) = self.dispatch(&event, &mut report) {
                    warn!(event:% = event, err:% = err; "Layout event failed");
                    report.errors.push((event, err));
                }
            }
        }

        info!(
            passes = report.passes,
            edges = report.edges_laid_out,
            containers = report.containers_laid_out,
            errors = report.errors.len();
            "Flushed layout"
        );
        report
    }

    fn dispatch(&mut self, event: &LayoutEvent, report: &mut FlushReport) -> Result<()> {
        match event {
            LayoutEvent::ShapeRemoved { parent, .. } => {
                if let Some(pool) = parent.and_then(|parent| self.pool_of(parent)) {
                    self.run_pool_layout(pool, None, report)?;
                }
            }
            LayoutEvent::DockerDocked { edge, .. } => {
                if self.shapes.contains_key(edge) {
                    self.dirty_edges.insert(*edge);
                }
            }
            LayoutEvent::PropertyChanged { shape, key } => {
                let is_lane = self
                    .shapes
                    .get(shape)
                    .is_some_and(|s| s.role() == ShapeRole::Lane);
                if key == "name" && is_lane {
                    if let Some(pool) = self.pool_of(*shape) {
                        self.run_pool_layout(pool, Some(*shape), report)?;
                    }
                }
            }
            LayoutEvent::LayoutPool { pool, changed } => {
                if self.shapes.contains_key(pool) {
                    self.run_pool_layout(*pool, *changed, report)?;
                } else {
                    trace!(pool_id:% = pool; "Pool gone before layout");
                }
            }
            LayoutEvent::LayoutSubProcess { shape } => {
                if self.shapes.contains_key(shape) {
                    let mut containers = std::mem::take(&mut self.containers);
                    let result = containers.layout_sub_process(self, *shape);
                    self.containers = containers;
                    result?;
                    report.containers_laid_out += 1;
                }
            }
        }
        Ok(())
    }

    fn run_pool_layout(
        &mut self,
        pool: Id,
        changed: Option<Id>,
        report: &mut FlushReport,
    ) -> Result<()> {
        let mut containers = std::mem::take(&mut self.containers);
        let result = containers.layout_pool(self, pool, changed);
        self.containers = containers;
        let outcome = result?;
        report.containers_laid_out += 1;
        if outcome.reordered && !report.reordered_pools.contains(&pool) {
            report.reordered_pools.push(pool);
        }
        Ok(())
    }

    /// Lays out one edge and moves the nodes living on it.
    fn run_edge_layout(&mut self, id: Id, force: bool) -> Option<EdgeLayoutOutcome> {
        let edge = self.edge(id)?;
        let lookup: HashMap<Id, Bounds> = edge
            .dockers()
            .iter()
            .filter_map(Docker::docked_shape)
            .chain(edge.attached_nodes().map(|position| position.node()))
            .filter_map(|shape| Some((shape, self.bounds_of(shape)?)))
            .collect();

        let config = &self.config;
        let edge = self.shapes.get_mut(&id)?.as_edge_mut()?;
        let outcome = layout_edge(edge, &lookup, config, force)?;
        for attached in &outcome.attached_moves {
            if let Some(mut bounds) = self.bounds_of(attached.node) {
                bounds.move_to(attached.upper_left);
                self.place_node(attached.node, bounds);
            }
        }
        Some(outcome)
    }

    pub(crate) fn edge_mut(&mut self, id: Id) -> Result<&mut Edge> {
        self.shapes
            .get_mut(&id)
            .ok_or(LayoutError::UnknownShape(id))?
            .as_edge_mut()
            .ok_or(LayoutError::NotAnEdge(id))
    }

    pub(crate) fn mark_edge_dirty(&mut self, id: Id) {
        self.dirty_edges.insert(id);
    }

    pub(crate) fn set_show_caption(&mut self, id: Id, show: bool) {
        if let Some(shape) = self.shapes.get_mut(&id) {
            shape.set_show_caption(show);
        }
    }

    /// Sets a node's bounds and dirties the edges docked to it.
    pub(crate) fn place_node(&mut self, id: Id, bounds: Bounds) {
        let Some(node) = self.shapes.get_mut(&id).and_then(Shape::as_node_mut) else {
            return;
        };
        node.set_bounds(bounds);
        self.mark_connected_edges(id);
    }

    /// Moves a node and every node below it by `offset`.
    pub(crate) fn translate_subtree(&mut self, id: Id, offset: Point) {
        let nodes: Vec<Id> = std::iter::once(id).chain(self.descendants(id)).collect();
        for node in nodes {
            let bounds = self.shapes.get(&node).and_then(Shape::as_node).map(Node::bounds);
            if let Some(bounds) = bounds {
                self.place_node(node, bounds.translate(offset));
            }
        }
    }

    /// Edges that are members themselves, are parented by one, or have a
    /// docker docked to one.
    pub(crate) fn edges_touching(&self, members: &HashSet<Id>) -> Vec<Id> {
        self.edges_where(|edge| {
            members.contains(&edge.id())
                || edge
                    .dockers()
                    .iter()
                    .any(|docker| docker.docked_shape().is_some_and(|s| members.contains(&s)))
        })
        .into_iter()
        .chain(
            self.shapes
                .values()
                .filter(|shape| {
                    shape.is_edge() && shape.parent().is_some_and(|p| members.contains(&p))
                })
                .map(Shape::id),
        )
        .collect::<IndexSet<Id>>()
        .into_iter()
        .collect()
    }

    fn edges_where(&self, predicate: impl Fn(&Edge) -> bool) -> Vec<Id> {
        self.shapes
            .values()
            .filter_map(Shape::as_edge)
            .filter(|edge| predicate(edge))
            .map(Edge::id)
            .collect()
    }

    fn mark_connected_edges(&mut self, node: Id) {
        let connected = self.edges_where(|edge| {
            edge.dockers()
                .iter()
                .any(|docker| docker.docked_shape() == Some(node))
        });
        for edge in connected {
            if let Some(edge_mut) = self.shapes.get_mut(&edge).and_then(Shape::as_edge_mut) {
                edge_mut.mark_changed();
            }
            self.dirty_edges.insert(edge);
        }
    }

    fn resolve_new(&self, id: Id, stencil: &str, parent: Option<Id>) -> Result<Stencil> {
        if self.shapes.contains_key(&id) {
            return Err(LayoutError::DuplicateShape(id));
        }
        let stencil = Stencil::resolve(stencil).map_err(|_| LayoutError::MissingStencil(id))?;
        if let Some(parent) = parent {
            if !self.shapes.contains_key(&parent) {
                return Err(LayoutError::InvalidParent { child: id, parent });
            }
        }
        Ok(stencil)
    }

    fn insert(&mut self, shape: Shape) {
        let (id, parent) = (shape.id(), shape.parent());
        self.shapes.insert(id, shape);
        if let Some(parent) = parent.and_then(|parent| self.shapes.get_mut(&parent)) {
            parent.add_child(id);
        }
    }

    /// Records `node` on `parent` if the parent is an edge.
    fn attach_to_edge(&mut self, parent: Id, node: Id, center: Point) {
        if let Some(edge) = self.shapes.get_mut(&parent).and_then(Shape::as_edge_mut) {
            edge.attach_node(node, center);
            self.dirty_edges.insert(parent);
        }
    }

    fn detach_from_edge(&mut self, parent: Id, node: Id) {
        if let Some(edge) = self.shapes.get_mut(&parent).and_then(Shape::as_edge_mut) {
            edge.detach_node(node);
        }
    }

    /// Re-records where a node living on an edge sits after a direct move.
    fn reattach(&mut self, id: Id) {
        let Some(shape) = self.shapes.get(&id) else {
            return;
        };
        if let Some(parent) = shape.parent() {
            let center = shape.bounds().center();
            self.attach_to_edge(parent, id, center);
        }
    }

    fn enqueue_container_events(&mut self, id: Id) {
        let Some(role) = self.shapes.get(&id).map(Shape::role) else {
            return;
        };
        match role {
            ShapeRole::Pool | ShapeRole::Lane => {
                if let Some(pool) = self.pool_of(id) {
                    self.pending.push_back(LayoutEvent::LayoutPool {
                        pool,
                        changed: Some(id),
                    });
                }
            }
            ShapeRole::SubProcess => {
                self.pending
                    .push_back(LayoutEvent::LayoutSubProcess { shape: id });
            }
            _ => {}
        }
    }
}

impl BoundsLookup for Diagram {
    fn bounds_of(&self, id: Id) -> Option<Bounds> {
        Diagram::bounds_of(self, id)
    }
}
