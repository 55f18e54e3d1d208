//! Pool, lane and sub-process layout.
//!
//! Lanes of a pool are stacked vertically, top to bottom, and nest
//! recursively. [`ContainerLayout`] keeps the invariant that every parent
//! (the pool or a lane) is exactly as tall as its child lanes together, and
//! that every lane spans its parent's width minus one indent per nesting
//! level.
//!
//! The layout is incremental. Per pool it caches the bounds, nesting depth
//! and top-to-bottom order of every lane as of the last pass, and diffs the
//! diagram against that cache to decide what happened:
//!
//! - lanes were added or removed,
//! - a lane moved to another parent or nesting level,
//! - the pool itself was resized or moved,
//! - a single lane was resized or moved.
//!
//! After the lanes are placed, free dockers of edges connected to the pool
//! are carried along with the lane that contained them, scaled vertically
//! when that lane was stretched. A pool that only moved shifts all of them by
//! its offset instead, lanes or not.
//!
//! Sub-processes only cache their bounds: when one moves without changing
//! size, the free dockers of edges connected to its children move with it.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, info, trace};

use swimlane_core::{
    geometry::{Bounds, Point},
    identifier::Id,
    stencil::ShapeRole,
};

use crate::{
    diagram::Diagram,
    error::{LayoutError, Result},
    label::scale_factor,
};

/// Geometry differences below this are treated as float noise.
const EPSILON: f32 = 1e-3;

/// What a container pass detected and acted on.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerChange {
    /// Nothing differs from the cached state.
    Unchanged,
    /// Lanes were added to or removed from the pool.
    Structure { added: Vec<Id>, removed: Vec<Id> },
    /// Lanes whose parent or nesting depth differs from the cache.
    Nesting(Vec<Id>),
    /// The container's own bounds changed.
    Container,
    /// A lane was resized or moved directly.
    Lane(Id),
}

/// Result of a container pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerOutcome {
    pub container: Id,
    pub change: ContainerChange,
    /// Shapes whose bounds were changed by the pass.
    pub placed: Vec<Id>,
    pub moved_dockers: usize,
    /// Whether the top-to-bottom order of the lanes changed.
    pub reordered: bool,
}

impl ContainerOutcome {
    fn new(container: Id, change: ContainerChange) -> Self {
        Self {
            container,
            change,
            placed: Vec::new(),
            moved_dockers: 0,
            reordered: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LaneCache {
    bounds: Bounds,
    depth: usize,
    /// The pool or the enclosing lane.
    parent: Id,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct PoolCache {
    bounds: Bounds,
    /// Lanes in top-to-bottom pre-order.
    lanes: IndexMap<Id, LaneCache>,
}

/// Cached container geometry, carried between passes.
#[derive(Debug, Clone, Default)]
pub struct ContainerLayout {
    pools: IndexMap<Id, PoolCache>,
    sub_processes: IndexMap<Id, Bounds>,
}

impl ContainerLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every cache entry of a removed shape.
    pub fn forget(&mut self, shape: Id) {
        self.pools.shift_remove(&shape);
        self.sub_processes.shift_remove(&shape);
    }

    /// Lays out the lanes of `pool`.
    ///
    /// `changed` names the shape that triggered the pass, if known; it wins
    /// when several lanes differ from the cache.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::UnknownShape`] if the pool does not exist.
    /// - [`LayoutError::NotAContainer`] if it is not a pool.
    pub fn layout_pool(
        &mut self,
        diagram: &mut Diagram,
        pool: Id,
        changed: Option<Id>,
    ) -> Result<ContainerOutcome> {
        let shape = diagram.shape(pool).ok_or(LayoutError::UnknownShape(pool))?;
        if shape.role() != ShapeRole::Pool {
            return Err(LayoutError::NotAContainer(pool));
        }
        let pool_bounds = shape.bounds();
        let cache = self.pools.get(&pool).cloned().unwrap_or_default();
        let first_pass = !self.pools.contains_key(&pool);
        let tree = LaneTree::build(diagram, pool, &cache);

        let added: Vec<Id> = tree
            .order
            .iter()
            .copied()
            .filter(|lane| !cache.lanes.contains_key(lane))
            .collect();
        let removed: Vec<Id> = cache
            .lanes
            .keys()
            .copied()
            .filter(|lane| !tree.current.contains_key(lane))
            .collect();
        let changed_lanes: Vec<Id> = tree
            .order
            .iter()
            .copied()
            .filter(|lane| {
                cache
                    .lanes
                    .get(lane)
                    .is_some_and(|cached| differs(cached.bounds, tree.current[lane]))
            })
            .collect();
        let nested: Vec<Id> = tree
            .order
            .iter()
            .copied()
            .filter(|lane| {
                cache.lanes.get(lane).is_some_and(|cached| {
                    cached.depth != tree.depth[lane]
                        || Some(&cached.parent) != tree.parent.get(lane)
                })
            })
            .collect();

        let change = if !added.is_empty() || !removed.is_empty() {
            ContainerChange::Structure { added, removed }
        } else if !nested.is_empty() {
            ContainerChange::Nesting(nested)
        } else if !first_pass && differs(cache.bounds, pool_bounds) {
            ContainerChange::Container
        } else if let Some(lane) = changed
            .filter(|id| changed_lanes.contains(id))
            .or_else(|| changed_lanes.first().copied())
        {
            ContainerChange::Lane(lane)
        } else {
            ContainerChange::Unchanged
        };
        debug!(pool_id:% = pool, change:? = change; "Laying out pool");

        let mut outcome = ContainerOutcome::new(pool, change.clone());
        let indent = diagram.config().container().lane_indent();
        let moved_only =
            change == ContainerChange::Container && !resized(cache.bounds, pool_bounds);

        if change != ContainerChange::Unchanged && !tree.order.is_empty() {
            let plan = plan(&tree, &cache, &change, pool_bounds, indent);
            let finals = arrange(&tree, &plan, indent);
            trace!(pool_id:% = pool, finals:? = finals; "Final lane bounds");

            apply(diagram, &tree, &finals, &mut outcome);
            if differs(pool_bounds, plan.pool) {
                diagram.place_node(pool, plan.pool);
                outcome.placed.push(pool);
            }
            if !moved_only {
                outcome.moved_dockers = carry_dockers(diagram, pool, &cache, &finals);
            }
        }
        if moved_only {
            let offset = pool_bounds.upper_left().sub_point(cache.bounds.upper_left());
            let mut members: HashSet<Id> = diagram.descendants(pool).into_iter().collect();
            members.insert(pool);
            outcome.moved_dockers = shift_free_dockers(diagram, &members, offset);
            debug!(
                pool_id:% = pool,
                dx = offset.x(),
                dy = offset.y(),
                moved_dockers = outcome.moved_dockers;
                "Pool moved"
            );
        }
        if change != ContainerChange::Unchanged {
            // Sub-processes carried along already had their dockers moved.
            for shape in diagram.descendants(pool) {
                let bounds = diagram.bounds_of(shape);
                if let (Some(cached), Some(bounds)) = (self.sub_processes.get_mut(&shape), bounds) {
                    *cached = bounds;
                }
            }
        }

        update_captions(diagram, &tree);

        let order: Vec<Id> = tree.order.clone();
        let previous: Vec<Id> = cache
            .lanes
            .keys()
            .copied()
            .filter(|lane| tree.current.contains_key(lane))
            .collect();
        let kept: Vec<Id> = order
            .iter()
            .copied()
            .filter(|lane| cache.lanes.contains_key(lane))
            .collect();
        outcome.reordered = previous != kept;
        if outcome.reordered {
            info!(pool_id:% = pool, order:? = order; "Lane order changed");
        }

        self.pools
            .insert(pool, PoolCache::capture(diagram, pool, &tree));
        Ok(outcome)
    }

    /// Lays out a sub-process after it was moved or resized.
    ///
    /// A pure move shifts the free dockers of every edge connected to one of
    /// its descendants, endpoints included for edges living inside it; a
    /// resize leaves dockers alone.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::UnknownShape`] if the shape does not exist.
    /// - [`LayoutError::NotAContainer`] if it is not a sub-process.
    pub fn layout_sub_process(
        &mut self,
        diagram: &mut Diagram,
        shape: Id,
    ) -> Result<ContainerOutcome> {
        let current = diagram
            .shape(shape)
            .ok_or(LayoutError::UnknownShape(shape))?;
        if current.role() != ShapeRole::SubProcess {
            return Err(LayoutError::NotAContainer(shape));
        }
        let current = current.bounds();

        let Some(previous) = self.sub_processes.insert(shape, current) else {
            return Ok(ContainerOutcome::new(shape, ContainerChange::Unchanged));
        };
        if previous == current {
            return Ok(ContainerOutcome::new(shape, ContainerChange::Unchanged));
        }

        let mut outcome = ContainerOutcome::new(shape, ContainerChange::Container);
        if !previous.same_size(current) {
            debug!(shape_id:% = shape; "Sub-process resized, dockers stay");
            return Ok(outcome);
        }

        let offset = current.upper_left().sub_point(previous.upper_left());
        let members: HashSet<Id> = diagram.descendants(shape).into_iter().collect();
        outcome.moved_dockers = shift_free_dockers(diagram, &members, offset);
        debug!(
            shape_id:% = shape,
            dx = offset.x(),
            dy = offset.y(),
            moved_dockers = outcome.moved_dockers;
            "Sub-process moved"
        );
        Ok(outcome)
    }
}

impl PoolCache {
    fn capture(diagram: &Diagram, pool: Id, tree: &LaneTree) -> Self {
        let lanes = tree
            .order
            .iter()
            .filter_map(|lane| {
                Some((
                    *lane,
                    LaneCache {
                        bounds: diagram.bounds_of(*lane)?,
                        depth: tree.depth[lane],
                        parent: tree.parent.get(lane).copied().unwrap_or(pool),
                    },
                ))
            })
            .collect();
        Self {
            bounds: diagram.bounds_of(pool).unwrap_or_default(),
            lanes,
        }
    }
}

/// Snapshot of a pool's lane hierarchy, sorted top to bottom.
#[derive(Debug)]
struct LaneTree {
    pool: Id,
    children: HashMap<Id, Vec<Id>>,
    parent: HashMap<Id, Id>,
    current: HashMap<Id, Bounds>,
    depth: HashMap<Id, usize>,
    /// Every lane in pre-order.
    order: Vec<Id>,
}

impl LaneTree {
    fn build(diagram: &Diagram, pool: Id, cache: &PoolCache) -> Self {
        let mut tree = Self {
            pool,
            children: HashMap::new(),
            parent: HashMap::new(),
            current: HashMap::new(),
            depth: HashMap::new(),
            order: Vec::new(),
        };
        tree.collect(diagram, pool, 1, cache);
        tree
    }

    fn collect(&mut self, diagram: &Diagram, parent: Id, depth: usize, cache: &PoolCache) {
        let Some(shape) = diagram.shape(parent) else {
            return;
        };
        let mut lanes: Vec<(Id, Bounds)> = shape
            .children()
            .iter()
            .filter_map(|child| {
                let child = diagram.shape(*child)?;
                (child.role() == ShapeRole::Lane && child.is_node())
                    .then(|| (child.id(), child.bounds()))
            })
            .collect();
        let cached_index = |id: &Id| cache.lanes.get_index_of(id).unwrap_or(usize::MAX);
        lanes.sort_by(|(a, a_bounds), (b, b_bounds)| {
            a_bounds
                .min_y()
                .round()
                .total_cmp(&b_bounds.min_y().round())
                .then_with(|| cached_index(a).cmp(&cached_index(b)))
        });

        self.children
            .insert(parent, lanes.iter().map(|(id, _)| *id).collect());
        for (lane, bounds) in lanes {
            self.parent.insert(lane, parent);
            self.current.insert(lane, bounds);
            self.depth.insert(lane, depth);
            self.order.push(lane);
            self.collect(diagram, lane, depth + 1, cache);
        }
    }

    fn child_lanes(&self, parent: Id) -> &[Id] {
        self.children.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Height a lane asks for: an override, the sum of its child lanes, or
    /// its current height for a leaf.
    fn natural_height(&self, lane: Id, overrides: &HashMap<Id, f32>) -> f32 {
        if let Some(height) = overrides.get(&lane) {
            return *height;
        }
        let children = self.child_lanes(lane);
        if children.is_empty() {
            self.current.get(&lane).map_or(0.0, |bounds| bounds.height())
        } else {
            children
                .iter()
                .map(|child| self.natural_height(*child, overrides))
                .sum()
        }
    }

    fn parent_height(&self, parent: Id, pool_bounds: Bounds) -> f32 {
        if parent == self.pool {
            pool_bounds.height()
        } else {
            self.current.get(&parent).map_or(0.0, |bounds| bounds.height())
        }
    }
}

/// Target pool bounds plus per-lane height overrides.
#[derive(Debug)]
struct Plan {
    pool: Bounds,
    overrides: HashMap<Id, f32>,
}

fn plan(
    tree: &LaneTree,
    cache: &PoolCache,
    change: &ContainerChange,
    pool_bounds: Bounds,
    indent: f32,
) -> Plan {
    let mut overrides = HashMap::new();
    let mut upper_left = pool_bounds.upper_left();
    let mut lower_right_x = pool_bounds.max_x();
    let direct = tree.child_lanes(tree.pool);

    let height = match change {
        ContainerChange::Structure { added, removed } if !added.is_empty() => {
            if let ([lane], true) = (added.as_slice(), removed.is_empty()) {
                let lone_parent = tree
                    .parent
                    .get(lane)
                    .copied()
                    .filter(|parent| tree.child_lanes(*parent).len() == 1);
                if let Some(parent) = lone_parent {
                    // A lone new lane fills its parent.
                    let fill = tree.parent_height(parent, pool_bounds);
                    debug!(lane_id:% = lane, height = fill; "New lane fills its parent");
                    overrides.insert(*lane, fill);
                }
            }
            direct
                .iter()
                .map(|lane| tree.natural_height(*lane, &overrides))
                .sum()
        }
        ContainerChange::Structure { removed, .. } => {
            // Remaining siblings absorb the space of removed lanes.
            let parents: HashSet<Id> = removed
                .iter()
                .filter_map(|lane| cached_parent(tree, cache, *lane))
                .collect();
            for parent in parents {
                if parent != tree.pool && !tree.child_lanes(parent).is_empty() {
                    overrides.insert(parent, tree.parent_height(parent, pool_bounds));
                }
            }
            pool_bounds.height()
        }
        ContainerChange::Nesting(lanes) => {
            // A lane keeps its height when it changes level.
            for lane in lanes {
                overrides.insert(*lane, tree.current[lane].height());
            }
            direct
                .iter()
                .map(|lane| tree.natural_height(*lane, &overrides))
                .sum()
        }
        ContainerChange::Lane(lane) => {
            let current = tree.current[lane];
            overrides.insert(*lane, current.height());
            if let Some(cached) = cache.lanes.get(lane) {
                let top_lane = (cached.bounds.min_y() - cache.bounds.min_y()).abs() < EPSILON;
                if top_lane && resized(cached.bounds, current) {
                    upper_left = upper_left.with_y(current.min_y());
                }
                if (cached.bounds.width() - current.width()).abs() >= EPSILON {
                    let indent_x = indent * tree.depth[lane] as f32;
                    upper_left = upper_left.with_x(current.min_x() - indent_x);
                    lower_right_x = current.max_x();
                }
            }
            direct
                .iter()
                .map(|lane| tree.natural_height(*lane, &overrides))
                .sum()
        }
        ContainerChange::Container | ContainerChange::Unchanged => pool_bounds.height(),
    };

    let height = if direct.is_empty() {
        pool_bounds.height()
    } else {
        height
    };
    Plan {
        pool: Bounds::from_corners(
            upper_left,
            Point::new(lower_right_x, upper_left.y() + height),
        ),
        overrides,
    }
}

/// Cached parent of a removed lane, if that parent is still there.
fn cached_parent(tree: &LaneTree, cache: &PoolCache, lane: Id) -> Option<Id> {
    let parent = cache.lanes.get(&lane)?.parent;
    (parent == tree.pool || tree.current.contains_key(&parent)).then_some(parent)
}

/// Stacks every lane inside its parent, top-down.
fn arrange(tree: &LaneTree, plan: &Plan, indent: f32) -> HashMap<Id, Bounds> {
    let mut finals = HashMap::new();
    place_children(tree, tree.pool, plan.pool, plan, indent, &mut finals);
    finals
}

fn place_children(
    tree: &LaneTree,
    parent: Id,
    parent_bounds: Bounds,
    plan: &Plan,
    indent: f32,
    finals: &mut HashMap<Id, Bounds>,
) {
    let children = tree.child_lanes(parent);
    let Some(last) = children.len().checked_sub(1) else {
        return;
    };
    let naturals: Vec<f32> = children
        .iter()
        .map(|child| tree.natural_height(*child, &plan.overrides))
        .collect();
    let factor = scale_factor(parent_bounds.height(), naturals.iter().sum());
    let min_x = (parent_bounds.min_x() + indent).min(parent_bounds.max_x());

    let mut cursor = parent_bounds.min_y();
    for (idx, child) in children.iter().enumerate() {
        // The last lane ends exactly at its parent's bottom edge.
        let max_y = if idx == last {
            parent_bounds.max_y()
        } else {
            (cursor + naturals[idx] * factor).min(parent_bounds.max_y())
        };
        let bounds = Bounds::from_corners(
            Point::new(min_x, cursor),
            Point::new(parent_bounds.max_x(), max_y),
        );
        finals.insert(*child, bounds);
        place_children(tree, *child, bounds, plan, indent, finals);
        cursor = max_y;
    }
}

/// Moves lanes to their final bounds, carrying and scaling their non-lane
/// children.
fn apply(
    diagram: &mut Diagram,
    tree: &LaneTree,
    finals: &HashMap<Id, Bounds>,
    outcome: &mut ContainerOutcome,
) {
    for lane in &tree.order {
        let (Some(current), Some(target)) = (tree.current.get(lane), finals.get(lane)) else {
            continue;
        };
        if !differs(*current, *target) {
            continue;
        }
        let offset_x = target.min_x() - current.min_x();
        let scale_y = scale_factor(target.height(), current.height());

        let contents: Vec<(Id, Bounds)> = diagram
            .shape(*lane)
            .map(|shape| shape.children().to_vec())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|child| {
                let shape = diagram.shape(child)?;
                (shape.is_node() && shape.role() != ShapeRole::Lane)
                    .then(|| (child, shape.bounds()))
            })
            .collect();
        for (child, bounds) in contents {
            let relative = bounds.center().y() - current.min_y();
            let center_y = target.min_y() + relative * scale_y;
            diagram.translate_subtree(child, Point::new(offset_x, center_y - bounds.center().y()));
        }

        diagram.place_node(*lane, *target);
        outcome.placed.push(*lane);
    }
}

/// Moves free dockers with the lane whose cached bounds contained them.
/// Returns the number of dockers moved.
fn carry_dockers(
    diagram: &mut Diagram,
    pool: Id,
    cache: &PoolCache,
    finals: &HashMap<Id, Bounds>,
) -> usize {
    if cache.lanes.is_empty() {
        return 0;
    }
    let mut members: HashSet<Id> = diagram.descendants(pool).into_iter().collect();
    members.insert(pool);

    let mut moved_total = 0;
    for edge_id in diagram.edges_touching(&members) {
        let Ok(edge) = diagram.edge_mut(edge_id) else {
            continue;
        };
        let mut moved = 0;
        for docker in edge.dockers_mut().iter_mut().filter(|d| !d.is_docked()) {
            let center = docker.center();
            let mut best: Option<(&LaneCache, Bounds)> = None;
            for (lane, cached) in &cache.lanes {
                let Some(target) = finals.get(lane) else {
                    continue;
                };
                if cached.bounds.is_included(center, 0.0)
                    && best.is_none_or(|(current, _)| cached.depth > current.depth)
                {
                    best = Some((cached, *target));
                }
            }
            let Some((cached, target)) = best else {
                continue;
            };
            let scale_y = scale_factor(target.height(), cached.bounds.height());
            let new_center = Point::new(
                center.x() + target.min_x() - cached.bounds.min_x(),
                target.min_y() + (center.y() - cached.bounds.min_y()) * scale_y,
            );
            if new_center.distance_to(center) > EPSILON {
                docker.place_at(new_center);
                moved += 1;
            }
        }
        if moved > 0 {
            edge.mark_changed();
            diagram.mark_edge_dirty(edge_id);
            moved_total += moved;
        }
    }
    moved_total
}

/// Shifts free dockers of every edge touching `members` by `offset`.
///
/// Interior dockers always move; free endpoints move only when the edge
/// itself lives inside `members`. Returns the number of dockers moved.
fn shift_free_dockers(diagram: &mut Diagram, members: &HashSet<Id>, offset: Point) -> usize {
    if offset.distance_to(Point::default()) <= EPSILON {
        return 0;
    }
    let mut moved_total = 0;
    for edge_id in diagram.edges_touching(members) {
        let owned = diagram
            .shape(edge_id)
            .and_then(|shape| shape.parent())
            .is_some_and(|parent| members.contains(&parent));
        let Ok(edge) = diagram.edge_mut(edge_id) else {
            continue;
        };
        let last = edge.dockers().len() - 1;
        let mut moved = 0;
        for (idx, docker) in edge.dockers_mut().iter_mut().enumerate() {
            let endpoint = idx == 0 || idx == last;
            if !docker.is_docked() && (owned || !endpoint) {
                docker.shift(offset);
                moved += 1;
            }
        }
        if moved > 0 {
            edge.mark_changed();
            diagram.mark_edge_dirty(edge_id);
            moved_total += moved;
        }
    }
    moved_total
}

/// A lone leaf lane shows its caption only when it has a name, and a lane
/// wrapping a single child lane hides an empty caption. Every other lane
/// shows its caption.
fn update_captions(diagram: &mut Diagram, tree: &LaneTree) {
    for lane in &tree.order {
        let blank = diagram
            .shape(*lane)
            .is_some_and(|shape| shape.name().trim().is_empty());
        let children = tree.child_lanes(*lane).len();
        let siblings = tree
            .parent
            .get(lane)
            .map_or(0, |parent| tree.child_lanes(*parent).len());
        let show = if children == 1 || (siblings == 1 && children == 0) {
            !blank
        } else {
            true
        };
        diagram.set_show_caption(*lane, show);
    }
}

fn resized(a: Bounds, b: Bounds) -> bool {
    (a.width() - b.width()).abs() > EPSILON || (a.height() - b.height()).abs() > EPSILON
}

fn differs(a: Bounds, b: Bounds) -> bool {
    a.upper_left().distance_to(b.upper_left()) > EPSILON
        || a.lower_right().distance_to(b.lower_right()) > EPSILON
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use swimlane_core::geometry::Size;

    use super::*;
    use crate::config::LayoutConfig;

    const POOL: &str = "http://b3mn.org/stencilset/bpmn2.0#Pool";
    const LANE: &str = "http://b3mn.org/stencilset/bpmn2.0#Lane";
    const TASK: &str = "http://b3mn.org/stencilset/bpmn2.0#Task";
    const SUBPROCESS: &str = "http://b3mn.org/stencilset/bpmn2.0#Subprocess";
    const FLOW: &str = "http://b3mn.org/stencilset/bpmn2.0#SequenceFlow";

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Bounds {
        Bounds::new_from_top_left(Point::new(x, y), Size::new(w, h))
    }

    /// Pool of 600x200 at the origin with two lanes of height 100.
    fn pool_with_two_lanes() -> (Diagram, Id, Id, Id) {
        let mut diagram = Diagram::new(LayoutConfig::default());
        let pool = Id::new("pool");
        let upper = Id::new("lane-upper");
        let lower = Id::new("lane-lower");
        diagram
            .add_node(pool, POOL, rect(0.0, 0.0, 600.0, 200.0), None)
            .unwrap();
        diagram
            .add_node(upper, LANE, rect(30.0, 0.0, 570.0, 100.0), Some(pool))
            .unwrap();
        diagram
            .add_node(lower, LANE, rect(30.0, 100.0, 570.0, 100.0), Some(pool))
            .unwrap();
        diagram.flush();
        (diagram, pool, upper, lower)
    }

    fn bounds(diagram: &Diagram, id: Id) -> Bounds {
        diagram.bounds_of(id).unwrap()
    }

    #[test]
    fn test_consistent_pool_is_left_alone() {
        let (diagram, pool, upper, lower) = pool_with_two_lanes();
        assert_eq!(bounds(&diagram, pool), rect(0.0, 0.0, 600.0, 200.0));
        assert_eq!(bounds(&diagram, upper), rect(30.0, 0.0, 570.0, 100.0));
        assert_eq!(bounds(&diagram, lower), rect(30.0, 100.0, 570.0, 100.0));
    }

    #[test]
    fn test_pool_resize_scales_lanes() {
        let (mut diagram, pool, upper, lower) = pool_with_two_lanes();
        diagram
            .resize_shape(pool, rect(0.0, 0.0, 600.0, 300.0))
            .unwrap();
        diagram.flush();

        assert_eq!(bounds(&diagram, upper), rect(30.0, 0.0, 570.0, 150.0));
        assert_eq!(bounds(&diagram, lower), rect(30.0, 150.0, 570.0, 150.0));
    }

    #[test]
    fn test_pool_resize_width_propagates() {
        let (mut diagram, pool, upper, lower) = pool_with_two_lanes();
        diagram
            .resize_shape(pool, rect(0.0, 0.0, 800.0, 200.0))
            .unwrap();
        diagram.flush();

        assert_eq!(bounds(&diagram, upper).max_x(), 800.0);
        assert_eq!(bounds(&diagram, lower).max_x(), 800.0);
        assert_eq!(bounds(&diagram, lower).min_x(), 30.0);
    }

    #[test]
    fn test_lane_resize_grows_pool_and_shifts_siblings() {
        let (mut diagram, pool, upper, lower) = pool_with_two_lanes();
        diagram
            .resize_shape(upper, rect(30.0, 0.0, 570.0, 160.0))
            .unwrap();
        diagram.flush();

        assert_eq!(bounds(&diagram, upper), rect(30.0, 0.0, 570.0, 160.0));
        assert_eq!(bounds(&diagram, lower), rect(30.0, 160.0, 570.0, 100.0));
        assert_eq!(bounds(&diagram, pool), rect(0.0, 0.0, 600.0, 260.0));
    }

    #[test]
    fn test_lane_resize_from_top_moves_pool() {
        let (mut diagram, pool, upper, lower) = pool_with_two_lanes();
        diagram
            .resize_shape(upper, rect(30.0, -20.0, 570.0, 120.0))
            .unwrap();
        diagram.flush();

        assert_eq!(bounds(&diagram, pool), rect(0.0, -20.0, 600.0, 220.0));
        assert_eq!(bounds(&diagram, upper), rect(30.0, -20.0, 570.0, 120.0));
        assert_eq!(bounds(&diagram, lower), rect(30.0, 100.0, 570.0, 100.0));
    }

    #[test]
    fn test_lane_width_change_sets_pool_width() {
        let (mut diagram, pool, upper, lower) = pool_with_two_lanes();
        diagram
            .resize_shape(lower, rect(30.0, 100.0, 670.0, 100.0))
            .unwrap();
        diagram.flush();

        assert_eq!(bounds(&diagram, pool).width(), 700.0);
        assert_eq!(bounds(&diagram, upper).max_x(), 700.0);
    }

    #[test]
    fn test_added_lane_grows_pool() {
        let (mut diagram, pool, _, _) = pool_with_two_lanes();
        let third = Id::new("lane-third");
        diagram
            .add_node(third, LANE, rect(30.0, 200.0, 570.0, 80.0), Some(pool))
            .unwrap();
        diagram.flush();

        assert_eq!(bounds(&diagram, pool).height(), 280.0);
        assert_eq!(bounds(&diagram, third), rect(30.0, 200.0, 570.0, 80.0));
    }

    #[test]
    fn test_first_lane_fills_pool() {
        let mut diagram = Diagram::new(LayoutConfig::default());
        let pool = Id::new("lonely-pool");
        let lane = Id::new("lonely-lane");
        diagram
            .add_node(pool, POOL, rect(0.0, 0.0, 500.0, 250.0), None)
            .unwrap();
        diagram.flush();
        diagram
            .add_node(lane, LANE, rect(0.0, 0.0, 100.0, 40.0), Some(pool))
            .unwrap();
        diagram.flush();

        assert_eq!(bounds(&diagram, lane), rect(30.0, 0.0, 470.0, 250.0));
        assert_eq!(bounds(&diagram, pool), rect(0.0, 0.0, 500.0, 250.0));
        // An unnamed lone lane hides its caption.
        assert!(!diagram.shape(lane).unwrap().show_caption());
    }

    #[test]
    fn test_removed_lane_space_is_absorbed() {
        let (mut diagram, pool, upper, lower) = pool_with_two_lanes();
        let parent = Id::new("lane-parent");
        let child_a = Id::new("lane-child-a");
        let child_b = Id::new("lane-child-b");
        diagram.remove_shape(lower).unwrap();
        diagram.remove_shape(upper).unwrap();
        diagram
            .add_node(parent, LANE, rect(30.0, 0.0, 570.0, 200.0), Some(pool))
            .unwrap();
        diagram
            .add_node(child_a, LANE, rect(60.0, 0.0, 540.0, 50.0), Some(parent))
            .unwrap();
        diagram
            .add_node(child_b, LANE, rect(60.0, 50.0, 540.0, 150.0), Some(parent))
            .unwrap();
        diagram.flush();
        assert_eq!(bounds(&diagram, parent).height(), 200.0);

        diagram.remove_shape(child_a).unwrap();
        diagram.flush();

        assert_eq!(bounds(&diagram, child_b), rect(60.0, 0.0, 540.0, 200.0));
        assert_eq!(bounds(&diagram, pool).height(), 200.0);
    }

    #[test]
    fn test_nested_lanes_are_indented() {
        let (mut diagram, _, upper, _) = pool_with_two_lanes();
        let nested = Id::new("lane-nested");
        diagram
            .add_node(nested, LANE, rect(0.0, 0.0, 10.0, 10.0), Some(upper))
            .unwrap();
        diagram.flush();

        assert_eq!(bounds(&diagram, nested), rect(60.0, 0.0, 540.0, 100.0));
    }

    #[test]
    fn test_lane_changing_level_is_indented() {
        let (mut diagram, pool, upper, lower) = pool_with_two_lanes();
        let task = Id::new("nesting-task");
        diagram
            .add_node(task, TASK, rect(200.0, 130.0, 100.0, 40.0), Some(lower))
            .unwrap();
        diagram.flush();

        diagram.set_parent(lower, Some(upper)).unwrap();
        let report = diagram.flush();
        assert!(report.errors().is_empty());

        assert_eq!(bounds(&diagram, upper), rect(30.0, 0.0, 570.0, 100.0));
        assert_eq!(bounds(&diagram, lower), rect(60.0, 0.0, 540.0, 100.0));
        assert_eq!(bounds(&diagram, pool), rect(0.0, 0.0, 600.0, 100.0));
        // Contents keep their place in the lane and take the extra indent.
        assert_eq!(bounds(&diagram, task), rect(230.0, 30.0, 100.0, 40.0));
        assert_eq!(diagram.flush().passes(), 0);

        diagram.set_parent(lower, Some(pool)).unwrap();
        diagram.flush();

        assert_eq!(bounds(&diagram, upper), rect(30.0, 0.0, 570.0, 100.0));
        assert_eq!(bounds(&diagram, lower), rect(30.0, 100.0, 570.0, 100.0));
        assert_eq!(bounds(&diagram, pool), rect(0.0, 0.0, 600.0, 200.0));
        assert_eq!(bounds(&diagram, task), rect(200.0, 130.0, 100.0, 40.0));
    }

    #[test]
    fn test_pool_without_lanes_move_carries_dockers() {
        let mut diagram = Diagram::new(LayoutConfig::default());
        let pool = Id::new("bare-pool");
        let flow = Id::new("bare-flow");
        let outside = Id::new("bare-outside");
        diagram
            .add_node(pool, POOL, rect(0.0, 0.0, 600.0, 200.0), None)
            .unwrap();
        diagram
            .add_edge(
                flow,
                FLOW,
                &[
                    Point::new(50.0, 50.0),
                    Point::new(200.0, 50.0),
                    Point::new(200.0, 150.0),
                ],
                Some(pool),
            )
            .unwrap();
        diagram
            .add_edge(
                outside,
                FLOW,
                &[Point::new(50.0, 300.0), Point::new(200.0, 300.0)],
                None,
            )
            .unwrap();
        diagram.flush();

        diagram.move_shape_by(pool, Point::new(100.0, 0.0)).unwrap();
        diagram.flush();

        assert_eq!(
            diagram.edge(flow).unwrap().polyline(),
            vec![
                Point::new(150.0, 50.0),
                Point::new(300.0, 50.0),
                Point::new(300.0, 150.0),
            ]
        );
        assert_eq!(
            diagram.edge(flow).unwrap().bounds(),
            Bounds::from_corners(Point::new(150.0, 50.0), Point::new(300.0, 150.0))
        );
        assert_eq!(
            diagram.edge(outside).unwrap().polyline(),
            vec![Point::new(50.0, 300.0), Point::new(200.0, 300.0)]
        );
    }

    #[test]
    fn test_pool_move_carries_header_dockers_once() {
        let (mut diagram, pool, _, _) = pool_with_two_lanes();
        let flow = Id::new("header-flow");
        diagram
            .add_edge(
                flow,
                FLOW,
                &[
                    Point::new(10.0, 50.0),
                    Point::new(300.0, 50.0),
                    Point::new(300.0, 150.0),
                ],
                Some(pool),
            )
            .unwrap();
        diagram.flush();

        diagram.move_shape_by(pool, Point::new(0.0, 50.0)).unwrap();
        diagram.flush();

        assert_eq!(
            diagram.edge(flow).unwrap().polyline(),
            vec![
                Point::new(10.0, 100.0),
                Point::new(300.0, 100.0),
                Point::new(300.0, 200.0),
            ]
        );
    }

    #[test]
    fn test_lane_contents_scale_with_lane() {
        let (mut diagram, pool, _, lower) = pool_with_two_lanes();
        let task = Id::new("lane-task");
        diagram
            .add_node(task, TASK, rect(100.0, 130.0, 100.0, 40.0), Some(lower))
            .unwrap();
        diagram.flush();

        diagram
            .resize_shape(pool, rect(0.0, 0.0, 600.0, 400.0))
            .unwrap();
        diagram.flush();

        // Lower lane now spans 200..400; the task's center moves from
        // 150 (50 into the lane) to 300 (100 into the lane).
        let task_bounds = bounds(&diagram, task);
        assert_approx_eq!(f32, task_bounds.center().y(), 300.0);
        assert_approx_eq!(f32, task_bounds.height(), 40.0);
    }

    #[test]
    fn test_lane_reorder_detected() {
        let (mut diagram, pool, upper, lower) = pool_with_two_lanes();
        diagram.move_shape_by(upper, Point::new(0.0, 150.0)).unwrap();
        let report = diagram.flush();

        assert!(report.reordered_pools().contains(&pool));
        assert_eq!(bounds(&diagram, lower), rect(30.0, 0.0, 570.0, 100.0));
        assert_eq!(bounds(&diagram, upper), rect(30.0, 100.0, 570.0, 100.0));
    }

    #[test]
    fn test_free_dockers_follow_scaled_lane() {
        let (mut diagram, pool, upper, lower) = pool_with_two_lanes();
        let a = Id::new("task-a");
        let b = Id::new("task-b");
        let flow = Id::new("flow-a-b");
        diagram
            .add_node(a, TASK, rect(100.0, 30.0, 100.0, 40.0), Some(upper))
            .unwrap();
        diagram
            .add_node(b, TASK, rect(400.0, 130.0, 100.0, 40.0), Some(lower))
            .unwrap();
        diagram
            .add_edge(
                flow,
                FLOW,
                &[
                    Point::new(150.0, 50.0),
                    Point::new(300.0, 150.0),
                    Point::new(450.0, 150.0),
                ],
                Some(pool),
            )
            .unwrap();
        let edge = diagram.edge(flow).unwrap();
        let (first, last) = (edge.first_docker().id(), edge.last_docker().id());
        diagram.dock(flow, first, Some(a)).unwrap();
        diagram.dock(flow, last, Some(b)).unwrap();
        diagram.flush();

        diagram
            .resize_shape(pool, rect(0.0, 0.0, 600.0, 300.0))
            .unwrap();
        diagram.flush();

        let edge = diagram.edge(flow).unwrap();
        assert_approx_eq!(f32, edge.dockers()[1].center().y(), 225.0);
        // Docked endpoints stay on their shapes.
        assert_eq!(edge.last_docker().center(), bounds(&diagram, b).center());
    }

    #[test]
    fn test_sub_process_move_shifts_interior_dockers() {
        let mut diagram = Diagram::new(LayoutConfig::default());
        let sub = Id::new("sub");
        let a = Id::new("sub-a");
        let b = Id::new("sub-b");
        let flow = Id::new("sub-flow");
        diagram
            .add_node(sub, SUBPROCESS, rect(0.0, 0.0, 400.0, 200.0), None)
            .unwrap();
        diagram
            .add_node(a, TASK, rect(20.0, 20.0, 60.0, 40.0), Some(sub))
            .unwrap();
        diagram
            .add_node(b, TASK, rect(300.0, 120.0, 60.0, 40.0), Some(sub))
            .unwrap();
        diagram
            .add_edge(
                flow,
                FLOW,
                &[
                    Point::new(50.0, 40.0),
                    Point::new(330.0, 40.0),
                    Point::new(330.0, 140.0),
                ],
                Some(sub),
            )
            .unwrap();
        let edge = diagram.edge(flow).unwrap();
        let (first, last) = (edge.first_docker().id(), edge.last_docker().id());
        diagram.dock(flow, first, Some(a)).unwrap();
        diagram.dock(flow, last, Some(b)).unwrap();
        diagram.flush();

        diagram.move_shape_by(sub, Point::new(100.0, 50.0)).unwrap();
        diagram.flush();

        let edge = diagram.edge(flow).unwrap();
        assert_eq!(edge.dockers()[1].center(), Point::new(430.0, 90.0));
        assert_eq!(edge.first_docker().center(), Point::new(150.0, 90.0));

        // A resize leaves the bend alone.
        diagram
            .resize_shape(sub, rect(100.0, 50.0, 500.0, 300.0))
            .unwrap();
        diagram.flush();
        let edge = diagram.edge(flow).unwrap();
        assert_eq!(edge.dockers()[1].center(), Point::new(430.0, 90.0));
    }

    #[test]
    fn test_layout_pool_rejects_non_pool() {
        let (mut diagram, _, upper, _) = pool_with_two_lanes();
        let mut layout = ContainerLayout::new();
        assert_eq!(
            layout.layout_pool(&mut diagram, upper, None),
            Err(LayoutError::NotAContainer(upper))
        );
        assert_eq!(
            layout.layout_sub_process(&mut diagram, Id::new("nope")),
            Err(LayoutError::UnknownShape(Id::new("nope")))
        );
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;
    use swimlane_core::geometry::Size;

    use super::*;
    use crate::config::LayoutConfig;

    fn check_lane_height_conservation(
        heights: Vec<f32>,
        new_height: f32,
    ) -> std::result::Result<(), TestCaseError> {
        let mut diagram = Diagram::new(LayoutConfig::default());
        let pool = Id::new("prop-pool");
        let total: f32 = heights.iter().sum();
        diagram
            .add_node(
                pool,
                "Pool",
                Bounds::new_from_top_left(Point::default(), Size::new(500.0, total)),
                None,
            )
            .unwrap();
        let mut lanes = Vec::new();
        let mut y = 0.0;
        for (idx, height) in heights.iter().enumerate() {
            let lane = Id::generated("prop-lane", idx);
            diagram
                .add_node(
                    lane,
                    "Lane",
                    Bounds::new_from_top_left(Point::new(30.0, y), Size::new(470.0, *height)),
                    Some(pool),
                )
                .unwrap();
            lanes.push(lane);
            y += height;
        }
        diagram.flush();

        diagram
            .resize_shape(
                pool,
                Bounds::new_from_top_left(Point::default(), Size::new(500.0, new_height)),
            )
            .unwrap();
        diagram.flush();

        let pool_bounds = diagram.bounds_of(pool).unwrap();
        let last = diagram.bounds_of(lanes[lanes.len() - 1]).unwrap();
        prop_assert_eq!(last.max_y(), pool_bounds.max_y());

        let sum: f32 = lanes
            .iter()
            .map(|lane| diagram.bounds_of(*lane).unwrap().height())
            .sum();
        prop_assert!(approx_eq!(f32, sum, new_height, epsilon = 1e-2));

        let first = diagram.bounds_of(lanes[0]).unwrap();
        prop_assert!(approx_eq!(
            f32,
            first.height(),
            heights[0] * new_height / total,
            epsilon = 1e-2
        ));
        Ok(())
    }

    proptest! {
        #[test]
        fn lane_height_conservation(
            heights in prop::collection::vec(20.0f32..200.0, 1..5),
            new_height in 100.0f32..1000.0,
        ) {
            check_lane_height_conservation(heights, new_height)?;
        }
    }
}
