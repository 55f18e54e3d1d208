//! Integration tests for the Diagram API
//!
//! These tests drive the engine the way an editor does: mutate, flush, read
//! geometry back.

use float_cmp::assert_approx_eq;

use swimlane::{
    Diagram, LayoutError,
    command::{AddDocker, CommandStack, MoveShape},
    config::LayoutConfig,
    geometry::{Bounds, Point, Size},
    identifier::Id,
    label::{HorizontalAlign, Label, LabelSegment, ReferencePoint, VerticalAlign},
};

const POOL: &str = "http://b3mn.org/stencilset/bpmn2.0#Pool";
const LANE: &str = "http://b3mn.org/stencilset/bpmn2.0#Lane";
const TASK: &str = "http://b3mn.org/stencilset/bpmn2.0#Task";
const EVENT: &str = "http://b3mn.org/stencilset/bpmn2.0#IntermediateEvent";
const FLOW: &str = "http://b3mn.org/stencilset/bpmn2.0#SequenceFlow";

fn rect(x: f32, y: f32, w: f32, h: f32) -> Bounds {
    Bounds::new_from_top_left(Point::new(x, y), Size::new(w, h))
}

fn add_flow(diagram: &mut Diagram, id: &str, points: &[(f32, f32)]) -> Id {
    let id = Id::new(id);
    let points: Vec<Point> = points.iter().map(|(x, y)| Point::new(*x, *y)).collect();
    diagram
        .add_edge(id, FLOW, &points, None)
        .expect("Failed to add edge");
    id
}

fn assert_bounds_enclose_dockers(diagram: &Diagram, edge: Id) {
    let edge = diagram.edge(edge).unwrap();
    let enclosing = Bounds::enclosing(edge.polyline()).unwrap();
    assert_eq!(edge.bounds(), enclosing, "Edge bounds must enclose its dockers");
}

#[test]
fn test_attached_node_keeps_its_ratio() {
    let mut diagram = Diagram::default();
    let flow = add_flow(&mut diagram, "api-host", &[(0.0, 0.0), (100.0, 0.0)]);
    let event = Id::new("api-attached");
    diagram
        .add_node(event, EVENT, rect(40.0, -10.0, 20.0, 20.0), Some(flow))
        .unwrap();
    diagram.flush();

    let position = *diagram.edge(flow).unwrap().attached_position(event).unwrap();
    assert_approx_eq!(f32, position.relative_distance(), 0.5);

    let last = diagram.edge(flow).unwrap().last_docker().id();
    diagram
        .move_docker(flow, last, Point::new(100.0, 100.0))
        .unwrap();
    diagram.flush();

    let center = diagram.bounds_of(event).unwrap().center();
    assert_approx_eq!(f32, center.x(), 50.0);
    assert_approx_eq!(f32, center.y(), 50.0);
    assert_bounds_enclose_dockers(&diagram, flow);
}

#[test]
fn test_add_docker_then_prune() {
    let mut diagram = Diagram::default();
    let flow = add_flow(&mut diagram, "api-diagonal", &[(0.0, 0.0), (100.0, 100.0)]);
    diagram.flush();

    let added = diagram.add_docker(flow, Point::new(50.0, 50.0)).unwrap();
    diagram.flush();
    assert_eq!(diagram.edge(flow).unwrap().dockers().len(), 3);
    assert_eq!(diagram.edge(flow).unwrap().path_data().len(), 3);

    assert_eq!(diagram.remove_unused_dockers(flow).unwrap(), vec![added]);
    assert_eq!(diagram.edge(flow).unwrap().dockers().len(), 2);

    assert_eq!(
        diagram.add_docker(flow, Point::new(90.0, 0.0)),
        Err(LayoutError::NoSegmentAt {
            edge: flow,
            point: Point::new(90.0, 0.0),
        })
    );
}

#[test]
fn test_docker_count_never_drops_below_two() {
    let mut diagram = Diagram::default();
    let flow = add_flow(&mut diagram, "api-minimal", &[(0.0, 0.0), (100.0, 0.0)]);
    let edge = diagram.edge(flow).unwrap();
    let (first, last) = (edge.first_docker().id(), edge.last_docker().id());

    assert_eq!(
        diagram.remove_docker(flow, last).unwrap_err(),
        LayoutError::MinimumDockers { edge: flow }
    );
    assert_eq!(
        diagram.remove_docker(flow, first).unwrap_err(),
        LayoutError::FirstDockerRemoval { edge: flow }
    );
    assert_eq!(diagram.edge(flow).unwrap().dockers().len(), 2);
}

#[test]
fn test_resegmentation_keeps_attached_node_in_place() {
    let mut diagram = Diagram::default();
    let flow = add_flow(&mut diagram, "api-split", &[(0.0, 0.0), (200.0, 0.0)]);
    let event = Id::new("api-split-event");
    diagram
        .add_node(event, EVENT, rect(140.0, -10.0, 20.0, 20.0), Some(flow))
        .unwrap();
    diagram.flush();
    let before = diagram.bounds_of(event).unwrap();

    let bend = diagram.add_docker(flow, Point::new(100.0, 0.0)).unwrap();
    diagram.flush();
    assert_eq!(diagram.bounds_of(event).unwrap(), before);
    let position = *diagram.edge(flow).unwrap().attached_position(event).unwrap();
    assert_eq!(position.segment().0, bend);
    assert_approx_eq!(f32, position.relative_distance(), 0.5);

    diagram.remove_docker(flow, bend).unwrap();
    diagram.flush();
    assert_eq!(diagram.bounds_of(event).unwrap(), before);
}

#[test]
fn test_pool_resize_carries_lanes_and_dockers() {
    let mut diagram = Diagram::default();
    let pool = Id::new("api-pool");
    let upper = Id::new("api-upper");
    let lower = Id::new("api-lower");
    let a = Id::new("api-task-a");
    let b = Id::new("api-task-b");
    diagram
        .add_node(pool, POOL, rect(0.0, 0.0, 600.0, 200.0), None)
        .unwrap();
    diagram
        .add_node(upper, LANE, rect(30.0, 0.0, 570.0, 100.0), Some(pool))
        .unwrap();
    diagram
        .add_node(lower, LANE, rect(30.0, 100.0, 570.0, 100.0), Some(pool))
        .unwrap();
    diagram
        .add_node(a, TASK, rect(100.0, 30.0, 100.0, 40.0), Some(upper))
        .unwrap();
    diagram
        .add_node(b, TASK, rect(400.0, 130.0, 100.0, 40.0), Some(lower))
        .unwrap();
    let flow = add_flow(
        &mut diagram,
        "api-cross-lane",
        &[(150.0, 50.0), (300.0, 150.0), (450.0, 150.0)],
    );
    let edge = diagram.edge(flow).unwrap();
    let (first, last) = (edge.first_docker().id(), edge.last_docker().id());
    diagram.dock(flow, first, Some(a)).unwrap();
    diagram.dock(flow, last, Some(b)).unwrap();
    diagram.set_parent(flow, Some(pool)).unwrap();
    diagram.flush();

    diagram
        .resize_shape(pool, rect(0.0, 0.0, 600.0, 300.0))
        .unwrap();
    let report = diagram.flush();
    assert!(report.errors().is_empty());

    assert_eq!(diagram.bounds_of(upper).unwrap().height(), 150.0);
    assert_eq!(diagram.bounds_of(lower).unwrap().height(), 150.0);
    assert_eq!(
        diagram.bounds_of(lower).unwrap().max_y(),
        diagram.bounds_of(pool).unwrap().max_y()
    );

    let edge = diagram.edge(flow).unwrap();
    assert_approx_eq!(f32, edge.dockers()[1].center().y(), 225.0);
    assert_eq!(
        edge.first_docker().center(),
        diagram.bounds_of(a).unwrap().center()
    );
    assert_eq!(
        edge.last_docker().center(),
        diagram.bounds_of(b).unwrap().center()
    );
    assert_bounds_enclose_dockers(&diagram, flow);

    let again = diagram.flush();
    assert_eq!(again.passes(), 0);
}

#[test]
fn test_label_alignment_follows_segment_direction() {
    let mut diagram = Diagram::default();
    let horizontal = add_flow(&mut diagram, "api-label-h", &[(0.0, 0.0), (100.0, 0.0)]);
    let vertical = add_flow(&mut diagram, "api-label-v", &[(0.0, 0.0), (0.0, 100.0)]);

    for (flow, position) in [
        (horizontal, Point::new(50.0, -10.0)),
        (vertical, Point::new(-10.0, 50.0)),
    ] {
        let edge = diagram.edge(flow).unwrap();
        let (from, to) = (edge.first_docker(), edge.last_docker());
        let reference = ReferencePoint::new(
            LabelSegment::new(from.id(), to.id(), 0, 1),
            from.center(),
            to.center(),
            position,
        );
        assert_approx_eq!(f32, reference.distance(), 10.0);
        diagram
            .add_label(flow, Label::referenced("label", reference))
            .unwrap();
    }
    diagram.flush();

    let label = &diagram.edge(horizontal).unwrap().labels()[0];
    assert_eq!(label.horizontal_align(), HorizontalAlign::Left);
    assert_eq!(label.vertical_align(), VerticalAlign::Bottom);

    let label = &diagram.edge(vertical).unwrap().labels()[0];
    assert_eq!(label.horizontal_align(), HorizontalAlign::Right);
    assert_eq!(label.vertical_align(), VerticalAlign::Top);

    // Turning the segment keeps ratio and distance.
    let last = diagram.edge(horizontal).unwrap().last_docker().id();
    diagram
        .move_docker(horizontal, last, Point::new(100.0, 100.0))
        .unwrap();
    diagram.flush();
    let label = &diagram.edge(horizontal).unwrap().labels()[0];
    let offset = 10.0 / 2.0f32.sqrt();
    assert_approx_eq!(f32, label.position().x(), 50.0 + offset, epsilon = 1e-3);
    assert_approx_eq!(f32, label.position().y(), 50.0 - offset, epsilon = 1e-3);
}

#[test]
fn test_command_stack_round_trip() {
    let mut diagram = Diagram::default();
    let task = Id::new("api-cmd-task");
    diagram
        .add_node(task, TASK, rect(0.0, 0.0, 100.0, 80.0), None)
        .unwrap();
    let flow = add_flow(&mut diagram, "api-cmd-flow", &[(50.0, 40.0), (300.0, 40.0)]);
    let first = diagram.edge(flow).unwrap().first_docker().id();
    diagram.dock(flow, first, Some(task)).unwrap();
    diagram.flush();
    let original = diagram.edge(flow).unwrap().polyline();

    let mut stack = CommandStack::new();
    stack
        .execute(
            &mut diagram,
            Box::new(AddDocker::new(flow, Point::new(200.0, 40.0))),
        )
        .unwrap();
    stack
        .execute(
            &mut diagram,
            Box::new(MoveShape::new(task, Point::new(0.0, 50.0))),
        )
        .unwrap();
    assert_eq!(diagram.edge(flow).unwrap().dockers().len(), 3);

    assert!(stack.undo(&mut diagram).unwrap());
    assert!(stack.undo(&mut diagram).unwrap());
    assert_eq!(diagram.edge(flow).unwrap().polyline(), original);
}

#[test]
fn test_config_from_toml() {
    let config: LayoutConfig = toml::from_str(
        r#"
        [container]
        lane_indent = 40.0

        [flush]
        max_passes = 2
        "#,
    )
    .expect("Failed to parse config");

    let mut diagram = Diagram::new(config);
    let pool = Id::new("api-toml-pool");
    let lane = Id::new("api-toml-lane");
    diagram
        .add_node(pool, POOL, rect(0.0, 0.0, 500.0, 100.0), None)
        .unwrap();
    diagram
        .add_node(lane, LANE, rect(0.0, 0.0, 500.0, 100.0), Some(pool))
        .unwrap();
    diagram.flush();

    assert_eq!(diagram.bounds_of(lane).unwrap().min_x(), 40.0);
    assert_eq!(diagram.config().flush().max_passes(), 2);
}
