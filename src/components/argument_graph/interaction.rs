//! Pointer gesture tracking: press, drag-to-pan, and click detection.

use super::camera::{Camera, SurfaceBounds};
use super::geometry::Point;
use super::graph::Graph;
use super::types::NodeId;

/// Largest displacement, per axis and exclusive, that still counts as a click.
pub const CLICK_THRESHOLD: f64 = 5.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cursor {
	#[default]
	Default,
	Move,
}

impl Cursor {
	pub fn css(self) -> &'static str {
		match self {
			Cursor::Default => "default",
			Cursor::Move => "move",
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
enum Gesture {
	#[default]
	Idle,
	Down {
		origin: Point,
		active: Option<NodeId>,
	},
	Dragging {
		origin: Point,
		drag: Point,
		active: Option<NodeId>,
	},
}

/// Emitted on every move of a held pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct DragUpdate {
	/// Cumulative displacement since the press.
	pub drag: Point,
	pub active: Option<NodeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Release {
	pub is_click: bool,
	pub active: Option<NodeId>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MouseTracker {
	gesture: Gesture,
}

impl MouseTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts a gesture and returns the pressed node, if any. Presses before
	/// the first layout are ignored.
	pub fn pointer_down(
		&mut self,
		client: Point,
		bounds: SurfaceBounds,
		camera: &Camera,
		graph: &Graph,
	) -> Option<NodeId> {
		if !graph.is_laid_out() {
			return None;
		}
		let world = camera.screen_to_world(client, bounds);
		let active = graph.hit_test(world).cloned();
		self.gesture = Gesture::Down {
			origin: client,
			active: active.clone(),
		};
		active
	}

	pub fn pointer_move(&mut self, client: Point) -> Option<DragUpdate> {
		let (origin, active) = match std::mem::take(&mut self.gesture) {
			Gesture::Idle => return None,
			Gesture::Down { origin, active } | Gesture::Dragging { origin, active, .. } => {
				(origin, active)
			}
		};
		let drag = client - origin;
		self.gesture = Gesture::Dragging {
			origin,
			drag,
			active: active.clone(),
		};
		Some(DragUpdate { drag, active })
	}

	/// Ends the gesture, committing any drag into `camera`.
	pub fn pointer_up(&mut self, camera: &mut Camera) -> Option<Release> {
		let (drag, active) = match std::mem::take(&mut self.gesture) {
			Gesture::Idle => return None,
			Gesture::Down { active, .. } => (Point::ORIGIN, active),
			Gesture::Dragging { drag, active, .. } => (drag, active),
		};
		camera.pan(drag.x, drag.y);
		Some(Release {
			is_click: drag.x.abs() < CLICK_THRESHOLD && drag.y.abs() < CLICK_THRESHOLD,
			active,
		})
	}

	/// Uncommitted drag to apply as a transient camera offset.
	pub fn drag_offset(&self) -> Point {
		match &self.gesture {
			Gesture::Dragging { drag, .. } => *drag,
			_ => Point::ORIGIN,
		}
	}

	pub fn active(&self) -> Option<&NodeId> {
		match &self.gesture {
			Gesture::Idle => None,
			Gesture::Down { active, .. } | Gesture::Dragging { active, .. } => active.as_ref(),
		}
	}

	/// Whether move and release events must be tracked outside the surface.
	pub fn is_tracking(&self) -> bool {
		self.gesture != Gesture::Idle
	}

	pub fn cursor(&self) -> Cursor {
		match self.gesture {
			Gesture::Dragging { .. } => Cursor::Move,
			_ => Cursor::Default,
		}
	}

	/// Drops an in-flight gesture without committing it.
	pub fn cancel(&mut self) {
		self.gesture = Gesture::Idle;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::argument_graph::layout::{LayeredEngine, LayoutOptions};
	use crate::components::argument_graph::surface::ApproximateMeasure;
	use crate::components::argument_graph::testing::sample_scene;

	const BOUNDS: SurfaceBounds = SurfaceBounds {
		left: 0.0,
		top: 0.0,
		width: 800.0,
		height: 600.0,
	};

	fn laid_out() -> Graph {
		let mut graph = Graph::from_scene(sample_scene()).unwrap();
		graph
			.layout(
				&LayoutOptions::default(),
				&LayeredEngine::default(),
				&ApproximateMeasure,
			)
			.unwrap();
		graph
	}

	/// Screen position of a node's center under the default camera.
	fn screen_of(graph: &Graph, id: &str) -> Point {
		let c = graph.node(&id.into()).unwrap().center.unwrap();
		Point::new(c.x + BOUNDS.width / 2.0, c.y + BOUNDS.height / 2.0)
	}

	#[test]
	fn small_displacement_is_a_click() {
		let graph = laid_out();
		let mut camera = Camera::default();
		let mut tracker = MouseTracker::new();
		let start = screen_of(&graph, "a");

		assert_eq!(tracker.pointer_down(start, BOUNDS, &camera, &graph), Some("a".into()));
		assert!(tracker.is_tracking());
		let update = tracker.pointer_move(start + Point::new(3.0, 4.0)).unwrap();
		assert_eq!(update.drag, Point::new(3.0, 4.0));
		assert_eq!(tracker.cursor(), Cursor::Move);

		let release = tracker.pointer_up(&mut camera).unwrap();
		assert!(release.is_click);
		assert_eq!(release.active, Some("a".into()));
		assert_eq!((camera.x, camera.y), (3.0, 4.0));
		assert!(!tracker.is_tracking());
		assert_eq!(tracker.cursor(), Cursor::Default);
	}

	#[test]
	fn drag_commits_to_camera_on_release() {
		let graph = laid_out();
		let mut camera = Camera::default();
		let mut tracker = MouseTracker::new();

		tracker.pointer_down(Point::new(10.0, 10.0), BOUNDS, &camera, &graph);
		tracker.pointer_move(Point::new(13.0, 10.0));
		tracker.pointer_move(Point::new(16.0, 10.0));
		assert_eq!(tracker.drag_offset(), Point::new(6.0, 0.0));
		assert_eq!(camera.x, 0.0);

		let release = tracker.pointer_up(&mut camera).unwrap();
		assert!(!release.is_click);
		assert_eq!(camera.x, 6.0);
		assert_eq!(tracker.drag_offset(), Point::ORIGIN);
	}

	#[test]
	fn release_without_move_is_a_click() {
		let graph = laid_out();
		let mut camera = Camera::default();
		let mut tracker = MouseTracker::new();
		tracker.pointer_down(Point::new(1.0, 1.0), BOUNDS, &camera, &graph);
		let release = tracker.pointer_up(&mut camera).unwrap();
		assert!(release.is_click);
		assert_eq!(release.active, None);
	}

	#[test]
	fn presses_before_layout_are_ignored() {
		let graph = Graph::from_scene(sample_scene()).unwrap();
		let mut tracker = MouseTracker::new();
		assert_eq!(
			tracker.pointer_down(Point::new(400.0, 300.0), BOUNDS, &Camera::default(), &graph),
			None
		);
		assert!(!tracker.is_tracking());
		assert_eq!(tracker.pointer_move(Point::new(500.0, 300.0)), None);
		assert_eq!(tracker.pointer_up(&mut Camera::default()), None);
	}

	#[test]
	fn only_regular_nodes_are_pressable() {
		let graph = laid_out();
		let mut tracker = MouseTracker::new();
		let camera = Camera::default();
		assert_eq!(tracker.pointer_down(screen_of(&graph, "in"), BOUNDS, &camera, &graph), None);
		assert_eq!(tracker.pointer_down(screen_of(&graph, "out"), BOUNDS, &camera, &graph), None);
		assert_eq!(
			tracker.pointer_down(screen_of(&graph, "b"), BOUNDS, &camera, &graph),
			Some("b".into())
		);
		assert_eq!(tracker.active(), Some(&NodeId::from("b")));
	}
}
