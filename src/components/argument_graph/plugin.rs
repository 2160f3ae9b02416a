//! One mounted viewer: owns the graph, camera, renderer, and pointer
//! tracker for a single drawing surface, and exposes the operations the
//! host component forwards DOM events to.

use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info};

use super::camera::{Camera, SurfaceBounds};
use super::error::{GraphError, SurfaceError};
use super::geometry::Point;
use super::graph::{Graph, Node};
use super::interaction::{Cursor, DragUpdate, MouseTracker, Release};
use super::layout::{LayeredEngine, LayoutEngine, LayoutOptions};
use super::render::Renderer;
use super::scene::Scene;
use super::surface::{Surface, TextMeasure};
use super::types::{ExplanationGraph, ImageSource, NodeId, NodeKind, RasterImage};
use crate::config::ViewerConfig;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Side-by-side view of a regular node's feature and filter images.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayContent {
	pub node: NodeId,
	pub primary: RasterImage,
	pub secondary: RasterImage,
	pub strength: f64,
}

impl OverlayContent {
	fn for_node(node: &Node) -> Option<Self> {
		if node.kind != NodeKind::Regular || !node.has_secondary_view() {
			return None;
		}
		let strength = if node.normalised_strength != 0.0 {
			node.normalised_strength
		} else {
			node.strength
		};
		Some(Self {
			node: node.id.clone(),
			primary: node.payload.primary()?.clone(),
			secondary: node.payload.secondary()?.clone(),
			strength,
		})
	}

	pub fn strength_label(&self) -> String {
		format!("Strength: {:.2}", self.strength)
	}
}

pub struct GraphPlugin<S: Surface> {
	instance: u64,
	model_id: String,
	explanation_id: String,
	/// `None` once destroyed.
	surface: Option<S>,
	graph: Option<Graph>,
	camera: Camera,
	renderer: Renderer,
	tracker: MouseTracker,
	options: LayoutOptions,
	fit_margin: f64,
	engine: Box<dyn LayoutEngine>,
	measure: Box<dyn TextMeasure>,
	overlay: Option<OverlayContent>,
	fitted: bool,
}

impl<S: Surface> GraphPlugin<S> {
	pub fn new(
		model_id: impl Into<String>,
		explanation_id: impl Into<String>,
		surface: S,
		config: &ViewerConfig,
		measure: Box<dyn TextMeasure>,
	) -> Self {
		let instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);
		let model_id = model_id.into();
		let explanation_id = explanation_id.into();
		debug!("plugin #{instance} created for {model_id}/{explanation_id}");
		Self {
			instance,
			model_id,
			explanation_id,
			surface: Some(surface),
			graph: None,
			camera: Camera::default(),
			renderer: Renderer::default(),
			tracker: MouseTracker::new(),
			options: config.layout,
			fit_margin: config.fit_margin,
			engine: Box::new(LayeredEngine::default()),
			measure,
			overlay: None,
			fitted: false,
		}
	}

	pub fn with_engine(mut self, engine: Box<dyn LayoutEngine>) -> Self {
		self.engine = engine;
		self
	}

	/// Unique per constructed plugin; lets async work detect that the plugin
	/// it started for has been replaced.
	pub fn instance(&self) -> u64 {
		self.instance
	}

	pub fn model_id(&self) -> &str {
		&self.model_id
	}

	pub fn explanation_id(&self) -> &str {
		&self.explanation_id
	}

	/// Validates an explanation and tags its payloads, ready for preloading.
	pub fn ingest(&self, explanation: &ExplanationGraph) -> Result<Scene<ImageSource>, GraphError> {
		let scene = Scene::from_explanation(explanation)?;
		info!(
			"ingested '{}': {} nodes, {} edges",
			explanation.name,
			scene.nodes.len(),
			scene.edges.len()
		);
		Ok(scene)
	}

	/// Builds and lays out the graph, fits the camera on the first success,
	/// and draws. Returns `Ok(false)` when the plugin was already destroyed.
	pub fn install(&mut self, scene: Scene<RasterImage>) -> Result<bool, GraphError> {
		if self.is_destroyed() {
			debug!("plugin #{} destroyed; dropping late scene", self.instance);
			return Ok(false);
		}
		let built = Graph::from_scene(scene).and_then(|mut graph| {
			graph.layout(&self.options, self.engine.as_ref(), self.measure.as_ref())?;
			Ok(graph)
		});
		let graph = match built {
			Ok(graph) => graph,
			Err(err) => {
				self.clear();
				return Err(err);
			}
		};

		if !self.fitted {
			if let Some(surface) = self.surface.as_mut() {
				let size = surface.sync_size();
				self.camera.fit(size, graph.layout_size(), self.fit_margin);
				self.fitted = true;
			}
		}
		self.tracker.cancel();
		self.overlay = None;
		self.graph = Some(graph);
		self.render();
		Ok(true)
	}

	/// Redraws the current state, including any uncommitted drag.
	pub fn render(&mut self) {
		if let (Some(surface), Some(graph)) = (self.surface.as_mut(), self.graph.as_ref()) {
			self.renderer
				.render(graph, &self.camera, surface, self.tracker.drag_offset());
		}
	}

	/// Applies new layout options, relaying out only when they differ from
	/// those the graph was last laid out with. A failed layout keeps the
	/// previous geometry.
	pub fn set_options(&mut self, options: LayoutOptions) -> Result<(), GraphError> {
		self.options = options;
		if let Some(graph) = self.graph.as_mut() {
			if graph.needs_layout(&options) {
				graph.layout(&options, self.engine.as_ref(), self.measure.as_ref())?;
			}
		}
		self.render();
		Ok(())
	}

	pub fn options(&self) -> &LayoutOptions {
		&self.options
	}

	pub fn set_highlight_enabled(&mut self, enabled: bool) {
		self.renderer.highlight_enabled = enabled;
		self.render();
	}

	/// Replaces the highlighted subset.
	pub fn highlight(&mut self, nodes: &[NodeId], edges: &[(NodeId, NodeId)]) {
		if let Some(graph) = self.graph.as_mut() {
			graph.clear_highlights();
			for id in nodes {
				graph.set_node_highlight(id, true);
			}
			for (source, target) in edges {
				graph.set_edge_highlight(source, target, true);
			}
		}
		self.render();
	}

	/// Returns whether a gesture started, i.e. whether the host must start
	/// tracking document-level move and release events.
	pub fn pointer_down(&mut self, client: Point, bounds: SurfaceBounds) -> bool {
		let Some(graph) = self.graph.as_mut() else {
			return false;
		};
		if self.surface.is_none() {
			return false;
		}
		if let Some(id) = self.tracker.pointer_down(client, bounds, &self.camera, graph) {
			graph.set_active(&id, true);
			self.render();
		}
		self.tracker.is_tracking()
	}

	pub fn pointer_move(&mut self, client: Point) -> Option<DragUpdate> {
		let update = self.tracker.pointer_move(client)?;
		self.render();
		Some(update)
	}

	/// Commits the gesture. A click on a regular node with a secondary view
	/// opens the overlay; with highlighting on, a click focuses the clicked
	/// node's neighbourhood, or clears the focus when it misses.
	pub fn pointer_up(&mut self) -> Option<Release> {
		let release = self.tracker.pointer_up(&mut self.camera)?;
		if let Some(graph) = self.graph.as_mut() {
			match &release.active {
				Some(id) => {
					graph.set_active(id, false);
					if release.is_click {
						if let Some(content) = graph.node(id).and_then(OverlayContent::for_node) {
							self.overlay = Some(content);
						}
						if self.renderer.highlight_enabled {
							graph.highlight_neighbourhood(id);
						}
					}
				}
				None if release.is_click && self.renderer.highlight_enabled => {
					graph.clear_highlights();
				}
				None => {}
			}
		}
		self.render();
		Some(release)
	}

	pub fn wheel(&mut self, delta_y: f64) {
		self.camera.zoom_wheel(delta_y);
		self.render();
	}

	pub fn zoom_step(&mut self, step: f64) {
		self.camera.zoom_step(step);
		self.render();
	}

	pub fn reset_camera(&mut self) {
		self.camera.reset();
		self.render();
	}

	/// Resyncs the surface to its displayed size. The camera is untouched.
	pub fn resize(&mut self) {
		self.render();
	}

	/// Drops the graph and blanks the surface.
	pub fn clear(&mut self) {
		self.graph = None;
		self.tracker.cancel();
		self.overlay = None;
		if let Some(surface) = self.surface.as_mut() {
			surface.sync_size();
			surface.clear();
		}
	}

	/// Blanks and releases the surface. Every later call is a no-op.
	pub fn destroy(&mut self) {
		self.clear();
		if self.surface.take().is_some() {
			debug!("plugin #{} destroyed", self.instance);
		}
	}

	pub fn is_destroyed(&self) -> bool {
		self.surface.is_none()
	}

	pub fn overlay(&self) -> Option<&OverlayContent> {
		self.overlay.as_ref()
	}

	pub fn close_overlay(&mut self) {
		self.overlay = None;
	}

	pub fn cursor(&self) -> Cursor {
		self.tracker.cursor()
	}

	pub fn is_tracking(&self) -> bool {
		self.tracker.is_tracking()
	}

	/// PNG data URI of the current frame.
	pub fn export_image(&mut self) -> Result<String, SurfaceError> {
		self.render();
		self.surface
			.as_ref()
			.ok_or(SurfaceError::ContextUnavailable)?
			.to_data_url()
	}

	pub fn surface(&self) -> Option<&S> {
		self.surface.as_ref()
	}

	pub fn camera(&self) -> &Camera {
		&self.camera
	}

	pub fn graph(&self) -> Option<&Graph> {
		self.graph.as_ref()
	}

	pub fn renderer(&self) -> &Renderer {
		&self.renderer
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::argument_graph::geometry::Size;
	use crate::components::argument_graph::layout::{LayoutEdge, LayoutNode, LayoutResult, StrengthScaling};
	use crate::components::argument_graph::scene::EdgeSpec;
	use crate::components::argument_graph::surface::ApproximateMeasure;
	use crate::components::argument_graph::testing::{
		DrawOp, RecordingSurface, sample_explanation, sample_scene,
	};
	use crate::components::argument_graph::types::ContributionType;

	const BOUNDS: SurfaceBounds = SurfaceBounds {
		left: 0.0,
		top: 0.0,
		width: 800.0,
		height: 600.0,
	};

	fn plugin() -> GraphPlugin<RecordingSurface> {
		GraphPlugin::new(
			"model",
			"explanation",
			RecordingSurface::new(BOUNDS.width, BOUNDS.height),
			&ViewerConfig::default(),
			Box::new(ApproximateMeasure),
		)
	}

	fn installed() -> GraphPlugin<RecordingSurface> {
		let mut plugin = plugin();
		assert!(plugin.install(sample_scene()).unwrap());
		plugin
	}

	fn screen_of(plugin: &GraphPlugin<RecordingSurface>, id: &str) -> Point {
		let c = plugin.graph().unwrap().node(&id.into()).unwrap().center.unwrap();
		let camera = plugin.camera();
		Point::new(
			c.x * camera.scale + camera.x + BOUNDS.width / 2.0,
			c.y * camera.scale + camera.y + BOUNDS.height / 2.0,
		)
	}

	fn click(plugin: &mut GraphPlugin<RecordingSurface>, at: Point) -> Release {
		assert!(plugin.pointer_down(at, BOUNDS));
		plugin.pointer_up().unwrap()
	}

	#[test]
	fn ingest_validates_structure() {
		let plugin = plugin();
		let scene = plugin.ingest(&sample_explanation()).unwrap();
		assert_eq!(scene.nodes.len(), 4);
		assert_eq!(scene.edges.len(), 4);
	}

	#[test]
	fn install_lays_out_fits_and_draws() {
		let plugin = installed();
		let graph = plugin.graph().unwrap();
		let size = graph.layout_size();
		let expected = (800.0 / (size.width + 64.0)).min(600.0 / (size.height + 64.0));
		assert_eq!(plugin.camera().scale, expected.max(0.1));
		assert!(!plugin.surface().unwrap().ops.is_empty());
	}

	#[test]
	fn instances_are_unique() {
		assert_ne!(plugin().instance(), plugin().instance());
	}

	#[test]
	fn rejected_scene_leaves_plugin_empty() {
		let mut plugin = plugin();
		let mut scene = sample_scene();
		scene.edges.push(EdgeSpec {
			source: "a".into(),
			target: "ghost".into(),
			contribution: ContributionType::Support,
		});
		let err = plugin.install(scene).unwrap_err();
		assert!(matches!(err, GraphError::UnknownNode { .. }));
		assert!(plugin.graph().is_none());
		assert_eq!(plugin.surface().unwrap().ops, [DrawOp::Clear(Size::new(800.0, 600.0))]);
	}

	#[test]
	fn failed_install_blanks_the_previous_frame() {
		let mut plugin = installed().with_engine(Box::new(FailingEngine));
		plugin.surface.as_mut().unwrap().ops.clear();
		let err = plugin.install(sample_scene()).unwrap_err();
		assert!(matches!(err, GraphError::Layout(_)));
		assert!(plugin.graph().is_none());
		assert_eq!(plugin.surface().unwrap().ops, [DrawOp::Clear(Size::new(800.0, 600.0))]);
		assert!(!plugin.pointer_down(Point::new(400.0, 300.0), BOUNDS));
	}

	/// Puts nodes on one row, 1000 units apart, with straight routes.
	struct RowEngine;

	impl LayoutEngine for RowEngine {
		fn layout(
			&self,
			nodes: &[LayoutNode<'_>],
			edges: &[LayoutEdge],
			_: &LayoutOptions,
		) -> Result<LayoutResult, GraphError> {
			let centers: Vec<Point> = (0..nodes.len())
				.map(|i| Point::new(1000.0 * i as f64, 0.0))
				.collect();
			let routes = edges
				.iter()
				.map(|e| vec![centers[e.source], centers[e.target]])
				.collect();
			Ok(LayoutResult { centers, routes })
		}
	}

	struct FailingEngine;

	impl LayoutEngine for FailingEngine {
		fn layout(
			&self,
			_: &[LayoutNode<'_>],
			_: &[LayoutEdge],
			_: &LayoutOptions,
		) -> Result<LayoutResult, GraphError> {
			Err(GraphError::Layout("no room".into()))
		}
	}

	#[test]
	fn injected_engine_places_the_nodes() {
		let mut plugin = plugin().with_engine(Box::new(RowEngine));
		assert!(plugin.install(sample_scene()).unwrap());
		let centers: Vec<Point> = plugin
			.graph()
			.unwrap()
			.nodes()
			.map(|n| n.center.unwrap())
			.collect();
		assert_eq!(centers.len(), 4);
		for pair in centers.windows(2) {
			assert_eq!(pair[1].x - pair[0].x, 1000.0);
			assert_eq!(pair[1].y, pair[0].y);
		}
		assert!(plugin.graph().unwrap().layout_size().width > 3000.0);
	}

	#[test]
	fn clear_blanks_the_surface() {
		let mut plugin = installed();
		plugin.clear();
		assert!(plugin.graph().is_none());
		assert_eq!(plugin.surface().unwrap().ops.last(), Some(&DrawOp::Clear(Size::new(800.0, 600.0))));
		plugin.destroy();
		assert!(plugin.is_destroyed());
	}

	#[test]
	fn destroy_then_late_install_is_ignored() {
		let mut plugin = plugin();
		plugin.destroy();
		assert!(plugin.is_destroyed());
		assert!(!plugin.install(sample_scene()).unwrap());
		assert!(plugin.graph().is_none());
		plugin.render();
		plugin.wheel(10.0);
		assert!(!plugin.pointer_down(Point::ORIGIN, BOUNDS));
		assert!(matches!(plugin.export_image(), Err(SurfaceError::ContextUnavailable)));
	}

	#[test]
	fn click_on_dual_image_node_opens_overlay() {
		let mut plugin = installed();
		let at = screen_of(&plugin, "a");
		let release = click(&mut plugin, at);
		assert!(release.is_click);

		let overlay = plugin.overlay().unwrap();
		assert_eq!(overlay.primary.src, "feat-a");
		assert_eq!(overlay.secondary.src, "filter-a");
		assert_eq!(overlay.strength_label(), "Strength: 1.00");
		assert!(!plugin.graph().unwrap().node(&"a".into()).unwrap().active);

		plugin.close_overlay();
		assert!(plugin.overlay().is_none());
	}

	#[test]
	fn text_node_click_and_drags_open_nothing() {
		let mut plugin = installed();
		let at = screen_of(&plugin, "b");
		click(&mut plugin, at);
		assert!(plugin.overlay().is_none());

		let at = screen_of(&plugin, "a");
		assert!(plugin.pointer_down(at, BOUNDS));
		assert!(plugin.graph().unwrap().node(&"a".into()).unwrap().active);
		plugin.pointer_move(at + Point::new(20.0, 0.0)).unwrap();
		assert_eq!(plugin.cursor(), Cursor::Move);
		let release = plugin.pointer_up().unwrap();
		assert!(!release.is_click);
		assert!(plugin.overlay().is_none());
		assert_eq!(plugin.camera().x, 20.0);
		assert!(!plugin.is_tracking());
	}

	#[test]
	fn drag_renders_with_transient_offset() {
		let mut plugin = installed();
		plugin.pointer_down(Point::new(1.0, 1.0), BOUNDS);
		plugin.surface.as_mut().unwrap().ops.clear();
		plugin.pointer_move(Point::new(11.0, 1.0));
		let ops = &plugin.surface().unwrap().ops;
		assert_eq!(ops[2], DrawOp::Translate(410.0, 300.0));
		assert_eq!(plugin.camera().x, 0.0);
	}

	#[test]
	fn highlight_click_focuses_neighbourhood() {
		let mut plugin = installed();
		plugin.set_highlight_enabled(true);
		assert!(plugin.renderer().highlight_enabled);
		let at = screen_of(&plugin, "b");
		click(&mut plugin, at);
		let lit: Vec<_> = plugin
			.graph()
			.unwrap()
			.nodes()
			.filter(|n| n.highlight)
			.map(|n| n.id.as_str())
			.collect();
		assert_eq!(lit, ["in", "b", "out"]);

		click(&mut plugin, Point::new(1.0, 1.0));
		assert!(plugin.graph().unwrap().nodes().all(|n| !n.highlight));
	}

	#[test]
	fn options_change_relayouts_but_keeps_camera() {
		let mut plugin = installed();
		plugin.zoom_step(0.2);
		let camera = *plugin.camera();
		let before = plugin.graph().unwrap().node(&"in".into()).unwrap().size;

		let options = LayoutOptions {
			input_size: 300.0,
			scaling: StrengthScaling::Logarithmic,
			..*plugin.options()
		};
		plugin.set_options(options).unwrap();

		let after = plugin.graph().unwrap().node(&"in".into()).unwrap().size;
		assert_ne!(before, after);
		assert_eq!(after.unwrap().height, 300.0);
		assert_eq!(*plugin.camera(), camera);
	}

	#[test]
	fn reset_and_export() {
		let mut plugin = installed();
		plugin.wheel(-200.0);
		plugin.reset_camera();
		assert_eq!(*plugin.camera(), Camera::default());
		assert!(plugin.export_image().unwrap().starts_with("data:image/png"));
	}
}
