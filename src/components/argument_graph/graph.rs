//! The graph model: nodes, edges, the content-aware sizing policy, and the
//! layout pass that drives the layout engine.

use indexmap::IndexMap;
use log::debug;

use super::error::GraphError;
use super::geometry::{Point, Rect, Size};
use super::layout::{LayoutEdge, LayoutEngine, LayoutNode, LayoutOptions};
use super::scene::{NodeSpec, Scene};
use super::surface::TextMeasure;
use super::types::{ContentType, ContributionType, NodeId, NodeKind, NodePayload, RasterImage};

/// Horizontal padding on each side of text content.
pub const TEXT_PADDING: f64 = 8.0;
pub const CONCLUSION_FONT_PX: f64 = 24.0;
pub const CONCLUSION_HEIGHT: f64 = 50.0;
/// Smallest edge of a regular image node, whatever its strength.
pub const MIN_IMAGE_SIZE: f64 = 40.0;
const BASE_FONT_PX: f64 = 24.0;
const MIN_FONT_PX: f64 = 12.0;
const MAX_FONT_PX: f64 = 48.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: NodeId,
	pub kind: NodeKind,
	pub content_type: ContentType,
	pub payload: NodePayload<RasterImage>,
	pub strength: f64,
	pub certainty: Option<f64>,
	/// `strength / max strength` as of the last layout pass.
	pub normalised_strength: f64,
	/// Font of text content, set by the layout pass.
	pub font_px: Option<f64>,
	pub size: Option<Size>,
	pub center: Option<Point>,
	/// Pointer is held down on this node.
	pub active: bool,
	pub highlight: bool,
}

impl Node {
	pub fn from_spec(spec: NodeSpec<RasterImage>) -> Self {
		Self {
			id: spec.id,
			kind: spec.kind,
			content_type: spec.content_type,
			payload: spec.payload,
			strength: spec.strength,
			certainty: spec.certainty,
			normalised_strength: 0.0,
			font_px: None,
			size: None,
			center: None,
			active: false,
			highlight: false,
		}
	}

	/// Bounding rect in world space, `None` until laid out.
	pub fn rect(&self) -> Option<Rect> {
		Some(Rect::from_center(self.center?, self.size?))
	}

	/// Whether a click should reveal side-by-side feature and filter views.
	pub fn has_secondary_view(&self) -> bool {
		self.content_type != ContentType::Text && self.payload.secondary().is_some()
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub source: NodeId,
	pub target: NodeId,
	pub contribution: ContributionType,
	/// Control points from source to target, set by the layout pass.
	pub points: Vec<Point>,
	pub highlight: bool,
}

impl Edge {
	pub fn color(&self) -> &'static str {
		self.contribution.color()
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Metrics {
	size: Size,
	font_px: Option<f64>,
	normalised: f64,
}

#[derive(Clone, Debug, Default)]
pub struct Graph {
	nodes: IndexMap<NodeId, Node>,
	edges: IndexMap<(NodeId, NodeId), Edge>,
	max_strength: f64,
	applied: Option<LayoutOptions>,
	layout_size: Size,
}

impl Graph {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_scene(scene: Scene<RasterImage>) -> Result<Self, GraphError> {
		let mut graph = Self::new();
		for spec in scene.nodes {
			graph.add_node(Node::from_spec(spec))?;
		}
		for edge in scene.edges {
			graph.add_edge(edge.source, edge.target, edge.contribution)?;
		}
		Ok(graph)
	}

	/// Inserts or replaces a node; a replaced node keeps its original position
	/// in iteration (and hit-test) order.
	pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
		if node.kind == NodeKind::None {
			return Err(GraphError::InvalidNodeKind(node.id));
		}
		let strength = node.strength;
		match self.nodes.insert(node.id.clone(), node) {
			// the replaced node may have held the maximum
			Some(old) if old.strength >= self.max_strength => {
				self.max_strength = self.nodes.values().map(|n| n.strength).fold(0.0, f64::max);
			}
			_ => self.max_strength = self.max_strength.max(strength),
		}
		self.applied = None;
		Ok(())
	}

	pub fn add_edge(
		&mut self,
		source: NodeId,
		target: NodeId,
		contribution: ContributionType,
	) -> Result<(), GraphError> {
		for id in [&source, &target] {
			if !self.nodes.contains_key(id) {
				return Err(GraphError::UnknownNode {
					from: source.clone(),
					to: target.clone(),
					missing: id.clone(),
				});
			}
		}
		self.edges.insert(
			(source.clone(), target.clone()),
			Edge {
				source,
				target,
				contribution,
				points: Vec::new(),
				highlight: false,
			},
		);
		self.applied = None;
		Ok(())
	}

	pub fn nodes(&self) -> impl Iterator<Item = &Node> {
		self.nodes.values()
	}

	pub fn edges(&self) -> impl Iterator<Item = &Edge> {
		self.edges.values()
	}

	pub fn node(&self, id: &NodeId) -> Option<&Node> {
		self.nodes.get(id)
	}

	pub fn edge(&self, source: &NodeId, target: &NodeId) -> Option<&Edge> {
		self.edges.get(&(source.clone(), target.clone()))
	}

	pub fn max_strength(&self) -> f64 {
		self.max_strength
	}

	/// Extent of the laid-out graph; zero before the first layout.
	pub fn layout_size(&self) -> Size {
		self.layout_size
	}

	pub fn is_laid_out(&self) -> bool {
		self.applied.is_some()
	}

	/// True when sizes are stale for `options`.
	pub fn needs_layout(&self, options: &LayoutOptions) -> bool {
		self.applied.as_ref() != Some(options)
	}

	/// Sizes every node, runs `engine`, and recenters the result so the
	/// bounding box of all nodes is centered on the origin. Nothing is
	/// committed unless every step succeeds.
	pub fn layout(
		&mut self,
		options: &LayoutOptions,
		engine: &dyn LayoutEngine,
		measure: &dyn TextMeasure,
	) -> Result<(), GraphError> {
		let metrics = self
			.nodes
			.values()
			.map(|node| self.measure_node(node, options, measure))
			.collect::<Result<Vec<_>, _>>()?;

		let layout_nodes: Vec<LayoutNode<'_>> = self
			.nodes
			.keys()
			.zip(&metrics)
			.map(|(id, m)| LayoutNode { id, size: m.size })
			.collect();
		let layout_edges = self
			.edges
			.values()
			.map(|edge| {
				let index = |id: &NodeId| {
					self.nodes.get_index_of(id).ok_or_else(|| GraphError::UnknownNode {
						from: edge.source.clone(),
						to: edge.target.clone(),
						missing: id.clone(),
					})
				};
				Ok(LayoutEdge {
					source: index(&edge.source)?,
					target: index(&edge.target)?,
				})
			})
			.collect::<Result<Vec<_>, GraphError>>()?;

		let result = engine.layout(&layout_nodes, &layout_edges, options)?;
		if result.centers.len() != metrics.len() || result.routes.len() != layout_edges.len() {
			return Err(GraphError::Layout(format!(
				"engine returned {} centers and {} routes for {} nodes and {} edges",
				result.centers.len(),
				result.routes.len(),
				metrics.len(),
				layout_edges.len()
			)));
		}
		if let Some(i) = result.routes.iter().position(|route| route.len() < 2) {
			return Err(GraphError::Layout(format!("edge #{i} was routed with fewer than 2 points")));
		}

		let bounds = Rect::enclosing(
			result
				.centers
				.iter()
				.zip(&metrics)
				.map(|(c, m)| Rect::from_center(*c, m.size)),
		)
		.unwrap_or_default();
		let shift = bounds.center();

		for ((node, m), center) in self.nodes.values_mut().zip(&metrics).zip(&result.centers) {
			node.size = Some(m.size);
			node.font_px = m.font_px;
			node.normalised_strength = m.normalised;
			node.center = Some(*center - shift);
		}
		for (edge, route) in self.edges.values_mut().zip(result.routes) {
			edge.points = route.into_iter().map(|p| p - shift).collect();
		}
		self.layout_size = bounds.size();
		self.applied = Some(*options);

		debug!(
			"laid out {} nodes and {} edges in {:.0}x{:.0}",
			self.nodes.len(),
			self.edges.len(),
			bounds.width,
			bounds.height
		);
		Ok(())
	}

	fn normalise(&self, strength: f64) -> f64 {
		if self.max_strength > 0.0 {
			(strength / self.max_strength).clamp(0.0, 1.0)
		} else {
			0.0
		}
	}

	fn measure_node(
		&self,
		node: &Node,
		options: &LayoutOptions,
		measure: &dyn TextMeasure,
	) -> Result<Metrics, GraphError> {
		let normalised = self.normalise(node.strength);
		let invalid = || GraphError::InvalidPayload {
			id: node.id.clone(),
			content_type: node.content_type,
		};
		let text_box = |text: &str, font_px: f64, height: f64| Metrics {
			size: Size::new(measure.text_width(text, font_px) + 2.0 * TEXT_PADDING, height),
			font_px: Some(font_px),
			normalised,
		};
		let image_box = |image: &RasterImage, height: f64| Metrics {
			size: Size::new(height * image.aspect_ratio(), height),
			font_px: None,
			normalised,
		};

		let metrics = match (node.kind, &node.payload) {
			(NodeKind::None, _) => return Err(GraphError::InvalidNodeKind(node.id.clone())),
			(NodeKind::Conclusion, NodePayload::Text(text)) => {
				text_box(text, CONCLUSION_FONT_PX, CONCLUSION_HEIGHT)
			}
			(NodeKind::Conclusion, _) => return Err(invalid()),
			(NodeKind::Input, NodePayload::Text(text)) => {
				let s = if node.strength > 0.0 { normalised } else { 1.0 };
				let font = (options.input_size * 0.01 * text_scale(s)).round();
				text_box(text, font, options.input_size * font * 0.007)
			}
			(NodeKind::Input, payload) => {
				image_box(payload.primary().ok_or_else(invalid)?, options.input_size)
			}
			(NodeKind::Regular, NodePayload::Text(text)) => {
				let font = (options.argument_size * 0.015 * text_scale(normalised)).round();
				text_box(text, font, options.argument_size * font * 0.01)
			}
			(NodeKind::Regular, payload) => {
				let factor = options.scaling.factor(normalised);
				let reference = options.argument_size;
				let side = reference.min(MIN_IMAGE_SIZE + factor.abs() * (reference - MIN_IMAGE_SIZE));
				image_box(payload.primary().ok_or_else(invalid)?, side)
			}
		};

		if !metrics.size.is_positive() {
			return Err(GraphError::Layout(format!(
				"node {} sized to {}x{}",
				node.id, metrics.size.width, metrics.size.height
			)));
		}
		Ok(metrics)
	}

	/// First regular node, in insertion order, whose rect contains `world`.
	/// Nodes that have not been laid out never match.
	pub fn hit_test(&self, world: Point) -> Option<&NodeId> {
		self.nodes
			.values()
			.filter(|node| node.kind == NodeKind::Regular)
			.find(|node| node.rect().is_some_and(|r| r.contains(world)))
			.map(|node| &node.id)
	}

	pub fn set_active(&mut self, id: &NodeId, active: bool) -> bool {
		self.nodes.get_mut(id).map(|n| n.active = active).is_some()
	}

	pub fn set_node_highlight(&mut self, id: &NodeId, highlight: bool) -> bool {
		self.nodes.get_mut(id).map(|n| n.highlight = highlight).is_some()
	}

	pub fn set_edge_highlight(&mut self, source: &NodeId, target: &NodeId, highlight: bool) -> bool {
		self.edges
			.get_mut(&(source.clone(), target.clone()))
			.map(|e| e.highlight = highlight)
			.is_some()
	}

	pub fn clear_highlights(&mut self) {
		self.nodes.values_mut().for_each(|n| n.highlight = false);
		self.edges.values_mut().for_each(|e| e.highlight = false);
	}

	/// Highlights `id`, its direct neighbours, and the edges between them.
	pub fn highlight_neighbourhood(&mut self, id: &NodeId) {
		self.clear_highlights();
		let mut neighbours = vec![id.clone()];
		for edge in self.edges.values_mut() {
			if &edge.source == id || &edge.target == id {
				edge.highlight = true;
				neighbours.push(edge.source.clone());
				neighbours.push(edge.target.clone());
			}
		}
		for n in neighbours {
			self.set_node_highlight(&n, true);
		}
	}
}

/// Font scale for text nodes: `24 * s` clamped into the legible range.
fn text_scale(s: f64) -> f64 {
	(BASE_FONT_PX * s).clamp(MIN_FONT_PX, MAX_FONT_PX)
}
