use std::f64::consts::FRAC_PI_6;

use super::camera::Camera;
use super::geometry::Point;
use super::graph::{Edge, Graph, Node, TEXT_PADDING};
use super::surface::Surface;
use super::types::{ContentType, NodeKind};

pub const ARROW_LENGTH: f64 = 10.0;
const ACTIVE_BACKING: &str = "rgba(0, 0, 0, 0.2)";
const ACTIVE_BACKING_SPREAD: f64 = 4.0;
const DIMMED_OVERLAY: &str = "rgba(0, 0, 0, 0.5)";
const TEXT_COLOR: &str = "black";

/// Stateless apart from the global highlight toggle; every frame is a full
/// redraw from the graph and camera.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Renderer {
	pub highlight_enabled: bool,
}

impl Renderer {
	/// Draws one frame. `offset` is the uncommitted drag vector, applied on
	/// top of the camera pan.
	pub fn render<S: Surface + ?Sized>(
		&self,
		graph: &Graph,
		camera: &Camera,
		surface: &mut S,
		offset: Point,
	) {
		let size = surface.sync_size();
		surface.clear();
		surface.save();
		surface.translate(
			size.width / 2.0 + camera.x + offset.x,
			size.height / 2.0 + camera.y + offset.y,
		);
		surface.scale(camera.scale);

		for node in graph.nodes() {
			self.draw_node(node, surface);
		}
		for edge in graph.edges() {
			self.draw_edge(edge, surface);
		}
		surface.restore();
	}

	fn draw_node<S: Surface + ?Sized>(&self, node: &Node, surface: &mut S) {
		let Some(rect) = node.rect() else {
			return;
		};

		if node.content_type == ContentType::Text {
			surface.set_stroke_style(TEXT_COLOR);
			surface.set_line_width(1.0);
			surface.stroke_rect(rect);
			if let (Some(text), Some(font_px)) = (node.payload.text(), node.font_px) {
				surface.set_font(font_px);
				surface.set_fill_style(TEXT_COLOR);
				surface.fill_text(text, Point::new(rect.x + TEXT_PADDING, rect.center().y));
			}
			return;
		}

		if node.active {
			surface.set_fill_style(ACTIVE_BACKING);
			surface.fill_rect(rect.expand(ACTIVE_BACKING_SPREAD));
		}
		if let Some(image) = node.payload.primary() {
			surface.draw_image(image, rect);
		}
		if self.highlight_enabled && node.kind == NodeKind::Regular && !node.highlight {
			surface.set_fill_style(DIMMED_OVERLAY);
			surface.fill_rect(rect);
		}
	}

	fn draw_edge<S: Surface + ?Sized>(&self, edge: &Edge, surface: &mut S) {
		let [.., from, to] = edge.points.as_slice() else {
			return;
		};
		let width = if self.highlight_enabled && edge.highlight {
			3.0
		} else {
			1.0
		};

		surface.set_line_width(width);
		surface.set_stroke_style(edge.color());
		surface.begin_path();
		surface.move_to(edge.points[0]);
		for p in &edge.points[1..] {
			surface.line_to(*p);
		}
		surface.stroke();

		let [tip, left, right] = arrow_head(*from, *to);
		surface.set_fill_style(edge.color());
		surface.begin_path();
		surface.move_to(tip);
		surface.line_to(left);
		surface.line_to(right);
		surface.close_path();
		surface.fill();
	}
}

/// Triangle at `to` pointing along `from -> to`: tip, then the two barbs.
pub fn arrow_head(from: Point, to: Point) -> [Point; 3] {
	let angle = (to.y - from.y).atan2(to.x - from.x);
	let barb = |theta: f64| {
		Point::new(
			to.x - ARROW_LENGTH * theta.cos(),
			to.y - ARROW_LENGTH * theta.sin(),
		)
	};
	[to, barb(angle - FRAC_PI_6), barb(angle + FRAC_PI_6)]
}

#[cfg(test)]
mod tests {
	use float_cmp::approx_eq;

	use super::*;
	use crate::components::argument_graph::geometry::Size;
	use crate::components::argument_graph::layout::{LayeredEngine, LayoutOptions};
	use crate::components::argument_graph::surface::ApproximateMeasure;
	use crate::components::argument_graph::testing::{DrawOp, RecordingSurface, sample_scene};
	use crate::components::argument_graph::types::NodeId;

	fn laid_out_sample() -> Graph {
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

	#[test]
	fn frame_order_is_clear_transform_nodes_edges() {
		let graph = laid_out_sample();
		let camera = Camera {
			x: 5.0,
			y: -5.0,
			scale: 2.0,
		};
		let mut surface = RecordingSurface::new(400.0, 300.0);
		Renderer::default().render(&graph, &camera, &mut surface, Point::new(1.0, 2.0));

		assert_eq!(surface.ops[0], DrawOp::Clear(Size::new(400.0, 300.0)));
		assert_eq!(surface.ops[2], DrawOp::Translate(206.0, 147.0));
		assert_eq!(surface.ops[3], DrawOp::Scale(2.0));

		let last_node = surface
			.position(|op| matches!(op, DrawOp::FillText(t, _) if t == "zebra (87.00%)"))
			.unwrap();
		let first_edge = surface.position(|op| *op == DrawOp::BeginPath).unwrap();
		assert!(last_node < first_edge);
		assert_eq!(surface.count(|op| *op == DrawOp::Fill), graph.edges().count());
		assert_eq!(surface.ops.last(), Some(&DrawOp::Restore));
	}

	#[test]
	fn edges_use_contribution_colors() {
		let graph = laid_out_sample();
		let mut surface = RecordingSurface::new(400.0, 300.0);
		Renderer::default().render(&graph, &Camera::default(), &mut surface, Point::ORIGIN);

		for color in ["green", "red", "#bbbbbb"] {
			assert!(surface.ops.contains(&DrawOp::StrokeStyle(color.into())));
		}
		assert_eq!(surface.count(|op| *op == DrawOp::LineWidth(3.0)), 0);
	}

	#[test]
	fn highlighting_dims_other_regular_images() {
		let mut graph = laid_out_sample();
		graph.set_edge_highlight(&"in".into(), &"a".into(), true);
		let mut surface = RecordingSurface::new(400.0, 300.0);
		let renderer = Renderer {
			highlight_enabled: true,
		};

		renderer.render(&graph, &Camera::default(), &mut surface, Point::ORIGIN);
		assert_eq!(surface.count(|op| *op == DrawOp::FillStyle(DIMMED_OVERLAY.into())), 1);
		assert_eq!(surface.count(|op| *op == DrawOp::LineWidth(3.0)), 1);

		graph.set_node_highlight(&NodeId::from("a"), true);
		let mut surface = RecordingSurface::new(400.0, 300.0);
		renderer.render(&graph, &Camera::default(), &mut surface, Point::ORIGIN);
		assert_eq!(surface.count(|op| *op == DrawOp::FillStyle(DIMMED_OVERLAY.into())), 0);
	}

	#[test]
	fn active_node_gets_backing() {
		let mut graph = laid_out_sample();
		graph.set_active(&"a".into(), true);
		let rect = graph.node(&"a".into()).unwrap().rect().unwrap();
		let mut surface = RecordingSurface::new(400.0, 300.0);
		Renderer::default().render(&graph, &Camera::default(), &mut surface, Point::ORIGIN);

		let backing = surface
			.position(|op| *op == DrawOp::FillRect(rect.expand(4.0)))
			.unwrap();
		let image = surface
			.position(|op| *op == DrawOp::DrawImage("feat-a".into(), rect))
			.unwrap();
		assert!(backing < image);
	}

	#[test]
	fn unlaid_graph_draws_no_content() {
		let graph = Graph::from_scene(sample_scene()).unwrap();
		let mut surface = RecordingSurface::new(10.0, 10.0);
		Renderer::default().render(&graph, &Camera::default(), &mut surface, Point::ORIGIN);
		assert_eq!(surface.ops.len(), 5);
	}

	#[test]
	fn arrow_head_geometry() {
		let [tip, left, right] = arrow_head(Point::new(0.0, 0.0), Point::new(0.0, 100.0));
		assert_eq!(tip, Point::new(0.0, 100.0));
		// pointing down: barbs sit above the tip, mirrored about the shaft
		for barb in [left, right] {
			let length = ((barb.x - tip.x).powi(2) + (barb.y - tip.y).powi(2)).sqrt();
			assert!(approx_eq!(f64, length, ARROW_LENGTH, epsilon = 1e-9));
			assert!(approx_eq!(f64, barb.y, 100.0 - 10.0 * FRAC_PI_6.cos(), epsilon = 1e-9));
		}
		assert!(approx_eq!(f64, left.x, -right.x, epsilon = 1e-9));
		assert!(approx_eq!(f64, left.x.abs(), 5.0, epsilon = 1e-9));
	}
}
