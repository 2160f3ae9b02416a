use super::error::SurfaceError;
use super::geometry::{Point, Rect, Size};
use super::scene::Scene;
use super::surface::Surface;
use super::types::{ExplanationGraph, RasterImage};

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
	Resize(Size),
	Clear(Size),
	Save,
	Restore,
	Translate(f64, f64),
	Scale(f64),
	FillStyle(String),
	StrokeStyle(String),
	LineWidth(f64),
	Font(f64),
	FillRect(Rect),
	StrokeRect(Rect),
	FillText(String, Point),
	DrawImage(String, Rect),
	BeginPath,
	MoveTo(Point),
	LineTo(Point),
	ClosePath,
	Stroke,
	Fill,
}

/// Surface that records every call instead of drawing.
#[derive(Debug)]
pub struct RecordingSurface {
	pub size: Size,
	pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			size: Size::new(width, height),
			ops: Vec::new(),
		}
	}

	pub fn count(&self, pred: impl Fn(&DrawOp) -> bool) -> usize {
		self.ops.iter().filter(|op| pred(op)).count()
	}

	pub fn position(&self, pred: impl Fn(&DrawOp) -> bool) -> Option<usize> {
		self.ops.iter().position(pred)
	}
}

impl Surface for RecordingSurface {
	fn sync_size(&mut self) -> Size {
		self.size
	}

	fn resize(&mut self, size: Size) {
		self.size = size;
		self.ops.push(DrawOp::Resize(size));
	}

	fn size(&self) -> Size {
		self.size
	}

	fn clear(&mut self) {
		self.ops.push(DrawOp::Clear(self.size));
	}

	fn save(&mut self) {
		self.ops.push(DrawOp::Save);
	}

	fn restore(&mut self) {
		self.ops.push(DrawOp::Restore);
	}

	fn translate(&mut self, x: f64, y: f64) {
		self.ops.push(DrawOp::Translate(x, y));
	}

	fn scale(&mut self, k: f64) {
		self.ops.push(DrawOp::Scale(k));
	}

	fn set_fill_style(&mut self, style: &str) {
		self.ops.push(DrawOp::FillStyle(style.to_owned()));
	}

	fn set_stroke_style(&mut self, style: &str) {
		self.ops.push(DrawOp::StrokeStyle(style.to_owned()));
	}

	fn set_line_width(&mut self, width: f64) {
		self.ops.push(DrawOp::LineWidth(width));
	}

	fn set_font(&mut self, font_px: f64) {
		self.ops.push(DrawOp::Font(font_px));
	}

	fn fill_rect(&mut self, rect: Rect) {
		self.ops.push(DrawOp::FillRect(rect));
	}

	fn stroke_rect(&mut self, rect: Rect) {
		self.ops.push(DrawOp::StrokeRect(rect));
	}

	fn fill_text(&mut self, text: &str, at: Point) {
		self.ops.push(DrawOp::FillText(text.to_owned(), at));
	}

	fn draw_image(&mut self, image: &RasterImage, rect: Rect) {
		self.ops.push(DrawOp::DrawImage(image.src.clone(), rect));
	}

	fn begin_path(&mut self) {
		self.ops.push(DrawOp::BeginPath);
	}

	fn move_to(&mut self, p: Point) {
		self.ops.push(DrawOp::MoveTo(p));
	}

	fn line_to(&mut self, p: Point) {
		self.ops.push(DrawOp::LineTo(p));
	}

	fn close_path(&mut self) {
		self.ops.push(DrawOp::ClosePath);
	}

	fn stroke(&mut self) {
		self.ops.push(DrawOp::Stroke);
	}

	fn fill(&mut self) {
		self.ops.push(DrawOp::Fill);
	}

	fn to_data_url(&self) -> Result<String, SurfaceError> {
		Ok(format!(
			"data:image/png;base64,{}x{}:{}",
			self.size.width,
			self.size.height,
			self.ops.len()
		))
	}
}

/// Input -> two regular arguments -> conclusion, mixing text and image content.
pub fn sample_explanation() -> ExplanationGraph {
	serde_json::from_value(serde_json::json!({
		"name": "sample",
		"input": ["in"],
		"conclusion": ["out"],
		"nodes": {
			"in": {
				"node_type": "input", "content_type": "image", "payload": "input-key", "strength": 2.0,
				"children": {
					"a": { "contribution_type": "support" },
					"b": { "contribution_type": "attack" }
				}
			},
			"a": {
				"node_type": "regular", "content_type": "image",
				"payload": { "feature": { "payload": "feat-a" }, "filter": { "payload": "filter-a" } },
				"strength": 4.0,
				"children": { "out": { "contribution_type": "support" } }
			},
			"b": {
				"node_type": "regular", "content_type": "string", "payload": "stripes",
				"strength": 1.0,
				"children": { "out": { "contribution_type": "indirect" } }
			},
			"out": {
				"node_type": "conclusion", "content_type": "string", "payload": "zebra",
				"strength": 0.0, "certainty": 87.0
			}
		}
	}))
	.expect("sample explanation is valid")
}

/// [`sample_explanation`] with every image resolved to a 100x50 raster
/// whose `src` is the resource key.
pub fn sample_scene() -> Scene<RasterImage> {
	let scene = Scene::from_explanation(&sample_explanation()).expect("sample explanation is valid");
	Scene {
		nodes: scene
			.nodes
			.into_iter()
			.map(|node| {
				node.map_images(|source| {
					let src = match source {
						super::types::ImageSource::Resource(key) => key,
						super::types::ImageSource::WordCloud(_) => "cloud".to_owned(),
					};
					RasterImage::new(src, 100.0, 50.0)
				})
			})
			.collect(),
		edges: scene.edges,
	}
}
