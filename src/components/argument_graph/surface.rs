//! The drawing surface the renderer and word-cloud rasterizer paint onto.
//!
//! In the browser this is a `CanvasRenderingContext2d` (see `canvas.rs`);
//! the trait keeps everything above it free of `web_sys`.

use super::error::SurfaceError;
use super::geometry::{Point, Rect, Size};
use super::types::RasterImage;

pub const FONT_FAMILY: &str = "sans-serif";

/// CSS font shorthand for a pixel size.
pub fn css_font(font_px: f64) -> String {
	format!("{font_px}px {FONT_FAMILY}")
}

/// Immediate-mode 2D drawing operations, a subset of the canvas API.
pub trait Surface {
	/// Matches the pixel dimensions to the displayed size and returns them.
	/// Resizing resets any transform left over from a previous frame.
	fn sync_size(&mut self) -> Size;
	/// Sets explicit pixel dimensions, for surfaces that are never displayed.
	fn resize(&mut self, size: Size);
	fn size(&self) -> Size;
	fn clear(&mut self);
	fn save(&mut self);
	fn restore(&mut self);
	fn translate(&mut self, x: f64, y: f64);
	fn scale(&mut self, k: f64);
	fn set_fill_style(&mut self, style: &str);
	fn set_stroke_style(&mut self, style: &str);
	fn set_line_width(&mut self, width: f64);
	fn set_font(&mut self, font_px: f64);
	fn fill_rect(&mut self, rect: Rect);
	fn stroke_rect(&mut self, rect: Rect);
	/// Left-aligned text with its vertical middle at `at.y`.
	fn fill_text(&mut self, text: &str, at: Point);
	fn draw_image(&mut self, image: &RasterImage, rect: Rect);
	fn begin_path(&mut self);
	fn move_to(&mut self, p: Point);
	fn line_to(&mut self, p: Point);
	fn close_path(&mut self);
	fn stroke(&mut self);
	fn fill(&mut self);
	fn to_data_url(&self) -> Result<String, SurfaceError>;
}

pub trait TextMeasure {
	fn text_width(&self, text: &str, font_px: f64) -> f64;
}

/// Width estimate from character count, used when no canvas is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproximateMeasure;

impl ApproximateMeasure {
	const EM_RATIO: f64 = 0.6;
}

impl TextMeasure for ApproximateMeasure {
	fn text_width(&self, text: &str, font_px: f64) -> f64 {
		text.chars().count() as f64 * font_px * Self::EM_RATIO
	}
}
