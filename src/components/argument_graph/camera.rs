use super::geometry::{Point, Size};

pub const MIN_SCALE: f64 = 0.1;
pub const ZOOM_SENSITIVITY: f64 = 0.001;
/// Zoom change per zoom-button press.
pub const ZOOM_STEP: f64 = 0.2;
pub const FIT_MARGIN: f64 = 64.0;

/// Screen-space rectangle of the drawing surface, as reported by
/// `getBoundingClientRect`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceBounds {
	pub left: f64,
	pub top: f64,
	pub width: f64,
	pub height: f64,
}

/// Pan offset in screen pixels and a uniform zoom. The world origin sits
/// at the surface center offset by `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
	pub x: f64,
	pub y: f64,
	pub scale: f64,
}

impl Default for Camera {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			scale: 1.0,
		}
	}
}

impl Camera {
	pub fn pan(&mut self, dx: f64, dy: f64) {
		self.x += dx;
		self.y += dy;
	}

	pub fn zoom_wheel(&mut self, delta_y: f64) {
		self.set_scale(self.scale - delta_y * ZOOM_SENSITIVITY);
	}

	pub fn zoom_step(&mut self, step: f64) {
		self.set_scale(self.scale + step);
	}

	pub fn reset(&mut self) {
		*self = Self::default();
	}

	/// Zooms so a centered `layout` of the given extent fits the surface
	/// with `margin` pixels to spare on the tighter axis.
	pub fn fit(&mut self, surface: Size, layout: Size, margin: f64) {
		let ratio_x = surface.width / (layout.width + margin);
		let ratio_y = surface.height / (layout.height + margin);
		self.x = 0.0;
		self.y = 0.0;
		self.set_scale(ratio_x.min(ratio_y));
	}

	pub fn screen_to_world(&self, client: Point, bounds: SurfaceBounds) -> Point {
		Point::new(
			(client.x - bounds.left - bounds.width / 2.0 - self.x) / self.scale,
			(client.y - bounds.top - bounds.height / 2.0 - self.y) / self.scale,
		)
	}

	fn set_scale(&mut self, scale: f64) {
		// NaN.max(MIN_SCALE) is MIN_SCALE
		self.scale = scale.max(MIN_SCALE);
	}
}
