use std::ops::{Add, Sub};

/// A point in world or screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

impl Add for Point {
	type Output = Point;

	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

impl Size {
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	pub fn is_positive(&self) -> bool {
		self.width > 0.0 && self.height > 0.0
	}
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self {
			x,
			y,
			width,
			height,
		}
	}

	pub fn from_center(center: Point, size: Size) -> Self {
		Self::new(
			center.x - size.width / 2.0,
			center.y - size.height / 2.0,
			size.width,
			size.height,
		)
	}

	pub fn center(&self) -> Point {
		Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
	}

	pub fn size(&self) -> Size {
		Size::new(self.width, self.height)
	}

	/// Edges are inclusive, so a point on the border counts as inside.
	pub fn contains(&self, p: Point) -> bool {
		p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
	}

	pub fn expand(&self, by: f64) -> Self {
		Self::new(
			self.x - by,
			self.y - by,
			self.width + 2.0 * by,
			self.height + 2.0 * by,
		)
	}

	/// Smallest rectangle covering every input rectangle, `None` for an empty input.
	pub fn enclosing(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
		let mut rects = rects.into_iter();
		let first = rects.next()?;
		let (mut min_x, mut min_y) = (first.x, first.y);
		let (mut max_x, mut max_y) = (first.x + first.width, first.y + first.height);
		for r in rects {
			min_x = min_x.min(r.x);
			min_y = min_y.min(r.y);
			max_x = max_x.max(r.x + r.width);
			max_y = max_y.max(r.y + r.height);
		}
		Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
	}
}
