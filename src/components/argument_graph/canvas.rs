//! Browser implementations of the drawing surface, text measurement, and
//! image loading, backed by `web_sys`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use super::error::{PreloadError, SurfaceError};
use super::geometry::{Point, Rect, Size};
use super::preload::{ImageLoader, short};
use super::surface::{ApproximateMeasure, Surface, TextMeasure, css_font};
use super::types::RasterImage;
use super::word_cloud::{self, WeightedWord};

const PLACEHOLDER_FILL: &str = "#dddddd";

/// Decoded images by `src`, shared between the loader that fills it and
/// the surfaces that draw from it.
#[derive(Clone, Debug, Default)]
pub struct ImageRegistry(Rc<RefCell<HashMap<String, HtmlImageElement>>>);

impl ImageRegistry {
	pub fn insert(&self, src: String, image: HtmlImageElement) {
		self.0.borrow_mut().insert(src, image);
	}

	pub fn get(&self, src: &str) -> Option<HtmlImageElement> {
		self.0.borrow().get(src).cloned()
	}
}

fn create_canvas() -> Result<HtmlCanvasElement, SurfaceError> {
	web_sys::window()
		.and_then(|w| w.document())
		.ok_or(SurfaceError::ContextUnavailable)?
		.create_element("canvas")
		.map_err(|e| SurfaceError::Create(format!("{e:?}")))?
		.dyn_into::<HtmlCanvasElement>()
		.map_err(|e| SurfaceError::Create(format!("{e:?}")))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, SurfaceError> {
	canvas
		.get_context("2d")
		.map_err(|_| SurfaceError::ContextUnavailable)?
		.ok_or(SurfaceError::ContextUnavailable)?
		.dyn_into::<CanvasRenderingContext2d>()
		.map_err(|_| SurfaceError::ContextUnavailable)
}

pub struct CanvasSurface {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	images: ImageRegistry,
}

impl CanvasSurface {
	pub fn new(canvas: HtmlCanvasElement, images: ImageRegistry) -> Result<Self, SurfaceError> {
		let ctx = context_2d(&canvas)?;
		Ok(Self {
			canvas,
			ctx,
			images,
		})
	}

	/// A detached canvas, for rasterizing content that is never displayed.
	pub fn offscreen(images: ImageRegistry) -> Result<Self, SurfaceError> {
		Self::new(create_canvas()?, images)
	}
}

impl Surface for CanvasSurface {
	fn sync_size(&mut self) -> Size {
		let (cw, ch) = (self.canvas.client_width(), self.canvas.client_height());
		// detached canvases report zero; keep their explicit size
		if cw > 0 && ch > 0 && (cw as u32 != self.canvas.width() || ch as u32 != self.canvas.height()) {
			self.canvas.set_width(cw as u32);
			self.canvas.set_height(ch as u32);
		}
		self.size()
	}

	fn resize(&mut self, size: Size) {
		self.canvas.set_width(size.width.round().max(0.0) as u32);
		self.canvas.set_height(size.height.round().max(0.0) as u32);
	}

	fn size(&self) -> Size {
		Size::new(self.canvas.width() as f64, self.canvas.height() as f64)
	}

	fn clear(&mut self) {
		let Size { width, height } = self.size();
		self.ctx.clear_rect(0.0, 0.0, width, height);
	}

	fn save(&mut self) {
		self.ctx.save();
	}

	fn restore(&mut self) {
		self.ctx.restore();
	}

	fn translate(&mut self, x: f64, y: f64) {
		let _ = self.ctx.translate(x, y);
	}

	fn scale(&mut self, k: f64) {
		let _ = self.ctx.scale(k, k);
	}

	fn set_fill_style(&mut self, style: &str) {
		self.ctx.set_fill_style_str(style);
	}

	fn set_stroke_style(&mut self, style: &str) {
		self.ctx.set_stroke_style_str(style);
	}

	fn set_line_width(&mut self, width: f64) {
		self.ctx.set_line_width(width);
	}

	fn set_font(&mut self, font_px: f64) {
		self.ctx.set_font(&css_font(font_px));
	}

	fn fill_rect(&mut self, rect: Rect) {
		self.ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
	}

	fn stroke_rect(&mut self, rect: Rect) {
		self.ctx.stroke_rect(rect.x, rect.y, rect.width, rect.height);
	}

	fn fill_text(&mut self, text: &str, at: Point) {
		self.ctx.set_text_align("left");
		self.ctx.set_text_baseline("middle");
		let _ = self.ctx.fill_text(text, at.x, at.y);
	}

	fn draw_image(&mut self, image: &RasterImage, rect: Rect) {
		match self.images.get(&image.src) {
			Some(element) => {
				let _ = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
					&element,
					rect.x,
					rect.y,
					rect.width,
					rect.height,
				);
			}
			None => {
				self.ctx.set_fill_style_str(PLACEHOLDER_FILL);
				self.fill_rect(rect);
			}
		}
	}

	fn begin_path(&mut self) {
		self.ctx.begin_path();
	}

	fn move_to(&mut self, p: Point) {
		self.ctx.move_to(p.x, p.y);
	}

	fn line_to(&mut self, p: Point) {
		self.ctx.line_to(p.x, p.y);
	}

	fn close_path(&mut self) {
		self.ctx.close_path();
	}

	fn stroke(&mut self) {
		self.ctx.stroke();
	}

	fn fill(&mut self) {
		self.ctx.fill();
	}

	fn to_data_url(&self) -> Result<String, SurfaceError> {
		self.canvas
			.to_data_url()
			.map_err(|e| SurfaceError::Export(format!("{e:?}")))
	}
}

/// Measures text with a canvas context, falling back to an estimate when
/// measuring fails.
pub struct CanvasMeasure {
	ctx: CanvasRenderingContext2d,
}

impl CanvasMeasure {
	pub fn new() -> Result<Self, SurfaceError> {
		Ok(Self {
			ctx: context_2d(&create_canvas()?)?,
		})
	}
}

impl TextMeasure for CanvasMeasure {
	fn text_width(&self, text: &str, font_px: f64) -> f64 {
		self.ctx.set_font(&css_font(font_px));
		self.ctx
			.measure_text(text)
			.map(|m| m.width())
			.unwrap_or_else(|_| ApproximateMeasure.text_width(text, font_px))
	}
}

/// Detaches the handlers of an image that may still be loading, so a late
/// event never reaches a dropped closure.
struct PendingImage {
	image: HtmlImageElement,
	_onload: Closure<dyn FnMut()>,
	_onerror: Closure<dyn FnMut()>,
}

impl Drop for PendingImage {
	fn drop(&mut self) {
		self.image.set_onload(None);
		self.image.set_onerror(None);
	}
}

struct Timer {
	handle: i32,
	_callback: Closure<dyn FnMut()>,
}

impl Drop for Timer {
	fn drop(&mut self) {
		if let Some(window) = web_sys::window() {
			window.clear_timeout_with_handle(self.handle);
		}
	}
}

/// Loads images through `HtmlImageElement` and registers them for drawing.
pub struct WebImageLoader {
	images: ImageRegistry,
	measure: CanvasMeasure,
	word_cloud_aspect: f64,
}

impl WebImageLoader {
	pub fn new(images: ImageRegistry, word_cloud_aspect: f64) -> Result<Self, SurfaceError> {
		Ok(Self {
			images,
			measure: CanvasMeasure::new()?,
			word_cloud_aspect,
		})
	}
}

impl ImageLoader for WebImageLoader {
	fn load(&self, url: String) -> LocalBoxFuture<'static, Result<RasterImage, PreloadError>> {
		let images = self.images.clone();
		async move {
			let image = HtmlImageElement::new().map_err(|_| PreloadError::Load(short(&url)))?;
			let (tx, rx) = oneshot::channel::<bool>();
			let tx = Rc::new(RefCell::new(Some(tx)));
			let settle = |loaded: bool| {
				let tx = tx.clone();
				Closure::<dyn FnMut()>::new(move || {
					if let Some(tx) = tx.borrow_mut().take() {
						let _ = tx.send(loaded);
					}
				})
			};
			let pending = PendingImage {
				image: image.clone(),
				_onload: settle(true),
				_onerror: settle(false),
			};
			image.set_onload(Some(pending._onload.as_ref().unchecked_ref::<js_sys::Function>()));
			image.set_onerror(Some(pending._onerror.as_ref().unchecked_ref()));
			image.set_src(&url);

			let loaded = rx.await.unwrap_or(false);
			drop(pending);
			if !loaded {
				return Err(PreloadError::Load(short(&url)));
			}
			let raster = RasterImage::new(
				url.clone(),
				image.natural_width() as f64,
				image.natural_height() as f64,
			);
			images.insert(url, image);
			Ok(raster)
		}
		.boxed_local()
	}

	fn deadline(&self, timeout: Duration) -> LocalBoxFuture<'static, ()> {
		let (tx, rx) = oneshot::channel::<()>();
		let mut tx = Some(tx);
		let callback = Closure::<dyn FnMut()>::new(move || {
			if let Some(tx) = tx.take() {
				let _ = tx.send(());
			}
		});
		let ms = timeout.as_millis().min(i32::MAX as u128) as i32;
		let timer = web_sys::window()
			.and_then(|w| {
				w.set_timeout_with_callback_and_timeout_and_arguments_0(
					callback.as_ref().unchecked_ref::<js_sys::Function>(),
					ms,
				)
				.ok()
			})
			.map(|handle| Timer {
				handle,
				_callback: callback,
			});

		async move {
			match timer {
				Some(_timer) => {
					let _ = rx.await;
				}
				// no timer: never time out rather than fail every load
				None => futures::future::pending::<()>().await,
			}
		}
		.boxed_local()
	}

	fn word_cloud_url(&self, words: &[WeightedWord]) -> Result<String, PreloadError> {
		let mut surface = CanvasSurface::offscreen(self.images.clone())
			.map_err(|e| PreloadError::WordCloud(e.to_string()))?;
		word_cloud::rasterize(words, self.word_cloud_aspect, &mut surface, &self.measure)
	}
}
