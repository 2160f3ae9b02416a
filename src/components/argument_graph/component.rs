use std::cell::RefCell;
use std::rc::{Rc, Weak};

use leptos::prelude::*;
use log::{debug, error, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlAnchorElement, HtmlCanvasElement, MouseEvent, ResizeObserver, WheelEvent};

use super::camera::SurfaceBounds;
use super::canvas::{CanvasMeasure, CanvasSurface, ImageRegistry, WebImageLoader};
use super::error::{GraphError, SurfaceError};
use super::geometry::Point;
use super::interaction::Cursor;
use super::layout::LayoutOptions;
use super::overlay::SecondaryOverlay;
use super::plugin::{GraphPlugin, OverlayContent};
use super::preload::preload;
use super::types::ExplanationGraph;
use crate::config::ViewerConfig;

type CanvasPlugin = GraphPlugin<CanvasSurface>;

/// Shared slot for the plugin of the mounted canvas. Async work holds a
/// [`Weak`] to it so a torn-down view is never touched.
#[derive(Clone, Default)]
struct PluginHandle(Rc<RefCell<Option<CanvasPlugin>>>);

impl PluginHandle {
	fn with_plugin<R>(&self, f: impl FnOnce(&mut CanvasPlugin) -> R) -> Option<R> {
		self.0.borrow_mut().as_mut().map(f)
	}

	/// Installs `plugin`, destroying the one it replaces.
	fn replace(&self, plugin: CanvasPlugin) {
		if let Some(mut old) = self.0.borrow_mut().replace(plugin) {
			old.destroy();
		}
	}

	fn destroy(&self) {
		if let Some(mut plugin) = self.0.borrow_mut().take() {
			plugin.destroy();
		}
	}

	fn downgrade(&self) -> Weak<RefCell<Option<CanvasPlugin>>> {
		Rc::downgrade(&self.0)
	}
}

/// Host-side remote for an [`ArgumentGraphView`]: camera buttons, export,
/// the overlay state, and the reason the last graph was rejected.
#[derive(Clone, Copy)]
pub struct GraphController {
	plugin: StoredValue<PluginHandle, LocalStorage>,
	overlay: RwSignal<Option<OverlayContent>>,
	error: RwSignal<Option<GraphError>>,
}

impl Default for GraphController {
	fn default() -> Self {
		Self::new()
	}
}

impl GraphController {
	pub fn new() -> Self {
		Self {
			plugin: StoredValue::new_local(PluginHandle::default()),
			overlay: RwSignal::new(None),
			error: RwSignal::new(None),
		}
	}

	fn handle(&self) -> Option<PluginHandle> {
		self.plugin.try_with_value(PluginHandle::clone)
	}

	fn with_plugin<R>(&self, f: impl FnOnce(&mut CanvasPlugin) -> R) -> Option<R> {
		self.handle()?.with_plugin(f)
	}

	pub fn reset_camera(&self) {
		self.with_plugin(|p| p.reset_camera());
	}

	pub fn zoom(&self, step: f64) {
		self.with_plugin(|p| p.zoom_step(step));
	}

	pub fn overlay(&self) -> Signal<Option<OverlayContent>> {
		self.overlay.into()
	}

	/// Why the current graph could not be shown, if it could not.
	pub fn error(&self) -> Signal<Option<GraphError>> {
		self.error.into()
	}

	fn report(&self, context: &str, err: GraphError) {
		error!("{context}: {err}");
		self.error.set(Some(err));
	}

	pub fn close_overlay(&self) {
		self.with_plugin(|p| p.close_overlay());
		self.overlay.set(None);
	}

	pub fn export_image(&self) -> Result<String, SurfaceError> {
		self.with_plugin(|p| p.export_image())
			.unwrap_or(Err(SurfaceError::ContextUnavailable))
	}

	/// Exports the current frame and hands it to the browser as a download.
	pub fn download_image(&self, filename: &str) -> Result<(), SurfaceError> {
		let url = self.export_image()?;
		let anchor = web_sys::window()
			.and_then(|w| w.document())
			.ok_or(SurfaceError::ContextUnavailable)?
			.create_element("a")
			.map_err(|e| SurfaceError::Export(format!("{e:?}")))?
			.dyn_into::<HtmlAnchorElement>()
			.map_err(|e| SurfaceError::Export(format!("{e:?}")))?;
		anchor.set_href(&url);
		anchor.set_download(filename);
		anchor.click();
		info!("exported graph as {filename}");
		Ok(())
	}

	fn sync_overlay(&self, plugin: &CanvasPlugin) {
		let next = plugin.overlay().cloned();
		if self.overlay.get_untracked() != next {
			self.overlay.set(next);
		}
	}
}

/// Move and release listeners on the document, attached only while a
/// gesture is in flight so a drag that leaves the canvas is not lost.
struct DocumentListeners {
	on_move: Closure<dyn FnMut(MouseEvent)>,
	on_up: Closure<dyn FnMut(MouseEvent)>,
}

impl DocumentListeners {
	fn attach(&self) {
		let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
			return;
		};
		let _ = doc.add_event_listener_with_callback("mousemove", self.on_move.as_ref().unchecked_ref());
		let _ = doc.add_event_listener_with_callback("mouseup", self.on_up.as_ref().unchecked_ref());
	}

	fn detach(&self) {
		let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
			return;
		};
		let _ = doc.remove_event_listener_with_callback("mousemove", self.on_move.as_ref().unchecked_ref());
		let _ = doc.remove_event_listener_with_callback("mouseup", self.on_up.as_ref().unchecked_ref());
	}
}

fn set_body_cursor(cursor: Cursor) {
	if let Some(body) = web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.body())
	{
		let _ = body.style().set_property("cursor", cursor.css());
	}
}

fn bounds_of(canvas: &HtmlCanvasElement) -> SurfaceBounds {
	let rect = canvas.get_bounding_client_rect();
	SurfaceBounds {
		left: rect.left(),
		top: rect.top(),
		width: rect.width(),
		height: rect.height(),
	}
}

fn client_point(ev: &MouseEvent) -> Point {
	Point::new(ev.client_x() as f64, ev.client_y() as f64)
}

struct Teardown {
	handle: PluginHandle,
	listeners: Rc<RefCell<Option<DocumentListeners>>>,
	observer: Rc<RefCell<Option<(ResizeObserver, Closure<dyn FnMut()>)>>>,
}

impl Teardown {
	fn run(&self) {
		if let Some((observer, _)) = self.observer.borrow_mut().take() {
			observer.disconnect();
		}
		if let Some(listeners) = self.listeners.borrow_mut().take() {
			listeners.detach();
		}
		self.handle.destroy();
		set_body_cursor(Cursor::Default);
		debug!("argument graph view torn down");
	}
}

/// Canvas viewer for one explanation graph. A new plugin is mounted each
/// time `graph` delivers a value; images are preloaded before anything is
/// drawn.
#[component]
pub fn ArgumentGraphView(
	#[prop(into)] model: String,
	#[prop(into)] explanation: String,
	#[prop(into)] graph: Signal<Option<ExplanationGraph>>,
	#[prop(into)] options: Signal<LayoutOptions>,
	#[prop(into, default = Signal::stored(false))] highlight: Signal<bool>,
	controller: GraphController,
) -> impl IntoView {
	let config = use_context::<ViewerConfig>().unwrap_or_default();
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let images = ImageRegistry::default();
	let Some(handle) = controller.handle() else {
		error!("graph controller disposed before its view mounted");
		return view! { <div class="argument-graph" /> }.into_any();
	};
	let listeners: Rc<RefCell<Option<DocumentListeners>>> = Rc::new(RefCell::new(None));
	let observer: Rc<RefCell<Option<(ResizeObserver, Closure<dyn FnMut()>)>>> =
		Rc::new(RefCell::new(None));

	// mount a plugin per delivered graph
	let handle_mount = handle.clone();
	Effect::new(move |_| {
		let delivered = graph.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(delivered) = delivered else {
			handle_mount.destroy();
			controller.error.set(None);
			return;
		};

		let config = ViewerConfig {
			layout: options.get_untracked(),
			..config.clone()
		};
		let built = CanvasSurface::new(canvas, images.clone()).and_then(|surface| {
			let measure = CanvasMeasure::new()?;
			let loader = WebImageLoader::new(images.clone(), config.word_cloud_aspect)?;
			Ok((surface, measure, loader))
		});
		let (surface, measure, loader) = match built {
			Ok(parts) => parts,
			Err(err) => {
				error!("cannot mount graph view: {err}");
				return;
			}
		};

		let mut plugin = GraphPlugin::new(
			model.clone(),
			explanation.clone(),
			surface,
			&config,
			Box::new(measure),
		);
		plugin.set_highlight_enabled(highlight.get_untracked());
		let scene = match plugin.ingest(&delivered) {
			Ok(scene) => scene,
			Err(err) => {
				plugin.clear();
				handle_mount.destroy();
				controller.report("rejected explanation graph", err);
				return;
			}
		};
		let instance = plugin.instance();
		handle_mount.replace(plugin);
		controller.overlay.set(None);
		controller.error.set(None);

		let slot = handle_mount.downgrade();
		let timeout = config.preload_timeout();
		spawn_local(async move {
			let resolved = preload(scene, &loader, timeout).await;
			let Some(slot) = slot.upgrade() else {
				return;
			};
			let mut slot = slot.borrow_mut();
			match slot.as_mut() {
				Some(plugin) if plugin.instance() == instance => match plugin.install(resolved) {
					Ok(true) => info!("graph {} ready", plugin.explanation_id()),
					Ok(false) => {}
					Err(err) => controller.report("layout failed", err),
				},
				_ => debug!("discarding preload for replaced plugin #{instance}"),
			}
		});
	});

	let handle_options = handle.clone();
	Effect::new(move |_| {
		let options = options.get();
		handle_options.with_plugin(|p| {
			if let Err(err) = p.set_options(options) {
				controller.report("layout failed", err);
			}
		});
	});

	let handle_highlight = handle.clone();
	Effect::new(move |_| {
		let enabled = highlight.get();
		handle_highlight.with_plugin(|p| p.set_highlight_enabled(enabled));
	});

	// keep the canvas in sync with its container
	let (handle_resize, observer_init) = (handle.clone(), observer.clone());
	Effect::new(move |_| {
		let Some(container) = container_ref.get() else {
			return;
		};
		if observer_init.borrow().is_some() {
			return;
		}
		let handle = handle_resize.clone();
		let callback = Closure::<dyn FnMut()>::new(move || {
			handle.with_plugin(|p| p.resize());
		});
		match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
			Ok(resize) => {
				resize.observe(&container);
				*observer_init.borrow_mut() = Some((resize, callback));
			}
			Err(err) => error!("ResizeObserver unavailable: {err:?}"),
		}
	});

	let (handle_doc, listeners_doc) = (handle.clone(), Rc::downgrade(&listeners));
	let handle_up = handle.clone();
	*listeners.borrow_mut() = Some(DocumentListeners {
		on_move: Closure::new(move |ev: MouseEvent| {
			handle_doc.with_plugin(|p| {
				if p.pointer_move(client_point(&ev)).is_some() {
					set_body_cursor(p.cursor());
				}
			});
		}),
		on_up: Closure::new(move |_: MouseEvent| {
			handle_up.with_plugin(|p| {
				p.pointer_up();
				set_body_cursor(p.cursor());
				controller.sync_overlay(p);
			});
			if let Some(listeners) = listeners_doc.upgrade() {
				if let Some(listeners) = listeners.borrow().as_ref() {
					listeners.detach();
				}
			}
		}),
	});

	let (handle_down, listeners_down) = (handle.clone(), listeners.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let bounds = bounds_of(&canvas);
		let tracking = handle_down
			.with_plugin(|p| p.pointer_down(client_point(&ev), bounds))
			.unwrap_or(false);
		if tracking {
			if let Some(listeners) = listeners_down.borrow().as_ref() {
				listeners.attach();
			}
		}
	};

	let handle_wheel = handle.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		handle_wheel.with_plugin(|p| p.wheel(ev.delta_y()));
	};

	let teardown = StoredValue::new_local(Teardown {
		handle,
		listeners,
		observer,
	});
	on_cleanup(move || {
		teardown.try_with_value(Teardown::run);
	});

	view! {
		<div
			node_ref=container_ref
			class="argument-graph"
			style="position: relative; width: 100%; height: 100%; overflow: hidden;"
		>
			<canvas
				node_ref=canvas_ref
				class="argument-graph-canvas"
				on:mousedown=on_mousedown
				on:wheel=on_wheel
				style="display: block; width: 100%; height: 100%;"
			/>
			{move || {
				controller
					.overlay
					.get()
					.map(|content| {
						view! {
							<SecondaryOverlay content=content controller=controller />
						}
					})
			}}
		</div>
	}
	.into_any()
}
