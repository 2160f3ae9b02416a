//! Canvas viewer for argumentation graphs: an explanation service delivers
//! a graph of arguments, which is laid out in layers and drawn on a pannable,
//! zoomable canvas.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

// Modules
pub mod api;
pub mod components;
pub mod config;
mod pages;

// Top-Level pages
use crate::pages::explanation::ExplanationPage;
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

pub use crate::components::argument_graph::{ArgumentGraphView, ExplanationGraph, GraphController};
pub use crate::config::ViewerConfig;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// An app router which renders the demo graph, explanation pages, and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();
	provide_context(ViewerConfig::from_document());

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		// sets the document title
		<Title text="Argumentation Graph Viewer" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
				<Route path=path!("/models/:model/explanations/:explanation") view=ExplanationPage />
			</Routes>
		</Router>
	}
}
