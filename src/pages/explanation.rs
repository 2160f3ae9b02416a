use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos_router::hooks::use_params_map;
use log::{error, info};
use wasm_bindgen_futures::spawn_local;

use crate::api::{ApiClient, PruneRequest};
use crate::components::argument_graph::{ArgumentGraphView, ExplanationGraph, GraphController};
use crate::components::options_panel::OptionsPanel;
use crate::config::ViewerConfig;

type Route = (String, String);

/// Fetches issued by the page. Only the newest may publish its result.
#[derive(Debug, Default)]
struct Requests {
	generation: u64,
	route: Option<Route>,
}

impl Requests {
	/// Starts a fetch for `route`, returning its generation and whether the
	/// route differs from the previous fetch.
	fn begin(&mut self, route: &Route) -> (u64, bool) {
		self.generation += 1;
		let moved = self.route.as_ref() != Some(route);
		if moved {
			self.route = Some(route.clone());
		}
		(self.generation, moved)
	}

	fn is_current(&self, generation: u64) -> bool {
		self.generation == generation
	}
}

/// Viewer for `/models/:model/explanations/:explanation`. The graph is
/// refetched whenever the pruning settings are applied.
#[component]
pub fn ExplanationPage() -> impl IntoView {
	let config = use_context::<ViewerConfig>().unwrap_or_default();
	let params = use_params_map();
	let ids = Memo::new(move |_| {
		let params = params.read();
		(
			params.get("model").unwrap_or_default(),
			params.get("explanation").unwrap_or_default(),
		)
	});

	let prune = RwSignal::new(PruneRequest::default());
	let graph = RwSignal::new(None::<ExplanationGraph>);
	let total_nodes = RwSignal::new(0usize);
	let failure = RwSignal::new(None::<String>);
	let options = RwSignal::new(config.layout);
	let highlight = RwSignal::new(false);
	let controller = GraphController::new();

	let client = ApiClient::new(&config.api_base);
	let requests = Rc::new(RefCell::new(Requests::default()));
	Effect::new(move |_| {
		let request = prune.get();
		let route = ids.get();
		let (current, moved) = requests.borrow_mut().begin(&route);
		if moved {
			// never show the previous explanation under the new ids
			graph.set(None);
			total_nodes.set(0);
			failure.set(None);
		}
		let (client, requests) = (client.clone(), requests.clone());
		let (model, explanation) = route;
		spawn_local(async move {
			let result = client.fetch_explanation(&model, &explanation, request).await;
			if !requests.borrow().is_current(current) {
				return;
			}
			match result {
				Ok(fetched) => {
					info!("fetched {model}/{explanation}: {} nodes", fetched.nodes.len());
					total_nodes.set(fetched.total_nodes.unwrap_or(fetched.nodes.len()));
					failure.set(None);
					graph.set(Some(fetched));
				}
				Err(err) => {
					error!("failed to fetch {model}/{explanation}: {err}");
					failure.set(Some(err.to_string()));
				}
			}
		});
	});

	view! {
		<div class="viewer-layout">
			<OptionsPanel
				options=options
				highlight=highlight
				controller=controller
				prune=prune
				total_nodes=total_nodes
			/>
			<div class="viewer-graph">
				{move || {
					let (model, explanation) = ids.get();
					view! {
						<ArgumentGraphView
							model=model
							explanation=explanation
							graph=graph
							options=options
							highlight=highlight
							controller=controller
						/>
					}
				}}
			</div>
			<Show when=move || failure.get().is_some()>
				<p class="error">"Could not load explanation: "{move || failure.get().unwrap_or_default()}</p>
			</Show>
			<Show when=move || controller.error().get().is_some()>
				<p class="error">
					"Could not display explanation: "
					{move || controller.error().get().map(|err| err.to_string()).unwrap_or_default()}
				</p>
			</Show>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn route(model: &str, explanation: &str) -> Route {
		(model.into(), explanation.into())
	}

	#[test]
	fn only_the_newest_fetch_is_current() {
		let mut requests = Requests::default();
		let (first, _) = requests.begin(&route("resnet", "e1"));
		let (second, _) = requests.begin(&route("resnet", "e1"));
		assert!(!requests.is_current(first));
		assert!(requests.is_current(second));
	}

	#[test]
	fn route_change_is_detected_once() {
		let mut requests = Requests::default();
		assert!(requests.begin(&route("resnet", "e1")).1);
		// new pruning, same explanation
		assert!(!requests.begin(&route("resnet", "e1")).1);
		assert!(requests.begin(&route("resnet", "e2")).1);
		assert!(!requests.begin(&route("resnet", "e2")).1);
	}
}
