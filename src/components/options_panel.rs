use leptos::prelude::*;
use log::{debug, error};

use crate::api::PruneRequest;
use crate::components::argument_graph::{GraphController, LayoutOptions, StrengthScaling, ZOOM_STEP};

/// Labelled range input bound to one numeric field.
#[component]
fn Slider(
	label: &'static str,
	min: f64,
	max: f64,
	#[prop(into)] value: Signal<f64>,
	on_change: impl Fn(f64) + 'static,
) -> impl IntoView {
	view! {
		<label class="slider">
			<span>{label}": "{move || value.get().round()}</span>
			<input
				type="range"
				min=min.to_string()
				max=max.to_string()
				prop:value=move || value.get().to_string()
				on:input=move |ev| {
					if let Ok(v) = event_target_value(&ev).parse::<f64>() {
						on_change(v);
					}
				}
			/>
		</label>
	}
}

/// Upper bound of the pruning sliders: the graph's node count, or the
/// default limit until a graph has been fetched.
fn pruning_max(total_nodes: usize) -> u32 {
	match total_nodes {
		0 => PruneRequest::default().limit,
		n => u32::try_from(n).unwrap_or(u32::MAX),
	}
}

/// Layout, pruning, and camera controls for a graph view. Pruning controls
/// are shown only when `prune` is given.
#[component]
pub fn OptionsPanel(
	options: RwSignal<LayoutOptions>,
	highlight: RwSignal<bool>,
	controller: GraphController,
	#[prop(optional)] prune: Option<RwSignal<PruneRequest>>,
	#[prop(into, default = Signal::stored(0))] total_nodes: Signal<usize>,
) -> impl IntoView {
	let field = move |get: fn(&LayoutOptions) -> f64| Signal::derive(move || get(&options.get()));

	let pruning = prune.map(|prune| {
		let draft = RwSignal::new(prune.get_untracked());
		let limit_max = Signal::derive(move || pruning_max(total_nodes.get()));
		view! {
			<fieldset>
				<legend>"Pruning"</legend>
				<label class="slider">
					<span>"Node limit: "{move || draft.get().limit}</span>
					<input
						type="range"
						min="0"
						max=move || limit_max.get().to_string()
						prop:value=move || draft.get().limit.to_string()
						on:input=move |ev| {
							if let Ok(v) = event_target_value(&ev).parse::<u32>() {
								draft.update(|d| d.limit = v);
							}
						}
					/>
				</label>
				<label class="slider">
					<span>"Layer limit: "{move || draft.get().layer_limit}</span>
					<input
						type="range"
						min="0"
						max=move || limit_max.get().to_string()
						prop:value=move || draft.get().layer_limit.to_string()
						on:input=move |ev| {
							if let Ok(v) = event_target_value(&ev).parse::<u32>() {
								draft.update(|d| d.layer_limit = v);
							}
						}
					/>
				</label>
				<button on:click=move |_| {
					let next = draft.get_untracked();
					if prune.get_untracked() != next {
						prune.set(next);
					} else {
						debug!("pruning unchanged; not refetching");
					}
				}>"Apply"</button>
			</fieldset>
		}
	});

	view! {
		<aside class="options-panel">
			<fieldset>
				<legend>"Layout"</legend>
				<Slider
					label="Horizontal spacing"
					min=30.0
					max=200.0
					value=field(|o| o.node_separation)
					on_change=move |v| options.update(|o| o.node_separation = v)
				/>
				<Slider
					label="Vertical spacing"
					min=30.0
					max=200.0
					value=field(|o| o.rank_separation)
					on_change=move |v| options.update(|o| o.rank_separation = v)
				/>
				<Slider
					label="Input size"
					min=50.0
					max=500.0
					value=field(|o| o.input_size)
					on_change=move |v| options.update(|o| o.input_size = v)
				/>
				<Slider
					label="Argument size"
					min=50.0
					max=500.0
					value=field(|o| o.argument_size)
					on_change=move |v| options.update(|o| o.argument_size = v)
				/>
				<label>
					"Scaling "
					<select on:change=move |ev| {
						let scaling = match event_target_value(&ev).as_str() {
							"logarithmic" => StrengthScaling::Logarithmic,
							_ => StrengthScaling::Linear,
						};
						options.update(|o| o.scaling = scaling);
					}>
						<option value="linear" selected=move || options.get().scaling == StrengthScaling::Linear>
							"Linear"
						</option>
						<option
							value="logarithmic"
							selected=move || options.get().scaling == StrengthScaling::Logarithmic
						>
							"Logarithmic"
						</option>
					</select>
				</label>
				<label>
					<input
						type="checkbox"
						prop:checked=move || highlight.get()
						on:change=move |ev| highlight.set(event_target_checked(&ev))
					/>
					" Highlight on click"
				</label>
			</fieldset>
			{pruning}
			<fieldset>
				<legend>"Camera"</legend>
				<button on:click=move |_| controller.reset_camera()>"Reset Camera"</button>
				<button on:click=move |_| controller.zoom(ZOOM_STEP)>"Zoom In"</button>
				<button on:click=move |_| controller.zoom(-ZOOM_STEP)>"Zoom Out"</button>
				<button on:click=move |_| {
					if let Err(err) = controller.download_image("graph.png") {
						error!("export failed: {err}");
					}
				}>"Export as Image"</button>
			</fieldset>
		</aside>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pruning_sliders_fit_the_default_draft_before_a_fetch() {
		let max = pruning_max(0);
		let draft = PruneRequest::default();
		assert_eq!(max, 20);
		assert!(draft.limit <= max && draft.layer_limit <= max);
		assert_eq!(pruning_max(137), 137);
	}
}
