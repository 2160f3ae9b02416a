use leptos::prelude::*;
use web_sys::MouseEvent;

use super::component::GraphController;
use super::plugin::OverlayContent;

const ARROW_COLOR: &str = "#00ea00";

/// Filter view, an arrow, then the feature view with its strength. Clicking
/// the backdrop closes it; clicks on the images do not.
#[component]
pub fn SecondaryOverlay(content: OverlayContent, controller: GraphController) -> impl IntoView {
	let label = content.strength_label();
	let stop = |ev: MouseEvent| ev.stop_propagation();

	view! {
		<div
			class="argument-graph-overlay"
			style="position: absolute; inset: 0; background-color: rgba(0, 0, 0, 0.5); display: flex;"
			on:click=move |_| controller.close_overlay()
		>
			<div style="flex: 5; padding: 16px; display: flex; align-items: center; justify-content: center;">
				<img src=content.secondary.src style="max-width: 100%;" on:click=stop />
			</div>
			<div style="flex: 1; display: flex; align-items: center; justify-content: center;">
				<svg viewBox="0 0 200 100" height="100" fill=ARROW_COLOR>
					<polygon points="150 25, 200 50, 150 75" />
					<line x1="0" y1="50" x2="150" y2="50" stroke=ARROW_COLOR stroke-width="8" />
				</svg>
			</div>
			<div style="flex: 5; padding: 16px; display: flex; flex-direction: column; align-items: center; justify-content: center;">
				<img
					src=content.primary.src
					style="max-width: 100%; border: 1px solid black;"
					on:click=stop
				/>
				<p
					style="font-family: sans-serif; background-color: white; padding: 8px; border-radius: 4px;"
					on:click=stop
				>
					{label}
				</p>
			</div>
		</div>
	}
}
