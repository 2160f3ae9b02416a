use indexmap::IndexMap;
use leptos::prelude::*;

use crate::components::argument_graph::{
	ArgumentGraphView, ChildLink, ContentType, ContributionType, ExplanationGraph, GraphController,
	NodeId, NodeKind, NodeRecord, RawContent, RawPayload,
};
use crate::components::options_panel::OptionsPanel;
use crate::config::ViewerConfig;

const CLAIMS: &[&str] = &[
	"striped coat",
	"four legs",
	"hooves",
	"savanna background",
	"mane",
	"black and white",
	"herd nearby",
	"long neck",
	"no spots",
	"tail tuft",
];

/// Generate a text-only explanation tree so the viewer can be tried
/// without a backend.
fn generate_demo_explanation(n: usize) -> ExplanationGraph {
	let n = n.clamp(1, CLAIMS.len());
	let conclusion = NodeId::new("conclusion");
	let mut children: Vec<IndexMap<NodeId, ChildLink>> = vec![IndexMap::new(); n + 1];

	// argument i hangs off an earlier node; node 0 is the input
	for i in 1..=n {
		let parent = (rand_simple(i) * (i as f64)) as usize;
		children[parent].insert(NodeId::new(i.to_string()), link(i));
	}
	for (i, links) in children.iter_mut().enumerate().skip(1) {
		if links.is_empty() {
			links.insert(conclusion.clone(), link(i + n));
		}
	}

	let mut nodes = IndexMap::new();
	for (i, links) in children.into_iter().enumerate() {
		let (node_type, text) = if i == 0 {
			(NodeKind::Input, "a photo of an animal".to_owned())
		} else {
			(NodeKind::Regular, CLAIMS[i - 1].to_owned())
		};
		nodes.insert(
			NodeId::new(i.to_string()),
			NodeRecord {
				node_type,
				content_type: ContentType::Text,
				children: links,
				payload: RawPayload::Content(RawContent::Text(text)),
				strength: if i == 0 { 1.0 } else { 0.1 + rand_simple(i * 31) },
				certainty: None,
			},
		);
	}
	nodes.insert(
		conclusion.clone(),
		NodeRecord {
			node_type: NodeKind::Conclusion,
			content_type: ContentType::Text,
			children: IndexMap::new(),
			payload: RawPayload::Content(RawContent::Text("zebra".into())),
			strength: 0.0,
			certainty: Some(100.0 * (0.5 + rand_simple(n) / 2.0)),
		},
	);

	ExplanationGraph {
		name: "demo".into(),
		input: vec![NodeId::new("0")],
		conclusion: vec![conclusion],
		total_nodes: Some(nodes.len()),
		nodes,
	}
}

fn link(seed: usize) -> ChildLink {
	let contribution_type = match (rand_simple(seed * 7) * 3.0) as usize {
		0 => ContributionType::Support,
		1 => ContributionType::Attack,
		_ => ContributionType::Indirect,
	};
	ChildLink { contribution_type }
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let config = use_context::<ViewerConfig>().unwrap_or_default();
	let explanation = Signal::derive(move || Some(generate_demo_explanation(CLAIMS.len())));
	let options = RwSignal::new(config.layout);
	let highlight = RwSignal::new(false);
	let controller = GraphController::new();

	view! {
		<div class="viewer-layout">
			<OptionsPanel options=options highlight=highlight controller=controller />
			<div class="viewer-graph">
				<ArgumentGraphView
					model="demo"
					explanation="demo"
					graph=explanation
					options=options
					highlight=highlight
					controller=controller
				/>
			</div>
			<div class="graph-overlay">
				<h1>"Argumentation Graph"</h1>
				<p class="subtitle">
					"Drag to pan. Scroll to zoom. Click an argument to focus it."
				</p>
			</div>
		</div>
	}
}
