use std::collections::HashSet;

use log::debug;

use super::error::GraphError;
use super::types::{
	ContentType, ContributionType, ExplanationGraph, ImageSource, NodeId, NodeKind, NodePayload,
	NodeRecord, RawContent, RawPayload,
};

/// A node as delivered by the host, with its payload tagged.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSpec<I> {
	pub id: NodeId,
	pub kind: NodeKind,
	pub content_type: ContentType,
	pub payload: NodePayload<I>,
	pub strength: f64,
	pub certainty: Option<f64>,
}

impl<I> NodeSpec<I> {
	/// Swaps every image of the payload, keeping everything else.
	pub fn map_images<J>(self, f: impl FnMut(I) -> J) -> NodeSpec<J> {
		NodeSpec {
			payload: self.payload.map(f),
			id: self.id,
			kind: self.kind,
			content_type: self.content_type,
			strength: self.strength,
			certainty: self.certainty,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSpec {
	pub source: NodeId,
	pub target: NodeId,
	pub contribution: ContributionType,
}

/// Validated graph description, ready for preloading (`I = ImageSource`)
/// or for building a [`Graph`](super::graph::Graph) (`I = RasterImage`).
#[derive(Clone, Debug, PartialEq)]
pub struct Scene<I> {
	pub nodes: Vec<NodeSpec<I>>,
	pub edges: Vec<EdgeSpec>,
}

impl Scene<ImageSource> {
	/// Checks the structure of an explanation and tags every payload.
	pub fn from_explanation(graph: &ExplanationGraph) -> Result<Self, GraphError> {
		let ids: HashSet<&NodeId> = graph.nodes.keys().collect();
		let mut nodes = Vec::with_capacity(graph.nodes.len());
		let mut edges = Vec::new();

		for (id, record) in &graph.nodes {
			nodes.push(tag_node(id, record)?);
			for (child, link) in &record.children {
				if !ids.contains(child) {
					return Err(GraphError::UnknownNode {
						from: id.clone(),
						to: child.clone(),
						missing: child.clone(),
					});
				}
				edges.push(EdgeSpec {
					source: id.clone(),
					target: child.clone(),
					contribution: link.contribution_type,
				});
			}
		}

		debug!(
			"ingested explanation {:?}: {} nodes, {} edges",
			graph.name,
			nodes.len(),
			edges.len()
		);
		Ok(Self { nodes, edges })
	}
}

fn tag_node(id: &NodeId, record: &NodeRecord) -> Result<NodeSpec<ImageSource>, GraphError> {
	let invalid = || GraphError::InvalidPayload {
		id: id.clone(),
		content_type: record.content_type,
	};

	let payload = match (record.node_type, record.content_type, &record.payload) {
		(NodeKind::None, ..) => return Err(GraphError::InvalidNodeKind(id.clone())),
		(NodeKind::Conclusion, _, RawPayload::Content(RawContent::Text(text))) => {
			NodePayload::Text(match record.certainty {
				Some(certainty) => format!("{text} ({certainty:.2}%)"),
				None => text.clone(),
			})
		}
		(NodeKind::Conclusion, ..) => return Err(invalid()),
		(_, ContentType::Text, RawPayload::Content(RawContent::Text(text))) => {
			NodePayload::Text(text.clone())
		}
		(_, ContentType::Text, _) => return Err(invalid()),
		(_, content_type, RawPayload::Content(content)) => {
			NodePayload::Single(image_source(content, content_type).ok_or_else(invalid)?)
		}
		(NodeKind::Regular, content_type, RawPayload::Dual { feature, filter }) => {
			let RawContent::Text(feature) = &feature.payload else {
				return Err(invalid());
			};
			NodePayload::Dual {
				primary: ImageSource::Resource(feature.clone()),
				secondary: image_source(&filter.payload, content_type).ok_or_else(invalid)?,
			}
		}
		(_, _, RawPayload::Dual { .. }) => return Err(invalid()),
	};

	Ok(NodeSpec {
		id: id.clone(),
		kind: record.node_type,
		content_type: record.content_type,
		payload,
		strength: record.strength,
		certainty: record.certainty,
	})
}

fn image_source(content: &RawContent, content_type: ContentType) -> Option<ImageSource> {
	match (content, content_type) {
		(RawContent::Text(key), ContentType::Image) => Some(ImageSource::Resource(key.clone())),
		(RawContent::Words(words), ContentType::WordCloud) => {
			Some(ImageSource::WordCloud(words.clone()))
		}
		_ => None,
	}
}
