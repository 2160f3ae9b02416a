//! Wire types exchanged with the explanation service, and the tagged forms
//! they are resolved into once on ingestion.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, de};

use super::word_cloud::WeightedWord;

/// Stable node key. Accepted on the wire as either a string or an integer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for NodeId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl<'de> Deserialize<'de> for NodeId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		struct IdVisitor;

		impl de::Visitor<'_> for IdVisitor {
			type Value = NodeId;

			fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str("a node id string or integer")
			}

			fn visit_str<E: de::Error>(self, v: &str) -> Result<NodeId, E> {
				Ok(NodeId::new(v))
			}

			fn visit_u64<E: de::Error>(self, v: u64) -> Result<NodeId, E> {
				Ok(NodeId(v.to_string()))
			}

			fn visit_i64<E: de::Error>(self, v: i64) -> Result<NodeId, E> {
				Ok(NodeId(v.to_string()))
			}
		}

		deserializer.deserialize_any(IdVisitor)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
	Regular,
	Conclusion,
	Input,
	None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
	#[serde(rename = "string")]
	Text,
	#[serde(rename = "image")]
	Image,
	#[serde(rename = "wdcloud")]
	WordCloud,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionType {
	Support,
	Attack,
	Indirect,
	#[default]
	#[serde(other)]
	Other,
}

impl ContributionType {
	/// Stroke color of edges carrying this contribution.
	pub fn color(self) -> &'static str {
		match self {
			ContributionType::Support => "green",
			ContributionType::Attack => "red",
			ContributionType::Indirect => "#bbbbbb",
			ContributionType::Other => "black",
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChildLink {
	#[serde(default)]
	pub contribution_type: ContributionType,
}

/// A single content payload: a resource key / display text, or a word list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawContent {
	Text(String),
	Words(Vec<WeightedWord>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayloadPart {
	pub payload: RawContent,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPayload {
	/// Feature view plus a filter/context view of the same argument.
	Dual {
		feature: PayloadPart,
		filter: PayloadPart,
	},
	Content(RawContent),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
	pub node_type: NodeKind,
	pub content_type: ContentType,
	#[serde(default)]
	pub children: IndexMap<NodeId, ChildLink>,
	pub payload: RawPayload,
	#[serde(default)]
	pub strength: f64,
	#[serde(default)]
	pub certainty: Option<f64>,
}

/// The graph description delivered by the explanation service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExplanationGraph {
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub input: Vec<NodeId>,
	#[serde(default)]
	pub conclusion: Vec<NodeId>,
	pub nodes: IndexMap<NodeId, NodeRecord>,
	#[serde(default)]
	pub total_nodes: Option<usize>,
}

/// Where an image comes from before it has been resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageSource {
	/// Content-addressed resource key served by the host.
	Resource(String),
	WordCloud(Vec<WeightedWord>),
}

/// A ready-to-draw raster. `src` is the key the drawing surface looks the
/// decoded image up by; an empty `src` marks the placeholder.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
	pub src: String,
	pub width: f64,
	pub height: f64,
}

impl RasterImage {
	pub fn new(src: impl Into<String>, width: f64, height: f64) -> Self {
		Self {
			src: src.into(),
			width,
			height,
		}
	}

	/// Stand-in for images that failed to load.
	pub fn placeholder() -> Self {
		Self::new(String::new(), 4.0, 3.0)
	}

	pub fn is_placeholder(&self) -> bool {
		self.src.is_empty()
	}

	/// Width over height, 1 for degenerate images.
	pub fn aspect_ratio(&self) -> f64 {
		if self.height > 0.0 && self.width > 0.0 {
			self.width / self.height
		} else {
			1.0
		}
	}
}

/// Node content, tagged once on ingestion. `I` is [`ImageSource`] before
/// preloading and [`RasterImage`] after.
#[derive(Clone, Debug, PartialEq)]
pub enum NodePayload<I> {
	Text(String),
	Single(I),
	Dual { primary: I, secondary: I },
}

impl<I> NodePayload<I> {
	/// Images in resolution order: primary before secondary.
	pub fn images(&self) -> impl Iterator<Item = &I> {
		let (first, second) = match self {
			NodePayload::Text(_) => (None, None),
			NodePayload::Single(image) => (Some(image), None),
			NodePayload::Dual { primary, secondary } => (Some(primary), Some(secondary)),
		};
		first.into_iter().chain(second)
	}

	/// Replaces every image, visiting them in the same order as [`Self::images`].
	pub fn map<J>(self, mut f: impl FnMut(I) -> J) -> NodePayload<J> {
		match self {
			NodePayload::Text(text) => NodePayload::Text(text),
			NodePayload::Single(image) => NodePayload::Single(f(image)),
			NodePayload::Dual { primary, secondary } => {
				let primary = f(primary);
				NodePayload::Dual {
					primary,
					secondary: f(secondary),
				}
			}
		}
	}

	pub fn text(&self) -> Option<&str> {
		match self {
			NodePayload::Text(text) => Some(text),
			_ => None,
		}
	}

	pub fn primary(&self) -> Option<&I> {
		match self {
			NodePayload::Text(_) => None,
			NodePayload::Single(image) | NodePayload::Dual { primary: image, .. } => Some(image),
		}
	}

	pub fn secondary(&self) -> Option<&I> {
		match self {
			NodePayload::Dual { secondary, .. } => Some(secondary),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_all_payload_shapes() {
		let graph: ExplanationGraph = serde_json::from_value(serde_json::json!({
			"name": "demo",
			"input": [0],
			"conclusion": ["2"],
			"nodes": {
				"0": {
					"node_type": "input",
					"content_type": "image",
					"children": { "1": { "contribution_type": "support" } },
					"payload": "abc123",
					"strength": 1.0
				},
				"1": {
					"node_type": "regular",
					"content_type": "wdcloud",
					"children": { "2": { "contribution_type": "neutral" } },
					"payload": {
						"feature": { "payload": "feat" },
						"filter": { "payload": [["good", 0.5], ["bad", -1.0]] }
					},
					"strength": 0.4
				},
				"2": {
					"node_type": "conclusion",
					"content_type": "string",
					"payload": "cat",
					"strength": 0,
					"certainty": 93.5
				}
			}
		}))
		.unwrap();

		assert_eq!(graph.input, vec![NodeId::from("0")]);
		let ids: Vec<_> = graph.nodes.keys().map(NodeId::as_str).collect();
		assert_eq!(ids, ["0", "1", "2"]);
		assert_eq!(
			graph.nodes[&NodeId::from("0")].payload,
			RawPayload::Content(RawContent::Text("abc123".into()))
		);
		let RawPayload::Dual { filter, .. } = &graph.nodes[&NodeId::from("1")].payload else {
			panic!("expected dual payload");
		};
		assert_eq!(
			filter.payload,
			RawContent::Words(vec![
				WeightedWord::new("good", 0.5),
				WeightedWord::new("bad", -1.0)
			])
		);
		let link = &graph.nodes[&NodeId::from("1")].children[&NodeId::from("2")];
		assert_eq!(link.contribution_type, ContributionType::Other);
		assert_eq!(graph.nodes[&NodeId::from("2")].certainty, Some(93.5));
	}

	#[test]
	fn payload_map_preserves_order() {
		let payload = NodePayload::Dual {
			primary: "a",
			secondary: "b",
		};
		let mut seen = Vec::new();
		let mapped = payload.map(|s| {
			seen.push(s);
			s.len()
		});
		assert_eq!(seen, ["a", "b"]);
		assert_eq!(mapped.primary(), Some(&1));
	}
}
