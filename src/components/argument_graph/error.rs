use thiserror::Error;

use super::types::{ContentType, NodeId};

/// Structural problems with a graph. These abort a layout pass before
/// anything is drawn and are reported to the host.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
	#[error("edge {from} -> {to} references unknown node {missing}")]
	UnknownNode {
		from: NodeId,
		to: NodeId,
		missing: NodeId,
	},
	#[error("node {0} has kind `none` and cannot be laid out")]
	InvalidNodeKind(NodeId),
	#[error("payload of node {id} does not match content type {content_type:?}")]
	InvalidPayload {
		id: NodeId,
		content_type: ContentType,
	},
	#[error("layout engine failed: {0}")]
	Layout(String),
}

/// Per-image failures. The preloader swallows these and substitutes a
/// placeholder, so they only ever reach the log.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreloadError {
	#[error("failed to load image {0}")]
	Load(String),
	#[error("timed out loading image {0}")]
	Timeout(String),
	#[error("failed to rasterize word cloud: {0}")]
	WordCloud(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
	#[error("canvas 2d context unavailable")]
	ContextUnavailable,
	#[error("failed to create canvas element: {0}")]
	Create(String),
	#[error("canvas export failed: {0}")]
	Export(String),
}
