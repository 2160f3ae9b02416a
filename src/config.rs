//! Viewer configuration, provided to the component tree through context.

use std::time::Duration;

use log::warn;
use serde::Deserialize;

use crate::components::argument_graph::{DEFAULT_ASPECT_RATIO, FIT_MARGIN, LayoutOptions};

/// Attribute on `<body>` holding a JSON override of [`ViewerConfig`].
pub const CONFIG_ATTRIBUTE: &str = "data-viewer-config";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
	/// Prefix for service requests; empty for same-origin.
	pub api_base: String,
	pub preload_timeout_ms: u64,
	pub word_cloud_aspect: f64,
	pub fit_margin: f64,
	pub layout: LayoutOptions,
}

impl Default for ViewerConfig {
	fn default() -> Self {
		Self {
			api_base: String::new(),
			preload_timeout_ms: 10_000,
			word_cloud_aspect: DEFAULT_ASPECT_RATIO,
			fit_margin: FIT_MARGIN,
			layout: LayoutOptions::default(),
		}
	}
}

impl ViewerConfig {
	pub fn preload_timeout(&self) -> Duration {
		Duration::from_millis(self.preload_timeout_ms)
	}

	/// Parses a JSON override; missing fields keep their defaults.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}

	/// Reads the override from the document body, falling back to defaults.
	pub fn from_document() -> Self {
		let raw = web_sys::window()
			.and_then(|w| w.document())
			.and_then(|d| d.body())
			.and_then(|body| body.get_attribute(CONFIG_ATTRIBUTE));
		match raw {
			Some(json) => Self::from_json(&json).unwrap_or_else(|err| {
				warn!("ignoring invalid {CONFIG_ATTRIBUTE}: {err}");
				Self::default()
			}),
			None => Self::default(),
		}
	}
}
