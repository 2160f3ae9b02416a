//! Client for the explanation service.

use serde::Serialize;
use thiserror::Error;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use crate::components::argument_graph::ExplanationGraph;

const GRAPH_VISUALISER: &str = "argflow_ui.visualisers.GraphVisualiser";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
	#[error("no browser window")]
	NoWindow,
	#[error("request error: {0}")]
	Request(String),
	#[error("fetch error: {0}")]
	Fetch(String),
	#[error("HTTP {0}")]
	Status(u16),
	#[error("deserialize error: {0}")]
	Decode(String),
}

/// Server-side pruning of the explanation graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PruneRequest {
	pub prune: bool,
	pub limit: u32,
	pub layer_limit: u32,
}

impl Default for PruneRequest {
	fn default() -> Self {
		Self {
			prune: true,
			limit: 20,
			layer_limit: 5,
		}
	}
}

#[derive(Clone, Debug)]
pub struct ApiClient {
	base_url: String,
}

impl ApiClient {
	pub fn new(base_url: &str) -> Self {
		Self {
			base_url: base_url.trim_end_matches('/').to_string(),
		}
	}

	pub fn explanation_path(model: &str, explanation: &str) -> String {
		format!("/api/models/{model}/explanations/{explanation}/visualisers/{GRAPH_VISUALISER}")
	}

	async fn post<B: Serialize, T: serde::de::DeserializeOwned>(
		&self,
		path: &str,
		body: &B,
	) -> Result<T, ApiError> {
		let url = format!("{}{}", self.base_url, path);
		let body = serde_json::to_string(body).map_err(|e| ApiError::Request(e.to_string()))?;

		let headers = Headers::new().map_err(|e| ApiError::Request(format!("{e:?}")))?;
		headers
			.set("Content-Type", "application/json")
			.map_err(|e| ApiError::Request(format!("{e:?}")))?;

		let opts = RequestInit::new();
		opts.set_method("POST");
		opts.set_mode(RequestMode::SameOrigin);
		opts.set_headers(&headers);
		opts.set_body(&JsValue::from_str(&body));

		let request = Request::new_with_str_and_init(&url, &opts)
			.map_err(|e| ApiError::Request(format!("{e:?}")))?;

		let window = web_sys::window().ok_or(ApiError::NoWindow)?;
		let resp: Response = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(|e| ApiError::Fetch(format!("{e:?}")))?
			.dyn_into()
			.map_err(|_| ApiError::Fetch("response is not a Response".into()))?;

		if !resp.ok() {
			return Err(ApiError::Status(resp.status()));
		}

		let text = JsFuture::from(resp.text().map_err(|e| ApiError::Fetch(format!("{e:?}")))?)
			.await
			.map_err(|e| ApiError::Fetch(format!("{e:?}")))?
			.as_string()
			.ok_or_else(|| ApiError::Decode("response body is not text".into()))?;

		serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
	}

	pub async fn fetch_explanation(
		&self,
		model: &str,
		explanation: &str,
		prune: PruneRequest,
	) -> Result<ExplanationGraph, ApiError> {
		log::debug!("fetching {model}/{explanation} with {prune:?}");
		self.post(&Self::explanation_path(model, explanation), &prune)
			.await
	}
}
