//! Resolves every image payload of a scene before the first layout.
//!
//! All loads run concurrently and meet at a single join barrier. Each load
//! races a deadline, so one stuck request can delay the barrier by at most
//! the timeout; failures and timeouts fall back to a placeholder image.

use std::time::Duration;

use futures::future::{self, Either, FutureExt, LocalBoxFuture};
use log::{debug, warn};

use super::error::PreloadError;
use super::scene::Scene;
use super::types::{ImageSource, RasterImage};
use super::word_cloud::WeightedWord;

pub const RESOURCE_PREFIX: &str = "/api/resources/";

/// Platform hooks the preloader needs: fetching an image, waiting, and
/// turning a word list into an image URL.
pub trait ImageLoader {
	fn load(&self, url: String) -> LocalBoxFuture<'static, Result<RasterImage, PreloadError>>;

	/// Resolves once `timeout` has elapsed.
	fn deadline(&self, timeout: Duration) -> LocalBoxFuture<'static, ()>;

	fn word_cloud_url(&self, words: &[WeightedWord]) -> Result<String, PreloadError>;

	fn resource_url(&self, key: &str) -> String {
		format!("{RESOURCE_PREFIX}{key}")
	}
}

pub fn source_url<L: ImageLoader + ?Sized>(
	source: &ImageSource,
	loader: &L,
) -> Result<String, PreloadError> {
	match source {
		ImageSource::Resource(key) => Ok(loader.resource_url(key)),
		ImageSource::WordCloud(words) => loader.word_cloud_url(words),
	}
}

/// Loads every image in `scene`. Never fails: unresolvable images become
/// [`RasterImage::placeholder`]. Text nodes pass through untouched.
pub async fn preload<L: ImageLoader + ?Sized>(
	scene: Scene<ImageSource>,
	loader: &L,
	timeout: Duration,
) -> Scene<RasterImage> {
	let jobs: Vec<_> = scene
		.nodes
		.iter()
		.flat_map(|node| node.payload.images())
		.map(|source| resolve(source, loader, timeout))
		.collect();

	debug!("preloading {} images", jobs.len());
	let mut resolved = future::join_all(jobs).await.into_iter();

	let nodes = scene
		.nodes
		.into_iter()
		.map(|node| node.map_images(|_| resolved.next().unwrap_or_else(RasterImage::placeholder)))
		.collect();

	Scene {
		nodes,
		edges: scene.edges,
	}
}

fn resolve<L: ImageLoader + ?Sized>(
	source: &ImageSource,
	loader: &L,
	timeout: Duration,
) -> LocalBoxFuture<'static, RasterImage> {
	let url = match source_url(source, loader) {
		Ok(url) => url,
		Err(err) => {
			warn!("{err}; using placeholder");
			return future::ready(RasterImage::placeholder()).boxed_local();
		}
	};
	let label = short(&url);
	let load = loader.load(url);
	let deadline = loader.deadline(timeout);

	async move {
		match future::select(load, deadline).await {
			Either::Left((Ok(image), _)) => image,
			Either::Left((Err(err), _)) => {
				warn!("{err}; using placeholder");
				RasterImage::placeholder()
			}
			Either::Right(((), _)) => {
				warn!("{}; using placeholder", PreloadError::Timeout(label));
				RasterImage::placeholder()
			}
		}
	}
	.boxed_local()
}

/// Data URIs run to megabytes; keep log lines readable.
pub(super) fn short(url: &str) -> String {
	const MAX: usize = 64;
	match url.char_indices().nth(MAX) {
		Some((cut, _)) => format!("{}...", &url[..cut]),
		None => url.to_owned(),
	}
}
