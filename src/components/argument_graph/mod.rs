mod camera;
mod canvas;
mod component;
mod error;
mod geometry;
mod graph;
mod interaction;
mod layout;
mod overlay;
mod plugin;
mod preload;
mod render;
mod scene;
mod surface;
mod types;
mod word_cloud;

#[cfg(test)]
mod testing;

pub use camera::{Camera, FIT_MARGIN, MIN_SCALE, SurfaceBounds, ZOOM_STEP};
pub use component::{ArgumentGraphView, GraphController};
pub use error::{GraphError, PreloadError, SurfaceError};
pub use geometry::{Point, Rect, Size};
pub use graph::{Edge, Graph, Node};
pub use interaction::{Cursor, MouseTracker};
pub use layout::{LayeredEngine, LayoutEngine, LayoutOptions, StrengthScaling};
pub use plugin::{GraphPlugin, OverlayContent};
pub use preload::{ImageLoader, preload};
pub use render::Renderer;
pub use scene::Scene;
pub use types::{
	ChildLink, ContentType, ContributionType, ExplanationGraph, NodeId, NodeKind, NodeRecord, RawContent,
	RawPayload,
};
pub use word_cloud::{DEFAULT_ASPECT_RATIO, WeightedWord};
