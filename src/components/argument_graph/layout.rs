//! Layout options and the layered-layout collaborator.
//!
//! [`LayoutEngine`] is the seam: the graph model sizes nodes, hands the
//! engine `(width, height)` boxes plus edges, and gets back centers and edge
//! polylines. [`LayeredEngine`] is the bundled implementation.

use std::collections::{HashSet, VecDeque};

use log::debug;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{DfsEvent, depth_first_search};
use serde::{Deserialize, Serialize};

use super::error::GraphError;
use super::geometry::{Point, Size};
use super::types::NodeId;

/// How regular-node strength maps to visual size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrengthScaling {
	#[default]
	Linear,
	Logarithmic,
}

impl StrengthScaling {
	/// Interpolation factor for a strength already normalised into `[0, 1]`.
	pub fn factor(self, normalised: f64) -> f64 {
		match self {
			StrengthScaling::Linear => normalised,
			StrengthScaling::Logarithmic => {
				(normalised + 1.0).ln().max(0.0).sqrt() / std::f64::consts::LN_2.sqrt()
			}
		}
	}
}

/// Host-adjustable layout parameters. Any change invalidates node sizes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
	/// Horizontal gap between neighbours in a rank.
	pub node_separation: f64,
	/// Vertical gap between ranks.
	pub rank_separation: f64,
	/// Reference size of input nodes.
	pub input_size: f64,
	/// Reference size of regular (argument) nodes.
	pub argument_size: f64,
	pub scaling: StrengthScaling,
}

impl Default for LayoutOptions {
	fn default() -> Self {
		Self {
			node_separation: 50.0,
			rank_separation: 50.0,
			input_size: 200.0,
			argument_size: 150.0,
			scaling: StrengthScaling::Linear,
		}
	}
}

#[derive(Clone, Copy, Debug)]
pub struct LayoutNode<'a> {
	pub id: &'a NodeId,
	pub size: Size,
}

/// Directed edge between two indices of the node slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutEdge {
	pub source: usize,
	pub target: usize,
}

/// Index-aligned with the engine input: one center per node, one polyline
/// of at least two points per edge, running from source to target.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutResult {
	pub centers: Vec<Point>,
	pub routes: Vec<Vec<Point>>,
}

pub trait LayoutEngine {
	fn layout(
		&self,
		nodes: &[LayoutNode<'_>],
		edges: &[LayoutEdge],
		options: &LayoutOptions,
	) -> Result<LayoutResult, GraphError>;
}

/// Rank-based layout for DAGs: cycles are broken by reversing DFS back
/// edges, ranks come from longest paths, long edges get dummy vertices, and
/// each rank is ordered by barycenter sweeps. All ties fall back to input
/// order, so identical input always produces identical output.
#[derive(Clone, Copy, Debug)]
pub struct LayeredEngine {
	sweeps: usize,
}

impl Default for LayeredEngine {
	fn default() -> Self {
		Self { sweeps: 8 }
	}
}

impl LayeredEngine {
	const LOOP_REACH: f64 = 20.0;
}

/// Working state over real nodes (`0..n`) and dummy vertices (`n..`).
struct Layering {
	rank: Vec<usize>,
	size: Vec<Size>,
	upper: Vec<Vec<usize>>,
	lower: Vec<Vec<usize>>,
	layers: Vec<Vec<usize>>,
	/// Vertex path of each edge, oriented downwards, or `None` for self-loops.
	paths: Vec<Option<Vec<usize>>>,
	reversed: Vec<bool>,
}

impl LayoutEngine for LayeredEngine {
	fn layout(
		&self,
		nodes: &[LayoutNode<'_>],
		edges: &[LayoutEdge],
		options: &LayoutOptions,
	) -> Result<LayoutResult, GraphError> {
		if let Some((i, _)) = edges
			.iter()
			.enumerate()
			.find(|(_, e)| e.source >= nodes.len() || e.target >= nodes.len())
		{
			return Err(GraphError::Layout(format!(
				"edge #{i} points outside the {} input nodes",
				nodes.len()
			)));
		}
		if nodes.is_empty() {
			return Ok(LayoutResult::default());
		}

		let mut layering = Layering::build(nodes, edges);
		for sweep in 0..self.sweeps {
			layering.sweep(sweep % 2 == 0);
		}
		let positions = layering.coordinates(options);

		let routes = edges
			.iter()
			.enumerate()
			.map(|(i, edge)| layering.route(i, edge, &positions))
			.collect();

		debug!(
			"layered {} nodes into {} ranks ({} dummy vertices)",
			nodes.len(),
			layering.layers.len(),
			layering.rank.len() - nodes.len()
		);

		Ok(LayoutResult {
			centers: positions[..nodes.len()].to_vec(),
			routes,
		})
	}
}

impl Layering {
	fn build(nodes: &[LayoutNode<'_>], edges: &[LayoutEdge]) -> Self {
		let n = nodes.len();
		let mut graph = DiGraph::<(), ()>::with_capacity(n, edges.len());
		let index: Vec<NodeIndex> = (0..n).map(|_| graph.add_node(())).collect();
		for edge in edges.iter().filter(|e| e.source != e.target) {
			graph.update_edge(index[edge.source], index[edge.target], ());
		}

		let mut back_edges = HashSet::new();
		depth_first_search(&graph, graph.node_indices(), |event| {
			if let DfsEvent::BackEdge(u, v) = event {
				back_edges.insert((u.index(), v.index()));
			}
		});

		let reversed: Vec<bool> = edges
			.iter()
			.map(|e| back_edges.contains(&(e.source, e.target)))
			.collect();
		let oriented: Vec<(usize, usize)> = edges
			.iter()
			.zip(&reversed)
			.filter(|(e, _)| e.source != e.target)
			.map(|(e, &rev)| if rev { (e.target, e.source) } else { (e.source, e.target) })
			.collect();

		// Longest-path ranking over the now acyclic edge set.
		let mut successors = vec![Vec::new(); n];
		let mut indegree = vec![0usize; n];
		for &(u, v) in &oriented {
			successors[u].push(v);
			indegree[v] += 1;
		}
		let mut rank = vec![0usize; n];
		let mut queue: VecDeque<usize> = (0..n).filter(|&v| indegree[v] == 0).collect();
		while let Some(u) = queue.pop_front() {
			for &v in &successors[u] {
				rank[v] = rank[v].max(rank[u] + 1);
				indegree[v] -= 1;
				if indegree[v] == 0 {
					queue.push_back(v);
				}
			}
		}

		let mut size: Vec<Size> = nodes.iter().map(|node| node.size).collect();
		let mut upper = vec![Vec::new(); n];
		let mut lower = vec![Vec::new(); n];
		let mut paths = Vec::with_capacity(edges.len());

		for (edge, &rev) in edges.iter().zip(&reversed) {
			if edge.source == edge.target {
				paths.push(None);
				continue;
			}
			let (top, bottom) = if rev {
				(edge.target, edge.source)
			} else {
				(edge.source, edge.target)
			};
			let mut path = vec![top];
			for r in rank[top] + 1..rank[bottom] {
				let dummy = rank.len();
				rank.push(r);
				size.push(Size::default());
				upper.push(Vec::new());
				lower.push(Vec::new());
				path.push(dummy);
			}
			path.push(bottom);
			for pair in path.windows(2) {
				lower[pair[0]].push(pair[1]);
				upper[pair[1]].push(pair[0]);
			}
			paths.push(Some(path));
		}

		let depth = rank.iter().copied().max().unwrap_or(0) + 1;
		let mut layers = vec![Vec::new(); depth];
		for (v, &r) in rank.iter().enumerate() {
			layers[r].push(v);
		}

		Self {
			rank,
			size,
			upper,
			lower,
			layers,
			paths,
			reversed,
		}
	}

	/// One barycenter pass, top-down when `downwards`, else bottom-up.
	fn sweep(&mut self, downwards: bool) {
		let mut order = vec![0usize; self.rank.len()];
		for layer in &self.layers {
			for (i, &v) in layer.iter().enumerate() {
				order[v] = i;
			}
		}

		let ranks: Vec<usize> = if downwards {
			(1..self.layers.len()).collect()
		} else {
			(0..self.layers.len().saturating_sub(1)).rev().collect()
		};

		for r in ranks {
			let neighbours = if downwards { &self.upper } else { &self.lower };
			let mut keyed: Vec<(f64, usize)> = self.layers[r]
				.iter()
				.map(|&v| {
					let adjacent = &neighbours[v];
					let key = if adjacent.is_empty() {
						order[v] as f64
					} else {
						adjacent.iter().map(|&u| order[u] as f64).sum::<f64>() / adjacent.len() as f64
					};
					(key, v)
				})
				.collect();
			keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
			self.layers[r] = keyed.into_iter().map(|(_, v)| v).collect();
			for (i, &v) in self.layers[r].iter().enumerate() {
				order[v] = i;
			}
		}
	}

	/// Centers of every vertex: ranks stacked top to bottom, each rank
	/// packed left to right and centered on `x = 0`.
	fn coordinates(&self, options: &LayoutOptions) -> Vec<Point> {
		let mut positions = vec![Point::ORIGIN; self.rank.len()];
		let mut top = 0.0;

		for layer in &self.layers {
			let height = layer
				.iter()
				.map(|&v| self.size[v].height)
				.fold(0.0, f64::max);
			let y = top + height / 2.0;

			let mut cursor = 0.0;
			for &v in layer {
				let width = self.size[v].width;
				positions[v] = Point::new(cursor + width / 2.0, y);
				cursor += width + options.node_separation;
			}
			let shift = (cursor - options.node_separation).max(0.0) / 2.0;
			for &v in layer {
				positions[v].x -= shift;
			}

			top += height + options.rank_separation;
		}
		positions
	}

	fn route(&self, i: usize, edge: &LayoutEdge, positions: &[Point]) -> Vec<Point> {
		let Some(path) = &self.paths[i] else {
			let c = positions[edge.source];
			let s = self.size[edge.source];
			let right = c.x + s.width / 2.0;
			let reach = right + LayeredEngine::LOOP_REACH;
			return vec![
				Point::new(right, c.y - s.height / 4.0),
				Point::new(reach, c.y - s.height / 4.0),
				Point::new(reach, c.y + s.height / 4.0),
				Point::new(right, c.y + s.height / 4.0),
			];
		};

		let last = path.len() - 1;
		let mut points: Vec<Point> = path
			.iter()
			.enumerate()
			.map(|(k, &v)| {
				let p = positions[v];
				let half = self.size[v].height / 2.0;
				match k {
					0 => Point::new(p.x, p.y + half),
					k if k == last => Point::new(p.x, p.y - half),
					_ => p,
				}
			})
			.collect();
		if self.reversed[i] {
			points.reverse();
		}
		points
	}
}

#[cfg(test)]
mod tests {
	use float_cmp::approx_eq;
	use proptest::prelude::*;

	use super::*;

	fn ids(n: usize) -> Vec<NodeId> {
		(0..n).map(|i| NodeId::new(i.to_string())).collect()
	}

	fn boxes(ids: &[NodeId]) -> Vec<LayoutNode<'_>> {
		ids.iter()
			.map(|id| LayoutNode {
				id,
				size: Size::new(40.0, 20.0),
			})
			.collect()
	}

	fn edge(source: usize, target: usize) -> LayoutEdge {
		LayoutEdge { source, target }
	}

	#[test]
	fn ranks_flow_downwards() {
		let ids = ids(3);
		let result = LayeredEngine::default()
			.layout(&boxes(&ids), &[edge(0, 1), edge(1, 2)], &LayoutOptions::default())
			.unwrap();

		let ys: Vec<f64> = result.centers.iter().map(|c| c.y).collect();
		assert!(ys[0] < ys[1] && ys[1] < ys[2]);
		// 20px tall ranks separated by 50px
		assert!(approx_eq!(f64, ys[1] - ys[0], 70.0, epsilon = 1e-9));
		assert_eq!(result.routes[0].first(), Some(&Point::new(result.centers[0].x, ys[0] + 10.0)));
		assert_eq!(result.routes[0].last(), Some(&Point::new(result.centers[1].x, ys[1] - 10.0)));
	}

	#[test]
	fn long_edges_pass_through_dummy_points() {
		let ids = ids(3);
		let result = LayeredEngine::default()
			.layout(
				&boxes(&ids),
				&[edge(0, 1), edge(1, 2), edge(0, 2)],
				&LayoutOptions::default(),
			)
			.unwrap();
		assert_eq!(result.routes[2].len(), 3);
	}

	#[test]
	fn siblings_respect_node_separation() {
		let ids = ids(3);
		let options = LayoutOptions {
			node_separation: 30.0,
			..Default::default()
		};
		let result = LayeredEngine::default()
			.layout(&boxes(&ids), &[edge(0, 1), edge(0, 2)], &options)
			.unwrap();
		let gap = (result.centers[2].x - result.centers[1].x).abs();
		assert!(approx_eq!(f64, gap, 70.0, epsilon = 1e-9));
		assert!(approx_eq!(f64, result.centers[1].x + result.centers[2].x, 0.0, epsilon = 1e-9));
	}

	#[test]
	fn cycles_and_self_loops_still_route() {
		let ids = ids(3);
		let edges = [edge(0, 1), edge(1, 2), edge(2, 0), edge(1, 1)];
		let result = LayeredEngine::default()
			.layout(&boxes(&ids), &edges, &LayoutOptions::default())
			.unwrap();

		assert!(result.routes.iter().all(|r| r.len() >= 2));
		// the reversed edge still starts at its own source
		let back = &result.routes[2];
		assert!(approx_eq!(f64, back[0].y, result.centers[2].y - 10.0, epsilon = 1e-9));
		assert!(approx_eq!(f64, back.last().unwrap().y, result.centers[0].y + 10.0, epsilon = 1e-9));
	}

	#[test]
	fn rejects_out_of_range_edges() {
		let ids = ids(1);
		let err = LayeredEngine::default()
			.layout(&boxes(&ids), &[edge(0, 4)], &LayoutOptions::default())
			.unwrap_err();
		assert!(matches!(err, GraphError::Layout(_)));
	}

	#[test]
	fn logarithmic_factor_hits_one_at_the_top() {
		assert!(approx_eq!(f64, StrengthScaling::Logarithmic.factor(1.0), 1.0, epsilon = 1e-12));
		assert_eq!(StrengthScaling::Logarithmic.factor(0.0), 0.0);
	}

	proptest! {
		#[test]
		fn identical_input_gives_identical_layout(
			n in 1usize..12,
			raw in proptest::collection::vec((0usize..12, 0usize..12), 0..24),
		) {
			let ids = ids(n);
			let nodes = boxes(&ids);
			let edges: Vec<_> = raw.into_iter().map(|(s, t)| edge(s % n, t % n)).collect();
			let engine = LayeredEngine::default();
			let a = engine.layout(&nodes, &edges, &LayoutOptions::default()).unwrap();
			let b = engine.layout(&nodes, &edges, &LayoutOptions::default()).unwrap();
			prop_assert_eq!(&a, &b);
			prop_assert_eq!(a.centers.len(), n);
			prop_assert!(a.routes.iter().all(|r| r.len() >= 2));
		}

		#[test]
		fn scaling_factors_are_finite_and_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
			let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
			for mode in [StrengthScaling::Linear, StrengthScaling::Logarithmic] {
				let (f_lo, f_hi) = (mode.factor(lo), mode.factor(hi));
				prop_assert!(f_lo.is_finite() && f_lo >= 0.0);
				prop_assert!(f_lo <= f_hi);
			}
		}
	}
}
