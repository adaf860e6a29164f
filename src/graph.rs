use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::TerrainParams;
use crate::grid::{Grid, neighbors4};
use crate::noise::NoiseField;

/// Canonical identity of a grid cell. Equal coordinates always produce equal
/// keys; the string form is `"x,y"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct NodeKey {
    pub x: i32,
    pub y: i32,
}

impl NodeKey {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn manhattan(self, other: NodeKey) -> i64 {
        (self.x as i64 - other.x as i64).abs() + (self.y as i64 - other.y as i64).abs()
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid node key {0:?}, expected \"x,y\"")]
pub struct ParseKeyError(pub String);

impl FromStr for NodeKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseKeyError(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(err)?;
        let x = x.trim().parse().map_err(|_| err())?;
        let y = y.trim().parse().map_err(|_| err())?;
        Ok(Self { x, y })
    }
}

impl From<NodeKey> for String {
    fn from(key: NodeKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for NodeKey {
    type Error = ParseKeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A grid cell with its movement cost multiplier (higher = harder terrain).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub x: i32,
    pub y: i32,
    pub weight: f64,
}

impl Node {
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.x, self.y)
    }
}

/// Weighted nodes plus symmetric adjacency. Immutable once built.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    width: usize,
    height: usize,
    nodes: HashMap<NodeKey, Node>,
    edges: HashMap<NodeKey, Vec<NodeKey>>,
}

impl Graph {
    /// One node per cell of `weights`, 4-connected within bounds.
    pub fn from_weights(weights: &Grid<f64>) -> Self {
        let (w, h) = (weights.w, weights.h);
        let mut nodes = HashMap::with_capacity(w * h);
        let mut edges = HashMap::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                let key = NodeKey::new(x as i32, y as i32);
                nodes.insert(
                    key,
                    Node {
                        x: key.x,
                        y: key.y,
                        weight: weights.get(x, y),
                    },
                );
                let adj = neighbors4(x, y, w, h)
                    .map(|(nx, ny)| NodeKey::new(nx as i32, ny as i32))
                    .collect();
                edges.insert(key, adj);
            }
        }
        Self {
            width: w,
            height: h,
            nodes,
            edges,
        }
    }

    /// Grid graph with every weight equal to `weight`.
    pub fn uniform(width: usize, height: usize, weight: f64) -> Self {
        Self::from_weights(&Grid::filled(width, height, weight))
    }

    /// Arbitrary graph from explicit nodes and undirected edges. Edges naming
    /// a missing node are ignored.
    pub fn from_parts(
        width: usize,
        height: usize,
        nodes: impl IntoIterator<Item = Node>,
        edges: impl IntoIterator<Item = (NodeKey, NodeKey)>,
    ) -> Self {
        let nodes: HashMap<NodeKey, Node> = nodes.into_iter().map(|n| (n.key(), n)).collect();
        let mut adj: HashMap<NodeKey, Vec<NodeKey>> =
            nodes.keys().map(|&k| (k, Vec::new())).collect();
        for (a, b) in edges {
            if a == b || !nodes.contains_key(&a) || !nodes.contains_key(&b) {
                continue;
            }
            for (from, to) in [(a, b), (b, a)] {
                let list = adj.entry(from).or_default();
                if !list.contains(&to) {
                    list.push(to);
                }
            }
        }
        Self {
            width,
            height,
            nodes,
            edges: adj,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(&key)
    }

    pub fn weight(&self, key: NodeKey) -> Option<f64> {
        self.nodes.get(&key).map(|n| n.weight)
    }

    /// Directly reachable keys; empty for unknown keys.
    pub fn neighbors(&self, key: NodeKey) -> &[NodeKey] {
        self.edges.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes.keys().copied()
    }
}

/// Four-band piecewise-linear map from noise value to movement cost:
/// valleys, rolling hills, hills, mountains.
pub fn terrain_weight(n: f64) -> f64 {
    if n < -0.3 {
        0.1 + (n + 1.0) / 0.7 * 0.15
    } else if n < 0.1 {
        0.5 + (n + 0.3) / 0.4 * 0.25
    } else if n < 0.4 {
        2.0 + (n - 0.1) / 0.3 * 3.0
    } else {
        8.0 + (n - 0.4) / 0.6 * 17.0
    }
}

/// Weight of cell `(x, y)`: banded base terrain, pulled down where the road
/// noise crosses zero, floored.
pub fn cell_weight(field: &NoiseField, x: f64, y: f64, detail: f64, params: &TerrainParams) -> f64 {
    let n = field.fractal_noise(
        x,
        y,
        params.base_octaves,
        params.base_persistence,
        detail * params.base_scale,
    );
    let mut weight = terrain_weight(n);

    let road = field.fractal_noise(
        x * params.road_coord_scale,
        y * params.road_coord_scale,
        params.road_octaves,
        params.road_persistence,
        detail * params.road_scale,
    );
    if road.abs() < params.road_threshold {
        weight = weight.min(params.road_weight_cap);
    }

    weight.max(params.weight_floor)
}

/// Build the terrain graph for `(width, height, seed, detail)` with default
/// terrain parameters.
pub fn generate_graph(width: usize, height: usize, seed: u32, detail: f64) -> Graph {
    generate_graph_with(width, height, seed, detail, &TerrainParams::default())
}

pub fn generate_graph_with(
    width: usize,
    height: usize,
    seed: u32,
    detail: f64,
    params: &TerrainParams,
) -> Graph {
    if width == 0 || height == 0 {
        return Graph {
            width,
            height,
            ..Graph::default()
        };
    }

    let t = Instant::now();
    let field = NoiseField::new(seed);
    let mut weights = Grid::<f64>::new(width, height);
    weights
        .data
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                *out = cell_weight(&field, x as f64, y as f64, detail, params);
            }
        });
    let graph = Graph::from_weights(&weights);

    tracing::debug!(
        width,
        height,
        seed,
        detail,
        ms = t.elapsed().as_secs_f64() * 1000.0,
        "generated terrain graph"
    );
    graph
}

/// Grid size, seed and detail of one terrain. The same tuple always yields
/// the same graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Terrain {
    pub width: usize,
    pub height: usize,
    pub seed: u32,
    pub detail: f64,
}

impl Terrain {
    pub fn generate(&self) -> Graph {
        self.generate_with(&TerrainParams::default())
    }

    pub fn generate_with(&self, params: &TerrainParams) -> Graph {
        generate_graph_with(self.width, self.height, self.seed, self.detail, params)
    }
}
