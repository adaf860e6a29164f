pub mod api;
pub mod config;
pub mod graph;
pub mod grid;
pub mod heap;
pub mod noise;
pub mod path;
pub mod rng;
pub mod search;

use std::time::Instant;

pub use config::{SearchParams, TerrainParams};
pub use graph::{Graph, Node, NodeKey, Terrain, generate_graph, generate_graph_with};
pub use path::{PathResult, find_shortest_path, find_shortest_path_with, reconstruct_path};
pub use search::{AnimationStep, run_animated_search, run_animated_search_with};

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Terrain plus the route across it, as produced by [`plan`].
pub struct Plan {
    pub graph: Graph,
    pub result: PathResult,
}

/// Generate `terrain` and route `start` to `end` across it, timing each stage.
pub fn plan(
    terrain: &Terrain,
    start: NodeKey,
    end: NodeKey,
    terrain_params: &TerrainParams,
    search: &SearchParams,
) -> (Plan, Vec<Timing>) {
    let mut timings = Vec::new();
    let total_start = Instant::now();

    // 1. Terrain graph
    let t = Instant::now();
    let graph = terrain.generate_with(terrain_params);
    timings.push(Timing {
        name: "terrain",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 2. Route
    let t = Instant::now();
    let result = find_shortest_path_with(start, end, &graph, search);
    timings.push(Timing {
        name: "route",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    let total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
    timings.push(Timing {
        name: "TOTAL",
        ms: total_ms,
    });

    (Plan { graph, result }, timings)
}
