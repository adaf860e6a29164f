use std::collections::HashMap;

use serde::Serialize;

use crate::config::SearchParams;
use crate::graph::{Graph, NodeKey};
use crate::search::search_batch;

/// Outcome of a shortest-path query. `distance` is infinite when no path was
/// found (serialized as `null`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    pub path: Vec<NodeKey>,
    pub distance: f64,
    pub path_exists: bool,
}

impl PathResult {
    pub fn not_found() -> Self {
        Self {
            path: Vec::new(),
            distance: f64::INFINITY,
            path_exists: false,
        }
    }
}

/// Walk predecessor links back from `end`. Returns an empty sequence unless
/// the chain ends exactly at `start`.
pub fn reconstruct_path(previous: &HashMap<NodeKey, NodeKey>, start: NodeKey, end: NodeKey) -> Vec<NodeKey> {
    let mut path = vec![end];
    let mut current = end;
    while let Some(&prev) = previous.get(&current) {
        path.push(prev);
        current = prev;
        // A chain longer than the map has a cycle.
        if path.len() > previous.len() + 1 {
            return Vec::new();
        }
    }
    if current != start {
        return Vec::new();
    }
    path.reverse();
    path
}

/// Shortest path with default search parameters.
pub fn find_shortest_path(start: NodeKey, end: NodeKey, graph: &Graph) -> PathResult {
    find_shortest_path_with(start, end, graph, &SearchParams::default())
}

pub fn find_shortest_path_with(start: NodeKey, end: NodeKey, graph: &Graph, params: &SearchParams) -> PathResult {
    if !graph.contains(start) || !graph.contains(end) {
        return PathResult::not_found();
    }
    if start == end {
        return PathResult {
            path: vec![start],
            distance: 0.0,
            path_exists: true,
        };
    }

    let maps = search_batch(start, end, graph, params);
    let path = reconstruct_path(&maps.previous, start, end);
    if path.is_empty() {
        return PathResult::not_found();
    }
    PathResult {
        distance: maps.cost(end),
        path,
        path_exists: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;

    fn k(x: i32, y: i32) -> NodeKey {
        NodeKey::new(x, y)
    }

    #[test]
    fn reconstruct_follows_chain() {
        let previous = HashMap::from([(k(1, 0), k(0, 0)), (k(2, 0), k(1, 0))]);
        assert_eq!(reconstruct_path(&previous, k(0, 0), k(2, 0)), vec![k(0, 0), k(1, 0), k(2, 0)]);
    }

    #[test]
    fn reconstruct_start_equals_end() {
        assert_eq!(reconstruct_path(&HashMap::new(), k(3, 3), k(3, 3)), vec![k(3, 3)]);
    }

    #[test]
    fn reconstruct_mismatched_start_is_empty() {
        let previous = HashMap::from([(k(1, 0), k(0, 0))]);
        assert!(reconstruct_path(&previous, k(5, 5), k(1, 0)).is_empty());
        assert!(reconstruct_path(&HashMap::new(), k(0, 0), k(1, 0)).is_empty());
    }

    #[test]
    fn reconstruct_cycle_is_empty() {
        let previous = HashMap::from([(k(1, 0), k(2, 0)), (k(2, 0), k(1, 0))]);
        assert!(reconstruct_path(&previous, k(0, 0), k(1, 0)).is_empty());
    }

    #[test]
    fn uniform_three_by_three() {
        let g = Graph::uniform(3, 3, 1.0);
        let result = find_shortest_path(k(0, 0), k(2, 2), &g);
        assert!(result.path_exists);
        assert_eq!(result.path.len(), 5);
        assert_eq!(result.distance, 4.0);
        assert_eq!(result.path.first(), Some(&k(0, 0)));
        assert_eq!(result.path.last(), Some(&k(2, 2)));
        for pair in result.path.windows(2) {
            assert!(g.neighbors(pair[0]).contains(&pair[1]));
        }
    }

    #[test]
    fn single_cell() {
        let g = Graph::uniform(1, 1, 1.0);
        let result = find_shortest_path(k(0, 0), k(0, 0), &g);
        assert_eq!(
            result,
            PathResult {
                path: vec![k(0, 0)],
                distance: 0.0,
                path_exists: true,
            }
        );
    }

    #[test]
    fn unknown_endpoint_not_found() {
        let g = Graph::uniform(3, 3, 1.0);
        let result = find_shortest_path(k(0, 0), k(3, 0), &g);
        assert!(!result.path_exists);
        assert!(result.path.is_empty());
        assert!(result.distance.is_infinite());
        assert!(!find_shortest_path(k(-1, 0), k(0, 0), &g).path_exists);
    }

    #[test]
    fn prefers_cheap_detour() {
        // 3x3 with an expensive centre: the cost through the edge ring wins.
        let nodes = (0..3).flat_map(|y| {
            (0..3).map(move |x| Node {
                x,
                y,
                weight: if (x, y) == (1, 1) { 50.0 } else { 1.0 },
            })
        });
        let edges = (0..3).flat_map(|y| {
            (0..3).flat_map(move |x| {
                let mut e = Vec::new();
                if x < 2 {
                    e.push((NodeKey::new(x, y), NodeKey::new(x + 1, y)));
                }
                if y < 2 {
                    e.push((NodeKey::new(x, y), NodeKey::new(x, y + 1)));
                }
                e
            })
        });
        let g = Graph::from_parts(3, 3, nodes, edges);
        let result = find_shortest_path(k(0, 1), k(2, 1), &g);
        assert!(result.path_exists);
        assert_eq!(result.distance, 4.0);
        assert!(!result.path.contains(&k(1, 1)));
    }

    #[test]
    fn disconnected_not_found() {
        let nodes = [Node { x: 0, y: 0, weight: 1.0 }, Node { x: 2, y: 0, weight: 1.0 }];
        let g = Graph::from_parts(3, 1, nodes, Vec::<(NodeKey, NodeKey)>::new());
        let result = find_shortest_path(k(0, 0), k(2, 0), &g);
        assert!(!result.path_exists);
        assert!(result.distance.is_infinite());
    }

    #[test]
    fn infinite_distance_serializes_as_null() {
        let json = serde_json::to_value(PathResult::not_found()).unwrap();
        assert!(json["distance"].is_null());
        assert_eq!(json["path_exists"], false);
    }
}
