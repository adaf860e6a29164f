use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::SearchParams;
use crate::graph::{Graph, NodeKey};
use crate::heap::{HeapEntry, MinHeap};
use crate::path::reconstruct_path;

/// Scaled Manhattan distance to the goal. Not admissible when weights drop
/// below `1 / scale`, so results are best-effort rather than optimal.
#[inline]
pub fn heuristic(from: NodeKey, goal: NodeKey, scale: f64) -> f64 {
    from.manhattan(goal) as f64 * scale
}

/// Why a search loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    GoalReached,
    /// Open set drained without reaching the goal.
    Exhausted,
    /// Explored-node or step budget spent.
    BudgetSpent,
}

/// Final state of a batch search: best known costs and predecessor links.
#[derive(Debug, Clone)]
pub struct SearchMaps {
    pub g_cost: HashMap<NodeKey, f64>,
    pub previous: HashMap<NodeKey, NodeKey>,
    pub explored: usize,
    pub termination: Termination,
}

impl SearchMaps {
    /// Best known cost to `key`, infinite when never reached.
    pub fn cost(&self, key: NodeKey) -> f64 {
        self.g_cost.get(&key).copied().unwrap_or(f64::INFINITY)
    }
}

/// One observable event of an animated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AnimationStep {
    Init {
        current: NodeKey,
    },
    Explore {
        current: NodeKey,
        visited_count: usize,
        newly_visited_count: usize,
        current_path: Vec<NodeKey>,
    },
    Complete {
        current: NodeKey,
        visited_count: usize,
        current_path: Vec<NodeKey>,
    },
    /// Emitted only by [`replay_path`], never by the search itself.
    PathProgress {
        current: NodeKey,
        current_path_prefix: Vec<NodeKey>,
        completed: bool,
        total_steps: usize,
    },
}

impl AnimationStep {
    pub fn current(&self) -> NodeKey {
        match self {
            Self::Init { current }
            | Self::Explore { current, .. }
            | Self::Complete { current, .. }
            | Self::PathProgress { current, .. } => *current,
        }
    }
}

/// Search-local mutable state; created per call and dropped with it.
struct SearchState {
    g_cost: HashMap<NodeKey, f64>,
    previous: HashMap<NodeKey, NodeKey>,
    closed: HashSet<NodeKey>,
    open: MinHeap<NodeKey>,
}

impl SearchState {
    fn new(g_cost: HashMap<NodeKey, f64>, start: NodeKey, goal: NodeKey, scale: f64) -> Self {
        let mut state = Self {
            g_cost,
            previous: HashMap::new(),
            closed: HashSet::new(),
            open: MinHeap::new(),
        };
        state.g_cost.insert(start, 0.0);
        state.open.push(start, heuristic(start, goal, scale));
        state
    }

    /// Pop until an unclosed key appears, discarding stale duplicates.
    fn pop_open(&mut self) -> Option<NodeKey> {
        while let Some(HeapEntry { element, .. }) = self.open.pop() {
            if !self.closed.contains(&element) {
                return Some(element);
            }
        }
        None
    }

    /// Relax the unclosed neighbours of `current`. Keys without a g entry are
    /// outside the search area and skipped. Returns how many improved.
    fn relax(&mut self, graph: &Graph, current: NodeKey, goal: NodeKey, scale: f64) -> usize {
        let current_g = self.g_cost.get(&current).copied().unwrap_or(f64::INFINITY);
        let mut improved = 0;
        for &next in graph.neighbors(current) {
            if self.closed.contains(&next) {
                continue;
            }
            let Some(&next_g) = self.g_cost.get(&next) else {
                continue;
            };
            let Some(weight) = graph.weight(next) else {
                continue;
            };
            let tentative = current_g + weight;
            if tentative < next_g {
                self.g_cost.insert(next, tentative);
                self.previous.insert(next, current);
                self.open.push(next, tentative + heuristic(next, goal, scale));
                improved += 1;
            }
        }
        improved
    }

    /// Replace the open set with entries keyed by raw Manhattan distance only.
    fn rekey_by_distance(&mut self, goal: NodeKey) {
        let mut pending: Vec<NodeKey> = self
            .open
            .drain()
            .map(|e| e.element)
            .filter(|k| !self.closed.contains(k))
            .collect();
        pending.sort_unstable();
        pending.dedup();
        for key in pending {
            self.open.push(key, key.manhattan(goal) as f64);
        }
    }
}

/// Batch search. Only nodes within `radius_factor` times the start-goal
/// distance of the start take part, and at most
/// [`SearchParams::explore_budget`] nodes are closed. The path itself is left
/// to [`reconstruct_path`].
pub fn search_batch(start: NodeKey, goal: NodeKey, graph: &Graph, params: &SearchParams) -> SearchMaps {
    let radius = params.radius_factor * start.manhattan(goal) as f64;
    let g_cost: HashMap<NodeKey, f64> = graph
        .keys()
        .filter(|&k| k == goal || start.manhattan(k) as f64 <= radius)
        .map(|k| (k, f64::INFINITY))
        .collect();
    let mut state = SearchState::new(g_cost, start, goal, params.heuristic_scale);

    let mut budget = params.explore_budget(graph.len());
    let mut tightened = false;
    let mut explored = 0usize;

    let termination = loop {
        let Some(current) = state.pop_open() else {
            break Termination::Exhausted;
        };
        if explored >= budget {
            break Termination::BudgetSpent;
        }
        state.closed.insert(current);
        explored += 1;

        if current == goal {
            break Termination::GoalReached;
        }

        let to_goal = current.manhattan(goal);
        if !tightened && to_goal <= params.near_goal_distance && explored > params.near_goal_explored {
            let remaining = budget - explored;
            budget = explored + (remaining / 2).max(to_goal as usize).min(remaining);
            tightened = true;
        }

        state.relax(graph, current, goal, params.heuristic_scale);
    };

    tracing::debug!(
        %start,
        %goal,
        explored,
        budget,
        ?termination,
        "batch search finished"
    );

    SearchMaps {
        g_cost: state.g_cost,
        previous: state.previous,
        explored,
        termination,
    }
}

/// Animated search with default parameters.
pub fn run_animated_search(start: NodeKey, goal: NodeKey, graph: &Graph) -> Vec<AnimationStep> {
    run_animated_search_with(start, goal, graph, &SearchParams::default())
}

/// Search over every node, recording one `Explore` step per newly closed node
/// and a final `Complete` when the goal is closed. At most `max_steps` steps
/// are produced; running out ends the trace without `Complete`. Unknown
/// endpoints produce an empty trace.
pub fn run_animated_search_with(
    start: NodeKey,
    goal: NodeKey,
    graph: &Graph,
    params: &SearchParams,
) -> Vec<AnimationStep> {
    if !graph.contains(start) || !graph.contains(goal) || params.max_steps == 0 {
        return Vec::new();
    }

    let mut steps = vec![AnimationStep::Init { current: start }];
    if start == goal {
        if steps.len() < params.max_steps {
            steps.push(AnimationStep::Complete {
                current: goal,
                visited_count: 1,
                current_path: vec![start],
            });
        }
        return steps;
    }

    let g_cost = graph.keys().map(|k| (k, f64::INFINITY)).collect();
    let mut state = SearchState::new(g_cost, start, goal, params.heuristic_scale);
    let mut rekeyed = false;

    let termination = loop {
        if steps.len() >= params.max_steps {
            break Termination::BudgetSpent;
        }
        let Some(current) = state.pop_open() else {
            break Termination::Exhausted;
        };
        state.closed.insert(current);

        if current == goal {
            steps.push(AnimationStep::Complete {
                current,
                visited_count: state.closed.len(),
                current_path: reconstruct_path(&state.previous, start, goal),
            });
            break Termination::GoalReached;
        }

        let newly = state.relax(graph, current, goal, params.heuristic_scale);

        if params.heuristic_rebuild
            && !rekeyed
            && current.manhattan(goal) <= params.near_goal_distance
            && state.closed.len() > params.near_goal_explored
        {
            state.rekey_by_distance(goal);
            rekeyed = true;
        }

        steps.push(AnimationStep::Explore {
            current,
            visited_count: state.closed.len(),
            newly_visited_count: newly,
            current_path: reconstruct_path(&state.previous, start, current),
        });
    };

    tracing::debug!(
        %start,
        %goal,
        steps = steps.len(),
        visited = state.closed.len(),
        ?termination,
        "animated search finished"
    );
    steps
}

/// Replay an already known path one node at a time.
pub fn replay_path(path: &[NodeKey]) -> Vec<AnimationStep> {
    let total = path.len();
    path.iter()
        .enumerate()
        .map(|(i, &current)| AnimationStep::PathProgress {
            current,
            current_path_prefix: path[..=i].to_vec(),
            completed: i + 1 == total,
            total_steps: total,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;

    fn k(x: i32, y: i32) -> NodeKey {
        NodeKey::new(x, y)
    }

    #[test]
    fn heuristic_is_scaled_manhattan() {
        assert_eq!(heuristic(k(0, 0), k(3, 4), 0.8), 7.0 * 0.8);
        assert_eq!(heuristic(k(2, 2), k(2, 2), 0.8), 0.0);
    }

    #[test]
    fn batch_reaches_goal_on_uniform_grid() {
        let g = Graph::uniform(3, 3, 1.0);
        let maps = search_batch(k(0, 0), k(2, 2), &g, &SearchParams::default());
        assert_eq!(maps.termination, Termination::GoalReached);
        assert_eq!(maps.cost(k(2, 2)), 4.0);
        assert_eq!(maps.cost(k(0, 0)), 0.0);
    }

    #[test]
    fn batch_costs_use_destination_weight() {
        // Row of three: entering (1,0) costs 5, entering (2,0) costs 2.
        let nodes = [
            Node { x: 0, y: 0, weight: 1.0 },
            Node { x: 1, y: 0, weight: 5.0 },
            Node { x: 2, y: 0, weight: 2.0 },
        ];
        let g = Graph::from_parts(3, 1, nodes, [(k(0, 0), k(1, 0)), (k(1, 0), k(2, 0))]);
        let maps = search_batch(k(0, 0), k(2, 0), &g, &SearchParams::default());
        assert_eq!(maps.cost(k(2, 0)), 7.0);
        assert_eq!(maps.previous.get(&k(2, 0)), Some(&k(1, 0)));
    }

    #[test]
    fn batch_prunes_nodes_outside_radius() {
        let g = Graph::uniform(20, 20, 1.0);
        let maps = search_batch(k(0, 0), k(2, 0), &g, &SearchParams::default());
        // radius = 1.5 * 2 = 3
        assert!(maps.g_cost.contains_key(&k(3, 0)));
        assert!(!maps.g_cost.contains_key(&k(4, 0)));
        assert!(!maps.g_cost.contains_key(&k(10, 10)));
    }

    #[test]
    fn batch_exhausts_on_disconnected_graph() {
        let nodes = [Node { x: 0, y: 0, weight: 1.0 }, Node { x: 5, y: 0, weight: 1.0 }];
        let g = Graph::from_parts(6, 1, nodes, Vec::<(NodeKey, NodeKey)>::new());
        let maps = search_batch(k(0, 0), k(5, 0), &g, &SearchParams::default());
        assert_eq!(maps.termination, Termination::Exhausted);
        assert!(maps.cost(k(5, 0)).is_infinite());
    }

    #[test]
    fn batch_respects_explore_budget() {
        let g = Graph::uniform(60, 60, 1.0);
        let params = SearchParams {
            max_explored: 5,
            min_explored: 0,
            ..SearchParams::default()
        };
        let maps = search_batch(k(0, 0), k(50, 50), &g, &params);
        assert_eq!(maps.termination, Termination::BudgetSpent);
        assert_eq!(maps.explored, 5);
    }

    #[test]
    fn batch_tightens_budget_near_goal() {
        // 30x30 to (10,10): a node within 3 of the goal is closed as the 112th,
        // the goal as the 125th. Halving the 18 remaining leaves 121.
        let g = Graph::uniform(30, 30, 1.0);
        let params = SearchParams {
            max_explored: 130,
            min_explored: 0,
            ..SearchParams::default()
        };
        let maps = search_batch(k(0, 0), k(10, 10), &g, &params);
        assert_eq!(maps.termination, Termination::BudgetSpent);
        assert_eq!(maps.explored, 121);

        let relaxed = SearchParams {
            near_goal_explored: usize::MAX,
            ..params
        };
        let maps = search_batch(k(0, 0), k(10, 10), &g, &relaxed);
        assert_eq!(maps.termination, Termination::GoalReached);
        assert_eq!(maps.explored, 125);
        assert_eq!(maps.cost(k(10, 10)), 20.0);
    }

    #[test]
    fn rekey_orders_by_raw_distance() {
        let goal = k(5, 0);
        let mut state = SearchState::new(HashMap::new(), k(0, 0), goal, 0.8);
        state.open.push(k(1, 0), 10.0);
        state.open.push(k(4, 0), 50.0);
        state.open.push(k(4, 0), 40.0);
        state.open.push(k(3, 0), 1.0);
        state.closed.insert(k(3, 0));

        state.rekey_by_distance(goal);

        let mut popped = Vec::new();
        while let Some(HeapEntry { element, priority }) = state.open.pop() {
            popped.push((element, priority));
        }
        assert_eq!(popped, vec![(k(4, 0), 1.0), (k(1, 0), 4.0), (k(0, 0), 5.0)]);
    }

    #[test]
    fn animated_small_grid_completes_at_goal() {
        let g = Graph::uniform(5, 5, 1.0);
        let steps = run_animated_search(k(0, 0), k(4, 4), &g);
        assert!(steps.len() <= 1500);
        assert_eq!(steps.first(), Some(&AnimationStep::Init { current: k(0, 0) }));
        let Some(AnimationStep::Complete { current, current_path, .. }) = steps.last() else {
            panic!("last step is not Complete: {:?}", steps.last());
        };
        assert_eq!(*current, k(4, 4));
        assert_eq!(current_path.first(), Some(&k(0, 0)));
        assert_eq!(current_path.last(), Some(&k(4, 4)));
        assert_eq!(current_path.len(), 9);
        for step in &steps[1..steps.len() - 1] {
            assert!(matches!(
                step,
                AnimationStep::Explore { current_path, .. } if current_path.last() == Some(&step.current())
            ));
        }
    }

    #[test]
    fn animated_explore_steps_are_monotonic() {
        let g = Graph::uniform(8, 8, 1.0);
        let steps = run_animated_search(k(0, 0), k(7, 3), &g);
        let mut last = 0;
        for step in &steps[1..steps.len() - 1] {
            let AnimationStep::Explore { visited_count, current, current_path, .. } = step else {
                panic!("unexpected step {step:?}");
            };
            assert_eq!(*visited_count, last + 1);
            assert_eq!(current_path.last(), Some(current));
            last = *visited_count;
        }
    }

    #[test]
    fn animated_step_cap() {
        let g = Graph::uniform(40, 40, 1.0);
        let params = SearchParams {
            max_steps: 10,
            ..SearchParams::default()
        };
        let steps = run_animated_search_with(k(0, 0), k(39, 39), &g, &params);
        assert_eq!(steps.len(), 10);
        assert!(!matches!(steps.last(), Some(AnimationStep::Complete { .. })));
    }

    #[test]
    fn animated_same_endpoint() {
        let g = Graph::uniform(1, 1, 1.0);
        let steps = run_animated_search(k(0, 0), k(0, 0), &g);
        assert_eq!(steps.len(), 2);
        assert!(matches!(steps[1], AnimationStep::Complete { current, .. } if current == k(0, 0)));
    }

    #[test]
    fn animated_unknown_endpoint_is_empty() {
        let g = Graph::uniform(3, 3, 1.0);
        assert!(run_animated_search(k(0, 0), k(9, 9), &g).is_empty());
    }

    #[test]
    fn animated_with_rebuild_still_completes() {
        let g = Graph::uniform(20, 20, 1.0);
        let params = SearchParams {
            heuristic_rebuild: true,
            near_goal_explored: 5,
            ..SearchParams::default()
        };
        let steps = run_animated_search_with(k(0, 0), k(19, 19), &g, &params);
        assert!(matches!(steps.last(), Some(AnimationStep::Complete { current, .. }) if *current == k(19, 19)));
    }

    #[test]
    fn replay_emits_prefixes() {
        let path = [k(0, 0), k(1, 0), k(1, 1)];
        let steps = replay_path(&path);
        assert_eq!(steps.len(), 3);
        assert_eq!(
            steps[1],
            AnimationStep::PathProgress {
                current: k(1, 0),
                current_path_prefix: vec![k(0, 0), k(1, 0)],
                completed: false,
                total_steps: 3,
            }
        );
        assert!(matches!(steps[2], AnimationStep::PathProgress { completed: true, .. }));
        let visited: Vec<NodeKey> = steps.iter().map(AnimationStep::current).collect();
        assert_eq!(visited, path);
        assert!(replay_path(&[]).is_empty());
    }

    #[test]
    fn step_json_shape() {
        let step = AnimationStep::Explore {
            current: k(1, 2),
            visited_count: 3,
            newly_visited_count: 2,
            current_path: vec![k(0, 2), k(1, 2)],
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["type"], "explore");
        assert_eq!(json["current"], "1,2");
        assert_eq!(json["visitedCount"], 3);
        assert_eq!(json["newlyVisitedCount"], 2);
        assert_eq!(json["currentPath"][1], "1,2");
    }
}
