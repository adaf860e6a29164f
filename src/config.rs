/// Terrain generation knobs. Defaults reproduce the reference terrain for a
/// given seed, so changing them changes every golden output.
#[derive(Clone, Debug)]
pub struct TerrainParams {
    // Base terrain noise
    pub base_octaves: u32,
    pub base_persistence: f64,
    pub base_scale: f64,

    // Road network noise
    pub road_octaves: u32,
    pub road_persistence: f64,
    pub road_scale: f64,
    pub road_coord_scale: f64,
    pub road_threshold: f64,
    pub road_weight_cap: f64,

    pub weight_floor: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            base_octaves: 4,
            base_persistence: 0.6,
            base_scale: 0.05,
            road_octaves: 2,
            road_persistence: 0.5,
            road_scale: 0.1,
            road_coord_scale: 0.03,
            road_threshold: 0.05,
            road_weight_cap: 0.3,
            weight_floor: 0.1,
        }
    }
}

/// Search budgets and heuristic tuning shared by batch and animated runs.
#[derive(Clone, Debug)]
pub struct SearchParams {
    /// Multiplier on the Manhattan distance to the goal.
    pub heuristic_scale: f64,

    // Batch mode
    pub radius_factor: f64,
    pub max_explored: usize,
    pub explored_fraction: f64,
    pub min_explored: usize,

    // Near-goal behavior (both modes)
    pub near_goal_distance: i64,
    pub near_goal_explored: usize,

    // Animated mode
    pub max_steps: usize,
    /// Re-key the open set by raw Manhattan distance once near the goal.
    /// Drops accumulated g-costs from the priorities, so it is off by default.
    pub heuristic_rebuild: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            heuristic_scale: 0.8,
            radius_factor: 1.5,
            max_explored: 1000,
            explored_fraction: 0.5,
            min_explored: 100,
            near_goal_distance: 3,
            near_goal_explored: 50,
            max_steps: 1500,
            heuristic_rebuild: false,
        }
    }
}

impl SearchParams {
    /// Batch exploration budget for a graph of `node_count` nodes.
    pub fn explore_budget(&self, node_count: usize) -> usize {
        let scaled = (node_count as f64 * self.explored_fraction) as usize;
        self.max_explored
            .min(scaled)
            .max(self.min_explored.min(node_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_caps_large_graphs() {
        let p = SearchParams::default();
        assert_eq!(p.explore_budget(1_000_000), 1000);
        assert_eq!(p.explore_budget(1000), 500);
    }

    #[test]
    fn budget_is_exhaustive_for_small_graphs() {
        let p = SearchParams::default();
        assert_eq!(p.explore_budget(9), 9);
        assert_eq!(p.explore_budget(150), 100);
        assert_eq!(p.explore_budget(0), 0);
    }
}
