use terrainpath::{NodeKey, SearchParams, Terrain, TerrainParams};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let seed: u32 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(42);
    let width: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(64);
    let height: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(48);
    let detail: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(1.0);
    let start: NodeKey = args
        .get(5)
        .and_then(|s| s.parse().ok())
        .unwrap_or(NodeKey::new(0, 0));
    let end: NodeKey = args.get(6).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
        NodeKey::new(width.saturating_sub(1) as i32, height.saturating_sub(1) as i32)
    });

    tracing::info!(width, height, seed, detail, %start, %end, "planning route");

    let terrain = Terrain {
        width,
        height,
        seed,
        detail,
    };
    let (plan, timings) = terrainpath::plan(
        &terrain,
        start,
        end,
        &TerrainParams::default(),
        &SearchParams::default(),
    );

    eprintln!("\nTimings:");
    for t in &timings {
        eprintln!("  {:20} {:8.1} ms", t.name, t.ms);
    }

    let result = &plan.result;
    if result.path_exists {
        eprintln!(
            "\nPath {} -> {}: {} nodes, cost {:.3} ({} graph nodes)",
            start,
            end,
            result.path.len(),
            result.distance,
            plan.graph.len()
        );
        let keys: Vec<String> = result.path.iter().map(NodeKey::to_string).collect();
        println!("{}", keys.join(" "));
    } else {
        eprintln!("\nNo path found from {} to {}", start, end);
        std::process::exit(1);
    }
}
