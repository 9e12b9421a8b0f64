use crate::core::config::DetectionConfig;
use crate::core::edge::Edge;
use crate::error::DetectionError;
use crate::graph::builder::Graph;
use crate::graph::cycle_detection::detect_cycles;
use crate::graph::shell::detect_shell_accounts;
use crate::graph::smurfing::detect_smurfing;
use crate::result::{build_output, DetectionResult};
use crate::scoring::guard::filter_false_positives;
use crate::scoring::scorer::score_accounts;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Run the full detection pipeline over an already-validated edge list.
///
/// Strictly sequential except for the cycle-detection stage, which runs
/// on a blocking worker under a wall-clock deadline
/// (`config.cycle_detection_deadline_secs`); on timeout the ring set is
/// simply empty and every other stage still runs to completion.
pub async fn run(
    edges: Vec<Edge>,
    config: DetectionConfig,
    include_graph: bool,
) -> Result<DetectionResult, DetectionError> {
    let start = Instant::now();

    let graph = Arc::new(Graph::build(edges));
    let config = Arc::new(config);
    log::info!(
        "graph built: {} nodes, {} transactions",
        graph.node_count(),
        graph.transaction_count()
    );

    let rings = {
        let graph = graph.clone();
        let config = config.clone();
        let deadline = Duration::from_secs(config.cycle_detection_deadline_secs);
        match tokio::time::timeout(
            deadline,
            tokio::task::spawn_blocking(move || detect_cycles(&graph, &config)),
        )
        .await
        {
            Ok(Ok(rings)) => rings,
            Ok(Err(join_err)) => {
                log::warn!("cycle detection task failed: {join_err}");
                Vec::new()
            }
            Err(_) => {
                log::warn!(
                    "cycle detection exceeded {}s deadline; continuing with no rings",
                    deadline.as_secs()
                );
                Vec::new()
            }
        }
    };

    let smurfing = detect_smurfing(&graph, &config);
    let shell = detect_shell_accounts(&graph, &config);
    let scored = score_accounts(&graph, &rings, &smurfing, &shell, &config);
    let retained = filter_false_positives(scored, &graph, &config);

    let processing_time_seconds = start.elapsed().as_secs_f64();
    let result = build_output(&graph, retained, &rings, processing_time_seconds, include_graph);

    log::info!(
        "pipeline complete in {:.3}s: {} suspicious accounts, {} rings",
        processing_time_seconds,
        result.suspicious_accounts.len(),
        result.fraud_rings.len()
    );

    Ok(result)
}
