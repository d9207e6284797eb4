//! End-to-end exploitability triage of one provenance graph

use std::time::Instant;

use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::classify::SinkTier;
use crate::error::Result;
use crate::estimator::{EstimatorConfig, MonteCarloEstimator, Rating};
use crate::graph::ProvenanceGraph;
use crate::metrics::{GraphMetrics, SanitizerCensus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageReport {
    pub count_nodes: usize,
    pub longest_path: usize,
    pub count_leaves: usize,
    pub count_controllable_leaves: usize,
    pub count_implicit: usize,
    pub implicit: Vec<String>,
    pub count_explicit: usize,
    pub explicit: Vec<String>,
    pub count_access: usize,
    pub object_access: Vec<String>,
    pub operations: usize,
    pub sink: SinkTier,
    pub result: TriageResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageResult {
    pub score: f64,
    pub rating: Rating,
    pub analysis_time_sec: f64,
}

impl TriageReport {
    fn new(metrics: &GraphMetrics, result: TriageResult) -> Self {
        let census = &metrics.census;
        Self {
            count_nodes: metrics.node_count,
            longest_path: metrics.longest_path.length,
            count_leaves: metrics.leaf_ids.len(),
            count_controllable_leaves: metrics.controllable_leaf_ids.len(),
            count_implicit: census.implicit.len(),
            implicit: SanitizerCensus::unique(&census.implicit),
            count_explicit: census.explicit.len(),
            explicit: SanitizerCensus::unique(&census.explicit),
            count_access: census.object_access.len(),
            object_access: SanitizerCensus::unique(&census.object_access),
            operations: census.total_operations,
            sink: metrics.sink_tier,
            result,
        }
    }
}

/// Computes the graph metrics, then estimates exploitability with `rng`.
///
/// Only the simulation is timed.
pub fn triage<R: Rng>(
    graph: &ProvenanceGraph,
    config: EstimatorConfig,
    rng: R,
) -> Result<TriageReport> {
    let metrics = GraphMetrics::compute(graph)?;

    let started = Instant::now();
    let estimate = MonteCarloEstimator::new(config, rng).estimate(graph, &metrics)?;
    let analysis_time_sec = started.elapsed().as_secs_f64();

    info!(
        score = estimate.score,
        rating = estimate.rating.as_str(),
        analysis_time_sec,
        "triage complete"
    );

    Ok(TriageReport::new(
        &metrics,
        TriageResult {
            score: estimate.score,
            rating: estimate.rating,
            analysis_time_sec,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TriageError;
    use crate::graph::ProvenanceNode;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn eval_graph() -> ProvenanceGraph {
        ProvenanceGraph::new([
            ProvenanceNode::new(1, "call:eval", vec![2]),
            ProvenanceNode::new(2, "+", vec![3, 4]),
            ProvenanceNode::new(3, "object.GetField", vec![5]),
            ProvenanceNode::new(4, "object.GetField", vec![5]),
            ProvenanceNode::new(5, "model:set_taint", vec![6]),
            ProvenanceNode::new(6, "Tainted", vec![]),
        ])
        .unwrap()
    }

    #[test]
    fn report_collects_metrics() {
        let report = triage(
            &eval_graph(),
            EstimatorConfig::default(),
            StdRng::seed_from_u64(3),
        )
        .unwrap();

        assert_eq!(report.count_nodes, 6);
        assert_eq!(report.longest_path, 5);
        assert_eq!(report.count_leaves, 1);
        assert_eq!(report.count_controllable_leaves, 1);
        assert_eq!(report.count_access, 2);
        assert_eq!(report.object_access, vec!["object.GetField"]);
        assert_eq!(report.operations, 6);
        assert_eq!(report.sink, SinkTier::T2);
        assert!(report.result.analysis_time_sec >= 0.0);
    }

    #[test]
    fn report_serializes_with_camel_case_keys() {
        let report = triage(
            &eval_graph(),
            EstimatorConfig::default(),
            StdRng::seed_from_u64(3),
        )
        .unwrap();
        let json = serde_json::to_value(&report).unwrap();

        for key in [
            "countNodes",
            "longestPath",
            "countLeaves",
            "countControllableLeaves",
            "countImplicit",
            "implicit",
            "countExplicit",
            "explicit",
            "countAccess",
            "objectAccess",
            "operations",
            "sink",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["sink"], "t2");
        assert!(json["result"].get("analysisTimeSec").is_some());
    }

    #[test]
    fn unknown_sink_aborts_triage() {
        let graph = ProvenanceGraph::new([
            ProvenanceNode::new(1, "call:fetch", vec![2]),
            ProvenanceNode::new(2, "Tainted", vec![]),
        ])
        .unwrap();
        let err = triage(&graph, EstimatorConfig::default(), StdRng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(
            err,
            TriageError::UnknownSink {
                operation: "call:fetch".into()
            }
        );
    }
}
