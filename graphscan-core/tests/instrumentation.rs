//! Span and event assertions for the public entry points.

mod common;

use common::{Line, dbscan};
use graphscan_core::{DbscanError, EdgeShard, NeighbourSearch, ProximityGraph};
use graphscan_test_support::recording::RecordingLayer;
use rstest::rstest;
use tracing::Level;

#[rstest]
fn run_records_core_spans() {
    let line = Line(vec![0.0, 1.0, 2.0, 10.0]);
    let dbscan = dbscan(1.5, 1, NeighbourSearch::BruteForce);
    let (result, layer) = RecordingLayer::capture(|| dbscan.run(&line));
    let result = result.expect("run must succeed");
    assert_eq!(result.cluster_count(), 1);

    let run = layer.span("core.run").expect("core.run span must exist");
    assert_eq!(run.field("data_source"), Some("line"));
    assert_eq!(run.field("items"), Some("4"));
    assert_eq!(run.field("min_pts"), Some("1"));
    assert_eq!(run.field("strategy"), Some("BruteForce"));

    let lists = layer
        .span("core.neighbour_lists")
        .expect("core.neighbour_lists span must exist");
    assert_eq!(lists.field("items"), Some("4"));
    assert!(layer.span("core.expand").is_some());

    let completed = layer
        .events()
        .into_iter()
        .find(|event| event.message() == Some("clustering completed"))
        .expect("completion event must exist");
    assert_eq!(completed.level, Level::INFO);
    assert_eq!(completed.field("clusters"), Some("1"));
    assert_eq!(completed.field("noise"), Some("1"));
}

#[rstest]
fn empty_source_logs_warning() {
    let dbscan = dbscan(1.0, 2, NeighbourSearch::Auto);
    let (result, layer) = RecordingLayer::capture(|| dbscan.run(&Line(Vec::new())));
    assert!(matches!(result, Err(DbscanError::EmptySource { .. })));
    assert!(layer.has_event(Level::WARN, "data source is empty, returning error"));
    let run = layer.span("core.run").expect("core.run span must exist");
    assert_eq!(run.field("items"), Some("0"));
}

#[rstest]
fn isolated_points_log_warning() {
    let dbscan = dbscan(0.5, 1, NeighbourSearch::BruteForce);
    let (result, layer) = RecordingLayer::capture(|| dbscan.run(&Line(vec![0.0, 5.0, 10.0])));
    assert_eq!(result.expect("run must succeed").noise_count(), 3);
    assert!(layer.has_event(
        Level::WARN,
        "no point has any neighbour within eps; every point will be noise"
    ));
}

#[rstest]
fn unsymmetrised_graph_logs_warning() {
    let line = Line(vec![0.0, 1.0]);
    let mut graph = ProximityGraph::with_nodes(2);
    graph.add_edge(0, 1).expect("in range");
    let dbscan = dbscan(1.5, 1, NeighbourSearch::Graph);
    let (result, layer) = RecordingLayer::capture(|| dbscan.run_with_graph(&line, &graph));
    result.expect("run must succeed");
    assert!(layer.has_event(
        Level::WARN,
        "proximity graph is not symmetrised; range searches may miss reverse edges"
    ));
}

#[rstest]
fn shard_merge_records_graph_spans() {
    let shards = vec![EdgeShard::new(0, vec![(0, vec![1, 2])])];
    let (graph, layer) = RecordingLayer::capture(|| ProximityGraph::from_shards(3, shards, None));
    let graph = graph.expect("valid shards");
    assert_eq!(graph.edge_count(), 4);

    let merge = layer
        .span("graph.from_shards")
        .expect("graph.from_shards span must exist");
    assert_eq!(merge.field("shards"), Some("1"));
    assert!(layer.span("graph.symmetrize").is_some());

    let assembled = layer
        .events()
        .into_iter()
        .find(|event| event.message() == Some("sharded graph assembled"))
        .expect("assembly event must exist");
    assert_eq!(assembled.field("reversed"), Some("2"));
}
