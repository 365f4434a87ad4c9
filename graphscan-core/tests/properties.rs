//! Property tests for the clustering invariants.

mod common;

use common::{dbscan, proptest_config, reference_neighbours, store};
use graphscan_core::{DbscanBuilder, NeighbourSearch, PointStore, ProximityGraph};
use proptest::prelude::*;
use test_strategy::Arbitrary;

/// Small two-dimensional dataset with clustering parameters.
#[derive(Clone, Debug, Arbitrary)]
struct Scenario {
    #[strategy(prop::collection::vec(prop::collection::vec(-4.0_f32..4.0, 2), 1..40))]
    rows: Vec<Vec<f32>>,
    #[strategy(0.2_f32..2.0)]
    eps: f32,
    #[strategy(1_usize..6)]
    min_pts: usize,
}

impl Scenario {
    fn store(&self) -> PointStore {
        store("scenario", self.rows.clone())
    }
}

proptest! {
    #![proptest_config(proptest_config(48))]

    #[test]
    fn every_point_is_labelled_exactly_once(scenario: Scenario) {
        let points = scenario.store();
        let result = dbscan(scenario.eps, scenario.min_pts, NeighbourSearch::BruteForce)
            .run(&points)
            .expect("run must succeed");

        prop_assert_eq!(result.len(), points.len());
        let mut seen = vec![0_usize; points.len()];
        for (cluster, members) in result.clusters().iter().enumerate() {
            prop_assert!(!members.is_empty());
            for &member in members {
                seen[member] += 1;
                let label = result.label(member).and_then(|label| label.cluster());
                prop_assert_eq!(label.map(|id| id.get()), Some(cluster as u64));
            }
        }
        for noise in result.noise() {
            seen[noise] += 1;
        }
        prop_assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn repeated_runs_are_identical(scenario: Scenario) {
        let points = scenario.store();
        let build = |parallel: bool| {
            DbscanBuilder::new()
                .with_eps(scenario.eps)
                .with_min_pts(scenario.min_pts)
                .with_neighbour_search(NeighbourSearch::BruteForce)
                .with_parallel(parallel && cfg!(feature = "parallel"))
                .build()
                .expect("valid configuration")
        };
        let first = build(false).run(&points).expect("run must succeed");
        let second = build(false).run(&points).expect("run must succeed");
        let parallel = build(true).run(&points).expect("run must succeed");
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &parallel);
    }

    #[test]
    fn core_points_share_clusters_with_core_neighbours(scenario: Scenario) {
        let points = scenario.store();
        let result = dbscan(scenario.eps, scenario.min_pts, NeighbourSearch::BruteForce)
            .run(&points)
            .expect("run must succeed");
        let neighbours = reference_neighbours(&points, scenario.eps);
        let is_core = |point: usize| neighbours[point].len() >= scenario.min_pts;

        for (point, list) in neighbours.iter().enumerate() {
            let label = result.label(point).expect("point in range");
            if is_core(point) {
                prop_assert!(!label.is_noise(), "core point {} is noise", point);
                for &other in list {
                    let other_label = result.label(other).expect("point in range");
                    prop_assert!(!other_label.is_noise());
                    if is_core(other) {
                        prop_assert_eq!(label, other_label);
                    }
                }
            } else if label.is_noise() {
                prop_assert!(list.iter().all(|&other| !is_core(other)));
            }
        }
    }

    #[test]
    fn complete_graph_matches_brute_force(scenario: Scenario) {
        let points = scenario.store();
        let count = points.len();
        let rows = (0..count).map(|node| (node, (0..count).collect::<Vec<_>>()));
        let graph = ProximityGraph::from_rows(count, rows, None).expect("ids in range");

        let exact = dbscan(scenario.eps, scenario.min_pts, NeighbourSearch::BruteForce)
            .run(&points)
            .expect("exact run");
        let approx = dbscan(scenario.eps, scenario.min_pts, NeighbourSearch::Graph)
            .run_with_graph(&points, &graph)
            .expect("graph run");
        prop_assert_eq!(exact.labels(), approx.labels());
    }

    #[test]
    fn neighbour_lists_match_reference(scenario: Scenario) {
        let points = scenario.store();
        let lists = dbscan(scenario.eps, scenario.min_pts, NeighbourSearch::BruteForce)
            .neighbour_lists(&points, None)
            .expect("lists");
        let reference = reference_neighbours(&points, scenario.eps);
        for (point, expected) in reference.iter().enumerate() {
            let mut found = lists.get(point).expect("point in range").to_vec();
            found.sort_unstable();
            prop_assert_eq!(&found, expected);
        }
    }
}
