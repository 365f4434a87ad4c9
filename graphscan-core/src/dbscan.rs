//! DBSCAN run orchestration.
//!
//! A run has two phases. The neighbourhood phase asks a
//! [`NeighbourOracle`] for every point's epsilon-neighbours and may run in
//! parallel. The expansion phase turns those lists into clusters and is
//! strictly sequential. Hosts that want to interrupt between the phases call
//! [`Dbscan::neighbour_lists`] and [`Dbscan::run_with_neighbours`]
//! separately.

use std::{num::NonZeroUsize, sync::Arc};

use tracing::{info, instrument, warn};

use crate::{
    Result,
    builder::NeighbourSearch,
    datasource::DataSource,
    engine::expand_clusters,
    error::DbscanError,
    graph::ProximityGraph,
    oracle::{BruteForceOracle, GraphOracle, NeighbourLists, compute_neighbour_lists},
    point::PointStore,
    result::ClusteringResult,
};

/// Entry point for running density-based clustering.
///
/// # Examples
/// ```
/// use graphscan_core::{DbscanBuilder, PointStore};
///
/// let rows = [0.0_f32, 1.0, 2.0, 3.0, 50.0]
///     .into_iter()
///     .map(|x| vec![x])
///     .collect();
/// let store = PointStore::load("line", rows)?;
/// let dbscan = DbscanBuilder::new()
///     .with_eps(1.5)
///     .with_min_pts(2)
///     .build()?;
/// let result = dbscan.run(&store)?;
/// assert_eq!(result.signed_labels(), vec![0, 0, 0, 0, -1]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Dbscan {
    eps: f32,
    min_pts: NonZeroUsize,
    neighbour_search: NeighbourSearch,
    parallel: bool,
}

impl Dbscan {
    pub(crate) fn new(
        eps: f32,
        min_pts: NonZeroUsize,
        neighbour_search: NeighbourSearch,
        parallel: bool,
    ) -> Self {
        Self {
            eps,
            min_pts,
            neighbour_search,
            parallel,
        }
    }

    /// Returns the neighbourhood radius.
    #[must_use]
    pub fn eps(&self) -> f32 {
        self.eps
    }

    /// Returns the core-point threshold.
    #[must_use]
    pub fn min_pts(&self) -> NonZeroUsize {
        self.min_pts
    }

    /// Returns the neighbour search strategy.
    #[must_use]
    pub fn neighbour_search(&self) -> NeighbourSearch {
        self.neighbour_search
    }

    /// Returns whether the neighbourhood phase runs in parallel.
    #[must_use]
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Clusters `source` without a proximity graph.
    ///
    /// # Errors
    /// Returns [`DbscanError::EmptySource`] for an empty source,
    /// [`DbscanError::GraphRequired`] when the strategy is
    /// [`NeighbourSearch::Graph`], and any error raised while computing
    /// distances.
    pub fn run<D: DataSource + Sync + ?Sized>(&self, source: &D) -> Result<ClusteringResult> {
        self.run_inner(source, None)
    }

    /// Clusters `source`, traversing `graph` unless the strategy is
    /// [`NeighbourSearch::BruteForce`].
    ///
    /// # Errors
    /// As [`Dbscan::run`], plus [`DbscanError::GraphSizeMismatch`] when the
    /// graph does not cover the source's points.
    pub fn run_with_graph<D: DataSource + Sync + ?Sized>(
        &self,
        source: &D,
        graph: &ProximityGraph,
    ) -> Result<ClusteringResult> {
        self.run_inner(source, Some(graph))
    }

    /// Computes only the neighbourhood phase.
    ///
    /// # Errors
    /// As [`Dbscan::run_with_graph`].
    #[instrument(
        name = "core.neighbours",
        err,
        skip(self, source, graph),
        fields(
            data_source = %source.name(),
            items = source.len(),
            eps = self.eps,
            graph = graph.is_some(),
        ),
    )]
    pub fn neighbour_lists<D: DataSource + Sync + ?Sized>(
        &self,
        source: &D,
        graph: Option<&ProximityGraph>,
    ) -> Result<NeighbourLists> {
        if source.is_empty() {
            warn!(
                data_source = source.name(),
                "data source is empty, returning error"
            );
            return Err(DbscanError::EmptySource {
                data_source: Arc::from(source.name()),
            });
        }

        let lists = if self.neighbour_search.uses_graph(graph.is_some()) {
            let graph = graph.ok_or(DbscanError::GraphRequired)?;
            let oracle = GraphOracle::new(source, graph, self.eps)?;
            compute_neighbour_lists(&oracle, self.parallel)?
        } else {
            let oracle = BruteForceOracle::new(source, self.eps);
            compute_neighbour_lists(&oracle, self.parallel)?
        };

        if lists.len() > 1 && lists.iter().all(<[usize]>::is_empty) {
            warn!(
                data_source = source.name(),
                eps = self.eps,
                "no point has any neighbour within eps; every point will be noise"
            );
        }
        Ok(lists)
    }

    /// Runs the expansion phase over previously computed lists.
    ///
    /// # Errors
    /// Returns [`DbscanError::EmptySource`] when `lists` is empty.
    #[instrument(
        name = "core.expand_lists",
        err,
        skip(self, lists),
        fields(items = lists.len(), min_pts = self.min_pts.get()),
    )]
    pub fn run_with_neighbours(&self, lists: &NeighbourLists) -> Result<ClusteringResult> {
        if lists.is_empty() {
            return Err(DbscanError::EmptySource {
                data_source: Arc::from("neighbour lists"),
            });
        }
        Ok(expand_clusters(lists, self.min_pts))
    }

    /// Clusters a [`PointStore`] and writes the labels back into it.
    ///
    /// # Errors
    /// As [`Dbscan::run_with_graph`]. The store's labels are untouched when
    /// the run fails.
    pub fn run_store(
        &self,
        store: &mut PointStore,
        graph: Option<&ProximityGraph>,
    ) -> Result<ClusteringResult> {
        let result = self.run_inner(&*store, graph)?;
        store
            .apply(&result)
            .map_err(|error| DbscanError::data_source(store.name(), error))?;
        Ok(result)
    }

    #[instrument(
        name = "core.run",
        err,
        skip(self, source, graph),
        fields(
            data_source = %source.name(),
            items = source.len(),
            eps = self.eps,
            min_pts = self.min_pts.get(),
            strategy = ?self.neighbour_search,
            parallel = self.parallel,
        ),
    )]
    fn run_inner<D: DataSource + Sync + ?Sized>(
        &self,
        source: &D,
        graph: Option<&ProximityGraph>,
    ) -> Result<ClusteringResult> {
        let lists = self.neighbour_lists(source, graph)?;
        let result = expand_clusters(&lists, self.min_pts);
        info!(
            clusters = result.cluster_count(),
            noise = result.noise_count(),
            "clustering completed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DbscanBuilder, DbscanErrorCode,
        test_utils::{CountingSource, line_with_outlier},
    };
    use rstest::{fixture, rstest};

    #[fixture]
    fn line() -> CountingSource {
        CountingSource::line(line_with_outlier())
    }

    fn dbscan(search: NeighbourSearch) -> Dbscan {
        DbscanBuilder::new()
            .with_eps(1.5)
            .with_min_pts(2)
            .with_neighbour_search(search)
            .build()
            .expect("configuration is valid")
    }

    #[rstest]
    fn empty_source_is_rejected() {
        let err = dbscan(NeighbourSearch::Auto)
            .run(&CountingSource::line(Vec::new()))
            .expect_err("empty source must fail");
        assert_eq!(err.code(), DbscanErrorCode::EmptySource);
    }

    #[rstest]
    fn graph_strategy_requires_a_graph(line: CountingSource) {
        let err = dbscan(NeighbourSearch::Graph)
            .run(&line)
            .expect_err("no graph supplied");
        assert_eq!(err, DbscanError::GraphRequired);
    }

    #[rstest]
    fn brute_force_ignores_supplied_graph(line: CountingSource) {
        let edgeless = ProximityGraph::with_nodes(line.len());
        let result = dbscan(NeighbourSearch::BruteForce)
            .run_with_graph(&line, &edgeless)
            .expect("run must succeed");
        assert_eq!(result.cluster_count(), 1);
    }

    #[rstest]
    fn auto_uses_supplied_graph(line: CountingSource) {
        let edgeless = ProximityGraph::with_nodes(line.len());
        let result = dbscan(NeighbourSearch::Auto)
            .run_with_graph(&line, &edgeless)
            .expect("run must succeed");
        assert_eq!(result.cluster_count(), 0, "an edgeless graph finds nothing");
    }

    #[rstest]
    fn graph_size_mismatch_is_reported(line: CountingSource) {
        let graph = ProximityGraph::with_nodes(3);
        let err = dbscan(NeighbourSearch::Graph)
            .run_with_graph(&line, &graph)
            .expect_err("sizes differ");
        assert_eq!(err.code(), DbscanErrorCode::GraphSizeMismatch);
    }

    #[rstest]
    fn phases_compose_to_a_full_run(line: CountingSource) {
        let dbscan = dbscan(NeighbourSearch::BruteForce);
        let lists = dbscan.neighbour_lists(&line, None).expect("lists");
        let staged = dbscan.run_with_neighbours(&lists).expect("expansion");
        assert_eq!(staged, dbscan.run(&line).expect("run"));
    }

    #[test]
    fn run_with_neighbours_rejects_empty_lists() {
        let err = dbscan(NeighbourSearch::Auto)
            .run_with_neighbours(&NeighbourLists::default())
            .expect_err("nothing to cluster");
        assert_eq!(err.code(), DbscanErrorCode::EmptySource);
    }

    #[test]
    fn run_store_writes_labels_back() {
        let rows = line_with_outlier().into_iter().map(|x| vec![x]).collect();
        let mut store = PointStore::load("line", rows).expect("valid rows");
        let result = dbscan(NeighbourSearch::Auto)
            .run_store(&mut store, None)
            .expect("run must succeed");
        let stored: Vec<_> = store.labels().collect();
        assert_eq!(stored, result.labels());
        assert!(stored.last().is_some_and(|label| label.is_noise()));
    }
}
