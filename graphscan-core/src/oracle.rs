//! Epsilon-neighbourhood queries.
//!
//! A [`NeighbourOracle`] answers "which points lie within eps of this one".
//! Two strategies ship with the crate: an exact linear scan and a traversal
//! of a [`ProximityGraph`]. [`compute_neighbour_lists`] runs an oracle once
//! for every point; each query only reads shared immutable data and owns its
//! output slot, so the fan-out needs no locking.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{instrument, warn};

use crate::{
    DataSource,
    error::{DbscanError, Result},
    graph::ProximityGraph,
};

/// Answers epsilon-neighbourhood queries for the points of one run.
pub trait NeighbourOracle {
    /// Returns the number of points the oracle can answer for.
    fn len(&self) -> usize;

    /// Returns whether the oracle covers no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the ids within eps of `point`, excluding `point` itself and
    /// without repeats. Order is unspecified.
    ///
    /// # Errors
    /// Fails when `point` is out of range or the distance computation fails.
    fn neighbours_within(&self, point: usize) -> Result<Vec<usize>>;
}

/// Exact oracle comparing the query with every point.
///
/// # Examples
/// ```
/// use graphscan_core::{BruteForceOracle, NeighbourOracle, PointStore};
///
/// let store = PointStore::load("line", vec![vec![0.0], vec![1.0], vec![3.0]])?;
/// let oracle = BruteForceOracle::new(&store, 1.5);
/// assert_eq!(oracle.neighbours_within(0)?, vec![1]);
/// assert!(oracle.neighbours_within(2)?.is_empty());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct BruteForceOracle<'a, D: ?Sized> {
    source: &'a D,
    eps: f32,
}

impl<'a, D: DataSource + ?Sized> BruteForceOracle<'a, D> {
    /// Creates an exact oracle over `source` with radius `eps`.
    #[must_use]
    pub fn new(source: &'a D, eps: f32) -> Self {
        Self { source, eps }
    }
}

impl<D: DataSource + ?Sized> NeighbourOracle for BruteForceOracle<'_, D> {
    fn len(&self) -> usize {
        self.source.len()
    }

    fn neighbours_within(&self, point: usize) -> Result<Vec<usize>> {
        let len = self.source.len();
        if point >= len {
            return Err(DbscanError::data_source(
                self.source.name(),
                crate::DataSourceError::OutOfRange { index: point, len },
            ));
        }

        let mut neighbours = Vec::new();
        for candidate in (0..len).filter(|&candidate| candidate != point) {
            let distance = self
                .source
                .distance(point, candidate)
                .map_err(|error| DbscanError::data_source(self.source.name(), error))?;
            if !distance.is_finite() {
                return Err(DbscanError::NonFiniteDistance {
                    left: point,
                    right: candidate,
                });
            }
            if distance < self.eps {
                neighbours.push(candidate);
            }
        }
        record_distance_evaluations(len.saturating_sub(1));
        Ok(neighbours)
    }
}

/// Approximate oracle delegating to [`ProximityGraph::range_search`].
#[derive(Debug)]
pub struct GraphOracle<'a, D: ?Sized> {
    source: &'a D,
    graph: &'a ProximityGraph,
    eps: f32,
}

impl<'a, D: DataSource + ?Sized> GraphOracle<'a, D> {
    /// Creates a graph-assisted oracle.
    ///
    /// # Errors
    /// Returns [`DbscanError::GraphSizeMismatch`] when the graph and the
    /// source cover different numbers of points.
    pub fn new(source: &'a D, graph: &'a ProximityGraph, eps: f32) -> Result<Self> {
        if graph.len() != source.len() {
            return Err(DbscanError::GraphSizeMismatch {
                data_source: source.name().into(),
                graph: graph.len(),
                items: source.len(),
            });
        }
        if !graph.is_symmetric() {
            warn!(
                data_source = source.name(),
                "proximity graph is not symmetrised; range searches may miss reverse edges"
            );
        }
        Ok(Self { source, graph, eps })
    }
}

impl<D: DataSource + ?Sized> NeighbourOracle for GraphOracle<'_, D> {
    fn len(&self) -> usize {
        self.graph.len()
    }

    fn neighbours_within(&self, point: usize) -> Result<Vec<usize>> {
        self.graph
            .range_search(self.source, point, self.eps)
            .map_err(|error| DbscanError::from_graph(self.source.name(), error))
    }
}

/// Per-point epsilon-neighbourhoods for one run, indexed by point id.
///
/// Lists never contain their own point, never repeat an id, and only
/// reference ids below [`NeighbourLists::len`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NeighbourLists {
    lists: Vec<Vec<usize>>,
}

impl NeighbourLists {
    /// Validates caller-supplied lists, e.g. ones cached from an earlier run.
    ///
    /// # Errors
    /// Returns [`DbscanError::NeighbourOutOfRange`] for ids outside the list
    /// range and [`DbscanError::InvalidNeighbourList`] for self references or
    /// repeated ids.
    ///
    /// # Examples
    /// ```
    /// use graphscan_core::{DbscanError, NeighbourLists};
    ///
    /// let lists = NeighbourLists::try_from_lists(vec![vec![1], vec![0]])?;
    /// assert_eq!(lists.get(1), Some(&[0][..]));
    ///
    /// let err = NeighbourLists::try_from_lists(vec![vec![0]]).unwrap_err();
    /// assert!(matches!(err, DbscanError::InvalidNeighbourList { point: 0, neighbour: 0 }));
    /// # Ok::<(), DbscanError>(())
    /// ```
    pub fn try_from_lists(lists: Vec<Vec<usize>>) -> Result<Self> {
        let len = lists.len();
        let mut seen = vec![usize::MAX; len];
        for (point, list) in lists.iter().enumerate() {
            for &neighbour in list {
                let Some(stamp) = seen.get_mut(neighbour) else {
                    return Err(DbscanError::NeighbourOutOfRange {
                        point,
                        neighbour,
                        len,
                    });
                };
                if neighbour == point || *stamp == point {
                    return Err(DbscanError::InvalidNeighbourList { point, neighbour });
                }
                *stamp = point;
            }
        }
        Ok(Self { lists })
    }

    pub(crate) fn from_trusted(lists: Vec<Vec<usize>>) -> Self {
        Self { lists }
    }

    /// Returns the number of points covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Returns whether no points are covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Returns the neighbours of one point.
    #[must_use]
    pub fn get(&self, point: usize) -> Option<&[usize]> {
        self.lists.get(point).map(Vec::as_slice)
    }

    /// Iterates over the lists in point order.
    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.lists.iter().map(Vec::as_slice)
    }

    /// Releases the underlying lists.
    #[must_use]
    pub fn into_inner(self) -> Vec<Vec<usize>> {
        self.lists
    }

    /// Slice access for the engine; ids are in range by construction.
    pub(crate) fn neighbours(&self, point: usize) -> &[usize] {
        self.get(point).unwrap_or_default()
    }
}

/// Runs `oracle` for every point id and collects the lists.
///
/// With `parallel` set (and the `parallel` feature compiled in) the queries
/// are spread over the rayon pool; results are identical either way.
///
/// # Errors
/// Returns the first error produced by the oracle.
#[instrument(name = "core.neighbour_lists", skip(oracle), fields(items = oracle.len()))]
pub fn compute_neighbour_lists<O>(oracle: &O, parallel: bool) -> Result<NeighbourLists>
where
    O: NeighbourOracle + Sync + ?Sized,
{
    let items = oracle.len();

    #[cfg(feature = "parallel")]
    let lists = if parallel {
        (0..items)
            .into_par_iter()
            .map(|point| oracle.neighbours_within(point))
            .collect::<Result<Vec<_>>>()?
    } else {
        sequential_lists(oracle, items)?
    };
    #[cfg(not(feature = "parallel"))]
    let lists = {
        debug_assert!(!parallel, "builder rejects parallel without the feature");
        sequential_lists(oracle, items)?
    };

    Ok(NeighbourLists::from_trusted(lists))
}

fn sequential_lists<O: NeighbourOracle + ?Sized>(oracle: &O, items: usize) -> Result<Vec<Vec<usize>>> {
    (0..items)
        .map(|point| oracle.neighbours_within(point))
        .collect()
}

#[cfg(feature = "metrics")]
fn record_distance_evaluations(count: usize) {
    metrics::counter!("graphscan_distance_evaluations").increment(count as u64);
}

#[cfg(not(feature = "metrics"))]
fn record_distance_evaluations(_count: usize) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CountingSource, line_with_outlier};
    use rstest::rstest;

    fn sorted(mut ids: Vec<usize>) -> Vec<usize> {
        ids.sort_unstable();
        ids
    }

    #[rstest]
    #[case(0, vec![1])]
    #[case(4, vec![3, 5])]
    #[case(10, vec![])]
    fn brute_force_uses_strict_radius(#[case] point: usize, #[case] expected: Vec<usize>) {
        let source = CountingSource::line(line_with_outlier());
        let oracle = BruteForceOracle::new(&source, 1.0 + f32::EPSILON);
        assert_eq!(oracle.neighbours_within(point).expect("in range"), expected);

        let strict = BruteForceOracle::new(&source, 1.0);
        assert!(strict.neighbours_within(point).expect("in range").is_empty());
    }

    #[test]
    fn brute_force_rejects_unknown_points() {
        let source = CountingSource::line(vec![0.0]);
        let err = BruteForceOracle::new(&source, 1.0)
            .neighbours_within(3)
            .expect_err("point 3 does not exist");
        assert_eq!(
            err.data_source_code(),
            Some(crate::DataSourceErrorCode::OutOfRange)
        );
    }

    #[test]
    fn brute_force_rejects_non_finite_distances() {
        let source = CountingSource::line(vec![0.0, f32::INFINITY]);
        let err = BruteForceOracle::new(&source, 1.0)
            .neighbours_within(0)
            .expect_err("infinite distance must fail");
        assert_eq!(err, DbscanError::NonFiniteDistance { left: 0, right: 1 });
    }

    #[test]
    fn graph_oracle_matches_brute_force_on_complete_graph() {
        let source = CountingSource::line(line_with_outlier());
        let rows = (0..11).map(|node| (node, (0..11).collect::<Vec<_>>()));
        let graph = ProximityGraph::from_rows(11, rows, None).expect("ids in range");
        let exact = BruteForceOracle::new(&source, 2.5);
        let approx = GraphOracle::new(&source, &graph, 2.5).expect("sizes match");
        for point in 0..11 {
            assert_eq!(
                sorted(approx.neighbours_within(point).expect("ok")),
                exact.neighbours_within(point).expect("ok"),
            );
        }
    }

    #[test]
    fn graph_oracle_rejects_size_mismatch() {
        let source = CountingSource::line(vec![0.0, 1.0]);
        let graph = ProximityGraph::with_nodes(3);
        let err = GraphOracle::new(&source, &graph, 1.0).expect_err("sizes differ");
        assert!(matches!(
            err,
            DbscanError::GraphSizeMismatch { graph: 3, items: 2, .. }
        ));
    }

    #[rstest]
    #[case::sequential(false)]
    #[cfg_attr(feature = "parallel", case::parallel(true))]
    fn compute_neighbour_lists_covers_every_point(#[case] parallel: bool) {
        let source = CountingSource::line(line_with_outlier());
        let oracle = BruteForceOracle::new(&source, 1.5);
        let lists = compute_neighbour_lists(&oracle, parallel).expect("lists");
        assert_eq!(lists.len(), 11);
        assert_eq!(lists.get(0), Some(&[1][..]));
        assert_eq!(lists.get(5), Some(&[4, 6][..]));
        assert_eq!(lists.get(10), Some(&[][..]));
    }

    #[rstest]
    #[case::out_of_range(
        vec![vec![3]],
        DbscanError::NeighbourOutOfRange { point: 0, neighbour: 3, len: 1 }
    )]
    #[case::duplicate(
        vec![vec![1, 1], vec![]],
        DbscanError::InvalidNeighbourList { point: 0, neighbour: 1 }
    )]
    #[case::self_reference(
        vec![vec![], vec![1]],
        DbscanError::InvalidNeighbourList { point: 1, neighbour: 1 }
    )]
    fn supplied_lists_are_validated(#[case] lists: Vec<Vec<usize>>, #[case] expected: DbscanError) {
        let err = NeighbourLists::try_from_lists(lists).expect_err("lists are invalid");
        assert_eq!(err, expected);
    }
}
