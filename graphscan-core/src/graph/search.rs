//! Graph-bounded range search.
//!
//! Starting from the query node, the search walks graph edges breadth first
//! and keeps every reached node whose true distance to the query is below the
//! radius. Only accepted nodes are expanded further, so the cost is bounded by
//! the degrees of the accepted region rather than by the number of points.

use crate::DataSource;

use super::{GraphError, ProximityGraph};

impl ProximityGraph {
    /// Returns the ids reachable from `query` through graph edges whose
    /// distance to `query` is strictly below `radius`, excluding `query`.
    ///
    /// Results follow discovery order. Recall depends entirely on the graph:
    /// a point inside the radius that no accepted node links to is missed.
    ///
    /// # Errors
    /// Returns [`GraphError::SizeMismatch`] when `source` does not cover the
    /// graph's nodes, [`GraphError::OutOfRange`] for an unknown query,
    /// [`GraphError::NonFiniteDistance`] for NaN or infinite distances, and
    /// wraps any [`crate::DataSourceError`].
    ///
    /// # Examples
    /// ```
    /// use graphscan_core::{DataSource, DataSourceError, ProximityGraph};
    ///
    /// struct Line(Vec<f32>);
    /// impl DataSource for Line {
    ///     fn len(&self) -> usize { self.0.len() }
    ///     fn name(&self) -> &str { "line" }
    ///     fn distance(&self, i: usize, j: usize) -> Result<f32, DataSourceError> {
    ///         Ok((self.0[i] - self.0[j]).abs())
    ///     }
    /// }
    ///
    /// let source = Line(vec![0.0, 1.0, 2.0, 3.0]);
    /// let mut graph = ProximityGraph::with_nodes(4);
    /// graph.add_edge(0, 1)?;
    /// graph.add_edge(1, 2)?;
    /// graph.add_edge(2, 3)?;
    /// graph.symmetrize();
    ///
    /// let mut found = graph.range_search(&source, 3, 2.5)?;
    /// found.sort_unstable();
    /// assert_eq!(found, vec![1, 2]);
    /// # Ok::<(), graphscan_core::GraphError>(())
    /// ```
    pub fn range_search<D: DataSource + ?Sized>(
        &self,
        source: &D,
        query: usize,
        radius: f32,
    ) -> Result<Vec<usize>, GraphError> {
        let node_count = self.nodes.len();
        if source.len() != node_count {
            return Err(GraphError::SizeMismatch {
                graph: node_count,
                source_len: source.len(),
            });
        }
        self.check_node(query)?;

        let mut frontier = vec![query];
        let mut seen = vec![false; node_count];
        if let Some(flag) = seen.get_mut(query) {
            *flag = true;
        }

        let mut cursor = 0;
        let mut candidates = Vec::new();
        while let Some(&current) = frontier.get(cursor) {
            cursor += 1;
            record_expansion();

            candidates.clear();
            for &neighbour in self.node(current)?.neighbours() {
                if let Some(flag) = seen.get_mut(neighbour) {
                    if !*flag {
                        *flag = true;
                        candidates.push(neighbour);
                    }
                }
            }
            if candidates.is_empty() {
                continue;
            }

            let distances = source.batch_distances(query, &candidates)?;
            for (&candidate, &distance) in candidates.iter().zip(&distances) {
                if !distance.is_finite() {
                    return Err(GraphError::NonFiniteDistance {
                        left: query,
                        right: candidate,
                    });
                }
                if distance < radius {
                    frontier.push(candidate);
                }
            }
        }

        Ok(frontier.split_off(1))
    }
}

#[cfg(feature = "metrics")]
fn record_expansion() {
    metrics::counter!("graphscan_range_search_expansions").increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_expansion() {}
