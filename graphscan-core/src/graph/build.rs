//! Bulk construction of proximity graphs.
//!
//! Sharded edge sources are merged in parallel: every shard owns a disjoint,
//! contiguous block of [`SHARD_SIZE`] source nodes, so each worker writes only
//! to its own block of the node vector. Symmetrisation touches arbitrary
//! nodes and therefore runs once, sequentially, after all shards land.

use std::num::NonZeroUsize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, instrument};

use crate::DataSource;

use super::{GraphError, ProximityGraph, extend_node, node::Node};

/// Number of consecutive source ids stored per shard file.
pub const SHARD_SIZE: usize = 1000;

/// Returns the shard that owns `node`.
///
/// # Examples
/// ```
/// use graphscan_core::shard_of;
///
/// assert_eq!(shard_of(0), 0);
/// assert_eq!(shard_of(999), 0);
/// assert_eq!(shard_of(1000), 1);
/// ```
#[must_use]
pub const fn shard_of(node: usize) -> usize {
    node / SHARD_SIZE
}

/// Adjacency rows read from one shard of a sharded edge source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeShard {
    index: usize,
    rows: Vec<(usize, Vec<usize>)>,
}

impl EdgeShard {
    /// Creates a shard from its index and `(source, targets)` rows.
    #[must_use]
    pub fn new(index: usize, rows: Vec<(usize, Vec<usize>)>) -> Self {
        Self { index, rows }
    }

    /// Returns the shard index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the rows in file order.
    #[must_use]
    pub fn rows(&self) -> &[(usize, Vec<usize>)] {
        &self.rows
    }
}

impl ProximityGraph {
    /// Builds a graph from `(source, targets)` rows, applying the optional
    /// degree cap per source, then symmetrises it.
    ///
    /// # Errors
    /// Returns [`GraphError::OutOfRange`] when any id is not below
    /// `node_count`.
    ///
    /// # Examples
    /// ```
    /// use std::num::NonZeroUsize;
    /// use graphscan_core::ProximityGraph;
    ///
    /// let rows = vec![(0, vec![1, 2, 3]), (2, vec![3])];
    /// let graph = ProximityGraph::from_rows(4, rows, NonZeroUsize::new(2))?;
    /// assert_eq!(graph.neighbours(0)?, &[1, 2]);
    /// assert!(graph.contains_edge(1, 0));
    /// assert!(graph.is_symmetric());
    /// # Ok::<(), graphscan_core::GraphError>(())
    /// ```
    pub fn from_rows<I>(
        node_count: usize,
        rows: I,
        max_degree: Option<NonZeroUsize>,
    ) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (usize, Vec<usize>)>,
    {
        let mut graph = Self::with_nodes(node_count);
        for (source, targets) in rows {
            graph.add_edges(source, targets, max_degree)?;
        }
        graph.symmetrize();
        Ok(graph)
    }

    /// Merges sharded adjacency rows into one graph, then symmetrises it.
    ///
    /// Shard `s` may only carry source nodes in
    /// `s * SHARD_SIZE .. (s + 1) * SHARD_SIZE`. Missing shards simply
    /// contribute no edges.
    ///
    /// # Errors
    /// Returns [`GraphError::ShardOutOfRange`], [`GraphError::DuplicateShard`]
    /// or [`GraphError::ShardOwnership`] for inconsistent sharding and
    /// [`GraphError::OutOfRange`] for targets outside the graph.
    #[instrument(name = "graph.from_shards", skip(shards), fields(shards = shards.len()))]
    pub fn from_shards(
        node_count: usize,
        shards: Vec<EdgeShard>,
        max_degree: Option<NonZeroUsize>,
    ) -> Result<Self, GraphError> {
        let shard_count = node_count.div_ceil(SHARD_SIZE);
        let mut by_index: Vec<Option<EdgeShard>> = vec![None; shard_count];
        for shard in shards {
            let slot = by_index
                .get_mut(shard.index)
                .ok_or(GraphError::ShardOutOfRange {
                    shard: shard.index,
                    shard_count,
                    node_count,
                })?;
            if slot.is_some() {
                return Err(GraphError::DuplicateShard { shard: shard.index });
            }
            *slot = Some(shard);
        }

        let mut graph = Self::with_nodes(node_count);
        fill_blocks(&mut graph.nodes, by_index, max_degree)?;
        let reversed = graph.symmetrize();
        info!(
            nodes = node_count,
            edges = graph.edge_count(),
            reversed,
            "sharded graph assembled"
        );
        Ok(graph)
    }

    /// Builds a directed k-nearest-neighbour graph by exhaustive search.
    ///
    /// Each node links to its `k` closest other nodes, ties broken by the
    /// lower id. Call [`ProximityGraph::symmetrize`] before range searches.
    ///
    /// # Errors
    /// Returns [`GraphError::NonFiniteDistance`] for NaN or infinite distances
    /// and wraps any [`crate::DataSourceError`].
    #[instrument(name = "graph.knn", skip(source, k), fields(items = source.len(), k = k.get()))]
    pub fn knn_from_source<D: DataSource + Sync + ?Sized>(
        source: &D,
        k: NonZeroUsize,
    ) -> Result<Self, GraphError> {
        let items = source.len();
        let candidates: Vec<usize> = (0..items).collect();
        let build = |query: usize| nearest(source, query, &candidates, k.get());

        #[cfg(feature = "parallel")]
        let nodes = candidates
            .par_iter()
            .map(|&query| build(query))
            .collect::<Result<Vec<_>, GraphError>>()?;
        #[cfg(not(feature = "parallel"))]
        let nodes = candidates
            .iter()
            .map(|&query| build(query))
            .collect::<Result<Vec<_>, GraphError>>()?;

        let symmetric = items <= 1;
        Ok(Self { nodes, symmetric })
    }
}

fn nearest<D: DataSource + ?Sized>(
    source: &D,
    query: usize,
    candidates: &[usize],
    k: usize,
) -> Result<Node, GraphError> {
    let distances = source.batch_distances(query, candidates)?;
    let mut ranked = Vec::with_capacity(candidates.len().saturating_sub(1));
    for (&candidate, &distance) in candidates.iter().zip(&distances) {
        if candidate == query {
            continue;
        }
        if !distance.is_finite() {
            return Err(GraphError::NonFiniteDistance {
                left: query,
                right: candidate,
            });
        }
        ranked.push((distance, candidate));
    }
    ranked.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    ranked.truncate(k);
    Ok(Node::from_ordered(
        ranked.into_iter().map(|(_, id)| id).collect(),
    ))
}

fn fill_blocks(
    nodes: &mut [Node],
    shards: Vec<Option<EdgeShard>>,
    max_degree: Option<NonZeroUsize>,
) -> Result<(), GraphError> {
    let node_count = nodes.len();
    let fill = |(index, (block, shard)): (usize, (&mut [Node], Option<EdgeShard>))| {
        shard.map_or(Ok(()), |shard| {
            fill_block(block, index, &shard, node_count, max_degree)
        })
    };

    #[cfg(feature = "parallel")]
    let outcome = nodes
        .par_chunks_mut(SHARD_SIZE)
        .zip(shards.into_par_iter())
        .enumerate()
        .try_for_each(fill);
    #[cfg(not(feature = "parallel"))]
    let outcome = nodes
        .chunks_mut(SHARD_SIZE)
        .zip(shards)
        .enumerate()
        .try_for_each(fill);
    outcome
}

fn fill_block(
    block: &mut [Node],
    shard: usize,
    rows: &EdgeShard,
    node_count: usize,
    max_degree: Option<NonZeroUsize>,
) -> Result<(), GraphError> {
    let base = shard * SHARD_SIZE;
    for (source, targets) in rows.rows() {
        let owner = shard_of(*source);
        let node = block
            .get_mut(source.wrapping_sub(base))
            .filter(|_| owner == shard);
        let Some(node) = node else {
            if *source >= node_count {
                return Err(GraphError::OutOfRange {
                    node: *source,
                    node_count,
                });
            }
            return Err(GraphError::ShardOwnership {
                shard,
                node: *source,
                owner,
            });
        };
        extend_node(node, *source, targets.iter().copied(), node_count, max_degree)?;
    }
    Ok(())
}
