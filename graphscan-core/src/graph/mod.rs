//! Sparse proximity graph used as a cheap substitute for brute-force
//! neighbourhood scans.
//!
//! The graph is loaded once as directed adjacency, symmetrised so it can be
//! walked in both directions, then shared read-only by every range search of a
//! clustering run.

mod build;
mod error;
mod node;
mod search;

use std::num::NonZeroUsize;

use tracing::{debug, instrument};

use self::node::Node;

pub use self::{
    build::{EdgeShard, SHARD_SIZE, shard_of},
    error::{GraphError, GraphErrorCode},
};

/// Directed neighbour lists indexed by dense point id.
///
/// # Examples
/// ```
/// use graphscan_core::ProximityGraph;
///
/// let mut graph = ProximityGraph::with_nodes(3);
/// assert!(graph.add_edge(0, 1)?);
/// assert!(!graph.add_edge(0, 1)?, "duplicate edges are ignored");
/// assert!(!graph.add_edge(2, 2)?, "self-loops are ignored");
///
/// graph.symmetrize();
/// assert_eq!(graph.neighbours(1)?, &[0]);
/// assert_eq!(graph.edge_count(), 2);
/// # Ok::<(), graphscan_core::GraphError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProximityGraph {
    nodes: Vec<Node>,
    symmetric: bool,
}

impl ProximityGraph {
    /// Creates a graph of `node_count` nodes with no edges.
    #[must_use]
    pub fn with_nodes(node_count: usize) -> Self {
        Self {
            nodes: vec![Node::default(); node_count],
            // An edgeless graph is trivially symmetric.
            symmetric: true,
        }
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns whether every edge currently has its reverse.
    ///
    /// Set by [`ProximityGraph::symmetrize`] and cleared by any later
    /// insertion.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// Appends `to` to the neighbour list of `from`.
    ///
    /// Returns `false` when the edge already exists or `from == to`; repeated
    /// calls with the same pair leave the list unchanged.
    ///
    /// # Errors
    /// Returns [`GraphError::OutOfRange`] when either id is not a node.
    pub fn add_edge(&mut self, from: usize, to: usize) -> Result<bool, GraphError> {
        self.check_node(to)?;
        let node = self.node_mut(from)?;
        if from == to {
            return Ok(false);
        }
        let inserted = node.insert(to);
        if inserted {
            self.symmetric = false;
        }
        Ok(inserted)
    }

    /// Appends several targets to the list of `from`, honouring an optional
    /// degree cap.
    ///
    /// Targets are considered in order and the first ones accepted win; once
    /// the node holds `max_degree` neighbours the remaining targets are
    /// dropped. Returns the number of edges actually added.
    ///
    /// # Errors
    /// Returns [`GraphError::OutOfRange`] when any id is not a node. Edges
    /// accepted before the failing target remain in place.
    pub fn add_edges<I>(
        &mut self,
        from: usize,
        targets: I,
        max_degree: Option<NonZeroUsize>,
    ) -> Result<usize, GraphError>
    where
        I: IntoIterator<Item = usize>,
    {
        let node_count = self.nodes.len();
        let node = self.node_mut(from)?;
        let added = extend_node(node, from, targets, node_count, max_degree)?;
        if added > 0 {
            self.symmetric = false;
        }
        Ok(added)
    }

    /// Adds the reverse of every existing edge.
    ///
    /// Edges are snapshotted first, so edges added here are not themselves
    /// reversed again. Existing edges are never duplicated and the degree cap
    /// used at load time is not applied. Returns the number of edges added.
    #[instrument(name = "graph.symmetrize", skip(self), fields(nodes = self.nodes.len()))]
    pub fn symmetrize(&mut self) -> usize {
        let edges: Vec<(usize, usize)> = self.iter_edges().collect();
        let mut added = 0;
        for (from, to) in edges {
            if let Some(node) = self.nodes.get_mut(to) {
                if node.insert(from) {
                    added += 1;
                }
            }
        }
        self.symmetric = true;
        debug!(added, edges = self.edge_count(), "graph symmetrised");
        added
    }

    /// Returns the neighbour list of a node in insertion order.
    ///
    /// # Errors
    /// Returns [`GraphError::OutOfRange`] when `node` is not a node.
    pub fn neighbours(&self, node: usize) -> Result<&[usize], GraphError> {
        Ok(self.node(node)?.neighbours())
    }

    /// Returns the out-degree of a node.
    ///
    /// # Errors
    /// Returns [`GraphError::OutOfRange`] when `node` is not a node.
    pub fn degree(&self, node: usize) -> Result<usize, GraphError> {
        Ok(self.node(node)?.degree())
    }

    /// Returns whether the directed edge `from -> to` exists.
    #[must_use]
    pub fn contains_edge(&self, from: usize, to: usize) -> bool {
        self.nodes.get(from).is_some_and(|node| node.contains(to))
    }

    /// Counts directed edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(Node::degree).sum()
    }

    /// Iterates over directed edges in ascending source order, each source's
    /// targets in insertion order.
    pub fn iter_edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.nodes.iter().enumerate().flat_map(|(from, node)| {
            node.neighbours().iter().map(move |&to| (from, to))
        })
    }

    fn check_node(&self, node: usize) -> Result<(), GraphError> {
        self.node(node).map(|_| ())
    }

    fn node(&self, node: usize) -> Result<&Node, GraphError> {
        let node_count = self.nodes.len();
        self.nodes
            .get(node)
            .ok_or(GraphError::OutOfRange { node, node_count })
    }

    fn node_mut(&mut self, node: usize) -> Result<&mut Node, GraphError> {
        let node_count = self.nodes.len();
        self.nodes
            .get_mut(node)
            .ok_or(GraphError::OutOfRange { node, node_count })
    }
}

/// Inserts `targets` into `node`, skipping self-loops and duplicates and
/// dropping targets once `max_degree` is reached.
fn extend_node<I>(
    node: &mut Node,
    from: usize,
    targets: I,
    node_count: usize,
    max_degree: Option<NonZeroUsize>,
) -> Result<usize, GraphError>
where
    I: IntoIterator<Item = usize>,
{
    let mut added = 0;
    let mut dropped = 0;
    for to in targets {
        if to >= node_count {
            return Err(GraphError::OutOfRange {
                node: to,
                node_count,
            });
        }
        if to == from || node.contains(to) {
            continue;
        }
        if max_degree.is_some_and(|cap| node.degree() >= cap.get()) {
            dropped += 1;
            continue;
        }
        node.insert(to);
        added += 1;
    }
    if dropped > 0 {
        debug!(node = from, dropped, "degree cap dropped edges");
    }
    Ok(added)
}
