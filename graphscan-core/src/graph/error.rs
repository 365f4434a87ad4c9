//! Error types produced by the proximity graph.

use thiserror::Error;

use crate::error::{DataSourceError, define_error_codes};

/// Errors produced while building or traversing a [`super::ProximityGraph`].
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum GraphError {
    /// An edge or query referenced a node outside the graph.
    #[error("node {node} is out of range for a graph of {node_count} nodes")]
    OutOfRange {
        /// The offending node id.
        node: usize,
        /// Number of nodes in the graph.
        node_count: usize,
    },
    /// The graph and the data source disagree on the number of points.
    #[error("graph has {graph} nodes but the data source has {source_len} points")]
    SizeMismatch {
        /// Node count of the graph.
        graph: usize,
        /// Item count of the data source.
        source_len: usize,
    },
    /// A shard index does not correspond to any node range.
    #[error("shard {shard} is out of range; {node_count} nodes span {shard_count} shards")]
    ShardOutOfRange {
        /// The offending shard index.
        shard: usize,
        /// Number of shards the node range spans.
        shard_count: usize,
        /// Number of nodes in the graph.
        node_count: usize,
    },
    /// Two shards claimed the same index.
    #[error("shard {shard} was supplied more than once")]
    DuplicateShard {
        /// The repeated shard index.
        shard: usize,
    },
    /// A shard held a source node owned by another shard.
    #[error("shard {shard} contains source node {node}, which belongs to shard {owner}")]
    ShardOwnership {
        /// Shard that carried the row.
        shard: usize,
        /// Source node of the row.
        node: usize,
        /// Shard that owns the node.
        owner: usize,
    },
    /// The data source returned a non-finite distance.
    #[error("data source returned a non-finite distance for ({left}, {right})")]
    NonFiniteDistance {
        /// Query node.
        left: usize,
        /// Candidate node.
        right: usize,
    },
    /// Wrapped data source error.
    #[error("data source failure: {0}")]
    DataSource(#[from] DataSourceError),
}

define_error_codes! {
    /// Stable codes describing [`GraphError`] variants.
    enum GraphErrorCode for GraphError {
        /// An edge or query referenced a node outside the graph.
        OutOfRange => OutOfRange { .. } => "GRAPH_OUT_OF_RANGE",
        /// The graph and the data source disagree on the number of points.
        SizeMismatch => SizeMismatch { .. } => "GRAPH_SIZE_MISMATCH",
        /// A shard index does not correspond to any node range.
        ShardOutOfRange => ShardOutOfRange { .. } => "GRAPH_SHARD_OUT_OF_RANGE",
        /// Two shards claimed the same index.
        DuplicateShard => DuplicateShard { .. } => "GRAPH_DUPLICATE_SHARD",
        /// A shard held a source node owned by another shard.
        ShardOwnership => ShardOwnership { .. } => "GRAPH_SHARD_OWNERSHIP",
        /// The data source returned a non-finite distance.
        NonFiniteDistance => NonFiniteDistance { .. } => "GRAPH_NON_FINITE_DISTANCE",
        /// Wrapped data source error.
        DataSource => DataSource(..) => "GRAPH_DATA_SOURCE",
    }
}
