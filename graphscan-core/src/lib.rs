//! Graphscan core library: DBSCAN clustering with exact or
//! proximity-graph-assisted neighbourhood search.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod datasource;
mod dbscan;
mod distance;
mod engine;
mod error;
mod graph;
mod oracle;
mod point;
mod quality;
mod result;

#[cfg(test)]
mod test_utils;

pub use crate::{
    builder::{DbscanBuilder, NeighbourSearch},
    datasource::DataSource,
    dbscan::Dbscan,
    distance::{DistanceError, VectorKind, euclidean_distance},
    engine::expand_clusters,
    error::{DataSourceError, DataSourceErrorCode, DbscanError, DbscanErrorCode, Result},
    graph::{EdgeShard, GraphError, GraphErrorCode, ProximityGraph, SHARD_SIZE, shard_of},
    oracle::{
        BruteForceOracle, GraphOracle, NeighbourLists, NeighbourOracle, compute_neighbour_lists,
    },
    point::{Label, Point, PointStore},
    quality::{QualityError, adjusted_rand_index, neighbour_recall},
    result::{ClusterId, ClusteringResult, NonContiguousClusterIds},
};
