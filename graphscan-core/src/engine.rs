//! Cluster expansion over precomputed neighbourhoods.
//!
//! The engine never computes a distance. It receives one epsilon-neighbour
//! list per point, decides which points are core points, and floods cluster
//! ids outward from each unvisited core point using an index-driven queue.

use std::num::NonZeroUsize;

use tracing::{debug, instrument};

use crate::{
    oracle::NeighbourLists,
    point::Label,
    result::{ClusterId, ClusteringResult},
};

/// Assigns every point to a cluster or to noise.
///
/// A point is a core point when its list holds at least `min_pts` entries.
/// Points are visited in ascending id order, so cluster ids are dense and
/// follow the lowest core point of each cluster. A border point reachable
/// from several clusters joins the first one that reaches it.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
/// use graphscan_core::{NeighbourLists, expand_clusters};
///
/// // 0 - 1 - 2 chain plus an isolated point 3.
/// let lists = NeighbourLists::try_from_lists(vec![vec![1], vec![0, 2], vec![1], vec![]])?;
/// let min_pts = NonZeroUsize::new(2).expect("non-zero");
/// let result = expand_clusters(&lists, min_pts);
/// assert_eq!(result.signed_labels(), vec![0, 0, 0, -1]);
/// # Ok::<(), graphscan_core::DbscanError>(())
/// ```
#[must_use]
#[instrument(name = "core.expand", skip(lists), fields(items = lists.len(), min_pts = min_pts.get()))]
pub fn expand_clusters(lists: &NeighbourLists, min_pts: NonZeroUsize) -> ClusteringResult {
    let items = lists.len();
    let is_core = |point: usize| lists.neighbours(point).len() >= min_pts.get();

    let mut labels = vec![Label::Noise; items];
    let mut visited = vec![false; items];
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut queue: Vec<usize> = Vec::new();

    for seed in 0..items {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        if !is_core(seed) {
            continue;
        }

        let cluster = ClusterId::from_index(clusters.len());
        let mut members = vec![seed];
        labels[seed] = Label::Cluster(cluster);

        queue.clear();
        queue.extend_from_slice(lists.neighbours(seed));
        let mut cursor = 0;
        while let Some(&point) = queue.get(cursor) {
            cursor += 1;
            if !visited[point] {
                visited[point] = true;
                if is_core(point) {
                    queue.extend_from_slice(lists.neighbours(point));
                }
            }
            // Border points visited earlier as noise are still claimed here.
            if labels[point].is_noise() {
                labels[point] = Label::Cluster(cluster);
                members.push(point);
            }
        }

        debug!(cluster = cluster.get(), size = members.len(), "cluster expanded");
        clusters.push(members);
    }

    record_clusters(clusters.len());
    ClusteringResult::from_parts(labels, clusters)
}

#[cfg(feature = "metrics")]
fn record_clusters(count: usize) {
    metrics::counter!("graphscan_clusters_discovered").increment(count as u64);
}

#[cfg(not(feature = "metrics"))]
fn record_clusters(_count: usize) {}
