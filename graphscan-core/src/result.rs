//! Result types for clustering operations.
//!
//! A [`ClusteringResult`] carries both views of a finished run: the per-point
//! labels indexed by point id, and the member lists indexed by cluster id.

use thiserror::Error;

use crate::point::Label;

/// Identifier assigned to a cluster, allocated from zero in discovery order.
///
/// # Examples
/// ```
/// use graphscan_core::ClusterId;
///
/// let id = ClusterId::new(4);
/// assert_eq!(id.get(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(u64);

impl ClusterId {
    /// Creates a new cluster identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Returns the underlying numeric identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u64)
    }

    fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

/// Error returned when labels reference cluster ids that are not contiguous
/// from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NonContiguousClusterIds {
    /// The labels use clusters but skip an identifier.
    #[error("cluster identifier {missing} is unused but a higher one is present")]
    Gap {
        /// First identifier with no members.
        missing: u64,
    },
    /// A cluster identifier does not fit the host pointer width.
    #[error("cluster identifier {id} exceeds the host pointer width")]
    Overflow {
        /// The oversized identifier.
        id: u64,
    },
}

/// Output of a clustering run.
///
/// # Examples
/// ```
/// use graphscan_core::{ClusterId, ClusteringResult, Label};
///
/// let c0 = Label::Cluster(ClusterId::new(0));
/// let result = ClusteringResult::try_from_labels(vec![c0, Label::Noise, c0])
///     .expect("labels are contiguous");
/// assert_eq!(result.cluster_count(), 1);
/// assert_eq!(result.cluster(ClusterId::new(0)), Some(&[0, 2][..]));
/// assert_eq!(result.noise().collect::<Vec<_>>(), vec![1]);
/// assert_eq!(result.signed_labels(), vec![0, -1, 0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusteringResult {
    labels: Vec<Label>,
    clusters: Vec<Vec<usize>>,
}

impl ClusteringResult {
    /// Trusted constructor used by the engine, whose labels and member lists
    /// agree by construction.
    pub(crate) fn from_parts(labels: Vec<Label>, clusters: Vec<Vec<usize>>) -> Self {
        debug_assert_eq!(
            clusters.iter().map(Vec::len).sum::<usize>(),
            labels.iter().filter(|label| !label.is_noise()).count(),
            "every labelled point must appear in exactly one cluster",
        );
        Self { labels, clusters }
    }

    /// Rebuilds a result from flat per-point labels.
    ///
    /// Member lists are produced in ascending point-id order. An empty label
    /// vector, or one holding only noise, yields zero clusters.
    ///
    /// # Errors
    /// Returns [`NonContiguousClusterIds::Gap`] when some cluster id below the
    /// maximum has no members and [`NonContiguousClusterIds::Overflow`] when
    /// an id cannot index memory on this host. An id at or beyond the number
    /// of labels always leaves a gap, which is reported before any storage is
    /// allocated for it.
    pub fn try_from_labels(labels: Vec<Label>) -> Result<Self, NonContiguousClusterIds> {
        let mut clusters: Vec<Vec<usize>> = Vec::new();
        for (point, label) in labels.iter().enumerate() {
            let Some(id) = label.cluster() else {
                continue;
            };
            let index = id
                .index()
                .ok_or(NonContiguousClusterIds::Overflow { id: id.get() })?;
            if index >= labels.len() {
                return Err(NonContiguousClusterIds::Gap {
                    missing: first_unused_id(&labels),
                });
            }
            if clusters.len() <= index {
                clusters.resize_with(index + 1, Vec::new);
            }
            if let Some(members) = clusters.get_mut(index) {
                members.push(point);
            }
        }

        if let Some(missing) = clusters.iter().position(Vec::is_empty) {
            return Err(NonContiguousClusterIds::Gap {
                missing: missing as u64,
            });
        }

        Ok(Self { labels, clusters })
    }

    /// Returns the label of every point, indexed by point id.
    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Returns the label of one point.
    #[must_use]
    pub fn label(&self, point: usize) -> Option<Label> {
        self.labels.get(point).copied()
    }

    /// Returns the labels rendered as `-1` for noise or the cluster id.
    #[must_use]
    pub fn signed_labels(&self) -> Vec<i64> {
        self.labels.iter().map(|label| label.as_signed()).collect()
    }

    /// Returns every cluster's members, indexed by cluster id.
    #[must_use]
    pub fn clusters(&self) -> &[Vec<usize>] {
        &self.clusters
    }

    /// Returns the members of one cluster.
    #[must_use]
    pub fn cluster(&self, id: ClusterId) -> Option<&[usize]> {
        id.index()
            .and_then(|index| self.clusters.get(index))
            .map(Vec::as_slice)
    }

    /// Returns the size of each cluster in cluster-id order.
    #[must_use]
    pub fn cluster_sizes(&self) -> Vec<usize> {
        self.clusters.iter().map(Vec::len).collect()
    }

    /// Counts the clusters discovered.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Iterates over the ids of noise points in ascending order.
    pub fn noise(&self) -> impl Iterator<Item = usize> + '_ {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(point, label)| label.is_noise().then_some(point))
    }

    /// Counts the noise points.
    #[must_use]
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|label| label.is_noise()).count()
    }

    /// Returns the number of points covered by the result.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns whether the result covers no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Smallest cluster id no label refers to. `n` labels use at most `n` ids, so
/// one below `labels.len()` is free whenever some id reaches that far.
fn first_unused_id(labels: &[Label]) -> u64 {
    let mut used = vec![false; labels.len()];
    for index in labels.iter().filter_map(|label| label.cluster()?.index()) {
        if let Some(slot) = used.get_mut(index) {
            *slot = true;
        }
    }
    let missing = used.iter().position(|used| !used).unwrap_or(labels.len());
    missing as u64
}
