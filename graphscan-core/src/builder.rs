//! Builder utilities for configuring DBSCAN runs.
//!
//! Exposes the neighbour search selection surface and the parameter
//! validation performed before constructing [`Dbscan`] instances.

use std::num::NonZeroUsize;

use crate::{Result, dbscan::Dbscan, error::DbscanError};

/// Selects how [`Dbscan`] answers epsilon-neighbourhood queries.
///
/// # Examples
/// ```
/// use graphscan_core::NeighbourSearch;
///
/// assert_eq!(NeighbourSearch::default(), NeighbourSearch::Auto);
/// assert!(NeighbourSearch::Auto.uses_graph(true));
/// assert!(!NeighbourSearch::Auto.uses_graph(false));
/// assert!(!NeighbourSearch::BruteForce.uses_graph(true));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NeighbourSearch {
    /// Traverse the proximity graph when one is supplied, otherwise scan.
    #[default]
    Auto,
    /// Always compare each point with every other point.
    BruteForce,
    /// Always traverse the proximity graph; a graph must be supplied.
    Graph,
}

impl NeighbourSearch {
    /// Returns whether this strategy traverses the graph given whether one
    /// was supplied.
    #[must_use]
    pub const fn uses_graph(self, graph_supplied: bool) -> bool {
        match self {
            Self::Auto => graph_supplied,
            Self::BruteForce => false,
            Self::Graph => true,
        }
    }
}

/// Configures and constructs [`Dbscan`] instances.
///
/// # Examples
/// ```
/// use graphscan_core::{DbscanBuilder, NeighbourSearch};
///
/// let dbscan = DbscanBuilder::new()
///     .with_eps(1.5)
///     .with_min_pts(2)
///     .with_neighbour_search(NeighbourSearch::BruteForce)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(dbscan.eps(), 1.5);
/// assert_eq!(dbscan.min_pts().get(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct DbscanBuilder {
    eps: f32,
    min_pts: usize,
    neighbour_search: NeighbourSearch,
    parallel: bool,
}

impl Default for DbscanBuilder {
    fn default() -> Self {
        Self {
            eps: 0.5,
            min_pts: 5,
            neighbour_search: NeighbourSearch::Auto,
            parallel: cfg!(feature = "parallel"),
        }
    }
}

impl DbscanBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use graphscan_core::{DbscanBuilder, NeighbourSearch};
    ///
    /// let builder = DbscanBuilder::new();
    /// assert_eq!(builder.eps(), 0.5);
    /// assert_eq!(builder.min_pts(), 5);
    /// assert_eq!(builder.neighbour_search(), NeighbourSearch::Auto);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the neighbourhood radius.
    #[must_use]
    pub fn with_eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    /// Returns the configured neighbourhood radius.
    #[must_use]
    pub fn eps(&self) -> f32 {
        self.eps
    }

    /// Overrides the minimum neighbour count that makes a point a core point.
    ///
    /// The count excludes the point itself.
    #[must_use]
    pub fn with_min_pts(mut self, min_pts: usize) -> Self {
        self.min_pts = min_pts;
        self
    }

    /// Returns the configured core-point threshold.
    #[must_use]
    pub fn min_pts(&self) -> usize {
        self.min_pts
    }

    /// Sets the neighbour search strategy.
    #[must_use]
    pub fn with_neighbour_search(mut self, search: NeighbourSearch) -> Self {
        self.neighbour_search = search;
        self
    }

    /// Returns the configured neighbour search strategy.
    #[must_use]
    pub fn neighbour_search(&self) -> NeighbourSearch {
        self.neighbour_search
    }

    /// Enables or disables the parallel neighbourhood phase.
    ///
    /// Defaults to `true` when the `parallel` feature is compiled in. Cluster
    /// expansion is always sequential.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Returns whether the neighbourhood phase runs in parallel.
    #[must_use]
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Validates the configuration and constructs a [`Dbscan`] instance.
    ///
    /// # Errors
    /// Returns [`DbscanError::InvalidEps`] when `eps` is not a positive
    /// finite number, [`DbscanError::InvalidMinPts`] when `min_pts` is zero,
    /// and [`DbscanError::ParallelUnavailable`] when parallelism is requested
    /// without the `parallel` feature.
    ///
    /// # Examples
    /// ```
    /// use graphscan_core::{DbscanBuilder, DbscanErrorCode};
    ///
    /// let err = DbscanBuilder::new().with_eps(0.0).build().unwrap_err();
    /// assert_eq!(err.code(), DbscanErrorCode::InvalidEps);
    /// ```
    pub fn build(self) -> Result<Dbscan> {
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(DbscanError::InvalidEps { got: self.eps });
        }
        let min_pts = NonZeroUsize::new(self.min_pts)
            .ok_or(DbscanError::InvalidMinPts { got: self.min_pts })?;
        if self.parallel && !cfg!(feature = "parallel") {
            return Err(DbscanError::ParallelUnavailable);
        }

        Ok(Dbscan::new(
            self.eps,
            min_pts,
            self.neighbour_search,
            self.parallel,
        ))
    }
}
