//! Error types for the graphscan core library.
//!
//! Defines error enums exposed by the public API, their stable codes, and a
//! convenient result alias.

use std::sync::Arc;

use thiserror::Error;

use crate::graph::GraphError;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl ::core::fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

pub(crate) use define_error_codes;

/// An error produced by [`crate::DataSource`] operations and point loading.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DataSourceError {
    /// Requested point id was outside `[0, len)`.
    #[error("point id {index} is out of range for {len} points")]
    OutOfRange {
        /// The requested id.
        index: usize,
        /// Number of points held by the source.
        len: usize,
    },
    /// Compared vectors had different dimensions.
    #[error("dimension mismatch: left={left}, right={right}")]
    DimensionMismatch {
        /// Dimensionality of the left-hand vector.
        left: usize,
        /// Dimensionality of the right-hand vector.
        right: usize,
    },
    /// Data source contained no rows.
    #[error("data source contains no rows")]
    EmptyData,
    /// Data source rows must have positive dimension.
    #[error("data source vectors must have positive dimension")]
    ZeroDimension,
    /// A coordinate was NaN or infinite.
    #[error("point {id} has a non-finite coordinate at position {position}")]
    NonFiniteCoordinate {
        /// Point carrying the offending value.
        id: usize,
        /// Position of the value within the coordinate vector.
        position: usize,
    },
    /// Two records claimed the same id.
    #[error("point id {id} appears more than once")]
    DuplicateId {
        /// The repeated id.
        id: usize,
    },
    /// A clustering result covered a different number of points than the
    /// store it was applied to.
    #[error("result covers {actual} points but the store holds {expected}")]
    LengthMismatch {
        /// Number of points in the store.
        expected: usize,
        /// Number of labels in the result.
        actual: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`DataSourceError`] variants.
    enum DataSourceErrorCode for DataSourceError {
        /// Requested point id was outside the source's range.
        OutOfRange => OutOfRange { .. } => "DATA_SOURCE_OUT_OF_RANGE",
        /// Compared vectors had different dimensions.
        DimensionMismatch => DimensionMismatch { .. } => "DATA_SOURCE_DIMENSION_MISMATCH",
        /// Data source contained no rows.
        EmptyData => EmptyData => "DATA_SOURCE_EMPTY",
        /// Data source rows must have positive dimension.
        ZeroDimension => ZeroDimension => "DATA_SOURCE_ZERO_DIMENSION",
        /// A coordinate was NaN or infinite.
        NonFiniteCoordinate => NonFiniteCoordinate { .. } => "DATA_SOURCE_NON_FINITE_COORDINATE",
        /// Two records claimed the same id.
        DuplicateId => DuplicateId { .. } => "DATA_SOURCE_DUPLICATE_ID",
        /// A result and a store disagreed on the number of points.
        LengthMismatch => LengthMismatch { .. } => "DATA_SOURCE_LENGTH_MISMATCH",
    }
}

/// Error type produced when configuring or running [`crate::Dbscan`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DbscanError {
    /// Epsilon must be a positive finite radius.
    #[error("eps must be positive and finite (got {got})")]
    InvalidEps {
        /// The rejected radius.
        got: f32,
    },
    /// `min_pts` must be greater than zero.
    #[error("min_pts must be at least 1 (got {got})")]
    InvalidMinPts {
        /// The rejected threshold.
        got: usize,
    },
    /// Parallel neighbour search was requested but not compiled in.
    #[error("parallel neighbour search is not available in this build")]
    ParallelUnavailable,
    /// The supplied [`crate::DataSource`] contained no items.
    #[error("data source `{data_source}` contains no items")]
    EmptySource {
        /// Identifier for the empty data source.
        data_source: Arc<str>,
    },
    /// Graph-assisted search was requested without a proximity graph.
    #[error("graph-assisted neighbour search requires a proximity graph")]
    GraphRequired,
    /// The proximity graph does not cover the same points as the source.
    #[error("proximity graph has {graph} nodes but data source `{data_source}` has {items} items")]
    GraphSizeMismatch {
        /// Identifier for the data source.
        data_source: Arc<str>,
        /// Node count of the graph.
        graph: usize,
        /// Item count of the data source.
        items: usize,
    },
    /// A supplied neighbour list referenced an id outside the point range.
    #[error("neighbour list of point {point} references id {neighbour} but only {len} points exist")]
    NeighbourOutOfRange {
        /// Owner of the offending list.
        point: usize,
        /// The invalid neighbour id.
        neighbour: usize,
        /// Number of points covered by the lists.
        len: usize,
    },
    /// A supplied neighbour list contained its own point or repeated an id.
    #[error("neighbour list of point {point} contains {neighbour} more than once or includes itself")]
    InvalidNeighbourList {
        /// Owner of the offending list.
        point: usize,
        /// The duplicated or self-referencing id.
        neighbour: usize,
    },
    /// The data source returned NaN or an infinite distance.
    #[error("data source returned a non-finite distance for ({left}, {right})")]
    NonFiniteDistance {
        /// Query point.
        left: usize,
        /// Candidate point.
        right: usize,
    },
    /// A [`crate::DataSource`] operation failed while running the algorithm.
    #[error("data source `{data_source}` failed: {error}")]
    DataSource {
        /// Identifier for the data source that produced the error.
        data_source: Arc<str>,
        #[source]
        /// Underlying data source error bubbled up by the algorithm.
        error: DataSourceError,
    },
    /// Proximity graph traversal failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

define_error_codes! {
    /// Stable codes describing [`DbscanError`] variants.
    enum DbscanErrorCode for DbscanError {
        /// Epsilon must be a positive finite radius.
        InvalidEps => InvalidEps { .. } => "DBSCAN_INVALID_EPS",
        /// `min_pts` must be greater than zero.
        InvalidMinPts => InvalidMinPts { .. } => "DBSCAN_INVALID_MIN_PTS",
        /// Parallel neighbour search was requested but not compiled in.
        ParallelUnavailable => ParallelUnavailable => "DBSCAN_PARALLEL_UNAVAILABLE",
        /// The supplied data source contained no items.
        EmptySource => EmptySource { .. } => "DBSCAN_EMPTY_SOURCE",
        /// Graph-assisted search was requested without a proximity graph.
        GraphRequired => GraphRequired => "DBSCAN_GRAPH_REQUIRED",
        /// The proximity graph does not cover the same points as the source.
        GraphSizeMismatch => GraphSizeMismatch { .. } => "DBSCAN_GRAPH_SIZE_MISMATCH",
        /// A supplied neighbour list referenced an out-of-range id.
        NeighbourOutOfRange => NeighbourOutOfRange { .. } => "DBSCAN_NEIGHBOUR_OUT_OF_RANGE",
        /// A supplied neighbour list contained a duplicate or self reference.
        InvalidNeighbourList => InvalidNeighbourList { .. } => "DBSCAN_INVALID_NEIGHBOUR_LIST",
        /// The data source returned a non-finite distance.
        NonFiniteDistance => NonFiniteDistance { .. } => "DBSCAN_NON_FINITE_DISTANCE",
        /// A data source operation failed while running the algorithm.
        DataSourceFailure => DataSource { .. } => "DBSCAN_DATA_SOURCE_FAILURE",
        /// Proximity graph traversal failed.
        GraphFailure => Graph(..) => "DBSCAN_GRAPH_FAILURE",
    }
}

impl DbscanError {
    /// Retrieve the inner [`DataSourceErrorCode`] when the error originated in a [`crate::DataSource`].
    #[must_use]
    pub const fn data_source_code(&self) -> Option<DataSourceErrorCode> {
        match self {
            Self::DataSource { error, .. } => Some(error.code()),
            _ => None,
        }
    }

    pub(crate) fn data_source(name: &str, error: DataSourceError) -> Self {
        Self::DataSource {
            data_source: Arc::from(name),
            error,
        }
    }

    /// Lifts a graph failure, unwrapping data source errors so callers see
    /// one variant for them regardless of the search strategy.
    pub(crate) fn from_graph(name: &str, error: GraphError) -> Self {
        match error {
            GraphError::DataSource(error) => Self::data_source(name, error),
            GraphError::NonFiniteDistance { left, right } => {
                Self::NonFiniteDistance { left, right }
            }
            other => Self::Graph(other),
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, DbscanError>;
