//! Point storage and per-point cluster labels.
//!
//! [`PointStore`] owns the loaded coordinates for one run. Point ids are the
//! dense range `0..len()`, so every per-point structure in the crate is a
//! plain vector indexed by id.

use core::fmt;

use tracing::debug;

use crate::{
    datasource::DataSource,
    distance::{DistanceError, VectorKind, euclidean_distance},
    error::DataSourceError,
    result::{ClusterId, ClusteringResult},
};

/// Cluster membership of a single point.
///
/// Every point starts as [`Label::Noise`]; the clustering engine assigns a
/// cluster at most once.
///
/// # Examples
/// ```
/// use graphscan_core::{ClusterId, Label};
///
/// assert_eq!(Label::Noise.as_signed(), -1);
/// assert_eq!(Label::Cluster(ClusterId::new(3)).as_signed(), 3);
/// assert_eq!(Label::default(), Label::Noise);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Label {
    /// The point belongs to no cluster (yet).
    #[default]
    Noise,
    /// The point belongs to the given cluster.
    Cluster(ClusterId),
}

impl Label {
    /// Signed value used for noise in serialised label files.
    pub const NOISE_VALUE: i64 = -1;

    /// Returns whether the point is unclaimed.
    #[must_use]
    pub const fn is_noise(self) -> bool {
        matches!(self, Self::Noise)
    }

    /// Returns the cluster id, if any.
    #[must_use]
    pub const fn cluster(self) -> Option<ClusterId> {
        match self {
            Self::Noise => None,
            Self::Cluster(id) => Some(id),
        }
    }

    /// Renders the label as `-1` for noise or the cluster id otherwise.
    ///
    /// Ids above `i64::MAX` saturate to `i64::MAX`; the engine allocates ids
    /// from point indices and never produces them.
    #[must_use]
    pub fn as_signed(self) -> i64 {
        match self {
            Self::Noise => Self::NOISE_VALUE,
            Self::Cluster(id) => i64::try_from(id.get()).unwrap_or(i64::MAX),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_signed())
    }
}

/// A loaded point: its id, coordinates, and current label.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    id: usize,
    coordinates: Vec<f32>,
    label: Label,
}

impl Point {
    /// Returns the dense id of the point.
    #[must_use]
    #[rustfmt::skip]
    pub fn id(&self) -> usize { self.id }

    /// Returns the coordinate vector.
    #[must_use]
    #[rustfmt::skip]
    pub fn coordinates(&self) -> &[f32] { &self.coordinates }

    /// Returns the current cluster label.
    #[must_use]
    #[rustfmt::skip]
    pub fn label(&self) -> Label { self.label }
}

/// Fixed-size collection of points addressed by dense id.
///
/// # Examples
/// ```
/// use graphscan_core::{ClusterId, DataSource, Label, PointStore};
///
/// let mut store = PointStore::load("demo", vec![vec![0.0, 0.0], vec![3.0, 4.0]])?;
/// assert_eq!(store.len(), 2);
/// assert_eq!(store.distance(0, 1)?, 5.0);
/// assert_eq!(store.get(1)?.label(), Label::Noise);
///
/// store.set_label(1, Label::Cluster(ClusterId::new(0)))?;
/// assert_eq!(store.get(1)?.label().as_signed(), 0);
/// assert!(store.get(2).is_err());
/// # Ok::<(), graphscan_core::DataSourceError>(())
/// ```
#[derive(Clone, Debug)]
pub struct PointStore {
    name: String,
    dimension: usize,
    points: Vec<Point>,
}

impl PointStore {
    /// Wraps coordinate rows into points whose ids are their row indices.
    ///
    /// # Errors
    /// Returns [`DataSourceError::EmptyData`] for no rows,
    /// [`DataSourceError::ZeroDimension`] for empty rows,
    /// [`DataSourceError::DimensionMismatch`] when rows differ in length, and
    /// [`DataSourceError::NonFiniteCoordinate`] for NaN or infinite values.
    pub fn load(name: impl Into<String>, rows: Vec<Vec<f32>>) -> Result<Self, DataSourceError> {
        let dimension = validate_rows(rows.iter().enumerate().map(|(id, row)| (id, row.as_slice())))?;
        let points = rows
            .into_iter()
            .enumerate()
            .map(|(id, coordinates)| Point {
                id,
                coordinates,
                label: Label::Noise,
            })
            .collect();
        Ok(Self {
            name: name.into(),
            dimension,
            points,
        })
    }

    /// Builds a store from `(id, coordinates)` records in any order.
    ///
    /// The ids must be a permutation of `0..records.len()`.
    ///
    /// # Errors
    /// Returns [`DataSourceError::OutOfRange`] for an id at or beyond the
    /// record count and [`DataSourceError::DuplicateId`] for a repeated id,
    /// plus every error documented on [`PointStore::load`].
    pub fn try_from_records(
        name: impl Into<String>,
        records: Vec<(usize, Vec<f32>)>,
    ) -> Result<Self, DataSourceError> {
        let len = records.len();
        let mut slots: Vec<Option<Vec<f32>>> = vec![None; len];
        for (id, coordinates) in records {
            let slot = slots
                .get_mut(id)
                .ok_or(DataSourceError::OutOfRange { index: id, len })?;
            if slot.is_some() {
                return Err(DataSourceError::DuplicateId { id });
            }
            *slot = Some(coordinates);
        }

        // `len` distinct ids below `len` fill every slot.
        let rows: Vec<Vec<f32>> = slots.into_iter().flatten().collect();
        debug_assert_eq!(rows.len(), len);
        debug!(records = len, "remapped records onto dense ids");
        Self::load(name, rows)
    }

    /// Returns the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns whether the store holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the shared dimensionality of every point.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns all points in id order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Returns the point with the given id.
    ///
    /// # Errors
    /// Returns [`DataSourceError::OutOfRange`] when `id >= len()`.
    pub fn get(&self, id: usize) -> Result<&Point, DataSourceError> {
        self.points.get(id).ok_or(DataSourceError::OutOfRange {
            index: id,
            len: self.points.len(),
        })
    }

    /// Overwrites the label of one point.
    ///
    /// # Errors
    /// Returns [`DataSourceError::OutOfRange`] when `id >= len()`.
    pub fn set_label(&mut self, id: usize, label: Label) -> Result<(), DataSourceError> {
        let len = self.points.len();
        let point = self
            .points
            .get_mut(id)
            .ok_or(DataSourceError::OutOfRange { index: id, len })?;
        point.label = label;
        Ok(())
    }

    /// Returns every label in id order.
    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.points.iter().map(Point::label)
    }

    /// Copies the labels of a finished run onto the points.
    ///
    /// # Errors
    /// Returns [`DataSourceError::LengthMismatch`] when the result covers a
    /// different number of points than the store.
    pub fn apply(&mut self, result: &ClusteringResult) -> Result<(), DataSourceError> {
        if result.labels().len() != self.points.len() {
            return Err(DataSourceError::LengthMismatch {
                expected: self.points.len(),
                actual: result.labels().len(),
            });
        }
        for (point, label) in self.points.iter_mut().zip(result.labels()) {
            point.label = *label;
        }
        Ok(())
    }

    /// Returns every point to [`Label::Noise`].
    pub fn reset_labels(&mut self) {
        for point in &mut self.points {
            point.label = Label::Noise;
        }
    }
}

impl DataSource for PointStore {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn distance(&self, i: usize, j: usize) -> Result<f32, DataSourceError> {
        let left = self.get(i)?;
        let right = self.get(j)?;
        euclidean_distance(&left.coordinates, &right.coordinates).map_err(|error| match error {
            DistanceError::DimensionMismatch { left, right } => {
                DataSourceError::DimensionMismatch { left, right }
            }
            DistanceError::ZeroLength => DataSourceError::ZeroDimension,
            DistanceError::NonFinite { which, index, .. } => {
                DataSourceError::NonFiniteCoordinate {
                    id: match which {
                        VectorKind::Left => i,
                        VectorKind::Right => j,
                    },
                    position: index,
                }
            }
        })
    }
}

fn validate_rows<'a>(
    rows: impl Iterator<Item = (usize, &'a [f32])>,
) -> Result<usize, DataSourceError> {
    let mut dimension = None;
    for (id, row) in rows {
        let expected = *dimension.get_or_insert(row.len());
        if expected == 0 {
            return Err(DataSourceError::ZeroDimension);
        }
        if row.len() != expected {
            return Err(DataSourceError::DimensionMismatch {
                left: expected,
                right: row.len(),
            });
        }
        if let Some(position) = row.iter().position(|value| !value.is_finite()) {
            return Err(DataSourceError::NonFiniteCoordinate { id, position });
        }
    }
    dimension.ok_or(DataSourceError::EmptyData)
}
