//! Deterministic point sets used by scenario tests across the workspace.
//!
//! Every generator is seeded, so two calls with the same arguments return
//! identical coordinates on every platform.

use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Eleven one-dimensional points at `0, 1, ..., 9` and `100`.
///
/// With `eps = 1.5` and `min_pts = 2` the first ten form one cluster and the
/// last is noise.
///
/// # Examples
/// ```
/// let rows = graphscan_test_support::datasets::line_with_outlier();
/// assert_eq!(rows.len(), 11);
/// assert_eq!(rows[10], vec![100.0]);
/// ```
#[must_use]
pub fn line_with_outlier() -> Vec<Vec<f32>> {
    (0..10_u8)
        .map(f32::from)
        .chain(std::iter::once(100.0))
        .map(|x| vec![x])
        .collect()
}

/// Grid of `count` two-dimensional points filled row-major with `columns`
/// points per row, each shifted by uniform jitter in `[-jitter, jitter)`.
#[must_use]
pub fn jittered_grid(
    seed: u64,
    origin: [f32; 2],
    columns: usize,
    count: usize,
    spacing: f32,
    jitter: f32,
) -> Vec<Vec<f32>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let columns = columns.max(1);
    (0..count)
        .map(|index| {
            let (row, column) = (index / columns, index % columns);
            let x = origin[0] + column as f32 * spacing + rng.gen_range(-jitter..jitter);
            let y = origin[1] + row as f32 * spacing + rng.gen_range(-jitter..jitter);
            vec![x, y]
        })
        .collect()
}

/// Points of [`two_blobs`] together with the blob each belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelledBlobs {
    /// Coordinates in id order: the first blob, then the second.
    pub points: Vec<Vec<f32>>,
    /// Blob index (`0` or `1`) for every point.
    pub truth: Vec<usize>,
}

/// Two dense, well separated blobs of 100 and 99 points.
///
/// Neighbouring points sit about `0.05` apart inside a blob and the blobs are
/// several units apart, so `eps = 0.2` with `min_pts = 5` recovers exactly
/// the two blobs with no noise.
#[must_use]
pub fn two_blobs() -> LabelledBlobs {
    let first = jittered_grid(7, [0.0, 0.0], 10, 100, 0.05, 0.01);
    let second = jittered_grid(11, [5.0, 5.0], 10, 99, 0.05, 0.01);
    let truth = std::iter::repeat_n(0, first.len())
        .chain(std::iter::repeat_n(1, second.len()))
        .collect();
    let mut points = first;
    points.extend(second);
    LabelledBlobs { points, truth }
}

/// `count` points drawn uniformly from `[0, extent)` in every dimension.
#[must_use]
pub fn uniform_cloud(seed: u64, count: usize, dimension: usize, extent: f32) -> Vec<Vec<f32>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..dimension).map(|_| rng.gen_range(0.0..extent)).collect())
        .collect()
}
