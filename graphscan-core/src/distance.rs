//! Euclidean distance over fixed-dimension coordinate vectors.
//!
//! The routine validates its inputs and surfaces detailed errors so loaders
//! can reject bad rows before clustering starts.

use core::fmt;

use thiserror::Error;

/// Identifies whether an error was produced while inspecting the left or right
/// vector argument.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VectorKind {
    /// Value originating from the first argument.
    Left,
    /// Value originating from the second argument.
    Right,
}

impl fmt::Display for VectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// Errors emitted while computing distances.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DistanceError {
    /// Either input vector had zero length.
    #[error("vectors must have positive dimension")]
    ZeroLength,
    /// Input vectors had different lengths.
    #[error("dimension mismatch: left={left}, right={right}")]
    DimensionMismatch {
        /// Length of the left vector.
        left: usize,
        /// Length of the right vector.
        right: usize,
    },
    /// Encountered a non-finite value in one of the vectors.
    #[error("{which} vector contains a non-finite value at index {index}: {value}")]
    NonFinite {
        /// Vector holding the value.
        which: VectorKind,
        /// Position of the value.
        index: usize,
        /// The offending value.
        value: f32,
    },
}

/// Computes the Euclidean distance between two vectors.
///
/// Squared differences are accumulated in `f64` so long vectors do not lose
/// precision before the final square root.
///
/// # Examples
///
/// ```
/// use graphscan_core::{euclidean_distance, DistanceError};
///
/// fn main() -> Result<(), DistanceError> {
///     let distance = euclidean_distance(&[1.0, 2.0, 3.0], &[4.0, 6.0, 8.0])?;
///     assert!((distance - 7.071_068).abs() < 1e-6);
///     Ok(())
/// }
/// ```
///
/// # Errors
///
/// - [`DistanceError::ZeroLength`] when any input is empty.
/// - [`DistanceError::DimensionMismatch`] when input lengths differ.
/// - [`DistanceError::NonFinite`] when a value is NaN or infinite.
pub fn euclidean_distance(left: &[f32], right: &[f32]) -> Result<f32, DistanceError> {
    if left.is_empty() || right.is_empty() {
        return Err(DistanceError::ZeroLength);
    }
    if left.len() != right.len() {
        return Err(DistanceError::DimensionMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    let mut sum = 0.0f64;
    for (index, (&l, &r)) in left.iter().zip(right.iter()).enumerate() {
        ensure_finite(l, VectorKind::Left, index)?;
        ensure_finite(r, VectorKind::Right, index)?;

        let diff = f64::from(l) - f64::from(r);
        sum += diff * diff;
    }

    Ok(sum.sqrt() as f32)
}

fn ensure_finite(value: f32, which: VectorKind, index: usize) -> Result<(), DistanceError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DistanceError::NonFinite {
            which,
            index,
            value,
        })
    }
}
