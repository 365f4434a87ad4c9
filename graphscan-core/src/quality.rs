//! Agreement metrics between two runs over the same points.
//!
//! Used to judge how far a graph-assisted run drifts from the exact
//! brute-force run: the Adjusted Rand Index (ARI) compares the final
//! partitions and neighbour recall compares the intermediate
//! epsilon-neighbourhoods.

use std::collections::{HashMap, HashSet};

use crate::{oracle::NeighbourLists, point::Label};

/// Errors raised while computing quality metrics.
#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum QualityError {
    /// The two inputs covered different numbers of points.
    #[error("length mismatch: reference={reference_len}, candidate={candidate_len}")]
    LengthMismatch {
        /// Number of points in the reference input.
        reference_len: usize,
        /// Number of points in the candidate input.
        candidate_len: usize,
    },
}

/// Partition key for a label. Each noise point forms its own singleton group,
/// so two noise points are never counted as agreeing on a shared cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Group {
    Noise(usize),
    Cluster(u64),
}

fn group(point: usize, label: Label) -> Group {
    label
        .cluster()
        .map_or(Group::Noise(point), |id| Group::Cluster(id.get()))
}

type GroupCounts = HashMap<Group, usize>;
type PairCounts = HashMap<(Group, Group), usize>;

const fn validate_lengths(reference: usize, candidate: usize) -> Result<usize, QualityError> {
    if reference != candidate {
        return Err(QualityError::LengthMismatch {
            reference_len: reference,
            candidate_len: candidate,
        });
    }
    Ok(reference)
}

fn build_contingency_table(
    reference: &[Label],
    candidate: &[Label],
) -> (GroupCounts, GroupCounts, PairCounts) {
    let mut reference_counts = GroupCounts::new();
    let mut candidate_counts = GroupCounts::new();
    let mut contingency = PairCounts::new();

    for (point, (&left, &right)) in reference.iter().zip(candidate).enumerate() {
        let left = group(point, left);
        let right = group(point, right);
        *reference_counts.entry(left).or_insert(0) += 1;
        *candidate_counts.entry(right).or_insert(0) += 1;
        *contingency.entry((left, right)).or_insert(0) += 1;
    }

    (reference_counts, candidate_counts, contingency)
}

#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "pair counting requires floating-point arithmetic."
)]
fn comb2(value: usize) -> f64 {
    let as_float = value as f64;
    as_float * (as_float - 1.0) / 2.0
}

/// Computes the Adjusted Rand Index between two labellings.
///
/// Returns `1.0` for identical partitions (including relabelled cluster ids)
/// and values near `0.0` for unrelated ones. Inputs with fewer than two
/// points score `1.0`.
///
/// # Errors
/// Returns [`QualityError::LengthMismatch`] when the labellings differ in
/// length.
///
/// # Examples
/// ```
/// use graphscan_core::{ClusterId, Label, adjusted_rand_index};
///
/// let a = Label::Cluster(ClusterId::new(0));
/// let b = Label::Cluster(ClusterId::new(1));
/// let ari = adjusted_rand_index(&[a, a, b, b], &[b, b, a, a])?;
/// assert!((ari - 1.0).abs() < 1e-12);
/// # Ok::<(), graphscan_core::QualityError>(())
/// ```
#[expect(
    clippy::float_arithmetic,
    reason = "ARI definition requires floating-point arithmetic."
)]
pub fn adjusted_rand_index(reference: &[Label], candidate: &[Label]) -> Result<f64, QualityError> {
    let item_count = validate_lengths(reference.len(), candidate.len())?;
    if item_count < 2 {
        return Ok(1.0);
    }
    let (reference_counts, candidate_counts, contingency) =
        build_contingency_table(reference, candidate);

    let sum_pair_counts: f64 = contingency.values().copied().map(comb2).sum();
    let sum_reference: f64 = reference_counts.values().copied().map(comb2).sum();
    let sum_candidate: f64 = candidate_counts.values().copied().map(comb2).sum();
    let total = comb2(item_count);

    let expected = (sum_reference * sum_candidate) / total;
    let max_index = 0.5 * (sum_reference + sum_candidate);
    let denominator = max_index - expected;
    if denominator == 0.0 {
        Ok(1.0)
    } else {
        Ok((sum_pair_counts - expected) / denominator)
    }
}

/// Fraction of the reference neighbour pairs that the candidate also found.
///
/// Typically the reference comes from a brute-force run and the candidate
/// from a graph-assisted one over the same points and eps. Returns `1.0`
/// when the reference holds no pairs at all.
///
/// # Errors
/// Returns [`QualityError::LengthMismatch`] when the lists cover different
/// numbers of points.
#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "recall is a ratio of counts."
)]
pub fn neighbour_recall(
    reference: &NeighbourLists,
    candidate: &NeighbourLists,
) -> Result<f64, QualityError> {
    validate_lengths(reference.len(), candidate.len())?;
    let mut expected = 0_usize;
    let mut found = 0_usize;
    for (exact, approx) in reference.iter().zip(candidate.iter()) {
        let approx: HashSet<usize> = approx.iter().copied().collect();
        expected += exact.len();
        found += exact.iter().filter(|id| approx.contains(id)).count();
    }
    if expected == 0 {
        return Ok(1.0);
    }
    Ok(found as f64 / expected as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ClusterId;
    use rstest::rstest;

    const A: Label = Label::Cluster(ClusterId::new(0));
    const B: Label = Label::Cluster(ClusterId::new(1));
    const N: Label = Label::Noise;

    #[rstest]
    #[case::identical(vec![A, A, B, B], vec![A, A, B, B], 1.0)]
    #[case::relabelled(vec![A, A, B, B], vec![B, B, A, A], 1.0)]
    #[case::single_point(vec![A], vec![N], 1.0)]
    #[case::all_noise(vec![N, N, N], vec![N, N, N], 1.0)]
    fn ari_recognises_equivalent_partitions(
        #[case] reference: Vec<Label>,
        #[case] candidate: Vec<Label>,
        #[case] expected: f64,
    ) {
        let ari = adjusted_rand_index(&reference, &candidate).expect("lengths match");
        assert!((ari - expected).abs() < 1e-12, "ari = {ari}");
    }

    #[test]
    fn ari_penalises_merged_clusters() {
        let ari = adjusted_rand_index(&[A, A, B, B], &[A, A, A, A]).expect("lengths match");
        assert!(ari < 0.5, "ari = {ari}");
    }

    #[test]
    fn ari_rejects_length_mismatch() {
        let err = adjusted_rand_index(&[A], &[A, B]).expect_err("lengths differ");
        assert_eq!(
            err,
            QualityError::LengthMismatch {
                reference_len: 1,
                candidate_len: 2
            }
        );
    }

    #[test]
    fn recall_counts_found_pairs() {
        let exact = NeighbourLists::try_from_lists(vec![vec![1, 2], vec![0], vec![0]])
            .expect("valid lists");
        let approx =
            NeighbourLists::try_from_lists(vec![vec![2], vec![0], vec![]]).expect("valid lists");
        let recall = neighbour_recall(&exact, &approx).expect("lengths match");
        assert!((recall - 0.5).abs() < 1e-12, "recall = {recall}");
    }

    #[test]
    fn recall_of_empty_reference_is_perfect() {
        let exact = NeighbourLists::try_from_lists(vec![vec![], vec![]]).expect("valid lists");
        let recall = neighbour_recall(&exact, &exact).expect("lengths match");
        assert!((recall - 1.0).abs() < 1e-12);
    }
}
