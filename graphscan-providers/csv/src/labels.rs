//! Cluster label output.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use graphscan_core::ClusteringResult;
use tracing::instrument;

use crate::errors::CsvProviderError;

/// Header line of a label file.
pub const LABEL_HEADER: &str = "cluster_id";

/// Writes the header then one signed label per point in id order; noise is
/// `-1`.
///
/// # Errors
/// Returns [`CsvProviderError::Io`] when the file cannot be written.
#[instrument(name = "csv.write_labels", skip(result, path), fields(path = %path.display(), items = result.len()), err)]
pub fn write_labels(result: &ClusteringResult, path: &Path) -> Result<(), CsvProviderError> {
    let file = File::create(path).map_err(|source| CsvProviderError::io(path, source))?;
    write_labels_to(result, BufWriter::new(file))
        .map_err(|source| CsvProviderError::io(path, source))
}

/// Streams the label file format into any writer.
///
/// # Errors
/// Propagates write failures.
///
/// # Examples
/// ```
/// use graphscan_core::{ClusterId, ClusteringResult, Label};
/// use graphscan_providers_csv::write_labels_to;
///
/// let c0 = Label::Cluster(ClusterId::new(0));
/// let result = ClusteringResult::try_from_labels(vec![c0, Label::Noise, c0])
///     .expect("labels are contiguous");
/// let mut out = Vec::new();
/// write_labels_to(&result, &mut out)?;
/// assert_eq!(String::from_utf8_lossy(&out), "cluster_id\n0\n-1\n0\n");
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn write_labels_to<W: Write>(result: &ClusteringResult, mut writer: W) -> std::io::Result<()> {
    writeln!(writer, "{LABEL_HEADER}")?;
    for label in result.labels() {
        writeln!(writer, "{label}")?;
    }
    writer.flush()
}
