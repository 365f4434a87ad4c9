//! Point dataset loader.
//!
//! One record per line, fields separated by commas. Blank lines are ignored.
//! Ids are either the record's position or an explicit first column.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use graphscan_core::PointStore;
use tracing::{debug, instrument};

use crate::errors::CsvProviderError;

/// Layout options for dataset files.
///
/// # Examples
/// ```
/// use graphscan_providers_csv::PointsFormat;
///
/// let format = PointsFormat::default().with_id_column(true);
/// assert!(format.id_column());
/// assert!(!format.skip_header());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointsFormat {
    id_column: bool,
    skip_header: bool,
}

impl PointsFormat {
    /// Treats the first field of each record as the point id.
    #[must_use]
    pub const fn with_id_column(mut self, id_column: bool) -> Self {
        self.id_column = id_column;
        self
    }

    /// Skips the first line of the file.
    #[must_use]
    pub const fn with_skip_header(mut self, skip_header: bool) -> Self {
        self.skip_header = skip_header;
        self
    }

    /// Returns whether records carry an explicit id.
    #[must_use]
    pub const fn id_column(&self) -> bool {
        self.id_column
    }

    /// Returns whether the first line is a header.
    #[must_use]
    pub const fn skip_header(&self) -> bool {
        self.skip_header
    }
}

/// Loads a dataset file into a [`PointStore`] named after the path.
///
/// # Errors
/// Returns [`CsvProviderError::Io`] when the file cannot be read,
/// [`CsvProviderError::MalformedRecord`] for unparsable or ragged records,
/// [`CsvProviderError::EmptyInput`] when no records remain, and
/// [`CsvProviderError::DataSource`] when ids are not dense or coordinates
/// are not finite.
#[instrument(name = "csv.load_points", skip(path), fields(path = %path.display()), err)]
pub fn load_points(path: &Path, format: PointsFormat) -> Result<PointStore, CsvProviderError> {
    let file = File::open(path).map_err(|source| CsvProviderError::io(path, source))?;
    read_points(path, BufReader::new(file), format)
}

/// Parses a dataset from any buffered reader. `origin` names the store and
/// is quoted in errors.
///
/// # Errors
/// As [`load_points`].
///
/// # Examples
/// ```
/// use std::{io::Cursor, path::Path};
/// use graphscan_providers_csv::{PointsFormat, read_points};
///
/// let input = Cursor::new("x,y\n0.0,1.0\n\n2.0,3.0\n");
/// let format = PointsFormat::default().with_skip_header(true);
/// let store = read_points(Path::new("demo.csv"), input, format)?;
/// assert_eq!(store.len(), 2);
/// assert_eq!(store.dimension(), 2);
/// # Ok::<(), graphscan_providers_csv::CsvProviderError>(())
/// ```
pub fn read_points<R: BufRead>(
    origin: &Path,
    reader: R,
    format: PointsFormat,
) -> Result<PointStore, CsvProviderError> {
    let mut records: Vec<(usize, Vec<f32>)> = Vec::new();
    let mut dimension = None;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|source| CsvProviderError::io(origin, source))?;
        if index == 0 && format.skip_header {
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut fields = trimmed.split(',').map(str::trim);
        let id = if format.id_column {
            let raw = fields.next().unwrap_or_default();
            raw.parse::<usize>().map_err(|_| {
                CsvProviderError::malformed(origin, line_no, format!("invalid id `{raw}`"))
            })?
        } else {
            records.len()
        };
        let coordinates = fields
            .map(|raw| {
                raw.parse::<f32>().map_err(|_| {
                    CsvProviderError::malformed(
                        origin,
                        line_no,
                        format!("invalid coordinate `{raw}`"),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if coordinates.is_empty() {
            return Err(CsvProviderError::malformed(
                origin,
                line_no,
                "record has no coordinates",
            ));
        }
        let expected = *dimension.get_or_insert(coordinates.len());
        if coordinates.len() != expected {
            return Err(CsvProviderError::malformed(
                origin,
                line_no,
                format!("expected {expected} coordinates, found {}", coordinates.len()),
            ));
        }
        records.push((id, coordinates));
    }

    if records.is_empty() {
        return Err(CsvProviderError::EmptyInput {
            path: origin.to_path_buf(),
        });
    }
    debug!(records = records.len(), dimension, "dataset parsed");

    let name = origin.display().to_string();
    let store = if format.id_column {
        PointStore::try_from_records(name, records)?
    } else {
        PointStore::load(name, records.into_iter().map(|(_, row)| row).collect())?
    };
    Ok(store)
}
