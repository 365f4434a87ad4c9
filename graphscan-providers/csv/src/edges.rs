//! Proximity graph edge lists.
//!
//! Each line reads `source,target,target,...`; a line holding only a source
//! declares no edges. A graph is stored either as one file or as a directory
//! of shard files named `{shard}.csv`, where shard `s` holds the sources in
//! `s * SHARD_SIZE .. (s + 1) * SHARD_SIZE`.

use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Write},
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use graphscan_core::{EdgeShard, ProximityGraph, SHARD_SIZE, shard_of};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::errors::CsvProviderError;

const SHARD_EXTENSION: &str = "csv";

/// How [`write_edges`] lays out a graph on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgeLayout {
    /// One file holding every row.
    #[default]
    Single,
    /// A directory with one file per non-empty shard.
    Sharded,
}

/// Parses `source,target,...` rows from a reader. `origin` is quoted in
/// errors.
///
/// # Errors
/// Returns [`CsvProviderError::MalformedRecord`] for ids that are not
/// non-negative integers and [`CsvProviderError::Io`] for read failures.
///
/// # Examples
/// ```
/// use std::{io::Cursor, path::Path};
/// use graphscan_providers_csv::read_edge_rows;
///
/// let rows = read_edge_rows(Path::new("g.csv"), Cursor::new("0,1,2\n\n3\n"))?;
/// assert_eq!(rows, vec![(0, vec![1, 2]), (3, vec![])]);
/// # Ok::<(), graphscan_providers_csv::CsvProviderError>(())
/// ```
pub fn read_edge_rows<R: BufRead>(
    origin: &Path,
    reader: R,
) -> Result<Vec<(usize, Vec<usize>)>, CsvProviderError> {
    let mut rows = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| CsvProviderError::io(origin, source))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let ids = trimmed
            .split(',')
            .map(str::trim)
            .map(|raw| {
                raw.parse::<usize>().map_err(|_| {
                    CsvProviderError::malformed(origin, index + 1, format!("invalid node id `{raw}`"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if let Some((&source, targets)) = ids.split_first() {
            rows.push((source, targets.to_vec()));
        }
    }
    Ok(rows)
}

/// Loads a graph over `node_count` points from a single edge file or a shard
/// directory, then symmetrises it.
///
/// # Errors
/// Returns [`CsvProviderError::Io`] and
/// [`CsvProviderError::MalformedRecord`] for unreadable input and
/// [`CsvProviderError::Graph`] for ids outside `0..node_count` or
/// inconsistent sharding.
#[instrument(name = "csv.load_edges", skip(path), fields(path = %path.display()), err)]
pub fn load_graph(
    path: &Path,
    node_count: usize,
    max_degree: Option<NonZeroUsize>,
) -> Result<ProximityGraph, CsvProviderError> {
    if path.is_dir() {
        return load_sharded_edges(path, node_count, max_degree);
    }
    let file = File::open(path).map_err(|source| CsvProviderError::io(path, source))?;
    let rows = read_edge_rows(path, BufReader::new(file))?;
    debug!(rows = rows.len(), "edge rows parsed");
    let graph = ProximityGraph::from_rows(node_count, rows, max_degree)?;
    info!(
        nodes = graph.len(),
        edges = graph.edge_count(),
        "proximity graph loaded"
    );
    Ok(graph)
}

/// Loads a shard directory, reading shard files in parallel.
///
/// Files whose stem is not a shard index or whose extension is not `csv`
/// are ignored.
///
/// # Errors
/// As [`load_graph`].
#[instrument(name = "csv.load_shards", skip(dir), fields(dir = %dir.display()), err)]
pub fn load_sharded_edges(
    dir: &Path,
    node_count: usize,
    max_degree: Option<NonZeroUsize>,
) -> Result<ProximityGraph, CsvProviderError> {
    let files = shard_files(dir)?;
    debug!(shards = files.len(), "shard files found");
    let read = |(index, path): &(usize, PathBuf)| -> Result<EdgeShard, CsvProviderError> {
        let file = File::open(path).map_err(|source| CsvProviderError::io(path, source))?;
        let rows = read_edge_rows(path, BufReader::new(file))?;
        Ok(EdgeShard::new(*index, rows))
    };

    #[cfg(feature = "parallel")]
    let shards = files.par_iter().map(read).collect::<Result<Vec<_>, _>>()?;
    #[cfg(not(feature = "parallel"))]
    let shards = files.iter().map(read).collect::<Result<Vec<_>, _>>()?;

    Ok(ProximityGraph::from_shards(node_count, shards, max_degree)?)
}

fn shard_files(dir: &Path) -> Result<Vec<(usize, PathBuf)>, CsvProviderError> {
    let entries = fs::read_dir(dir).map_err(|source| CsvProviderError::io(dir, source))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| CsvProviderError::io(dir, source))?
            .path();
        let index = path
            .extension()
            .filter(|extension| *extension == SHARD_EXTENSION)
            .and_then(|_| path.file_stem())
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<usize>().ok());
        match index {
            Some(index) => files.push((index, path)),
            None => debug!(path = %path.display(), "ignoring non-shard file"),
        }
    }
    files.sort_unstable();
    Ok(files)
}

/// Writes every node with at least one neighbour as a
/// `source,target,...` line in ascending source order.
///
/// With [`EdgeLayout::Sharded`], `path` is a directory (created when
/// missing) receiving one `{shard}.csv` file per non-empty shard.
///
/// # Errors
/// Returns [`CsvProviderError::Io`] when a file or directory cannot be
/// written.
#[instrument(name = "csv.write_edges", skip(graph, path), fields(path = %path.display(), edges = graph.edge_count()), err)]
pub fn write_edges(
    graph: &ProximityGraph,
    path: &Path,
    layout: EdgeLayout,
) -> Result<(), CsvProviderError> {
    match layout {
        EdgeLayout::Single => write_rows(graph, path, 0..graph.len()),
        EdgeLayout::Sharded => {
            fs::create_dir_all(path).map_err(|source| CsvProviderError::io(path, source))?;
            let shard_count = graph.len().div_ceil(SHARD_SIZE);
            for shard in 0..shard_count {
                let start = shard * SHARD_SIZE;
                let end = graph.len().min(start + SHARD_SIZE);
                let has_edges = (start..end)
                    .any(|node| graph.degree(node).is_ok_and(|degree| degree > 0));
                if !has_edges {
                    continue;
                }
                debug_assert_eq!(shard_of(start), shard);
                let file = path.join(format!("{shard}.{SHARD_EXTENSION}"));
                write_rows(graph, &file, start..end)?;
            }
            Ok(())
        }
    }
}

fn write_rows(
    graph: &ProximityGraph,
    path: &Path,
    nodes: std::ops::Range<usize>,
) -> Result<(), CsvProviderError> {
    let io_error = |source| CsvProviderError::io(path, source);
    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    for node in nodes {
        let neighbours = graph.neighbours(node)?;
        if neighbours.is_empty() {
            continue;
        }
        write!(writer, "{node}").map_err(io_error)?;
        for target in neighbours {
            write!(writer, ",{target}").map_err(io_error)?;
        }
        writeln!(writer).map_err(io_error)?;
    }
    writer.flush().map_err(io_error)
}
