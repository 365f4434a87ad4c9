//! Comma-separated text formats for graphscan: point datasets, proximity
//! graph edge lists (single file or sharded directory), and label output.

mod edges;
mod errors;
mod labels;
mod points;

pub use edges::{EdgeLayout, load_graph, load_sharded_edges, read_edge_rows, write_edges};
pub use errors::{CsvProviderError, CsvProviderErrorCode};
pub use labels::{LABEL_HEADER, write_labels, write_labels_to};
pub use points::{PointsFormat, load_points, read_points};

#[cfg(test)]
mod tests;
