//! Command-line interface orchestration for graphscan.
//!
//! `run` loads a dataset (and optionally a proximity graph), clusters it,
//! and writes or prints the labels. `knn` builds a symmetrised
//! k-nearest-neighbour graph over a dataset and writes its edges, ready to
//! be passed back to `run --graph`.

mod commands;

pub use commands::{
    Cli, CliError, Command, ExecutionSummary, InputArgs, KnnCommand, RunCommand, SearchArg,
    render_summary, run_cli,
};

#[cfg(test)]
mod tests;
