//! Command implementations and argument parsing for the graphscan CLI.

use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use graphscan_core::{
    ClusteringResult, DataSource, DataSourceErrorCode, DbscanBuilder, DbscanError, GraphError,
    NeighbourSearch, PointStore, ProximityGraph,
};
use graphscan_providers_csv::{
    CsvProviderError, EdgeLayout, PointsFormat, load_graph, load_points, write_edges,
    write_labels,
};
use thiserror::Error;
use tracing::{Span, debug, field, info, instrument};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "graphscan",
    about = "Density-based clustering with exact or proximity-graph neighbour search."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Cluster a dataset with DBSCAN.
    Run(RunCommand),
    /// Build a symmetrised k-nearest-neighbour graph and write its edges.
    Knn(KnnCommand),
}

/// Dataset layout flags shared by every command.
#[derive(Debug, Args, Clone, Copy, Default)]
pub struct InputArgs {
    /// Treat the first field of each record as the point id.
    #[arg(long = "id-column")]
    pub id_column: bool,

    /// Skip the first line of the dataset.
    #[arg(long = "skip-header")]
    pub skip_header: bool,
}

impl InputArgs {
    fn format(self) -> PointsFormat {
        PointsFormat::default()
            .with_id_column(self.id_column)
            .with_skip_header(self.skip_header)
    }
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Dataset file, one comma-separated record per line.
    pub input: PathBuf,

    /// Neighbourhood radius; points strictly closer than this are neighbours.
    #[arg(long)]
    pub eps: f32,

    /// Neighbour count at which a point becomes a core point.
    #[arg(long = "min-pts")]
    pub min_pts: usize,

    /// Edge file or shard directory describing a proximity graph.
    #[arg(long)]
    pub graph: Option<PathBuf>,

    /// Keep at most this many neighbours per node when loading the graph.
    #[arg(long = "max-degree")]
    pub max_degree: Option<NonZeroUsize>,

    /// Label file to write; labels are printed to stdout when omitted.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Neighbour search strategy.
    #[arg(long, value_enum, default_value_t = SearchArg::Auto)]
    pub search: SearchArg,

    /// Compute neighbourhoods on the calling thread only.
    #[arg(long)]
    pub sequential: bool,

    /// Dataset layout.
    #[command(flatten)]
    pub input_args: InputArgs,
}

/// Options accepted by the `knn` command.
#[derive(Debug, Args, Clone)]
pub struct KnnCommand {
    /// Dataset file, one comma-separated record per line.
    pub input: PathBuf,

    /// Neighbours linked from each point before symmetrisation.
    #[arg(long)]
    pub k: NonZeroUsize,

    /// Edge file, or shard directory with `--sharded`.
    #[arg(long)]
    pub output: PathBuf,

    /// Write one `{shard}.csv` file per shard into the output directory.
    #[arg(long)]
    pub sharded: bool,

    /// Dataset layout.
    #[command(flatten)]
    pub input_args: InputArgs,
}

/// Neighbour search strategies accepted on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SearchArg {
    /// Use the graph when `--graph` is given, brute force otherwise.
    #[default]
    Auto,
    /// Compare every pair of points.
    BruteForce,
    /// Traverse the proximity graph; `--graph` is required.
    Graph,
}

impl From<SearchArg> for NeighbourSearch {
    fn from(value: SearchArg) -> Self {
        match value {
            SearchArg::Auto => Self::Auto,
            SearchArg::BruteForce => Self::BruteForce,
            SearchArg::Graph => Self::Graph,
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading or writing a graphscan file failed.
    #[error(transparent)]
    Csv(#[from] CsvProviderError),
    /// Building the proximity graph failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// Configuration or clustering failed.
    #[error(transparent)]
    Core(#[from] DbscanError),
}

impl CliError {
    /// Returns the stable code of the underlying error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Csv(err) => err.code().as_str(),
            Self::Graph(err) => err.code().as_str(),
            Self::Core(err) => err.code().as_str(),
        }
    }

    /// Returns the data source code when a dataset read caused the failure.
    #[must_use]
    pub const fn data_source_code(&self) -> Option<DataSourceErrorCode> {
        match self {
            Self::Csv(CsvProviderError::DataSource(err)) => Some(err.code()),
            Self::Core(err) => err.data_source_code(),
            _ => None,
        }
    }
}

/// Outcome of a CLI command.
#[derive(Debug, Clone)]
pub enum ExecutionSummary {
    /// A `run` command finished.
    Clustering {
        /// Name of the clustered dataset.
        data_source: String,
        /// Labels and clusters produced by the run.
        result: ClusteringResult,
        /// Label file written, if any.
        output: Option<PathBuf>,
    },
    /// A `knn` command finished.
    Graph {
        /// Name of the dataset the graph was built over.
        data_source: String,
        /// Number of nodes in the graph.
        nodes: usize,
        /// Number of directed edges after symmetrisation.
        edges: usize,
        /// Edge file or shard directory written.
        output: PathBuf,
    },
}

/// Executes the CLI command represented by `cli`.
///
/// Labels are written only once clustering has succeeded, so a failed run
/// never leaves a partial label file behind.
///
/// # Errors
/// Returns [`CliError`] when loading, clustering, or writing fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use clap::Parser;
/// # use graphscan_cli::cli::{Cli, ExecutionSummary, run_cli};
/// # use tempfile::NamedTempFile;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let file = NamedTempFile::new()?;
/// std::fs::write(file.path(), "0.0\n1.0\n2.0\n9.0\n")?;
/// let input = file.path().to_str().ok_or("non-UTF-8 temp path")?;
/// let cli = Cli::try_parse_from(["graphscan", "run", input, "--eps", "1.5", "--min-pts", "2"])?;
/// let ExecutionSummary::Clustering { result, .. } = run_cli(cli)? else {
///     return Err("expected a clustering summary".into());
/// };
/// assert_eq!(result.cluster_count(), 1);
/// assert_eq!(result.noise_count(), 1);
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Run(run) => {
            Span::current().record("command", field::display("run"));
            run_command(run)
        }
        Command::Knn(knn) => {
            Span::current().record("command", field::display("knn"));
            knn_command(knn)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(
        input = %command.input.display(),
        eps = command.eps,
        min_pts = command.min_pts,
        search = ?command.search,
        graph = field::Empty,
    ),
)]
pub(super) fn run_command(command: RunCommand) -> Result<ExecutionSummary, CliError> {
    let dbscan = DbscanBuilder::new()
        .with_eps(command.eps)
        .with_min_pts(command.min_pts)
        .with_neighbour_search(command.search.into())
        .with_parallel(!command.sequential)
        .build()?;

    let mut store = load_points(&command.input, command.input_args.format())?;
    let graph = match command.graph.as_deref() {
        Some(path) if dbscan.neighbour_search().uses_graph(true) => {
            Span::current().record("graph", field::display(path.display()));
            Some(load_graph(path, store.len(), command.max_degree)?)
        }
        Some(path) => {
            debug!(path = %path.display(), "brute-force search requested; graph not loaded");
            None
        }
        None => None,
    };

    let result = dbscan.run_store(&mut store, graph.as_ref())?;
    if let Some(output) = command.output.as_deref() {
        write_labels(&result, output)?;
    }

    info!(
        data_source = store.name(),
        clusters = result.cluster_count(),
        noise = result.noise_count(),
        "command completed"
    );
    Ok(ExecutionSummary::Clustering {
        data_source: store.name().to_owned(),
        result,
        output: command.output,
    })
}

#[instrument(
    name = "cli.knn",
    err,
    skip(command),
    fields(input = %command.input.display(), k = command.k.get(), sharded = command.sharded),
)]
pub(super) fn knn_command(command: KnnCommand) -> Result<ExecutionSummary, CliError> {
    let store = load_points(&command.input, command.input_args.format())?;
    let graph = build_knn_graph(&store, command.k)?;
    let layout = if command.sharded {
        EdgeLayout::Sharded
    } else {
        EdgeLayout::Single
    };
    write_edges(&graph, &command.output, layout)?;

    info!(
        data_source = store.name(),
        nodes = graph.len(),
        edges = graph.edge_count(),
        "knn graph written"
    );
    Ok(ExecutionSummary::Graph {
        data_source: store.name().to_owned(),
        nodes: graph.len(),
        edges: graph.edge_count(),
        output: command.output,
    })
}

pub(super) fn build_knn_graph(
    store: &PointStore,
    k: NonZeroUsize,
) -> Result<ProximityGraph, GraphError> {
    let mut graph = ProximityGraph::knn_from_source(store, k)?;
    let added = graph.symmetrize();
    debug!(added, "reverse edges added");
    Ok(graph)
}

/// Renders `summary` to `writer` in a human-readable text format.
///
/// Clustering summaries without a label file list one `id<TAB>label` line
/// per point, noise as `-1`.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use graphscan_cli::cli::{ExecutionSummary, render_summary};
/// # use graphscan_core::{ClusterId, ClusteringResult, Label};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let c0 = Label::Cluster(ClusterId::new(0));
/// let summary = ExecutionSummary::Clustering {
///     data_source: "demo".into(),
///     result: ClusteringResult::try_from_labels(vec![c0, c0, Label::Noise])?,
///     output: None,
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// let text = String::from_utf8(buffer)?;
/// assert!(text.ends_with("0\t0\n1\t0\n2\t-1\n"));
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary {
        ExecutionSummary::Clustering {
            data_source,
            result,
            output,
        } => {
            writeln!(writer, "data source: {data_source}")?;
            writeln!(writer, "clusters: {}", result.cluster_count())?;
            writeln!(writer, "noise: {}", result.noise_count())?;
            match output {
                Some(path) => writeln!(writer, "labels: {}", path.display())?,
                None => {
                    for (index, label) in result.labels().iter().enumerate() {
                        writeln!(writer, "{index}\t{label}")?;
                    }
                }
            }
        }
        ExecutionSummary::Graph {
            data_source,
            nodes,
            edges,
            output,
        } => {
            writeln!(writer, "data source: {data_source}")?;
            writeln!(writer, "nodes: {nodes}")?;
            writeln!(writer, "edges: {edges}")?;
            writeln!(writer, "graph: {}", output.display())?;
        }
    }
    Ok(())
}
