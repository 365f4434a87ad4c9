//! Unit tests for argument parsing and command execution.

use super::commands::{build_knn_graph, knn_command, run_command};
use super::{
    Cli, CliError, Command, ExecutionSummary, InputArgs, KnnCommand, RunCommand, SearchArg,
    render_summary, run_cli,
};

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use clap::Parser;
use graphscan_core::{DataSourceErrorCode, DbscanError, Label, PointStore};
use graphscan_providers_csv::CsvProviderError;
use graphscan_test_support::{datasets::line_with_outlier, recording::RecordingLayer};
use rstest::{fixture, rstest};
use tempfile::TempDir;
use tracing::Level;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[fixture]
fn workspace() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    let rows: String = line_with_outlier()
        .iter()
        .map(|row| format!("{:.1}\n", row[0]))
        .collect();
    fs::write(dir.path().join("line.csv"), rows).expect("write dataset");
    dir
}

fn run_args(input: PathBuf) -> RunCommand {
    RunCommand {
        input,
        eps: 1.5,
        min_pts: 2,
        graph: None,
        max_degree: None,
        output: None,
        search: SearchArg::Auto,
        sequential: false,
        input_args: InputArgs::default(),
    }
}

fn knn_args(input: PathBuf, output: PathBuf, sharded: bool) -> KnnCommand {
    KnnCommand {
        input,
        k: NonZeroUsize::new(3).expect("non-zero"),
        output,
        sharded,
        input_args: InputArgs::default(),
    }
}

fn clustering(summary: ExecutionSummary) -> Vec<Label> {
    match summary {
        ExecutionSummary::Clustering { result, .. } => result.labels().to_vec(),
        other @ ExecutionSummary::Graph { .. } => panic!("unexpected summary: {other:?}"),
    }
}

fn expected_line_labels() -> Vec<i64> {
    let mut labels = vec![0; 10];
    labels.push(-1);
    labels
}

fn signed(labels: &[Label]) -> Vec<i64> {
    labels.iter().map(|label| label.as_signed()).collect()
}

fn dataset(dir: &TempDir) -> PathBuf {
    dir.path().join("line.csv")
}

#[rstest]
fn parse_run_applies_defaults() {
    let cli = Cli::try_parse_from(["graphscan", "run", "points.csv", "--eps", "0.5", "--min-pts", "4"])
        .expect("arguments parse");
    let Command::Run(run) = cli.command else {
        panic!("expected the run command");
    };
    assert_eq!(run.input, Path::new("points.csv"));
    assert!((run.eps - 0.5).abs() < f32::EPSILON);
    assert_eq!(run.min_pts, 4);
    assert_eq!(run.search, SearchArg::Auto);
    assert!(run.graph.is_none());
    assert!(run.output.is_none());
    assert!(!run.sequential);
    assert!(!run.input_args.id_column);
}

#[rstest]
#[case::brute_force("brute-force", SearchArg::BruteForce)]
#[case::graph("graph", SearchArg::Graph)]
#[case::auto("auto", SearchArg::Auto)]
fn parse_run_accepts_search_strategies(#[case] raw: &str, #[case] expected: SearchArg) {
    let cli = Cli::try_parse_from([
        "graphscan", "run", "p.csv", "--eps", "1", "--min-pts", "1", "--search", raw,
    ])
    .expect("arguments parse");
    let Command::Run(run) = cli.command else {
        panic!("expected the run command");
    };
    assert_eq!(run.search, expected);
}

#[rstest]
#[case::missing_eps(&["graphscan", "run", "p.csv", "--min-pts", "2"][..])]
#[case::unknown_search(&["graphscan", "run", "p.csv", "--eps", "1", "--min-pts", "2", "--search", "fast"][..])]
#[case::zero_k(&["graphscan", "knn", "p.csv", "--k", "0", "--output", "g.csv"][..])]
fn parse_rejects_invalid_arguments(#[case] args: &[&str]) {
    assert!(Cli::try_parse_from(args).is_err());
}

#[rstest]
#[case::parallel(false)]
#[case::sequential(true)]
fn run_brute_force_labels_line(workspace: TempDir, #[case] sequential: bool) -> TestResult {
    let mut command = run_args(dataset(&workspace));
    command.sequential = sequential;
    let labels = clustering(run_command(command)?);
    assert_eq!(signed(&labels), expected_line_labels());
    Ok(())
}

#[rstest]
#[case::single_file(false)]
#[case::sharded(true)]
fn knn_graph_feeds_graph_assisted_run(workspace: TempDir, #[case] sharded: bool) -> TestResult {
    let graph_path = workspace.path().join(if sharded { "shards" } else { "knn.csv" });
    let summary = knn_command(knn_args(dataset(&workspace), graph_path.clone(), sharded))?;
    let ExecutionSummary::Graph { nodes, edges, .. } = summary else {
        panic!("expected a graph summary");
    };
    assert_eq!(nodes, 11);
    assert!(edges >= 33, "every node keeps its three nearest: {edges}");
    if sharded {
        assert!(graph_path.join("0.csv").is_file());
    }

    let mut command = run_args(dataset(&workspace));
    command.graph = Some(graph_path);
    command.search = SearchArg::Graph;
    let labels = clustering(run_command(command)?);
    assert_eq!(signed(&labels), expected_line_labels());
    Ok(())
}

#[rstest]
fn run_writes_label_file(workspace: TempDir) -> TestResult {
    let output = workspace.path().join("labels.csv");
    let mut command = run_args(dataset(&workspace));
    command.output = Some(output.clone());
    run_command(command)?;

    let written = fs::read_to_string(&output)?;
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some("cluster_id"));
    let labels: Vec<i64> = lines.map(str::parse).collect::<Result<_, _>>()?;
    assert_eq!(labels, expected_line_labels());
    Ok(())
}

#[rstest]
fn failed_run_leaves_no_label_file(workspace: TempDir) {
    let output = workspace.path().join("labels.csv");
    let mut command = run_args(dataset(&workspace));
    command.output = Some(output.clone());
    command.search = SearchArg::Graph;

    let err = run_command(command).expect_err("graph search without a graph must fail");
    assert!(matches!(err, CliError::Core(DbscanError::GraphRequired)));
    assert_eq!(err.code(), "DBSCAN_GRAPH_REQUIRED");
    assert!(!output.exists());
}

#[rstest]
fn brute_force_search_does_not_read_the_graph(workspace: TempDir) -> TestResult {
    let mut command = run_args(dataset(&workspace));
    command.graph = Some(workspace.path().join("missing.csv"));
    command.search = SearchArg::BruteForce;
    let labels = clustering(run_command(command)?);
    assert_eq!(signed(&labels), expected_line_labels());
    Ok(())
}

#[rstest]
fn run_reports_out_of_range_graph_ids(workspace: TempDir) -> TestResult {
    let graph = workspace.path().join("bad.csv");
    fs::write(&graph, "0,1\n3,11\n")?;
    let mut command = run_args(dataset(&workspace));
    command.graph = Some(graph);
    let err = run_command(command).expect_err("node 11 does not exist");
    assert_eq!(err.code(), "CSV_GRAPH");
    Ok(())
}

#[rstest]
#[case::zero_eps(0.0, 2, "DBSCAN_INVALID_EPS")]
#[case::nan_eps(f32::NAN, 2, "DBSCAN_INVALID_EPS")]
#[case::zero_min_pts(1.0, 0, "DBSCAN_INVALID_MIN_PTS")]
fn run_rejects_invalid_parameters(
    workspace: TempDir,
    #[case] eps: f32,
    #[case] min_pts: usize,
    #[case] code: &str,
) {
    let mut command = run_args(dataset(&workspace));
    command.eps = eps;
    command.min_pts = min_pts;
    let err = run_command(command).expect_err("parameters are invalid");
    assert_eq!(err.code(), code);
}

#[rstest]
fn run_reports_missing_input(workspace: TempDir) {
    let command = run_args(workspace.path().join("absent.csv"));
    let err = run_command(command).expect_err("input does not exist");
    assert!(matches!(err, CliError::Csv(CsvProviderError::Io { .. })));
    assert_eq!(err.code(), "CSV_IO");
    assert_eq!(err.data_source_code(), None);
}

#[rstest]
fn run_reports_duplicate_ids(workspace: TempDir) -> TestResult {
    let input = workspace.path().join("ids.csv");
    fs::write(&input, "id,x\n0,0.0\n0,1.0\n")?;
    let mut command = run_args(input);
    command.input_args = InputArgs {
        id_column: true,
        skip_header: true,
    };
    let err = run_command(command).expect_err("ids repeat");
    assert_eq!(err.code(), "CSV_DATA_SOURCE");
    assert_eq!(err.data_source_code(), Some(DataSourceErrorCode::DuplicateId));
    Ok(())
}

#[rstest]
fn id_column_orders_points_by_id(workspace: TempDir) -> TestResult {
    let input = workspace.path().join("ids.csv");
    fs::write(&input, "2,50.0\n0,0.0\n1,1.0\n")?;
    let mut command = run_args(input);
    command.input_args.id_column = true;
    command.min_pts = 1;
    let labels = clustering(run_command(command)?);
    assert_eq!(signed(&labels), vec![0, 0, -1]);
    Ok(())
}

#[rstest]
fn build_knn_graph_is_symmetric() -> TestResult {
    let store = PointStore::load("line", line_with_outlier())?;
    let graph = build_knn_graph(&store, NonZeroUsize::new(2).expect("non-zero"))?;
    assert!(graph.is_symmetric());
    for (from, to) in graph.iter_edges() {
        assert!(graph.contains_edge(to, from), "missing {to} -> {from}");
    }
    Ok(())
}

#[rstest]
fn run_cli_records_command_spans(workspace: TempDir) -> TestResult {
    let cli = Cli {
        command: Command::Run(run_args(dataset(&workspace))),
    };
    let (summary, layer) = RecordingLayer::capture(|| run_cli(cli));
    summary?;

    let span = layer.span("cli.run").expect("cli.run span closed");
    assert_eq!(span.field("command"), Some("run"));
    let execute = layer.span("cli.execute").expect("cli.execute span closed");
    assert_eq!(execute.field("min_pts"), Some("2"));
    assert_eq!(execute.field("search"), Some("Auto"));
    assert!(layer.span("csv.load_points").is_some());
    assert!(layer.span("core.run").is_some());
    assert!(layer.has_event(Level::INFO, "command completed"));
    Ok(())
}

#[rstest]
fn render_summary_prints_labels_without_output() -> TestResult {
    let store = PointStore::load("line", line_with_outlier())?;
    let result = graphscan_core::DbscanBuilder::new()
        .with_eps(1.5)
        .with_min_pts(2)
        .build()?
        .run(&store)?;
    let summary = ExecutionSummary::Clustering {
        data_source: "line".into(),
        result,
        output: None,
    };
    let mut buffer = Vec::new();
    render_summary(&summary, &mut buffer)?;
    let text = String::from_utf8(buffer)?;
    assert!(text.starts_with("data source: line\nclusters: 1\nnoise: 1\n"));
    assert!(text.contains("\n0\t0\n"));
    assert!(text.ends_with("10\t-1\n"));
    Ok(())
}

#[rstest]
fn render_summary_reports_written_files() -> TestResult {
    let summary = ExecutionSummary::Graph {
        data_source: "line".into(),
        nodes: 11,
        edges: 40,
        output: PathBuf::from("knn.csv"),
    };
    let mut buffer = Vec::new();
    render_summary(&summary, &mut buffer)?;
    assert_eq!(
        String::from_utf8(buffer)?,
        "data source: line\nnodes: 11\nedges: 40\ngraph: knn.csv\n"
    );
    Ok(())
}
