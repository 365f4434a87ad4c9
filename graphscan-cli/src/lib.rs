//! Library half of the `graphscan` binary: argument parsing, command
//! execution, and logging setup.

pub mod cli;
pub mod logging;
