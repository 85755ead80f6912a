//! Error types. Every error here is fatal to a benchmark run.

use std::path::PathBuf;

use thiserror::Error;

/// Every violated constraint of a configuration, reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid arguments:\n{}", itemize(.0))]
pub struct ConfigError(pub Vec<String>);

fn itemize(problems: &[String]) -> String {
    problems
        .iter()
        .map(|p| format!("\t{p}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized file extension for {0} (expected .graph.bin, .graph.el or .rmat)")]
    UnknownFormat(String),

    #[error("{}: size {len} is not a multiple of the {record} byte edge record", .path.display())]
    MisSized { path: PathBuf, len: u64, record: usize },

    #[error("{}:{line}: expected `src dst weight timestamp`, found {content:?}", .path.display())]
    Parse { path: PathBuf, line: usize, content: String },

    #[error("dataset contains no edges")]
    Empty,

    #[error("invalid dataset: edges not sorted by timestamp (edge {index} has timestamp {timestamp} after {previous})")]
    Unsorted { index: usize, previous: i64, timestamp: i64 },

    #[error("invalid dataset: no self-edges allowed (edge {index} is {vertex} -> {vertex})")]
    SelfEdge { index: usize, vertex: i64 },

    #[error("invalid arguments: batch size ({batch_size}) cannot be larger than the total number of edges in the dataset ({num_edges})")]
    BatchTooLarge { batch_size: i64, num_edges: i64 },

    #[error("invalid arguments: number of epochs ({num_epochs}) cannot be greater than the number of batches in the dataset ({num_batches})")]
    TooManyEpochs { num_epochs: i64, num_batches: i64 },

    #[error("invalid rmat descriptor {descriptor:?}: {reason}")]
    InvalidRmat { descriptor: String, reason: String },

    #[error("rmat generator discarded {attempts} consecutive draws without producing a usable edge")]
    GeneratorStalled { attempts: u64 },

    #[error("batch {requested} requested out of order (next batch is {expected}); generated datasets must be read in order")]
    OutOfOrder { requested: i64, expected: i64 },

    #[error("batch {batch_id} out of range ({num_batches} batches)")]
    BatchOutOfRange { batch_id: i64, num_batches: i64 },

    #[error("cannot split {edges_per_batch} edges per batch across {participants} participants")]
    TooManyParticipants { edges_per_batch: i64, participants: usize },

    #[error("coordinator failed to establish the dataset: {0}")]
    CoordinatorFailed(String),

    #[error("participant {rank} received {received} edges for batch {batch_id}, expected {expected}")]
    IncompleteScatter { rank: usize, batch_id: i64, received: usize, expected: usize },
}

#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("algorithm {alg:?} is not supported by this graph engine (supported: {supported:?})")]
    UnsupportedAlg { alg: String, supported: Vec<String> },

    #[error("graph engine failed: {0}")]
    Engine(String),

    #[error("trial {trial} ran {executed} epochs, expected {expected}")]
    EpochMismatch { trial: i64, executed: i64, expected: i64 },
}
