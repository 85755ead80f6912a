//! Dynamic graph benchmark harness.
//!
//! Streams a time-ordered edge list, batch by batch, into a graph engine
//! implementing [`engine::DynamicGraph`], deleting edges that fall out of a
//! sliding time window and running algorithms at evenly spaced epochs.

pub type Node = i64;
pub type Weight = i64;
pub type Time = i64;

pub mod alg_data;
pub mod bench;
pub mod config;
pub mod dataset;
pub mod diagnostics;
pub mod distribute;
pub mod edge;
pub mod engine;
pub mod error;
pub mod hooks;

pub use config::{Args, SortMode};
pub use dataset::Dataset;
pub use diagnostics::Diagnostics;
pub use edge::{Batch, Edge};
pub use engine::DynamicGraph;
pub use error::{BenchError, ConfigError, DatasetError};
