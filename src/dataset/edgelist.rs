//! A dataset backed by an edge list loaded into memory.

use tracing::info;

use super::{check_batch_id, check_batching, epoch_boundary, io, window_threshold, Dataset};
use crate::config::Args;
use crate::diagnostics::Diagnostics;
use crate::edge::{Batch, Edge};
use crate::error::DatasetError;
use crate::{Node, Time};

/// Facts derived from the whole edge list, identical on every participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    pub num_edges: i64,
    pub num_batches: i64,
    /// Edges per batch in the full edge list.
    pub edges_per_batch: i64,
    pub max_vertex_id: Node,
    pub min_timestamp: Time,
    pub max_timestamp: Time,
    /// Timestamp of the last edge of each batch.
    pub batch_end_timestamps: Vec<Time>,
}

pub struct EdgeListDataset {
    num_epochs: i64,
    window_size: f64,
    summary: DatasetSummary,
    edges: Vec<Edge>,
    /// Edges per batch held by this participant.
    local_batch_size: usize,
}

impl EdgeListDataset {
    /// Loads and validates the edge list named by `args.input_path`.
    pub fn load(args: &Args, diag: &Diagnostics) -> Result<Self, DatasetError> {
        let edges = diag.in_scope(|| io::read_edges(&args.input_path))?;
        let dataset = Self::from_edges(args, edges)?;
        diag.in_scope(|| {
            info!(
                "{:?}\tloaded {} edges in {} batches of {}",
                diag.elapsed(),
                dataset.summary.num_edges,
                dataset.summary.num_batches,
                dataset.local_batch_size,
            )
        });
        Ok(dataset)
    }

    /// Validates `edges` and slices them into `args.batch_size` batches.
    pub fn from_edges(args: &Args, edges: Vec<Edge>) -> Result<Self, DatasetError> {
        let summary = summarize(args, &edges)?;
        Ok(EdgeListDataset {
            num_epochs: args.num_epochs,
            window_size: args.window_size,
            local_batch_size: summary.edges_per_batch as usize,
            summary,
            edges,
        })
    }

    /// One participant's share of a distributed dataset.
    ///
    /// `edges` holds this participant's slice of every batch, in batch
    /// order, so its batch size is re-derived from its own edge count rather
    /// than taken from the global batch size.
    pub fn from_partition(args: &Args, summary: DatasetSummary, edges: Vec<Edge>) -> Self {
        let local_batch_size = if summary.num_batches > 0 {
            edges.len() / summary.num_batches as usize
        } else {
            0
        };
        EdgeListDataset {
            num_epochs: args.num_epochs,
            window_size: args.window_size,
            summary,
            edges,
            local_batch_size,
        }
    }

    pub fn summary(&self) -> &DatasetSummary {
        &self.summary
    }

    pub fn local_batch_size(&self) -> usize {
        self.local_batch_size
    }

    /// Gives up the edge list, for redistribution.
    pub fn into_edges(self) -> (DatasetSummary, Vec<Edge>) {
        (self.summary, self.edges)
    }
}

/// Checks the dataset invariants and derives its summary.
fn summarize(args: &Args, edges: &[Edge]) -> Result<DatasetSummary, DatasetError> {
    let (first, last) = match (edges.first(), edges.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(DatasetError::Empty),
    };
    let num_edges = edges.len() as i64;
    let num_batches = check_batching(args, num_edges)?;

    // lets engines provision their vertex arrays up front.
    let max_vertex_id = edges
        .iter()
        .map(|e| std::cmp::max(e.src, e.dst))
        .max()
        .unwrap_or_default();

    if let Some(index) = edges.windows(2).position(|w| w[1].timestamp < w[0].timestamp) {
        return Err(DatasetError::Unsorted {
            index: index + 1,
            previous: edges[index].timestamp,
            timestamp: edges[index + 1].timestamp,
        });
    }

    if let Some(index) = edges.iter().position(Edge::is_self_edge) {
        return Err(DatasetError::SelfEdge { index, vertex: edges[index].src });
    }

    let batch_size = args.batch_size as usize;
    let batch_end_timestamps = edges
        .chunks_exact(batch_size)
        .map(|batch| batch[batch_size - 1].timestamp)
        .collect();

    Ok(DatasetSummary {
        num_edges,
        num_batches,
        edges_per_batch: args.batch_size,
        max_vertex_id,
        min_timestamp: first.timestamp,
        max_timestamp: last.timestamp,
        batch_end_timestamps,
    })
}

impl Dataset for EdgeListDataset {
    fn batch(&mut self, batch_id: i64) -> Result<Batch<'_>, DatasetError> {
        check_batch_id(batch_id, self.summary.num_batches)?;
        let begin = batch_id as usize * self.local_batch_size;
        Ok(Batch::new(&self.edges[begin..begin + self.local_batch_size]))
    }

    fn batches_up_to(&mut self, batch_id: i64) -> Result<Batch<'_>, DatasetError> {
        check_batch_id(batch_id, self.summary.num_batches)?;
        let end = (batch_id as usize + 1) * self.local_batch_size;
        Ok(Batch::new(&self.edges[..end]))
    }

    /// # Panics
    ///
    /// If `batch_id` is not a batch of this dataset.
    fn timestamp_for_window(&self, batch_id: i64) -> Time {
        let latest = self.summary.batch_end_timestamps[batch_id as usize];
        window_threshold(self.window_size, self.summary.min_timestamp, self.summary.max_timestamp, latest)
    }

    fn enable_algs_for_batch(&self, batch_id: i64) -> bool {
        epoch_boundary(batch_id, self.summary.num_batches, self.num_epochs)
    }

    fn num_batches(&self) -> i64 {
        self.summary.num_batches
    }

    fn num_edges(&self) -> i64 {
        self.edges.len() as i64
    }

    fn max_vertex_id(&self) -> Node {
        self.summary.max_vertex_id
    }

    fn is_directed(&self) -> bool {
        true
    }

    fn reset(&mut self) {}
}
