//! Splitting a loaded dataset across cooperating timely workers.
//!
//! Worker 0 loads and validates the edge list, then every batch is cut into
//! one contiguous slice per worker and scattered, so each worker holds a
//! share of every batch in file order. The dataset summary is
//! broadcast alongside, so window thresholds and epoch triggers agree on
//! every worker.

use std::cell::RefCell;
use std::rc::Rc;

use timely::communication::Allocate;
use timely::dataflow::operators::{Broadcast, Exchange, Inspect, ToStream};
use timely::worker::Worker;
use tracing::{debug, info};

use crate::config::Args;
use crate::dataset::edgelist::DatasetSummary;
use crate::dataset::EdgeListDataset;
use crate::diagnostics::Diagnostics;
use crate::edge::Edge;
use crate::error::DatasetError;

/// How each batch is divided among participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    pub edges_per_batch: usize,
    pub slice_sizes: Vec<usize>,
    /// Offset of each participant's slice within a batch.
    pub displacements: Vec<usize>,
}

impl PartitionPlan {
    /// Even slices, with the remainder handed one edge at a time to the
    /// lowest ranks.
    pub fn new(edges_per_batch: i64, participants: usize) -> Result<Self, DatasetError> {
        if participants == 0 || edges_per_batch < participants as i64 {
            return Err(DatasetError::TooManyParticipants { edges_per_batch, participants });
        }
        let edges_per_batch = edges_per_batch as usize;
        let base = edges_per_batch / participants;
        let remainder = edges_per_batch % participants;
        let slice_sizes: Vec<usize> = (0..participants)
            .map(|rank| base + if rank < remainder { 1 } else { 0 })
            .collect();
        let displacements = slice_sizes
            .iter()
            .scan(0, |offset, size| {
                let start = *offset;
                *offset += size;
                Some(start)
            })
            .collect();
        Ok(PartitionPlan { edges_per_batch, slice_sizes, displacements })
    }

    pub fn participants(&self) -> usize {
        self.slice_sizes.len()
    }
}

type WireEdge = (i64, i64, i64, i64);

/// `(ok, summary scalars, batch end timestamps, error)`.
type Header = (bool, Vec<i64>, Vec<i64>, String);

/// `(rank, batch_id, edges)`.
type Slice = (u64, u64, Vec<WireEdge>);

fn encode_summary(summary: &DatasetSummary) -> Header {
    let scalars = vec![
        summary.num_edges,
        summary.num_batches,
        summary.edges_per_batch,
        summary.max_vertex_id,
        summary.min_timestamp,
        summary.max_timestamp,
    ];
    (true, scalars, summary.batch_end_timestamps.clone(), String::new())
}

fn encode_failure(error: &DatasetError) -> Header {
    (false, Vec::new(), Vec::new(), error.to_string())
}

fn decode_header(header: Header) -> Result<DatasetSummary, DatasetError> {
    let (ok, scalars, batch_end_timestamps, error) = header;
    if !ok {
        return Err(DatasetError::CoordinatorFailed(error));
    }
    match scalars[..] {
        [num_edges, num_batches, edges_per_batch, max_vertex_id, min_timestamp, max_timestamp] => Ok(DatasetSummary {
            num_edges,
            num_batches,
            edges_per_batch,
            max_vertex_id,
            min_timestamp,
            max_timestamp,
            batch_end_timestamps,
        }),
        _ => Err(DatasetError::CoordinatorFailed(format!("malformed dataset header ({} fields)", scalars.len()))),
    }
}

/// Loads on the coordinator, validating that the batches can be split.
fn establish(args: &Args, diag: &Diagnostics) -> Result<(DatasetSummary, Vec<Edge>, PartitionPlan), DatasetError> {
    let (summary, edges) = EdgeListDataset::load(args, diag)?.into_edges();
    let plan = PartitionPlan::new(summary.edges_per_batch, diag.peers())?;
    Ok((summary, edges, plan))
}

/// Consumes the edge list, which is laid out batch by batch and rank by rank.
fn scatter(summary: &DatasetSummary, edges: Vec<Edge>, plan: &PartitionPlan) -> Vec<Slice> {
    let mut slices = Vec::with_capacity(summary.num_batches as usize * plan.participants());
    let mut edges = edges.into_iter();
    for batch_id in 0..summary.num_batches as usize {
        for rank in 0..plan.participants() {
            let slice = edges
                .by_ref()
                .take(plan.slice_sizes[rank])
                .map(|e| (e.src, e.dst, e.weight, e.timestamp))
                .collect();
            slices.push((rank as u64, batch_id as u64, slice));
        }
    }
    slices
}

/// Reassembles this participant's slices in batch order.
fn gather(
    mut slices: Vec<Slice>,
    summary: &DatasetSummary,
    plan: &PartitionPlan,
    rank: usize,
) -> Result<Vec<Edge>, DatasetError> {
    slices.sort_by_key(|s| s.1);
    let expected = plan.slice_sizes[rank];
    let mut edges = Vec::with_capacity(expected * summary.num_batches as usize);
    for batch_id in 0..summary.num_batches {
        let received = match slices.get(batch_id as usize) {
            Some((_, id, slice)) if *id == batch_id as u64 => slice.len(),
            _ => 0,
        };
        if received != expected {
            return Err(DatasetError::IncompleteScatter { rank, batch_id, received, expected });
        }
        let (_, _, slice) = &slices[batch_id as usize];
        edges.extend(slice.iter().map(|&(src, dst, weight, timestamp)| Edge::new(src, dst, weight, timestamp)));
    }
    Ok(edges)
}

/// Builds this worker's share of the dataset named by `args.input_path`.
///
/// Every worker must call this, as it constructs a dataflow. Worker 0 reads
/// the file; the others block until their slices arrive.
pub fn distribute<A: Allocate>(
    worker: &mut Worker<A>,
    args: &Args,
    diag: &Diagnostics,
) -> Result<EdgeListDataset, DatasetError> {
    let mut failure = None;
    let (headers, slices) = if diag.is_coordinator() {
        match establish(args, diag) {
            Ok((summary, edges, plan)) => {
                let slices = scatter(&summary, edges, &plan);
                diag.in_scope(|| {
                    info!(
                        "{:?}\tscattering {} batches across {} participants (slices of {:?})",
                        diag.elapsed(),
                        summary.num_batches,
                        plan.participants(),
                        plan.slice_sizes,
                    )
                });
                (vec![encode_summary(&summary)], slices)
            }
            Err(error) => {
                let header = encode_failure(&error);
                failure = Some(error);
                (vec![header], Vec::new())
            }
        }
    } else {
        (Vec::new(), Vec::new())
    };

    let received_headers = Rc::new(RefCell::new(Vec::<Header>::new()));
    let received_slices = Rc::new(RefCell::new(Vec::<Slice>::new()));

    let header_sink = received_headers.clone();
    let slice_sink = received_slices.clone();
    worker.dataflow::<u64, _, _>(move |scope| {
        headers
            .to_stream(scope)
            .broadcast()
            .inspect(move |header| header_sink.borrow_mut().push(header.clone()));
        slices
            .to_stream(scope)
            .exchange(|slice: &Slice| slice.0)
            .inspect(move |slice| slice_sink.borrow_mut().push(slice.clone()));
    });
    while worker.step() {}

    if let Some(error) = failure {
        return Err(error);
    }

    let header = received_headers
        .borrow_mut()
        .pop()
        .ok_or_else(|| DatasetError::CoordinatorFailed("no dataset header received".to_string()))?;
    let summary = decode_header(header)?;
    let plan = PartitionPlan::new(summary.edges_per_batch, diag.peers())?;
    let slices = received_slices.replace(Vec::new());
    let edges = gather(slices, &summary, &plan, diag.rank())?;

    diag.in_scope(|| debug!("{:?}\treceived {} edges", diag.elapsed(), edges.len()));
    Ok(EdgeListDataset::from_partition(args, summary, edges))
}
