//! Datasets: sources of numbered edge batches.
//!
//! A dataset hands out batches `0 .. num_batches()` and answers the two
//! questions the benchmark loop asks about each one: which edges have aged
//! out of the window ([`Dataset::timestamp_for_window`]) and whether the
//! algorithms run after it ([`Dataset::enable_algs_for_batch`]).

use crate::config::{Args, SortMode};
use crate::diagnostics::Diagnostics;
use crate::edge::Batch;
use crate::error::DatasetError;
use crate::{Node, Time};

pub mod edgelist;
pub mod io;
pub mod rmat;

pub use edgelist::EdgeListDataset;
pub use rmat::{RmatArgs, RmatDataset};

pub trait Dataset {
    /// The raw edges of batch `batch_id`.
    fn batch(&mut self, batch_id: i64) -> Result<Batch<'_>, DatasetError>;

    /// All edges from the first through the end of batch `batch_id`.
    fn batches_up_to(&mut self, batch_id: i64) -> Result<Batch<'_>, DatasetError>;

    /// Edges older than the returned timestamp fall outside the window.
    fn timestamp_for_window(&self, batch_id: i64) -> Time;

    /// True if an epoch ends with batch `batch_id`.
    fn enable_algs_for_batch(&self, batch_id: i64) -> bool;

    fn num_batches(&self) -> i64;

    fn num_edges(&self) -> i64;

    fn max_vertex_id(&self) -> Node;

    fn is_directed(&self) -> bool;

    /// Rewinds to batch zero. Generated datasets replay the same edges.
    fn reset(&mut self);

    /// The batch as the engine should see it under `sort_mode`.
    ///
    /// In snapshot mode this is the deduplicated cumulative prefix through
    /// `batch_id`, which replaces the graph's contents entirely.
    fn prepared_batch(&mut self, batch_id: i64, sort_mode: SortMode) -> Result<Batch<'_>, DatasetError> {
        let threshold = self.timestamp_for_window(batch_id);
        Ok(match sort_mode {
            SortMode::Unsorted => self.batch(batch_id)?.filtered(threshold),
            SortMode::Presort => self.batch(batch_id)?.filtered(threshold).deduplicated(),
            SortMode::Snapshot => self.batches_up_to(batch_id)?.filtered(threshold).deduplicated(),
        })
    }
}

/// Width of the window, in timestamp units, and where it starts for a batch
/// whose last edge has timestamp `latest`.
pub fn window_threshold(window_size: f64, min_timestamp: Time, max_timestamp: Time, latest: Time) -> Time {
    let span = max_timestamp as i128 - min_timestamp as i128;
    let window_time = (window_size * span as f64).floor() as i128;
    let threshold = (latest as i128 - window_time).clamp(min_timestamp as i128, latest.max(min_timestamp) as i128);
    threshold as Time
}

/// True if the epoch count changes between `batch_id` and the next batch.
///
/// Spreads exactly `num_epochs` trigger points over `num_batches` batches,
/// the last batch always among them.
///
/// With `batches_per_epoch = num_batches / num_epochs`, the epochs completed
/// before batch `b` are `floor(b / batches_per_epoch)`, computed here as
/// `b * num_epochs / num_batches` in integers so rounding cannot drop the
/// final trigger.
pub fn epoch_boundary(batch_id: i64, num_batches: i64, num_epochs: i64) -> bool {
    let epochs_before = |b: i64| (b as i128 * num_epochs as i128) / num_batches as i128;
    epochs_before(batch_id + 1) > epochs_before(batch_id)
}

/// Checks the batch size and epoch count against the dataset's size,
/// returning the number of batches.
pub fn check_batching(args: &Args, num_edges: i64) -> Result<i64, DatasetError> {
    if args.batch_size > num_edges {
        return Err(DatasetError::BatchTooLarge { batch_size: args.batch_size, num_edges });
    }
    // rounds down: trailing edges that do not fill a batch are never used.
    let num_batches = num_edges / args.batch_size;
    if args.num_epochs > num_batches {
        return Err(DatasetError::TooManyEpochs { num_epochs: args.num_epochs, num_batches });
    }
    Ok(num_batches)
}

pub(crate) fn check_batch_id(batch_id: i64, num_batches: i64) -> Result<(), DatasetError> {
    if batch_id < 0 || batch_id >= num_batches {
        Err(DatasetError::BatchOutOfRange { batch_id, num_batches })
    } else {
        Ok(())
    }
}

/// Opens the dataset named by `args.input_path`.
pub fn open(args: &Args, diag: &Diagnostics) -> Result<Box<dyn Dataset>, DatasetError> {
    if args.is_rmat() {
        Ok(Box::new(RmatDataset::new(args, diag)?))
    } else {
        Ok(Box::new(EdgeListDataset::load(args, diag)?))
    }
}

impl<D: Dataset + ?Sized> Dataset for Box<D> {
    fn batch(&mut self, batch_id: i64) -> Result<Batch<'_>, DatasetError> {
        (**self).batch(batch_id)
    }
    fn batches_up_to(&mut self, batch_id: i64) -> Result<Batch<'_>, DatasetError> {
        (**self).batches_up_to(batch_id)
    }
    fn timestamp_for_window(&self, batch_id: i64) -> Time {
        (**self).timestamp_for_window(batch_id)
    }
    fn enable_algs_for_batch(&self, batch_id: i64) -> bool {
        (**self).enable_algs_for_batch(batch_id)
    }
    fn num_batches(&self) -> i64 {
        (**self).num_batches()
    }
    fn num_edges(&self) -> i64 {
        (**self).num_edges()
    }
    fn max_vertex_id(&self) -> Node {
        (**self).max_vertex_id()
    }
    fn is_directed(&self) -> bool {
        (**self).is_directed()
    }
    fn reset(&mut self) {
        (**self).reset()
    }
}
