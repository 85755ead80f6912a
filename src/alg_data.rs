//! Per-algorithm result buffers, shared across the trials of a run.

use tracing::debug;

use crate::Node;

/// What one algorithm's buffer held at the end of an epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochResult {
    pub epoch: i64,
    pub alg: String,
    /// Entries holding a result (non-negative).
    pub reached: usize,
    pub max_value: i64,
}

/// One vertex-indexed `i64` buffer per algorithm.
///
/// Algorithms update their buffer in place, so repeated algorithm trials
/// within an epoch must start from a [`checkpoint`](AlgDataManager::checkpoint)
/// rather than from the previous trial's output.
#[derive(Debug, Clone)]
pub struct AlgDataManager {
    buffers: Vec<(String, Vec<i64>)>,
    saved: Vec<Vec<i64>>,
    epoch: i64,
    results: Vec<EpochResult>,
}

impl AlgDataManager {
    pub fn new(max_vertex_id: Node, algs: &[String]) -> Self {
        let len = (max_vertex_id + 1).max(0) as usize;
        AlgDataManager {
            buffers: algs.iter().map(|alg| (alg.clone(), vec![-1; len])).collect(),
            saved: Vec::new(),
            epoch: 0,
            results: Vec::new(),
        }
    }

    pub fn data(&self, alg: &str) -> Option<&[i64]> {
        self.buffers.iter().find(|(a, _)| a == alg).map(|(_, data)| data.as_slice())
    }

    pub fn data_mut(&mut self, alg: &str) -> Option<&mut [i64]> {
        self.buffers.iter_mut().find(|(a, _)| a == alg).map(|(_, data)| data.as_mut_slice())
    }

    /// Clears every buffer and the captured results, for a new trial.
    pub fn begin_trial(&mut self) {
        for (_, data) in self.buffers.iter_mut() {
            data.iter_mut().for_each(|d| *d = -1);
        }
        self.saved.clear();
        self.epoch = 0;
        self.results.clear();
    }

    pub fn checkpoint(&mut self) {
        self.saved = self.buffers.iter().map(|(_, data)| data.clone()).collect();
    }

    /// Restores the buffers saved by the last checkpoint, if any.
    pub fn rollback(&mut self) {
        for ((_, data), saved) in self.buffers.iter_mut().zip(self.saved.iter()) {
            data.copy_from_slice(saved);
        }
    }

    /// Records every buffer's state as the result of the current epoch.
    pub fn next_epoch(&mut self) {
        for (alg, data) in self.buffers.iter() {
            let result = EpochResult {
                epoch: self.epoch,
                alg: alg.clone(),
                reached: data.iter().filter(|&&d| d >= 0).count(),
                max_value: data.iter().copied().max().unwrap_or(-1),
            };
            debug!("epoch {} {}: {} vertices reached (max {})", result.epoch, alg, result.reached, result.max_value);
            self.results.push(result);
        }
        self.epoch += 1;
    }

    pub fn epoch(&self) -> i64 {
        self.epoch
    }

    pub fn results(&self) -> &[EpochResult] {
        &self.results
    }
}
