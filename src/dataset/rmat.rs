//! Synthetic datasets from a recursive-matrix (R-MAT) edge generator.
//!
//! A descriptor `a-b-c-d-ne-nv.rmat` names the quadrant probabilities and the
//! number of edges and vertices, e.g. `0.55-0.15-0.15-0.15-500M-1M.rmat`.
//! Edges are generated on demand, batch by batch, so the dataset must be read
//! in order.

use std::path::Path;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tracing::info;

use super::{check_batch_id, check_batching, epoch_boundary, window_threshold, Dataset};
use crate::config::{Args, SortMode};
use crate::diagnostics::Diagnostics;
use crate::edge::{Batch, Edge};
use crate::error::DatasetError;
use crate::{Node, Time};

/// Consecutive rejected draws after which the generator gives up.
pub const MAX_ATTEMPTS: u64 = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RmatArgs {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub num_edges: i64,
    pub num_vertices: i64,
}

/// Parses a count with an optional binary magnitude suffix (`K`, `M`, `G`, `T`).
fn parse_count(token: &str) -> Option<i64> {
    let (digits, shift) = match token.as_bytes().last()? {
        b'K' => (&token[..token.len() - 1], 10),
        b'M' => (&token[..token.len() - 1], 20),
        b'G' => (&token[..token.len() - 1], 30),
        b'T' => (&token[..token.len() - 1], 40),
        _ => (token, 0),
    };
    digits.parse::<i64>().ok()?.checked_mul(1i64 << shift)
}

impl RmatArgs {
    /// Parses and validates a descriptor.
    pub fn parse(descriptor: &str) -> Result<RmatArgs, DatasetError> {
        let args: RmatArgs = descriptor.parse().map_err(|reason| DatasetError::InvalidRmat {
            descriptor: descriptor.to_string(),
            reason,
        })?;
        args.validate().map_err(|reason| DatasetError::InvalidRmat {
            descriptor: descriptor.to_string(),
            reason,
        })?;
        Ok(args)
    }

    pub fn validate(&self) -> Result<(), String> {
        let probs = [self.a, self.b, self.c, self.d];
        let sum: f64 = probs.iter().sum();
        if probs.iter().any(|p| !(0.0..=1.0).contains(p)) || sum > 1.0 {
            return Err("parameters must fall in the range [0, 1] and sum to at most 1".to_string());
        }
        if sum <= 0.0 {
            return Err("parameters cannot all be zero".to_string());
        }
        if self.b + self.c <= 0.0 {
            return Err("b and c cannot both be zero: every edge would be a self-edge".to_string());
        }
        if self.num_edges < 1 || self.num_vertices < 1 {
            return Err("graph must have a positive number of edges and vertices".to_string());
        }
        if self.num_vertices < 2 {
            return Err("graph needs at least two vertices to avoid self-edges".to_string());
        }
        Ok(())
    }
}

impl FromStr for RmatArgs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = Path::new(s)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(s);
        let stem = name
            .strip_suffix(".rmat")
            .ok_or_else(|| "expected a .rmat suffix".to_string())?;
        let fields: Vec<&str> = stem.split('-').collect();
        if fields.len() != 6 {
            return Err(format!("expected a-b-c-d-ne-nv, found {} fields", fields.len()));
        }
        let prob = |i: usize| {
            fields[i]
                .parse::<f64>()
                .map_err(|_| format!("cannot parse probability {:?}", fields[i]))
        };
        let count = |i: usize| parse_count(fields[i]).ok_or_else(|| format!("cannot parse count {:?}", fields[i]));
        Ok(RmatArgs {
            a: prob(0)?,
            b: prob(1)?,
            c: prob(2)?,
            d: prob(3)?,
            num_edges: count(4)?,
            num_vertices: count(5)?,
        })
    }
}

/// Draws edges by recursively choosing a quadrant of the adjacency matrix.
pub struct RmatGenerator {
    num_vertices: Node,
    levels: u32,
    /// Cumulative quadrant probabilities, normalized to sum to one.
    thresholds: [f64; 3],
    rng: Pcg64,
}

impl RmatGenerator {
    pub fn new(args: &RmatArgs, seed: u64) -> Self {
        let sum = args.a + args.b + args.c + args.d;
        let levels = 64 - (args.num_vertices.max(2) as u64 - 1).leading_zeros();
        RmatGenerator {
            num_vertices: args.num_vertices,
            levels,
            thresholds: [args.a / sum, (args.a + args.b) / sum, (args.a + args.b + args.c) / sum],
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    fn draw(&mut self) -> (Node, Node) {
        let (mut src, mut dst) = (0, 0);
        for level in (0..self.levels).rev() {
            let bit = 1i64 << level;
            let r: f64 = self.rng.random();
            match self.thresholds.iter().filter(|&&t| r >= t).count() {
                0 => {}
                1 => dst |= bit,
                2 => src |= bit,
                _ => {
                    src |= bit;
                    dst |= bit;
                }
            }
        }
        (src, dst)
    }

    /// The next edge, stamped with `timestamp`.
    ///
    /// Draws that land outside the vertex range, or on the diagonal, are
    /// discarded and redrawn.
    pub fn next_edge(&mut self, timestamp: Time) -> Result<Edge, DatasetError> {
        for _ in 0..MAX_ATTEMPTS {
            let (src, dst) = self.draw();
            if src < self.num_vertices && dst < self.num_vertices && src != dst {
                return Ok(Edge::new(src, dst, 1, timestamp));
            }
        }
        Err(DatasetError::GeneratorStalled { attempts: MAX_ATTEMPTS })
    }

    /// The next `count` edges, stamped from `first_timestamp` on.
    pub fn edges(&mut self, count: usize, first_timestamp: Time) -> Result<Vec<Edge>, DatasetError> {
        (0..count as i64)
            .map(|i| self.next_edge(first_timestamp + i))
            .collect()
    }
}

pub struct RmatDataset {
    rmat: RmatArgs,
    seed: u64,
    batch_size: i64,
    num_batches: i64,
    num_epochs: i64,
    window_size: f64,
    generator: RmatGenerator,
    current_batch: i64,
    next_timestamp: Time,
    /// Every edge generated so far, kept only when snapshots are needed.
    history: Vec<Edge>,
    retain_history: bool,
    snapshots: bool,
}

impl RmatDataset {
    pub fn new(args: &Args, diag: &Diagnostics) -> Result<Self, DatasetError> {
        let rmat = RmatArgs::parse(&args.input_path)?;
        let num_batches = check_batching(args, rmat.num_edges)?;
        diag.in_scope(|| {
            info!(
                "{:?}\tgenerating {} edges over {} vertices (a={} b={} c={} d={}, seed {:#x})",
                diag.elapsed(),
                rmat.num_edges,
                rmat.num_vertices,
                rmat.a,
                rmat.b,
                rmat.c,
                rmat.d,
                args.seed,
            )
        });
        Ok(RmatDataset {
            generator: RmatGenerator::new(&rmat, args.seed),
            rmat,
            seed: args.seed,
            batch_size: args.batch_size,
            num_batches,
            num_epochs: args.num_epochs,
            window_size: args.window_size,
            current_batch: 0,
            next_timestamp: 0,
            history: Vec::new(),
            retain_history: args.sort_mode == SortMode::Snapshot,
            snapshots: args.sort_mode == SortMode::Snapshot,
        })
    }

    /// Generates the next batch in sequence.
    fn advance(&mut self) -> Result<Vec<Edge>, DatasetError> {
        let edges = self.generator.edges(self.batch_size as usize, self.next_timestamp)?;
        self.next_timestamp += self.batch_size;
        self.current_batch += 1;
        Ok(edges)
    }
}

impl Dataset for RmatDataset {
    fn batch(&mut self, batch_id: i64) -> Result<Batch<'_>, DatasetError> {
        check_batch_id(batch_id, self.num_batches)?;
        if batch_id != self.current_batch {
            return Err(DatasetError::OutOfOrder { requested: batch_id, expected: self.current_batch });
        }
        let edges = self.advance()?;
        if self.retain_history {
            let start = self.history.len();
            self.history.extend(edges);
            Ok(Batch::new(&self.history[start..]))
        } else {
            Ok(Batch::owned(edges))
        }
    }

    /// Generates any batches through `batch_id` not yet generated.
    ///
    /// Needs the full history, so outside snapshot mode this only works
    /// before the first batch has been taken.
    fn batches_up_to(&mut self, batch_id: i64) -> Result<Batch<'_>, DatasetError> {
        check_batch_id(batch_id, self.num_batches)?;
        if !self.retain_history {
            if self.current_batch > 0 {
                return Err(DatasetError::OutOfOrder { requested: batch_id, expected: 0 });
            }
            self.retain_history = true;
        }
        while self.current_batch <= batch_id {
            let edges = self.advance()?;
            self.history.extend(edges);
        }
        let end = ((batch_id + 1) * self.batch_size) as usize;
        Ok(Batch::new(&self.history[..end]))
    }

    fn timestamp_for_window(&self, batch_id: i64) -> Time {
        let latest = (batch_id + 1) * self.batch_size - 1;
        window_threshold(self.window_size, 0, self.rmat.num_edges - 1, latest)
    }

    fn enable_algs_for_batch(&self, batch_id: i64) -> bool {
        epoch_boundary(batch_id, self.num_batches, self.num_epochs)
    }

    fn num_batches(&self) -> i64 {
        self.num_batches
    }

    fn num_edges(&self) -> i64 {
        self.rmat.num_edges
    }

    fn max_vertex_id(&self) -> Node {
        self.rmat.num_vertices - 1
    }

    fn is_directed(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        self.generator = RmatGenerator::new(&self.rmat, self.seed);
        self.current_batch = 0;
        self.next_timestamp = 0;
        self.history.clear();
        self.retain_history = self.snapshots;
    }
}
