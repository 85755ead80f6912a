//! The benchmark loop: trials of batches, with algorithm runs at epochs.

use serde::Serialize;
use tracing::info;

use crate::alg_data::{AlgDataManager, EpochResult};
use crate::config::{Args, SortMode};
use crate::dataset::Dataset;
use crate::diagnostics::Diagnostics;
use crate::engine::DynamicGraph;
use crate::error::BenchError;
use crate::hooks::Hooks;
use crate::Node;

/// Number of source vertices handed to `alg` at each run.
pub fn num_sources_for_alg(alg: &str) -> usize {
    match alg {
        "bfs" | "sssp" => 1,
        "bc" => 128,
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialSummary {
    pub trial: i64,
    pub epochs: i64,
    /// Batches inserted into the engine (snapshots count once each).
    pub batches_applied: i64,
    pub num_vertices: i64,
    pub num_edges: i64,
}

#[derive(Debug, Clone, Default)]
pub struct BenchReport {
    pub trials: Vec<TrialSummary>,
    /// Per-epoch algorithm results of the last trial.
    pub results: Vec<EpochResult>,
}

/// Rejects algorithms the engine cannot run.
pub fn check_algs<G: DynamicGraph>(args: &Args) -> Result<(), BenchError> {
    let supported = G::supported_algs();
    match args.algs().iter().find(|alg| !supported.contains(&alg.as_str())) {
        Some(alg) => Err(BenchError::UnsupportedAlg {
            alg: alg.clone(),
            supported: supported.iter().map(|s| s.to_string()).collect(),
        }),
        None => Ok(()),
    }
}

/// Highest-degree vertices, as many as `alg` wants.
fn pick_sources<G: DynamicGraph>(graph: &G, alg: &str) -> Vec<Node> {
    graph
        .get_high_degree_vertices(num_sources_for_alg(alg))
        .into_iter()
        .map(|d| d.vertex_id)
        .collect()
}

/// Runs every configured algorithm `num_alg_trials` times, each time from
/// the same starting buffers, then records the epoch's results.
fn run_epoch<G: DynamicGraph, H: Hooks>(
    args: &Args,
    graph: &mut G,
    alg_data: &mut AlgDataManager,
    hooks: &mut H,
) -> Result<(), BenchError> {
    alg_data.checkpoint();
    for alg_trial in 0..args.num_alg_trials {
        if alg_trial > 0 {
            alg_data.rollback();
        }
        hooks.set_attr("alg_trial", alg_trial.into());
        for alg in args.algs() {
            let sources = pick_sources(graph, alg);
            let data = alg_data
                .data_mut(alg)
                .ok_or_else(|| BenchError::Engine(format!("no result buffer for {alg}")))?;
            hooks.region(alg, |_| graph.update_alg(alg, &sources, data))?;
        }
    }
    alg_data.next_epoch();
    Ok(())
}

/// Streams `dataset` into a fresh `G` once per trial.
///
/// Outside snapshot mode each batch is windowed, optionally deleted from and
/// inserted incrementally. In snapshot mode nothing happens between epochs;
/// at each epoch the engine is reset and loaded with the deduplicated,
/// windowed history.
pub fn run_benchmark<G, D, H>(
    args: &Args,
    dataset: &mut D,
    hooks: &mut H,
    diag: &Diagnostics,
) -> Result<BenchReport, BenchError>
where
    G: DynamicGraph,
    D: Dataset + ?Sized,
    H: Hooks,
{
    check_algs::<G>(args)?;

    let max_vertex_id = dataset.max_vertex_id();
    let mut alg_data = AlgDataManager::new(max_vertex_id, args.algs());
    let mut report = BenchReport::default();

    for trial in 0..args.num_trials {
        hooks.set_attr("trial", trial.into());
        dataset.reset();
        alg_data.begin_trial();
        let mut graph = G::new(args, max_vertex_id)?;
        let mut epoch: i64 = 0;
        let mut batches_applied: i64 = 0;

        for batch_id in 0..dataset.num_batches() {
            hooks.set_attr("batch", batch_id.into());
            hooks.set_attr("epoch", epoch.into());
            let enable = dataset.enable_algs_for_batch(batch_id);
            let threshold = dataset.timestamp_for_window(batch_id);

            if args.sort_mode == SortMode::Snapshot {
                if enable {
                    hooks.region_begin("snapshot");
                    graph.reset(args, max_vertex_id)?;
                    let snapshot = dataset.prepared_batch(batch_id, SortMode::Snapshot)?;
                    graph.before_batch(&snapshot, threshold);
                    graph.insert_batch(&snapshot)?;
                    hooks.region_end();
                    batches_applied += 1;
                }
            } else {
                hooks.region_begin("preprocess");
                let batch = dataset.prepared_batch(batch_id, args.sort_mode)?;
                hooks.region_end();

                graph.before_batch(&batch, threshold);
                if args.window_size < 1.0 {
                    hooks.region("deletions", |_| graph.delete_edges_older_than(threshold))?;
                }
                hooks.region("insertions", |_| graph.insert_batch(&batch))?;
                batches_applied += 1;
            }

            hooks.set_attr("num_vertices", graph.get_num_vertices().into());
            hooks.set_attr("num_edges", graph.get_num_edges().into());

            if enable {
                run_epoch(args, &mut graph, &mut alg_data, hooks)?;
                epoch += 1;
            }
        }

        if epoch != args.num_epochs {
            return Err(BenchError::EpochMismatch { trial, executed: epoch, expected: args.num_epochs });
        }

        let summary = TrialSummary {
            trial,
            epochs: epoch,
            batches_applied,
            num_vertices: graph.get_num_vertices(),
            num_edges: graph.get_num_edges(),
        };
        diag.in_scope(|| {
            info!(
                "{:?}\ttrial {} complete: {} epochs, {} vertices, {} edges",
                diag.elapsed(),
                trial,
                summary.epochs,
                summary.num_vertices,
                summary.num_edges,
            )
        });
        report.trials.push(summary);
    }

    report.results = alg_data.results().to_vec();
    Ok(report)
}
