use dynograph::bench::run_benchmark;
use dynograph::dataset::io::write_edges;
use dynograph::dataset::{Dataset, EdgeListDataset};
use dynograph::distribute::distribute;
use dynograph::engine::ReferenceGraph;
use dynograph::hooks::NoopHooks;
use dynograph::{Args, Diagnostics, Edge};

fn stream(n: i64) -> Vec<Edge> {
    (0..n).map(|t| Edge::new(t % 11, (t * 7 + 1) % 13 + 11, 1, t)).collect()
}

/// Runs `f` on `workers` timely workers, each holding its share of the dataset.
fn on_workers<T, F>(args: Args, workers: usize, f: F) -> Vec<Result<T, String>>
where
    T: Send + 'static,
    F: Fn(&Args, &Diagnostics, EdgeListDataset) -> T + Send + Sync + 'static,
{
    let guards = timely::execute(timely::Config::process(workers), move |worker| {
        let diag = Diagnostics::new(worker.index(), worker.peers());
        distribute(worker, &args, &diag)
            .map(|dataset| f(&args, &diag, dataset))
            .map_err(|e| e.to_string())
    })
    .unwrap();
    guards.join().into_iter().map(|r| r.and_then(|inner| inner)).collect()
}

#[test]
fn every_batch_is_split_across_workers() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("stream.graph.bin").to_string_lossy().into_owned();
    write_edges(&file, &stream(103)).unwrap();

    // 10 batches of 10; the last 3 edges are never used.
    let args = Args::new(file, 10, 5).with_window_size(0.5);
    let shares = on_workers(args, 3, |_, diag, mut dataset| {
        let batches: Vec<Vec<Edge>> = (0..dataset.num_batches()).map(|b| dataset.batch(b).unwrap().to_vec()).collect();
        let thresholds: Vec<i64> = (0..dataset.num_batches()).map(|b| dataset.timestamp_for_window(b)).collect();
        (diag.rank(), dataset.max_vertex_id(), batches, thresholds)
    });

    let shares: Vec<_> = shares.into_iter().map(|s| s.unwrap()).collect();
    assert_eq!(shares.len(), 3);
    let expected = stream(100);
    for batch_id in 0..10 {
        let mut rebuilt = Vec::new();
        for rank in 0..3 {
            let (_, max_vertex_id, batches, thresholds) = shares.iter().find(|s| s.0 == rank).unwrap();
            assert_eq!(*max_vertex_id, 23);
            assert_eq!(batches[batch_id].len(), if rank == 0 { 4 } else { 3 });
            // span is 102, window is 51 wide; batch b ends at 10b + 9.
            assert_eq!(thresholds[batch_id], std::cmp::max(0, 10 * batch_id as i64 + 9 - 51));
            rebuilt.extend(batches[batch_id].iter().copied());
        }
        assert_eq!(rebuilt, expected[batch_id * 10..(batch_id + 1) * 10]);
    }
}

#[test]
fn coordinator_failure_reaches_every_worker() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("missing.graph.el").to_string_lossy().into_owned();
    let args = Args::new(file, 10, 1);
    let results = on_workers(args, 2, |_, _, dataset| dataset.num_edges());
    assert_eq!(results.len(), 2);
    assert!(results[0].as_ref().unwrap_err().contains("missing.graph.el"));
    assert!(results[1].as_ref().unwrap_err().contains("coordinator failed"));
}

#[test]
fn batches_too_small_to_split_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("small.graph.el").to_string_lossy().into_owned();
    write_edges(&file, &stream(12)).unwrap();
    let args = Args::new(file, 2, 1);
    let results = on_workers(args, 4, |_, _, dataset| dataset.num_edges());
    assert!(results.iter().all(|r| r.is_err()));
}

#[test]
fn each_worker_runs_its_own_benchmark() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("stream.graph.el").to_string_lossy().into_owned();
    write_edges(&file, &stream(120)).unwrap();
    let args = Args::new(file, 12, 4).with_algs(["bfs"]);
    let reports = on_workers(args, 2, |args, diag, mut dataset| {
        run_benchmark::<ReferenceGraph, _, _>(args, &mut dataset, &mut NoopHooks, diag)
            .map(|report| (report.trials[0].epochs, report.trials[0].batches_applied))
            .map_err(|e| e.to_string())
    });
    for report in reports {
        assert_eq!(report.unwrap(), Ok((4, 10)));
    }
}
