use std::process;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use timely::communication::Allocate;
use timely::worker::Worker;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use dynograph::bench::{check_algs, run_benchmark, BenchReport};
use dynograph::distribute::distribute;
use dynograph::engine::ReferenceGraph;
use dynograph::hooks::TracingHooks;
use dynograph::{dataset, Args, BenchError, Diagnostics};

fn main() {
    if let Err(err) = run() {
        error!("{:#}", err);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{}", args.to_json());
    args.validate()?;
    check_algs::<ReferenceGraph>(&args)?;

    let timer = Instant::now();
    let config = timely::Config::process(args.workers);
    let guards = timely::execute(config, move |worker| {
        let diag = Diagnostics::new(worker.index(), worker.peers());
        run_worker(worker, &args, &diag).map_err(|e| e.to_string())
    })
    .map_err(|e| anyhow!("failed to start workers: {e}"))?;

    let mut failures = 0;
    for (rank, result) in guards.join().into_iter().enumerate() {
        match result {
            Ok(Ok(report)) => {
                if rank == 0 {
                    for trial in report.trials.iter() {
                        info!("{}", serde_json::to_string(trial).context("rendering trial summary")?);
                    }
                }
            }
            Ok(Err(message)) => {
                error!("worker {}: {}", rank, message);
                failures += 1;
            }
            Err(panic) => {
                error!("worker {} panicked: {}", rank, panic);
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{} of the workers failed", failures);
    }
    info!("{:?}\tbenchmark complete", timer.elapsed());
    Ok(())
}

fn run_worker<A: Allocate>(worker: &mut Worker<A>, args: &Args, diag: &Diagnostics) -> Result<BenchReport, BenchError> {
    let mut hooks = TracingHooks::new();
    if diag.peers() > 1 {
        let mut dataset = distribute(worker, args, diag)?;
        diag.in_scope(|| run_benchmark::<ReferenceGraph, _, _>(args, &mut dataset, &mut hooks, diag))
    } else {
        let mut dataset = dataset::open(args, diag)?;
        diag.in_scope(|| run_benchmark::<ReferenceGraph, _, _>(args, &mut *dataset, &mut hooks, diag))
    }
}
