//! Writes a generated R-MAT edge stream to a `.graph.el` or `.graph.bin` file.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dynograph::dataset::io::write_edges;
use dynograph::dataset::rmat::{RmatArgs, RmatGenerator};

#[derive(Parser, Debug)]
#[command(name = "rmat")]
#[command(about = "Generate an R-MAT edge list with sequential timestamps")]
struct Cli {
    /// Generator descriptor, e.g. 0.55-0.15-0.15-0.15-1M-64K.rmat
    descriptor: String,

    /// Output file (.graph.el or .graph.bin)
    output: String,

    /// Generator seed
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let timer = Instant::now();
    let rmat = RmatArgs::parse(&cli.descriptor)?;
    let mut generator = RmatGenerator::new(&rmat, cli.seed);
    let edges = generator
        .edges(rmat.num_edges as usize, 0)
        .with_context(|| format!("generating {}", cli.descriptor))?;
    info!("{:?}\tgenerated {} edges", timer.elapsed(), edges.len());

    write_edges(&cli.output, &edges).with_context(|| format!("writing {}", cli.output))?;
    info!("{:?}\twrote {}", timer.elapsed(), cli.output);
    Ok(())
}
