//! Run configuration.

use std::fmt;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How each batch is prepared before it reaches the graph engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Drop edges older than the window; duplicates pass through.
    #[default]
    Unsorted,
    /// Sort and deduplicate each batch before inserting it.
    Presort,
    /// Rebuild the graph at each epoch from a deduplicated cumulative snapshot.
    Snapshot,
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortMode::Unsorted => "unsorted",
            SortMode::Presort => "presort",
            SortMode::Snapshot => "snapshot",
        })
    }
}

/// Benchmark arguments. Validated once, before any dataset work.
#[derive(Parser, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[command(name = "dynograph")]
#[command(about = "Stream a time-ordered edge list into a dynamic graph engine and run algorithms at epochs")]
pub struct Args {
    /// Number of epochs (algorithm updates) in the benchmark
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub num_epochs: i64,

    /// Edge list to load (.graph.el or .graph.bin), or an rmat descriptor (a-b-c-d-ne-nv.rmat)
    #[arg(long, default_value = "")]
    pub input_path: String,

    /// Number of edges in each batch of insertions
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub batch_size: i64,

    /// Algorithms to run in each epoch, separated by spaces
    #[arg(long, default_value = "", value_parser = parse_alg_names)]
    pub alg_names: AlgNames,

    /// Batch preprocessing
    #[arg(long, value_enum, default_value_t = SortMode::Unsorted)]
    pub sort_mode: SortMode,

    /// Fraction of the graph's time span to hold in memory
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub window_size: f64,

    /// Number of times to repeat the benchmark
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub num_trials: i64,

    /// Number of times to repeat each algorithm at every epoch
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub num_alg_trials: i64,

    /// Number of cooperating workers; worker 0 loads and distributes the dataset
    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    /// Seed for synthetic (rmat) datasets
    #[arg(long, default_value_t = 0x5eed)]
    pub seed: u64,

    /// Verbose output
    #[arg(short, long)]
    #[serde(skip)]
    pub verbose: bool,
}

/// Algorithm names, in the order they run at each epoch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlgNames(pub Vec<String>);

fn parse_alg_names(s: &str) -> Result<AlgNames, String> {
    Ok(AlgNames(s.split_whitespace().map(String::from).collect()))
}

impl Args {
    /// A configuration with defaults for everything but the required fields.
    pub fn new(input_path: impl Into<String>, batch_size: i64, num_epochs: i64) -> Self {
        Args {
            num_epochs,
            input_path: input_path.into(),
            batch_size,
            alg_names: AlgNames::default(),
            sort_mode: SortMode::Unsorted,
            window_size: 1.0,
            num_trials: 1,
            num_alg_trials: 1,
            workers: 1,
            seed: 0x5eed,
            verbose: false,
        }
    }

    pub fn with_algs<I, S>(mut self, algs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alg_names = AlgNames(algs.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_sort_mode(mut self, sort_mode: SortMode) -> Self {
        self.sort_mode = sort_mode;
        self
    }

    pub fn with_window_size(mut self, window_size: f64) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_trials(mut self, num_trials: i64, num_alg_trials: i64) -> Self {
        self.num_trials = num_trials;
        self.num_alg_trials = num_alg_trials;
        self
    }

    pub fn algs(&self) -> &[String] {
        &self.alg_names.0
    }

    pub fn is_rmat(&self) -> bool {
        self.input_path.ends_with(".rmat")
    }

    /// Checks every constraint, reporting all violations at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        if self.num_epochs < 1 {
            problems.push("--num-epochs must be positive".to_string());
        }
        if self.input_path.is_empty() {
            problems.push("--input-path cannot be empty".to_string());
        }
        if self.batch_size < 1 {
            problems.push("--batch-size must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.window_size) {
            problems.push("--window-size must be in the range [0.0, 1.0]".to_string());
        }
        if self.num_trials < 1 {
            problems.push("--num-trials must be positive".to_string());
        }
        if self.num_alg_trials < 1 {
            problems.push("--num-alg-trials must be positive".to_string());
        }
        if self.workers < 1 {
            problems.push("--workers must be positive".to_string());
        }
        if self.workers > 1 && self.is_rmat() {
            problems.push("--workers must be 1 for generated (.rmat) datasets".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError(problems))
        }
    }

    /// Single-line JSON rendering, echoed at startup.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }
}
