//! Command-line arguments and sweep plan assembly

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use apsk_physics::{RatioSweep, SweepPlan};
use clap::Parser;

/// Simulate dual-ring APSK over AWGN and export BER/SER against SNR.
#[derive(Parser, Debug)]
#[command(
    name = "apsk-sweep",
    about = "Simulate dual-ring APSK over AWGN and export BER/SER against SNR"
)]
pub struct Args {
    /// JSON sweep plan; the flags below override its fields.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Symbols simulated per SNR point.
    #[arg(short = 'n', long)]
    pub symbols: Option<usize>,

    /// Symbols per ring (M); 2M must be a power of two.
    #[arg(short = 'm', long)]
    pub ring_symbols: Option<usize>,

    /// Ring ratio and starting SNR as `b:snr_db`. Repeatable.
    #[arg(long = "pair", value_parser = parse_pair)]
    pub pairs: Vec<RatioSweep>,

    /// SNR points per ring ratio.
    #[arg(long)]
    pub steps: Option<usize>,

    /// SNR increment between points, dB.
    #[arg(long)]
    pub step_db: Option<f64>,

    /// Master seed for every experiment.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run experiments on a single thread.
    #[arg(long)]
    pub sequential: bool,

    /// CSV file the results are appended to.
    #[arg(long, default_value = "results.csv")]
    pub csv: PathBuf,

    /// Skip the CSV export.
    #[arg(long)]
    pub no_csv: bool,

    /// Print all results as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Print each ring ratio's constellation points as JSON on stdout.
    #[arg(long)]
    pub constellation: bool,
}

impl Args {
    /// Plan from `--config` (or defaults) with flag overrides applied
    pub fn plan(&self) -> Result<SweepPlan> {
        let mut plan = match &self.config {
            Some(path) => load_plan(path)?,
            None => SweepPlan::default(),
        };
        if let Some(n) = self.symbols {
            plan.symbol_count = n;
        }
        if let Some(m) = self.ring_symbols {
            plan.ring_symbols = m;
        }
        if !self.pairs.is_empty() {
            plan.pairs = self.pairs.clone();
        }
        if let Some(steps) = self.steps {
            plan.steps = steps;
        }
        if let Some(step) = self.step_db {
            plan.snr_step_db = step;
        }
        if let Some(seed) = self.seed {
            plan.seed = seed;
        }
        if self.sequential {
            plan.parallel = false;
        }
        Ok(plan)
    }
}

pub fn load_plan(path: &Path) -> Result<SweepPlan> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading sweep plan {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing sweep plan {}", path.display()))
}

fn parse_pair(s: &str) -> std::result::Result<RatioSweep, String> {
    let (b, snr) = s
        .split_once(':')
        .ok_or_else(|| format!("expected b:snr_db, got {:?}", s))?;
    let b = b.trim().parse().map_err(|e| format!("bad b {:?}: {}", b, e))?;
    let snr_start_db = snr
        .trim()
        .parse()
        .map_err(|e| format!("bad SNR {:?}: {}", snr, e))?;
    Ok(RatioSweep { b, snr_start_db })
}
