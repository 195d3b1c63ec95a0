//! `apsk-sweep`: runs dual-ring APSK SER/BER sweeps
//!
//! Appends `(ber, ser, snr)` rows per ring ratio to a CSV file and can dump
//! results and constellation points as JSON for an external plotter.
//!
//! ```text
//! apsk-sweep -n 100000 -m 8 --pair 0.5:0 --pair 0.7:2 [--json] [--constellation]
//! ```

mod cli;
mod report;

use std::fs::OpenOptions;
use std::io::BufWriter;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Args;
use report::ConstellationDump;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let plan = args.plan()?;
    let sweeps = plan.sweeps().context("invalid sweep plan")?;

    let started = Instant::now();
    info!(
        ring_symbols = plan.ring_symbols,
        symbols = plan.symbol_count,
        pairs = sweeps.len(),
        "starting sweeps"
    );

    let mut results = Vec::with_capacity(sweeps.len());
    for sweep in &sweeps {
        let result = sweep.run()?;
        for point in &result.points {
            info!(
                b = result.b,
                desired_snr_db = point.desired_snr_db,
                ber = point.result.ber,
                ser = point.result.ser,
                snr = point.result.snr,
                "sweep point"
            );
        }
        results.push(result);
    }

    if !args.no_csv {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&args.csv)
            .with_context(|| format!("opening {}", args.csv.display()))?;
        report::write_csv(BufWriter::new(file), &results)
            .with_context(|| format!("writing {}", args.csv.display()))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    if args.constellation {
        let dumps: Vec<ConstellationDump> = sweeps
            .iter()
            .map(|s| ConstellationDump::from(s.constellation()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&dumps)?);
    }

    info!(elapsed_ms = started.elapsed().as_millis() as u64, "done");
    Ok(())
}
