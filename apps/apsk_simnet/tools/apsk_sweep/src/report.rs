//! CSV and JSON export of sweep results

use std::io::{self, Write};

use apsk_physics::{Constellation, SweepResult};
use serde::Serialize;

/// Append one block per ring ratio: a `b = <b>` row, then `ber,ser,snr` rows
pub fn write_csv<W: Write>(mut out: W, results: &[SweepResult]) -> io::Result<()> {
    for sweep in results {
        writeln!(out, "b = {}", sweep.b)?;
        for point in &sweep.points {
            writeln!(out, "{},{},{}", point.result.ber, point.result.ser, point.result.snr)?;
        }
    }
    out.flush()
}

#[derive(Debug, Serialize)]
pub struct PointRow {
    pub index: usize,
    pub re: f64,
    pub im: f64,
    pub label: String,
}

/// Everything a plotter needs to draw one constellation
#[derive(Debug, Serialize)]
pub struct ConstellationDump {
    pub ring_symbols: usize,
    pub b: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub points: Vec<PointRow>,
}

impl From<&Constellation> for ConstellationDump {
    fn from(c: &Constellation) -> Self {
        Self {
            ring_symbols: c.ring_symbols(),
            b: c.ratio(),
            inner_radius: c.inner_radius(),
            outer_radius: c.outer_radius(),
            points: c
                .points()
                .iter()
                .map(|p| PointRow {
                    index: p.index,
                    re: p.vector.re,
                    im: p.vector.im,
                    label: p.label.to_string(),
                })
                .collect(),
        }
    }
}
