//! APSK Physics NIF for the simnet application
//!
//! Exposes constellation construction, single SER/BER experiments and SNR
//! sweeps to Elixir. Experiments and sweeps run on dirty CPU schedulers.

pub mod registry;
pub mod types;

use std::sync::Arc;

use rustler::NifResult;

use apsk_physics::{Constellation, Experiment, Sweep};
use registry::Registry;
use types::{ConstellationInfo, ExperimentParams, ExperimentResult, PointTuple, SweepParams, SweepPoint};

// Global registry for constellation handles
lazy_static::lazy_static! {
    static ref CONSTELLATIONS: Registry<Constellation> = Registry::new(1024);
}

mod atoms {
    rustler::atoms! {
        ok,
        error,
    }
}

rustler::init!("Elixir.ApskSimnet.Physics.Nif");

fn term_error<E: ToString>(err: E) -> rustler::Error {
    rustler::Error::Term(Box::new(err.to_string()))
}

fn lookup(constellation_id: u64) -> NifResult<Arc<Constellation>> {
    CONSTELLATIONS
        .get(constellation_id)
        .ok_or_else(|| rustler::Error::Term(Box::new("constellation_not_found")))
}

/// Builds a constellation and returns its registry handle.
#[rustler::nif]
fn create_constellation(
    ring_symbols: u64,
    inner_radius: f64,
    outer_radius: f64,
) -> NifResult<(rustler::Atom, u64)> {
    let ring_symbols = usize::try_from(ring_symbols).map_err(term_error)?;
    let constellation =
        Constellation::new(ring_symbols, inner_radius, outer_radius).map_err(term_error)?;

    match CONSTELLATIONS.insert(constellation) {
        Some(id) => Ok((atoms::ok(), id)),
        None => Err(rustler::Error::Term(Box::new("registry_full"))),
    }
}

/// Builds the experiment-convention constellation (inner 1, outer 1/b).
#[rustler::nif]
fn create_constellation_for_ratio(ring_symbols: u64, b: f64) -> NifResult<(rustler::Atom, u64)> {
    let ring_symbols = usize::try_from(ring_symbols).map_err(term_error)?;
    let constellation = Constellation::from_ratio(ring_symbols, b).map_err(term_error)?;

    match CONSTELLATIONS.insert(constellation) {
        Some(id) => Ok((atoms::ok(), id)),
        None => Err(rustler::Error::Term(Box::new("registry_full"))),
    }
}

/// Lists points as {index, re, im, label} for plotting.
#[rustler::nif]
fn constellation_points(constellation_id: u64) -> NifResult<(rustler::Atom, Vec<PointTuple>)> {
    let constellation = lookup(constellation_id)?;
    let points = constellation.points().iter().map(types::point_tuple).collect();
    Ok((atoms::ok(), points))
}

/// Returns radii, sizes and powers of a constellation.
#[rustler::nif]
fn constellation_info(constellation_id: u64) -> NifResult<(rustler::Atom, ConstellationInfo)> {
    let constellation = lookup(constellation_id)?;
    Ok((atoms::ok(), ConstellationInfo::from(constellation.as_ref())))
}

/// Runs one experiment against a registered constellation.
#[rustler::nif(schedule = "DirtyCpu")]
fn run_experiment(
    constellation_id: u64,
    params: ExperimentParams,
) -> NifResult<(rustler::Atom, ExperimentResult)> {
    let constellation = lookup(constellation_id)?;
    let core_params = params.to_core().map_err(term_error)?;
    let experiment = Experiment::new(&constellation, core_params).map_err(term_error)?;

    let result = if params.parallel {
        experiment.run_parallel(params.seed)
    } else {
        experiment.run_seeded(params.seed)
    };
    Ok((atoms::ok(), result.into()))
}

/// Runs a full SNR sweep for one b.
#[rustler::nif(schedule = "DirtyCpu")]
fn run_sweep(params: SweepParams) -> NifResult<(rustler::Atom, Vec<SweepPoint>)> {
    let sweep = Sweep::new(params.to_core().map_err(term_error)?).map_err(term_error)?;
    let result = sweep.run().map_err(term_error)?;
    Ok((atoms::ok(), result.points.into_iter().map(SweepPoint::from).collect()))
}

/// Releases a constellation handle.
#[rustler::nif]
fn destroy_constellation(constellation_id: u64) -> NifResult<rustler::Atom> {
    CONSTELLATIONS.remove(constellation_id);
    Ok(atoms::ok())
}

/// Returns the number of live constellation handles.
#[rustler::nif]
fn constellation_count() -> NifResult<u64> {
    Ok(CONSTELLATIONS.count() as u64)
}
