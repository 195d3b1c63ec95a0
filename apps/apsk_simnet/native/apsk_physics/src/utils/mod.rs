//! Small numeric helpers shared by the simulator modules

mod math;

pub use math::*;
