//! Per-call orchestration: parameters, planning, the stage drivers and intermediate cleanup.

pub mod driver;
pub mod params;
pub mod plan;
pub mod temp;
