//! Background precalculation workers and the cube generation pipeline.
#![forbid(unsafe_code)]

mod pipeline;
mod precalc;
mod tasks;
mod terrain;

pub use pipeline::{CubeGenerator, PipelineStats};
pub use precalc::{NoisePrecalc, PrecalcStats};
pub use tasks::{TaskPool, TaskStats};
pub use terrain::DensityTerrain;
