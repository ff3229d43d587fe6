//! # Gravity Physics
//!
//! Particle state and the grid-side pieces of a 2D periodic particle-mesh
//! gravity solver: mass deposition, force fields, and the leapfrog integrator.
//! The spectral Poisson solve lives in `gravity-simulation`.

pub mod constants;
pub mod deposit;
pub mod field;
pub mod forces;
pub mod grid;
pub mod integrator;
pub mod math;
pub mod particle;
pub mod spawn;

pub use constants::*;
pub use deposit::*;
pub use field::*;
pub use forces::*;
pub use grid::*;
pub use integrator::*;
pub use particle::*;
pub use spawn::*;
