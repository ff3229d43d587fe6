//! # Gravity Simulation Engine
//!
//! Spectral Poisson solve on CPU or a wgpu device, with automatic fallback to
//! the CPU when the device fails, driving a particle-mesh N-body integrator.

pub mod cache;
pub mod error;
pub mod fallback;
pub mod fft;
pub mod params;
pub mod poisson;
pub mod simulation;

pub use error::*;
pub use fallback::*;
pub use fft::{CpuFft, DeviceFft, Direction, FftProcessor, ProcessorKind};
pub use params::*;
pub use simulation::*;
