//! Fourier transforms over complex grids
//!
//! Two processors implement [`FftProcessor`]: [`CpuFft`], always available,
//! and [`DeviceFft`], a wgpu compute pipeline. Inverse transforms apply the
//! `1/N` normalization exactly once.

pub mod cpu;
pub mod device;

pub use cpu::CpuFft;
pub use device::{ComputeContext, DeviceFft, DeviceInfo, FftPlan, PlanKey, PlanKind, Precision};

use crate::error::SimulationError;
use gravity_physics::Grid;
use num_complex::Complex64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Inverse,
}

impl Direction {
    /// `+1` forward, `-1` inverse
    pub fn sign(self) -> i32 {
        match self {
            Self::Forward => 1,
            Self::Inverse => -1,
        }
    }

    /// Twiddle factor `exp(∓2πi·m/n)` for this direction
    pub fn twiddle(self, m: usize, n: usize) -> Complex64 {
        let theta = 2.0 * std::f64::consts::PI * m as f64 / n as f64;
        Complex64::new(theta.cos(), -(self.sign() as f64) * theta.sin())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProcessorKind {
    Cpu,
    Device,
}

impl std::fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Device => write!(f, "device"),
        }
    }
}

pub trait FftProcessor: Send {
    fn kind(&self) -> ProcessorKind;

    fn fft_1d(&mut self, data: &[Complex64]) -> Result<Vec<Complex64>, SimulationError>;

    fn ifft_1d(&mut self, data: &[Complex64]) -> Result<Vec<Complex64>, SimulationError>;

    fn fft_2d(&mut self, grid: &Grid<Complex64>) -> Result<Grid<Complex64>, SimulationError>;

    fn ifft_2d(&mut self, grid: &Grid<Complex64>) -> Result<Grid<Complex64>, SimulationError>;
}

pub fn is_power_of_two(n: usize) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// Real grid promoted to complex with zero imaginary part
pub fn to_complex(grid: &Grid<f64>) -> Grid<Complex64> {
    grid.map(|&re| Complex64::new(re, 0.0))
}

pub fn real_part(grid: &Grid<Complex64>) -> Grid<f64> {
    grid.map(|c| c.re)
}
