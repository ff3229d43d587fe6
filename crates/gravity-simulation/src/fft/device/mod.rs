//! wgpu FFT processor
//!
//! Power-of-two grids run as a multi-dispatch Cooley-Tukey pipeline
//! (bit-reversal then `log2 n` butterfly stages per axis, ping-ponging between
//! two storage buffers, one compute pass per stage). Other sizes run a single
//! direct-DFT dispatch. If the Cooley-Tukey path fails the same transform is
//! retried with the direct DFT before any error reaches the caller.

pub mod buffers;
pub mod context;
pub mod kernels;
pub mod plan;

pub use buffers::GridBuffers;
pub use context::{ComputeContext, DeviceInfo};
pub use kernels::Kernel;
pub use plan::{FftPlan, PlanKey, PlanKind};

use super::{Direction, FftProcessor, ProcessorKind};
use crate::error::SimulationError;
use crate::params::DeviceOptions;
use gravity_physics::Grid;
use num_complex::Complex64;

/// Floating-point width the device computes in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Precision {
    F32,
    /// Requires `wgpu::Features::SHADER_F64`
    F64,
}

impl Precision {
    pub fn from_features(features: wgpu::Features) -> Self {
        if features.contains(wgpu::Features::SHADER_F64) {
            Self::F64
        } else {
            Self::F32
        }
    }

    pub fn wgsl_scalar(self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Bytes per scalar
    pub fn scalar_size(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// Expected max abs deviation from a double-precision host transform,
    /// per unit of input magnitude
    pub fn relative_tolerance(self) -> f64 {
        match self {
            Self::F32 => 1.0e-6,
            Self::F64 => 1.0e-10,
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wgsl_scalar())
    }
}

/// FFT processor backed by a [`ComputeContext`]
pub struct DeviceFft {
    context: ComputeContext,
}

impl DeviceFft {
    pub fn new(options: &DeviceOptions) -> Result<Self, SimulationError> {
        Ok(Self {
            context: ComputeContext::new(options)?,
        })
    }

    pub fn from_context(context: ComputeContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ComputeContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ComputeContext {
        &mut self.context
    }

    pub fn info(&self) -> &DeviceInfo {
        self.context.info()
    }

    pub fn shutdown(&mut self) {
        self.context.shutdown();
    }

    /// Run one 2D transform, demoting to the direct DFT if Cooley-Tukey fails
    pub fn transform(
        &mut self,
        width: usize,
        height: usize,
        data: &[Complex64],
        direction: Direction,
    ) -> Result<Vec<Complex64>, SimulationError> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(SimulationError::Configuration(format!(
                "device transform of {} values does not fit a {width}x{height} grid",
                data.len()
            )));
        }

        let key = PlanKey::new(width, height, direction);
        let plan = match self.context.create_plan(key) {
            Ok(plan) => plan,
            Err(err) if key.preferred_kind() == PlanKind::CooleyTukey => {
                log::warn!("Cooley-Tukey FFT plan {width}x{height} failed ({err}), using direct DFT");
                return self.run_demoted(key, data);
            }
            Err(err) => return Err(err),
        };

        match plan.execute(&self.context, data) {
            Ok(out) => Ok(out),
            Err(err) if plan.kind() == PlanKind::CooleyTukey => {
                log::warn!("Cooley-Tukey FFT {width}x{height} failed ({err}), retrying with direct DFT");
                self.run_demoted(key, data)
            }
            Err(err) => Err(err),
        }
    }

    fn run_demoted(&mut self, key: PlanKey, data: &[Complex64]) -> Result<Vec<Complex64>, SimulationError> {
        let plan = self.context.demote_plan(key)?;
        plan.execute(&self.context, data)
    }

    fn transform_grid(
        &mut self,
        grid: &Grid<Complex64>,
        direction: Direction,
    ) -> Result<Grid<Complex64>, SimulationError> {
        let out = self.transform(grid.width(), grid.height(), grid.as_slice(), direction)?;
        Grid::from_vec(grid.width(), grid.height(), out).ok_or_else(|| {
            SimulationError::BackendExecution("device returned a grid of the wrong size".into())
        })
    }
}

impl FftProcessor for DeviceFft {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Device
    }

    fn fft_1d(&mut self, data: &[Complex64]) -> Result<Vec<Complex64>, SimulationError> {
        self.transform(data.len(), 1, data, Direction::Forward)
    }

    fn ifft_1d(&mut self, data: &[Complex64]) -> Result<Vec<Complex64>, SimulationError> {
        self.transform(data.len(), 1, data, Direction::Inverse)
    }

    fn fft_2d(&mut self, grid: &Grid<Complex64>) -> Result<Grid<Complex64>, SimulationError> {
        self.transform_grid(grid, Direction::Forward)
    }

    fn ifft_2d(&mut self, grid: &Grid<Complex64>) -> Result<Grid<Complex64>, SimulationError> {
        self.transform_grid(grid, Direction::Inverse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_follows_shader_f64() {
        assert_eq!(Precision::from_features(wgpu::Features::SHADER_F64), Precision::F64);
        assert_eq!(Precision::from_features(wgpu::Features::empty()), Precision::F32);
        assert_eq!(Precision::F64.scalar_size(), 8);
        assert_eq!(Precision::F32.to_string(), "f32");
    }
}
