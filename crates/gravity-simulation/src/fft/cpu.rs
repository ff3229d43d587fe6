//! Host FFT: iterative radix-2 with an O(N²) DFT for other lengths

use super::{is_power_of_two, Direction, FftProcessor, ProcessorKind};
use crate::error::SimulationError;
use gravity_physics::Grid;
use num_complex::Complex64;

#[derive(Clone, Copy, Debug, Default)]
pub struct CpuFft;

impl CpuFft {
    pub fn new() -> Self {
        Self
    }

    /// Normalized 1D transform (inverse scaled by 1/n)
    pub fn transform(&self, data: &[Complex64], direction: Direction) -> Vec<Complex64> {
        let mut out = data.to_vec();
        transform_in_place(&mut out, direction);
        out
    }

    /// Rows then columns
    pub fn transform_2d(&self, grid: &Grid<Complex64>, direction: Direction) -> Grid<Complex64> {
        let mut out = grid.clone();
        for j in 0..out.height() {
            transform_in_place(out.row_mut(j), direction);
        }
        for i in 0..out.width() {
            let mut column = out.column(i);
            transform_in_place(&mut column, direction);
            out.set_column(i, &column);
        }
        out
    }
}

/// Transform `data` in place; power-of-two lengths take the radix-2 path
pub fn transform_in_place(data: &mut [Complex64], direction: Direction) {
    let n = data.len();
    if n <= 1 {
        return;
    }
    if is_power_of_two(n) {
        radix2(data, direction);
    } else {
        let out = naive_dft(data, direction);
        data.copy_from_slice(&out);
    }
    if direction == Direction::Inverse {
        let scale = 1.0 / n as f64;
        for v in data.iter_mut() {
            *v *= scale;
        }
    }
}

fn bit_reverse_permute(data: &mut [Complex64]) {
    let n = data.len();
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            data.swap(i, j);
        }
    }
}

/// Unnormalized decimation-in-time Cooley-Tukey
fn radix2(data: &mut [Complex64], direction: Direction) {
    let n = data.len();
    bit_reverse_permute(data);

    let twiddles: Vec<Complex64> = (0..n / 2).map(|m| direction.twiddle(m, n)).collect();

    let mut span = 2;
    while span <= n {
        let half = span / 2;
        let stride = n / span;
        for base in (0..n).step_by(span) {
            for k in 0..half {
                let t = twiddles[k * stride] * data[base + k + half];
                let u = data[base + k];
                data[base + k] = u + t;
                data[base + k + half] = u - t;
            }
        }
        span *= 2;
    }
}

/// Unnormalized O(N²) DFT
fn naive_dft(data: &[Complex64], direction: Direction) -> Vec<Complex64> {
    let n = data.len();
    (0..n)
        .map(|k| {
            data.iter()
                .enumerate()
                .map(|(t, &x)| x * direction.twiddle((k * t) % n, n))
                .sum()
        })
        .collect()
}

fn check_shape(grid: &Grid<Complex64>) -> Result<(), SimulationError> {
    if grid.is_empty() {
        return Err(SimulationError::Configuration(format!(
            "cannot transform an empty {}x{} grid",
            grid.width(),
            grid.height()
        )));
    }
    Ok(())
}

impl FftProcessor for CpuFft {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Cpu
    }

    fn fft_1d(&mut self, data: &[Complex64]) -> Result<Vec<Complex64>, SimulationError> {
        Ok(self.transform(data, Direction::Forward))
    }

    fn ifft_1d(&mut self, data: &[Complex64]) -> Result<Vec<Complex64>, SimulationError> {
        Ok(self.transform(data, Direction::Inverse))
    }

    fn fft_2d(&mut self, grid: &Grid<Complex64>) -> Result<Grid<Complex64>, SimulationError> {
        check_shape(grid)?;
        Ok(self.transform_2d(grid, Direction::Forward))
    }

    fn ifft_2d(&mut self, grid: &Grid<Complex64>) -> Result<Grid<Complex64>, SimulationError> {
        check_shape(grid)?;
        Ok(self.transform_2d(grid, Direction::Inverse))
    }
}
