//! Spectral Poisson solver: ∇²Φ = 4πGρ on a periodic grid

use crate::error::SimulationError;
use crate::fft::{real_part, to_complex, CpuFft, Direction, FftProcessor};
use gravity_physics::Grid;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Angular wavenumber of frequency bin `index` on an axis of length `n`.
/// Bins above `n/2` alias to negative frequencies.
pub fn wavenumber(index: usize, n: usize) -> f64 {
    let k = if index > n / 2 {
        index as f64 - n as f64
    } else {
        index as f64
    };
    k * 2.0 * PI / n as f64
}

/// Multiply each bin by `-4πG/k²`; the DC bin is zeroed
pub fn apply_greens_function(spectrum: &mut Grid<Complex64>, g: f64) {
    let (w, h) = (spectrum.width(), spectrum.height());
    let kx: Vec<f64> = (0..w).map(|u| wavenumber(u, w)).collect();
    for v in 0..h {
        let kz = wavenumber(v, h);
        for (u, cell) in spectrum.row_mut(v).iter_mut().enumerate() {
            let k2 = kx[u] * kx[u] + kz * kz;
            if k2 == 0.0 {
                *cell = Complex64::new(0.0, 0.0);
            } else {
                *cell *= -4.0 * PI * g / k2;
            }
        }
    }
}

/// Potential from density using any FFT processor
pub fn solve<P: FftProcessor + ?Sized>(
    density: &Grid<f64>,
    g: f64,
    processor: &mut P,
) -> Result<Grid<f64>, SimulationError> {
    let mut spectrum = processor.fft_2d(&to_complex(density))?;
    apply_greens_function(&mut spectrum, g);
    let potential = processor.ifft_2d(&spectrum)?;
    Ok(real_part(&potential))
}

/// Host-only solve; cannot fail
pub fn solve_cpu(density: &Grid<f64>, g: f64, cpu: &CpuFft) -> Grid<f64> {
    let mut spectrum = cpu.transform_2d(&to_complex(density), Direction::Forward);
    apply_greens_function(&mut spectrum, g);
    real_part(&cpu.transform_2d(&spectrum, Direction::Inverse))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wavenumbers_alias_above_nyquist() {
        let n = 8;
        assert_eq!(wavenumber(0, n), 0.0);
        assert!((wavenumber(1, n) - 2.0 * PI / 8.0).abs() < 1e-15);
        // index n/2 stays positive
        assert!((wavenumber(4, n) - PI).abs() < 1e-15);
        assert!((wavenumber(5, n) + 3.0 * 2.0 * PI / 8.0).abs() < 1e-15);
        assert!((wavenumber(7, n) + 2.0 * PI / 8.0).abs() < 1e-15);
    }

    #[test]
    fn dc_bin_is_zeroed() {
        let mut spectrum = Grid::filled(4, 4, Complex64::new(3.0, 1.0));
        apply_greens_function(&mut spectrum, 1.0);
        assert_eq!(spectrum[(0, 0)], Complex64::new(0.0, 0.0));
        assert!(spectrum[(1, 0)].re < 0.0);
    }

    #[test]
    fn potential_has_zero_mean() {
        let mut density = Grid::new(16, 16);
        density[(3, 4)] = 10.0;
        density[(9, 12)] = 5.0;
        let phi = solve_cpu(&density, 1.0, &CpuFft);
        assert!(phi.sum().abs() < 1e-9);
    }

    #[test]
    fn single_mode_is_solved_exactly() {
        // ρ = cos(2πx/n) → Φ = -4πG/k² · cos(2πx/n)
        let n = 32;
        let k = 2.0 * PI / n as f64;
        let mut density = Grid::new(n, n);
        for j in 0..n {
            for i in 0..n {
                density[(i, j)] = (k * i as f64).cos();
            }
        }
        let phi = solve_cpu(&density, 1.0, &CpuFft);
        let scale = -4.0 * PI / (k * k);
        for i in 0..n {
            assert!((phi[(i, 5)] - scale * (k * i as f64).cos()).abs() < 1e-8);
        }
    }

    #[test]
    fn generic_and_cpu_paths_agree() {
        let mut density = Grid::new(8, 8);
        density[(2, 2)] = 1.0;
        let a = solve(&density, 2.0, &mut CpuFft).unwrap();
        let b = solve_cpu(&density, 2.0, &CpuFft);
        assert_eq!(a, b);
    }
}
