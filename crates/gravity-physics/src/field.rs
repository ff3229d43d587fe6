//! Force field from a potential grid

use crate::grid::Grid;
use crate::math::{grid_coordinate, split_cell};
use glam::DVec3;

/// Acceleration components on the simulation plane
#[derive(Debug, Clone, PartialEq)]
pub struct ForceField {
    pub accel_x: Grid<f64>,
    pub accel_z: Grid<f64>,
}

impl ForceField {
    /// All-zero field
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            accel_x: Grid::new(width, height),
            accel_z: Grid::new(width, height),
        }
    }

    pub fn width(&self) -> usize {
        self.accel_x.width()
    }

    pub fn height(&self) -> usize {
        self.accel_x.height()
    }
}

/// Periodic central-difference gradient, negated: a = -∇Φ
pub fn gradient(potential: &Grid<f64>) -> ForceField {
    let (w, h) = (potential.width(), potential.height());
    let mut field = ForceField::zeros(w, h);
    if w == 0 || h == 0 {
        return field;
    }

    for j in 0..h {
        let (jm, jp) = ((j + h - 1) % h, (j + 1) % h);
        for i in 0..w {
            let (im, ip) = ((i + w - 1) % w, (i + 1) % w);
            field.accel_x[(i, j)] = -(potential[(ip, j)] - potential[(im, j)]) / 2.0;
            field.accel_z[(i, j)] = -(potential[(i, jp)] - potential[(i, jm)]) / 2.0;
        }
    }
    field
}

/// Bilinear acceleration at a world position; `(0, 0)` off the grid
pub fn interpolate(position: DVec3, field: &ForceField) -> (f64, f64) {
    let (w, h) = (field.width(), field.height());
    let g = grid_coordinate(position, w, h);
    let (i, fx) = split_cell(g.x);
    let (j, fz) = split_cell(g.y);

    if i < 0 || j < 0 || i >= w as i64 - 1 || j >= h as i64 - 1 {
        return (0.0, 0.0);
    }
    let (i, j) = (i as usize, j as usize);

    let sample = |grid: &Grid<f64>| {
        grid[(i, j)] * (1.0 - fx) * (1.0 - fz)
            + grid[(i + 1, j)] * fx * (1.0 - fz)
            + grid[(i, j + 1)] * (1.0 - fx) * fz
            + grid[(i + 1, j + 1)] * fx * fz
    };
    (sample(&field.accel_x), sample(&field.accel_z))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_potential(w: usize, h: usize) -> Grid<f64> {
        let mut phi = Grid::new(w, h);
        for j in 0..h {
            for i in 0..w {
                phi[(i, j)] = i as f64 + 2.0 * j as f64;
            }
        }
        phi
    }

    #[test]
    fn gradient_of_linear_potential() {
        let field = gradient(&linear_potential(8, 8));
        for j in 1..7 {
            for i in 1..7 {
                assert!((field.accel_x[(i, j)] + 1.0).abs() < 1e-12);
                assert!((field.accel_z[(i, j)] + 2.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn gradient_wraps_periodically() {
        let field = gradient(&linear_potential(8, 8));
        // Φ(7) - Φ(1) at i = 0 spans the seam
        assert!((field.accel_x[(0, 3)] - -(1.0 - 7.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn interpolation_is_bilinear() {
        let mut field = ForceField::zeros(4, 4);
        field.accel_x[(2, 2)] = 1.0;
        field.accel_x[(3, 2)] = 3.0;
        // grid coordinate (2.5, 2.0)
        let (ax, az) = interpolate(DVec3::new(0.5, 0.0, 0.0), &field);
        assert!((ax - 2.0).abs() < 1e-12);
        assert_eq!(az, 0.0);
    }

    #[test]
    fn interpolation_is_zero_off_grid() {
        let mut field = ForceField::zeros(4, 4);
        field.accel_x = Grid::filled(4, 4, 1.0);
        assert_eq!(interpolate(DVec3::new(1.5, 0.0, 0.0), &field), (0.0, 0.0));
        assert_eq!(interpolate(DVec3::new(-2.5, 0.0, 0.0), &field), (0.0, 0.0));
        assert_eq!(interpolate(DVec3::new(0.0, 0.0, 0.0), &field).0, 1.0);
    }
}
