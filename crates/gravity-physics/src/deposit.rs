//! Cloud-in-cell mass deposition

use crate::grid::Grid;
use crate::math::{grid_coordinate, split_cell};
use crate::particle::Particle;

/// Rasterize particle masses onto a `width × height` density grid.
///
/// Each particle spreads its mass bilinearly over the four cells around its
/// continuous grid coordinate. Particles whose base cell is in the last
/// row/column or outside the grid are dropped.
pub fn deposit_mass(particles: &[Particle], width: usize, height: usize) -> Grid<f64> {
    let mut density = Grid::new(width, height);
    for p in particles {
        deposit_particle(&mut density, p);
    }
    density
}

fn deposit_particle(density: &mut Grid<f64>, p: &Particle) {
    let (w, h) = (density.width(), density.height());
    let g = grid_coordinate(p.position, w, h);
    let (i, fx) = split_cell(g.x);
    let (j, fz) = split_cell(g.y);

    if i < 0 || j < 0 || i >= w as i64 - 1 || j >= h as i64 - 1 {
        return;
    }
    let (i, j) = (i as usize, j as usize);

    density[(i, j)] += p.mass * (1.0 - fx) * (1.0 - fz);
    density[(i + 1, j)] += p.mass * fx * (1.0 - fz);
    density[(i, j + 1)] += p.mass * (1.0 - fx) * fz;
    density[(i + 1, j + 1)] += p.mass * fx * fz;
}
