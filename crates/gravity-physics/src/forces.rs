//! Direct-summation gravity
//!
//! NOTE: These are reference implementations for validation and testing.
//! The actual simulation uses the particle-mesh solver.

use crate::constants::*;
use crate::particle::Particle;
use glam::DVec3;

/// Schwarzschild radius r_s = 2Gm/c²
pub fn schwarzschild_radius(mass: f64, g: f64) -> f64 {
    2.0 * g * mass / (C * C)
}

/// Heuristic weak-field correction factor 1 + 3·r_s/(2d)
pub fn relativistic_correction(source_mass: f64, distance: f64, g: f64) -> f64 {
    if distance <= 0.0 {
        return 1.0;
    }
    1.0 + 3.0 * schwarzschild_radius(source_mass, g) / (2.0 * distance)
}

/// Acceleration of `target` due to `source`
/// a = G * m_source / r² along the separation
pub fn gravitational_acceleration(target: &Particle, source: &Particle, g: f64, relativistic: bool) -> DVec3 {
    let r_vec = source.position - target.position;
    let r = r_vec.length() + SOFTENING;

    if r < SOFTENING * 2.0 {
        return DVec3::ZERO;
    }

    let mut magnitude = g * source.mass / (r * r);
    if relativistic {
        magnitude *= relativistic_correction(source.mass, r, g);
    }
    r_vec.normalize() * magnitude
}

/// Pairwise-summed acceleration for every particle (O(N²))
pub fn direct_accelerations(particles: &[Particle], g: f64, relativistic: bool) -> Vec<DVec3> {
    particles
        .iter()
        .enumerate()
        .map(|(i, target)| {
            particles
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, source)| gravitational_acceleration(target, source, g, relativistic))
                .sum()
        })
        .collect()
}
