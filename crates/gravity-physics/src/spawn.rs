//! Random particle initialization

use crate::constants::*;
use crate::particle::Particle;
use glam::DVec3;
use rand::Rng;

/// Radius of a spawned particle: (mass / 20)^(1/3) * 0.5
pub fn spawn_radius(mass: f64) -> f64 {
    (mass / SPAWN_RADIUS_REFERENCE_MASS).cbrt() * SPAWN_RADIUS_SCALE
}

/// Scatter `count` particles at rest across the central 80% of a
/// `width × depth` domain on the y = 0 plane.
pub fn spawn_particles<R: Rng + ?Sized>(count: usize, width: usize, depth: usize, rng: &mut R) -> Vec<Particle> {
    let (w, d) = (width as f64, depth as f64);
    (0..count)
        .map(|_| {
            let mass = SPAWN_MASS_MIN + rng.random::<f64>() * SPAWN_MASS_RANGE;
            let x = (rng.random::<f64>() - 0.5) * w * SPAWN_EXTENT_FRACTION;
            let z = (rng.random::<f64>() - 0.5) * d * SPAWN_EXTENT_FRACTION;
            Particle {
                position: DVec3::new(x, 0.0, z),
                velocity: DVec3::ZERO,
                mass,
                radius: spawn_radius(mass),
            }
        })
        .collect()
}

/// Same as [`spawn_particles`], with the first particle replaced by a body of
/// `central_mass` at rest at the origin.
pub fn spawn_with_central_mass<R: Rng + ?Sized>(
    count: usize,
    width: usize,
    depth: usize,
    central_mass: f64,
    rng: &mut R,
) -> Vec<Particle> {
    let mut particles = spawn_particles(count, width, depth, rng);
    if let Some(first) = particles.first_mut() {
        *first = Particle {
            position: DVec3::ZERO,
            velocity: DVec3::ZERO,
            mass: central_mass,
            radius: spawn_radius(central_mass),
        };
    }
    particles
}
