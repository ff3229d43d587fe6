//! Kick-drift-kick leapfrog on the periodic plane

use crate::field::{interpolate, ForceField};
use crate::particle::Particle;

/// `v += a * dt * correction` using the field sampled at each particle
pub fn kick(particles: &mut [Particle], field: &ForceField, dt: f64, correction: f64) {
    for p in particles.iter_mut() {
        let (ax, az) = interpolate(p.position, field);
        p.velocity.x += ax * dt * correction;
        p.velocity.z += az * dt * correction;
    }
}

/// `x += v * dt`, wrapping x and z at ±half-extent
pub fn drift(particles: &mut [Particle], dt: f64, width: usize, height: usize) {
    let (half_w, half_h) = (width as f64 / 2.0, height as f64 / 2.0);
    for p in particles.iter_mut() {
        p.position += p.velocity * dt;
        p.position.x = wrap(p.position.x, half_w);
        p.position.z = wrap(p.position.z, half_h);
    }
}

/// A coordinate past one edge jumps to exactly the opposite edge
#[inline]
fn wrap(x: f64, half: f64) -> f64 {
    if x > half {
        -half
    } else if x < -half {
        half
    } else {
        x
    }
}

/// One leapfrog step in a fixed field
pub fn leapfrog_step(particles: &mut [Particle], field: &ForceField, dt: f64, correction: f64) {
    kick(particles, field, dt * 0.5, correction);
    drift(particles, dt, field.width(), field.height());
    kick(particles, field, dt * 0.5, correction);
}

/// One KDK step with forces recomputed after the drift.
///
/// `forces` maps the current particle set to a force field. It is called
/// twice: once for the opening half kick and once, after the drift, for the
/// closing half kick. Returns the field from the second call.
pub fn kick_drift_kick<F>(
    particles: &mut [Particle],
    dt: f64,
    width: usize,
    height: usize,
    correction: f64,
    mut forces: F,
) -> ForceField
where
    F: FnMut(&[Particle]) -> ForceField,
{
    let field = forces(particles);
    kick(particles, &field, dt * 0.5, correction);
    drift(particles, dt, width, height);
    let field = forces(particles);
    kick(particles, &field, dt * 0.5, correction);
    field
}
