//! Particle state and system-wide totals

use crate::constants::RADIUS_SCALE;
use bytemuck::{Pod, Zeroable};
use glam::DVec3;

/// A massive body living on the simulation plane.
///
/// Positions and velocities are full 3D vectors but the particle-mesh solver
/// only acts on x and z; y is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: DVec3,
    pub velocity: DVec3,
    /// Always > 0
    pub mass: f64,
    /// Derived from mass, used for rendering only
    pub radius: f64,
}

impl Particle {
    /// Create a particle with radius `mass^(1/3) * RADIUS_SCALE`
    pub fn new(mass: f64, position: DVec3, velocity: DVec3) -> Self {
        Self {
            position,
            velocity,
            mass,
            radius: mass.cbrt() * RADIUS_SCALE,
        }
    }

    /// Create a particle at rest
    pub fn at_rest(mass: f64, position: DVec3) -> Self {
        Self::new(mass, position, DVec3::ZERO)
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.length_squared()
    }

    pub fn momentum(&self) -> DVec3 {
        self.velocity * self.mass
    }

    /// Pack into the f32 layout used by GPU-side consumers
    pub fn to_gpu(&self) -> GpuParticle {
        GpuParticle {
            position: self.position.as_vec3().to_array(),
            radius: self.radius as f32,
            velocity: self.velocity.as_vec3().to_array(),
            mass: self.mass as f32,
        }
    }
}

/// GPU-compatible particle structure
/// Aligned for WGSL struct compatibility (two vec4 slots)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuParticle {
    /// Position in 3D space
    pub position: [f32; 3],
    /// Radius for rendering
    pub radius: f32,

    /// Velocity vector
    pub velocity: [f32; 3],
    /// Mass of the particle
    pub mass: f32,
}

pub fn total_mass(particles: &[Particle]) -> f64 {
    particles.iter().map(|p| p.mass).sum()
}

pub fn total_momentum(particles: &[Particle]) -> DVec3 {
    particles.iter().map(Particle::momentum).sum()
}

pub fn total_kinetic_energy(particles: &[Particle]) -> f64 {
    particles.iter().map(Particle::kinetic_energy).sum()
}

/// Pack a whole particle set for upload
pub fn to_gpu_particles(particles: &[Particle]) -> Vec<GpuParticle> {
    particles.iter().map(Particle::to_gpu).collect()
}
