//! Physical constants for the particle-mesh simulation
//!
//! These are simplified constants scaled for real-time visualization. One grid
//! cell is one length unit; masses are in arbitrary simulation units.

/// Gravitational constant in simulation units
pub const G: f64 = 1.0;

/// Speed of light in simulation units
/// Only used by the heuristic relativistic correction in the direct-sum
/// reference forces.
pub const C: f64 = 299_792_458.0;

/// Empirical factor applied to every kick.
/// Approximately cancels a particle's attraction to its own deposited mass.
/// Not physically derived; override through the simulation config.
pub const FORCE_CORRECTION_FACTOR: f64 = 0.5;

/// Radius scale for `Particle::new`: radius = mass^(1/3) * RADIUS_SCALE
pub const RADIUS_SCALE: f64 = 0.01;

/// Smallest mass produced by the random spawner
pub const SPAWN_MASS_MIN: f64 = 20.0;

/// Width of the spawner's mass range (masses fall in [MIN, MIN + RANGE))
pub const SPAWN_MASS_RANGE: f64 = 30.0;

/// Fraction of the domain extent the spawner fills, centred on the origin
pub const SPAWN_EXTENT_FRACTION: f64 = 0.8;

/// Reference mass for spawned particle radii: radius = (mass / REF)^(1/3) * SCALE
pub const SPAWN_RADIUS_REFERENCE_MASS: f64 = 20.0;

/// Radius of a spawned particle at the reference mass
pub const SPAWN_RADIUS_SCALE: f64 = 0.5;

/// Softening used by the direct-sum reference to avoid r→0 singularities
pub const SOFTENING: f64 = 1.0e-6;
