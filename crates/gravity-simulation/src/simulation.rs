//! Particle-mesh simulation manager
//!
//! Owns the particles, the grids of the last solve, both FFT processors, and
//! a handle to the (possibly shared) fallback manager. The device processor
//! is created lazily the first time a step could use it.

use crate::error::SimulationError;
use crate::fallback::{BackendMode, BackendStatus, FallbackManager};
use crate::fft::{CpuFft, DeviceFft, ProcessorKind};
use crate::params::SimulationConfig;
use crate::poisson;
use gravity_physics::{
    deposit_mass, gradient, kick_drift_kick, spawn_particles, spawn_with_central_mass, total_kinetic_energy,
    total_mass, total_momentum, ForceField, Grid, Particle,
};
use glam::DVec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Instant;

/// Per-step summary for logging
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationStats {
    pub steps: u64,
    pub time: f64,
    pub total_mass: f64,
    pub total_momentum: DVec3,
    pub kinetic_energy: f64,
}

pub struct Simulation {
    config: SimulationConfig,
    particles: Vec<Particle>,

    density: Grid<f64>,
    potential: Grid<f64>,
    force_field: ForceField,

    cpu: CpuFft,
    device: Option<DeviceFft>,
    device_attempted: bool,
    fallback: Arc<FallbackManager>,

    paused: bool,
    time: f64,
    steps: u64,
}

impl Simulation {
    /// Validate `config` and spawn its particles
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let (w, h, count) = (config.width, config.height, config.particle_count);
        let particles = match config.central_mass {
            Some(mass) => spawn_with_central_mass(count, w, h, mass, &mut rng),
            None => spawn_particles(count, w, h, &mut rng),
        };
        Self::with_particles(config, particles)
    }

    /// Validate `config` and take an explicit particle set
    pub fn with_particles(config: SimulationConfig, particles: Vec<Particle>) -> Result<Self, SimulationError> {
        config.validate()?;
        if let Some(p) = particles.iter().find(|p| !(p.mass > 0.0)) {
            return Err(SimulationError::Configuration(format!(
                "particle masses must be positive, got {}",
                p.mass
            )));
        }

        let (w, h) = (config.width, config.height);
        let fallback = Arc::new(FallbackManager::new(config.backend_mode));
        log::info!(
            "Simulation {}x{} with {} particles, backend {:?}",
            w,
            h,
            particles.len(),
            config.backend_mode
        );

        Ok(Self {
            density: Grid::new(w, h),
            potential: Grid::new(w, h),
            force_field: ForceField::zeros(w, h),
            config,
            particles,
            cpu: CpuFft::new(),
            device: None,
            device_attempted: false,
            fallback,
            paused: false,
            time: 0.0,
            steps: 0,
        })
    }

    /// Share a fallback manager with other simulations. The manager's mode
    /// is left as it is.
    pub fn with_fallback_manager(mut self, manager: Arc<FallbackManager>) -> Self {
        self.fallback = manager;
        self
    }

    /// Advance one kick-drift-kick step. Does nothing while paused.
    pub fn step(&mut self, dt: f64) {
        if self.paused {
            return;
        }
        self.ensure_device();

        let (w, h) = (self.config.width, self.config.height);
        let correction = self.config.force_correction;
        let mut particles = std::mem::take(&mut self.particles);
        let field = kick_drift_kick(&mut particles, dt, w, h, correction, |ps| self.compute_forces(ps));
        self.particles = particles;
        self.force_field = field;

        self.time += dt;
        self.steps += 1;
    }

    /// deposit → solve → gradient, keeping the grids for the read-only views
    fn compute_forces(&mut self, particles: &[Particle]) -> ForceField {
        let density = deposit_mass(particles, self.config.width, self.config.height);
        let potential = self.solve_potential(&density);
        let field = gradient(&potential);
        self.density = density;
        self.potential = potential;
        field
    }

    fn solve_potential(&mut self, density: &Grid<f64>) -> Grid<f64> {
        let g = self.config.gravitational_constant;

        if self.fallback.processor() == ProcessorKind::Device {
            if let Some(device) = self.device.as_mut() {
                let start = Instant::now();
                match poisson::solve(density, g, device) {
                    Ok(potential) => {
                        self.fallback.record_performance(ProcessorKind::Device, start.elapsed());
                        return potential;
                    }
                    Err(err) => self.fallback.report_device_error(&err),
                }
            }
        }

        let start = Instant::now();
        let potential = poisson::solve_cpu(density, g, &self.cpu);
        self.fallback.record_performance(ProcessorKind::Cpu, start.elapsed());
        potential
    }

    /// Create the device processor once, unless the CPU is forced
    fn ensure_device(&mut self) {
        if self.device_attempted || self.fallback.mode() == BackendMode::ForceCpu {
            return;
        }
        self.device_attempted = true;

        match DeviceFft::new(&self.config.device) {
            Ok(device) => {
                self.fallback.set_device_available(true, Some(device.info().clone()));
                self.device = Some(device);
            }
            Err(err) => {
                log::warn!("No compute device, staying on CPU: {err}");
                self.fallback.set_device_available(false, None);
                self.fallback.report_device_error(&err);
            }
        }
    }

    /// Time `samples` solves of the current density on each processor so
    /// that `Auto` has history to choose from
    pub fn calibrate(&mut self, samples: usize) {
        self.ensure_device();
        let g = self.config.gravitational_constant;
        let density = deposit_mass(&self.particles, self.config.width, self.config.height);

        for _ in 0..samples {
            let start = Instant::now();
            let _ = poisson::solve_cpu(&density, g, &self.cpu);
            self.fallback.record_performance(ProcessorKind::Cpu, start.elapsed());
        }

        if self.fallback.has_error() {
            return;
        }
        let Some(device) = self.device.as_mut() else {
            return;
        };
        for _ in 0..samples {
            let start = Instant::now();
            match poisson::solve(&density, g, device) {
                Ok(_) => self
                    .fallback
                    .record_performance(ProcessorKind::Device, start.elapsed()),
                Err(err) => {
                    self.fallback.report_device_error(&err);
                    break;
                }
            }
        }
        log::info!("Calibration done: {:?}", self.fallback.performance_stats());
    }

    /// Rebuild the device processor if possible and clear the error state.
    /// Fails only when no device was ever available.
    pub fn attempt_recovery(&mut self) -> Result<(), SimulationError> {
        let options = self.config.device.clone();
        let mut replacement = None;
        self.fallback.attempt_recovery(|| {
            let device = DeviceFft::new(&options)?;
            let info = device.info().clone();
            replacement = Some(device);
            Ok(info)
        })?;
        if let Some(device) = replacement {
            if let Some(mut old) = self.device.replace(device) {
                old.shutdown();
            }
        }
        Ok(())
    }

    /// Release the device. Later steps run on the CPU.
    pub fn shutdown(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.shutdown();
        }
        self.device_attempted = true;
        self.fallback.set_device_available(false, None);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn density_grid(&self) -> &Grid<f64> {
        &self.density
    }

    /// Potential from the second solve of the last step
    pub fn potential_grid(&self) -> &Grid<f64> {
        &self.potential
    }

    pub fn force_field(&self) -> &ForceField {
        &self.force_field
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn set_backend_mode(&self, mode: BackendMode) {
        self.fallback.set_mode(mode);
    }

    pub fn backend_status(&self) -> BackendStatus {
        self.fallback.status()
    }

    pub fn fallback_manager(&self) -> &Arc<FallbackManager> {
        &self.fallback
    }

    pub fn device(&self) -> Option<&DeviceFft> {
        self.device.as_ref()
    }

    pub fn device_mut(&mut self) -> Option<&mut DeviceFft> {
        self.device.as_mut()
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn step_count(&self) -> u64 {
        self.steps
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            steps: self.steps,
            time: self.time,
            total_mass: total_mass(&self.particles),
            total_momentum: total_momentum(&self.particles),
            kinetic_energy: total_kinetic_energy(&self.particles),
        }
    }
}
