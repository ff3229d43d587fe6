//! Headless particle-mesh gravity runner
//!
//! Steps a simulation built from defaults and logs statistics and backend
//! status at a fixed interval. Device selection follows
//! `GRAVITY_PM_ADAPTER` and `GRAVITY_PM_WGPU_BACKEND`.

use gravity_simulation::{DeviceOptions, Simulation, SimulationConfig};
use std::collections::VecDeque;
use std::time::Instant;

const PARTICLE_COUNT: usize = 2000;
const GRID_SIZE: usize = 256;
const STEPS: u64 = 2000;
const DT: f64 = 0.01;
const LOG_INTERVAL: u64 = 100;
const CALIBRATION_SAMPLES: usize = 3;
const CENTRAL_MASS: f64 = 5000.0;

fn main() {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting particle-mesh gravity simulation...");

    let config = SimulationConfig::default()
        .with_grid(GRID_SIZE, GRID_SIZE)
        .with_particle_count(PARTICLE_COUNT)
        .with_central_mass(CENTRAL_MASS)
        .with_device_options(DeviceOptions::from_env());

    let mut simulation = match Simulation::new(config) {
        Ok(simulation) => simulation,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    simulation.calibrate(CALIBRATION_SAMPLES);
    if let Some(info) = simulation.fallback_manager().device_info() {
        log::info!("✓ Using compute device: {info}");
    }

    let initial = simulation.stats();
    log::info!(
        "✓ {} particles, total mass {:.1}",
        simulation.particles().len(),
        initial.total_mass
    );
    let mut step_times: VecDeque<f64> = VecDeque::with_capacity(LOG_INTERVAL as usize);

    for step in 1..=STEPS {
        let start = Instant::now();
        simulation.step(DT);
        step_times.push_back(start.elapsed().as_secs_f64() * 1000.0);
        if step_times.len() > LOG_INTERVAL as usize {
            step_times.pop_front();
        }

        if step % LOG_INTERVAL == 0 {
            let stats = simulation.stats();
            let status = simulation.backend_status();
            let avg_step = step_times.iter().sum::<f64>() / step_times.len() as f64;
            log::info!(
                "step {} t={:.2} | {:.2}ms/step | KE={:.3e} | |Δp|={:.3e} | {:?}{}{}",
                stats.steps,
                stats.time,
                avg_step,
                stats.kinetic_energy,
                (stats.total_momentum - initial.total_momentum).length(),
                status.mode,
                if status.has_error { " (error)" } else { "" },
                if status.is_fallback { " (fallback)" } else { "" },
            );
        }

        if simulation.backend_status().has_error && step % (LOG_INTERVAL * 5) == 0 {
            match simulation.attempt_recovery() {
                Ok(()) => log::info!("✓ Compute device recovered"),
                Err(e) => log::debug!("Recovery not possible: {e}"),
            }
        }
    }

    for (kind, stats) in simulation.fallback_manager().performance_stats() {
        log::info!(
            "{kind}: {} solves, {:.3}ms average",
            stats.count,
            stats.average_ms
        );
    }

    simulation.shutdown();
    log::info!("✓ Done");
}
