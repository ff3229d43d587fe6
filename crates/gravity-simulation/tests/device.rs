//! Device FFT behaviour. Every test returns early when no adapter exists.

use gravity_physics::Grid;
use gravity_simulation::fft::{CpuFft, DeviceFft, Direction, FftProcessor, PlanKey, PlanKind, Precision};
use gravity_simulation::poisson;
use gravity_simulation::{BackendMode, DeviceOptions, Simulation, SimulationConfig};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn device() -> Option<DeviceFft> {
    let _ = env_logger::builder().is_test(true).try_init();
    match DeviceFft::new(&DeviceOptions::from_env()) {
        Ok(device) => {
            eprintln!("Running on {}", device.info());
            Some(device)
        }
        Err(e) => {
            eprintln!("Skipping device test: {e}");
            None
        }
    }
}

fn random_complex(w: usize, h: usize, seed: u64) -> Grid<Complex64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..w * h)
        .map(|_| Complex64::new(rng.random::<f64>() * 2.0 - 1.0, 0.0))
        .collect();
    Grid::from_vec(w, h, data).unwrap()
}

/// 1e-6 on an f64 device; an f32 device gets its relative tolerance of the
/// largest possible output magnitude
fn tolerance(precision: Precision, input: &Grid<Complex64>) -> f64 {
    match precision {
        Precision::F64 => 1e-6,
        Precision::F32 => {
            let l1: f64 = input.as_slice().iter().map(|c| c.norm()).sum();
            precision.relative_tolerance() * l1.max(1.0)
        }
    }
}

/// Direct sums accumulate every input into each bin, so f32 error grows faster
fn direct_tolerance(precision: Precision, input: &Grid<Complex64>) -> f64 {
    match precision {
        Precision::F64 => 1e-6,
        Precision::F32 => 4.0 * tolerance(precision, input),
    }
}

fn max_diff(a: &Grid<Complex64>, b: &Grid<Complex64>) -> f64 {
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| (x - y).norm())
        .fold(0.0, f64::max)
}

#[test]
fn repeated_plan_requests_reuse_the_plan() {
    let Some(mut device) = device() else { return };
    let ctx = device.context_mut();
    let key = PlanKey::new(32, 32, Direction::Forward);

    let first = ctx.create_plan(key).unwrap();
    let compiles = ctx.kernel_compile_count();
    let builds = ctx.plan_build_count();

    let second = ctx.create_plan(key).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(ctx.kernel_compile_count(), compiles);
    assert_eq!(ctx.plan_build_count(), builds);
    assert_eq!(first.kind(), PlanKind::CooleyTukey);
    assert!(ctx.plan_cache_stats().hits >= 1);

    // the inverse shares kernels but is its own plan
    let inverse = ctx.create_plan(PlanKey::new(32, 32, Direction::Inverse)).unwrap();
    assert!(!Arc::ptr_eq(&first, &inverse));
    assert_eq!(ctx.kernel_compile_count(), compiles);
}

#[test]
fn non_power_of_two_uses_direct_dft() {
    let Some(mut device) = device() else { return };
    let plan = device
        .context_mut()
        .create_plan(PlanKey::new(12, 10, Direction::Forward))
        .unwrap();
    assert_eq!(plan.kind(), PlanKind::NaiveDft);
    assert_eq!(plan.stage_count(), 1);

    let input = random_complex(12, 10, 3);
    let on_device = device.fft_2d(&input).unwrap();
    let on_host = CpuFft::new().fft_2d(&input).unwrap();
    let tol = direct_tolerance(device.info().precision, &input);
    assert!(max_diff(&on_device, &on_host) < tol);
}

#[test]
fn device_matches_host_transform() {
    let Some(mut device) = device() else { return };
    let precision = device.info().precision;
    let mut cpu = CpuFft::new();

    for (seed, (w, h)) in [(32, 32), (64, 16), (8, 1)].into_iter().enumerate() {
        let input = random_complex(w, h, seed as u64);
        let tol = tolerance(precision, &input);

        let forward = device.fft_2d(&input).unwrap();
        let expected = cpu.fft_2d(&input).unwrap();
        let err = max_diff(&forward, &expected);
        assert!(err < tol, "{w}x{h} forward error {err} >= {tol}");

        let back = device.ifft_2d(&forward).unwrap();
        let err = max_diff(&back, &input);
        assert!(err < tol, "{w}x{h} round trip error {err} >= {tol}");
    }
}

#[test]
fn device_poisson_matches_host() {
    let Some(mut device) = device() else { return };
    let mut density = Grid::new(32, 32);
    density[(16, 16)] = 1.0;
    density[(8, 20)] = 2.0;

    let on_device = poisson::solve(&density, 1.0, &mut device).unwrap();
    let on_host = poisson::solve_cpu(&density, 1.0, &CpuFft::new());
    let scale = on_host.max_abs();
    let tol = match device.info().precision {
        Precision::F64 => 1e-6,
        Precision::F32 => 2e-5 * scale,
    };
    for (a, b) in on_device.as_slice().iter().zip(on_host.as_slice()) {
        assert!((a - b).abs() < tol);
    }
}

#[test]
fn demoted_power_of_two_plan_matches_host() {
    let Some(mut device) = device() else { return };
    for direction in [Direction::Forward, Direction::Inverse] {
        let key = PlanKey::new(16, 16, direction);
        let plan = device.context_mut().demote_plan(key).unwrap();
        assert_eq!(plan.kind(), PlanKind::NaiveDft);
        // later lookups keep the demoted plan
        let cached = device.context_mut().create_plan(key).unwrap();
        assert!(Arc::ptr_eq(&plan, &cached));
    }

    let input = random_complex(16, 16, 21);
    let tol = direct_tolerance(device.info().precision, &input);
    let mut cpu = CpuFft::new();

    let forward = device.fft_2d(&input).unwrap();
    let err = max_diff(&forward, &cpu.fft_2d(&input).unwrap());
    assert!(err < tol, "demoted forward error {err} >= {tol}");

    let back = device.ifft_2d(&forward).unwrap();
    let err = max_diff(&back, &input);
    assert!(err < tol, "demoted round trip error {err} >= {tol}");
}

#[test]
fn device_loss_mid_run_falls_back_to_cpu() {
    let config = SimulationConfig::default()
        .with_grid(32, 32)
        .with_seed(17)
        .with_particle_count(12)
        .with_device_options(DeviceOptions::from_env());
    let mut on_device = Simulation::new(config.clone().with_backend_mode(BackendMode::ForceGpu)).unwrap();
    let mut on_host = Simulation::new(config.with_backend_mode(BackendMode::ForceCpu)).unwrap();

    on_device.step(0.01);
    on_host.step(0.01);
    let Some(device) = on_device.device_mut() else {
        eprintln!("Skipping device test: no adapter");
        return;
    };
    device.shutdown();

    for _ in 0..10 {
        on_device.step(0.01);
        on_host.step(0.01);
    }
    assert_eq!(on_device.step_count(), 11);

    let status = on_device.backend_status();
    assert_eq!(status.mode, BackendMode::ForceCpu);
    assert!(status.has_error);
    assert!(status.is_fallback);
    assert!(on_device.fallback_manager().last_error().is_some_and(|e| e.is_backend()));

    for (a, b) in on_device.particles().iter().zip(on_host.particles()) {
        let dpos = (a.position - b.position).length();
        assert!(dpos < 1e-6, "position differs by {dpos}");
    }
}

#[test]
fn shut_down_device_reports_backend_error() {
    let Some(mut device) = device() else { return };
    device.fft_2d(&random_complex(4, 4, 0)).unwrap();
    assert_eq!(device.context().cached_buffer_count(), 1);

    device.shutdown();
    device.shutdown();
    assert!(device.context().is_shut_down());
    assert_eq!(device.context().cached_buffer_count(), 0);
    assert_eq!(device.context().cached_plan_count(), 0);

    let err = device.fft_2d(&random_complex(4, 4, 0)).unwrap_err();
    assert!(err.is_backend());
}
