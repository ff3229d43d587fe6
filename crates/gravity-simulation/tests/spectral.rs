//! FFT and Poisson solver properties on the host processor

use gravity_physics::{deposit_mass, direct_accelerations, gradient, interpolate, Grid, Particle};
use gravity_simulation::fft::{to_complex, CpuFft, Direction, FftProcessor};
use gravity_simulation::poisson::{solve, solve_cpu};
use glam::DVec3;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_grid(n: usize, seed: u64) -> Grid<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..n * n).map(|_| rng.random::<f64>() * 2.0 - 1.0).collect();
    Grid::from_vec(n, n, data).unwrap()
}

#[test]
fn round_trip_recovers_real_grids() {
    let mut cpu = CpuFft::new();
    for (seed, n) in [64usize, 128, 256].into_iter().enumerate() {
        let input = to_complex(&random_grid(n, seed as u64));
        let spectrum = cpu.fft_2d(&input).unwrap();
        let output = cpu.ifft_2d(&spectrum).unwrap();

        let max_err = input
            .as_slice()
            .iter()
            .zip(output.as_slice())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max);
        assert!(max_err < 1e-10, "{n}x{n} round trip error {max_err}");
    }
}

#[test]
fn parseval_holds_in_one_dimension() {
    let mut rng = StdRng::seed_from_u64(42);
    let n = 1024;
    let signal: Vec<Complex64> = (0..n)
        .map(|_| Complex64::new(rng.random::<f64>() - 0.5, rng.random::<f64>() - 0.5))
        .collect();
    let spectrum = CpuFft::new().fft_1d(&signal).unwrap();

    let time_energy: f64 = signal.iter().map(|c| c.norm_sqr()).sum();
    let freq_energy: f64 = spectrum.iter().map(|c| c.norm_sqr()).sum::<f64>() / n as f64;
    assert!((time_energy - freq_energy).abs() < 1e-10 * time_energy.max(1.0));
}

#[test]
fn non_power_of_two_matches_direct_sum() {
    let n = 12;
    let signal: Vec<Complex64> = (0..n).map(|i| Complex64::new(i as f64, 0.0)).collect();
    let spectrum = CpuFft::new().transform(&signal, Direction::Forward);
    let dc: f64 = (0..n).map(|i| i as f64).sum();
    assert!((spectrum[0].re - dc).abs() < 1e-9);
    assert!(spectrum[0].im.abs() < 1e-9);

    let back = CpuFft::new().transform(&spectrum, Direction::Inverse);
    for (a, b) in signal.iter().zip(&back) {
        assert!((a - b).norm() < 1e-9);
    }
}

#[test]
fn point_mass_potential_is_a_well() {
    let n = 32;
    let particles = [Particle::at_rest(1.0, DVec3::ZERO)];
    let density = deposit_mass(&particles, n, n);
    assert_eq!(density[(16, 16)], 1.0);

    let phi = solve_cpu(&density, 1.0, &CpuFft::new());
    let centre = phi[(16, 16)];
    assert!(centre < 0.0);

    let directions: [(i64, i64); 8] = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (1, -1), (-1, 1), (-1, -1)];
    for (dx, dz) in directions {
        let at = |d: i64| phi[((16 + dx * d) as usize, (16 + dz * d) as usize)];
        for d in 0..5 {
            assert!(at(d) < 0.0, "positive potential at distance {d} along ({dx}, {dz})");
            assert!(
                at(d + 1).abs() < at(d).abs(),
                "|Φ| not decreasing at distance {d} along ({dx}, {dz})"
            );
        }
    }
}

#[test]
fn equal_masses_attract() {
    let n = 32;
    let particles = [
        Particle::at_rest(1.0, DVec3::new(-5.0, 0.0, 0.0)),
        Particle::at_rest(1.0, DVec3::new(5.0, 0.0, 0.0)),
    ];
    let density = deposit_mass(&particles, n, n);
    let field = gradient(&solve_cpu(&density, 1.0, &CpuFft::new()));

    let (left_x, left_z) = interpolate(particles[0].position, &field);
    let (right_x, right_z) = interpolate(particles[1].position, &field);
    assert!(left_x > 0.0);
    assert!(right_x < 0.0);
    assert!((left_x + right_x).abs() < 1e-9);
    assert!(left_z.abs() < 1e-9 && right_z.abs() < 1e-9);
}

#[test]
fn mesh_forces_agree_with_direct_sum() {
    let n = 32;
    let particles = [
        Particle::at_rest(1.0, DVec3::new(-5.0, 0.0, 0.0)),
        Particle::at_rest(3.0, DVec3::new(5.0, 0.0, 0.0)),
    ];
    let density = deposit_mass(&particles, n, n);
    let field = gradient(&solve_cpu(&density, 1.0, &CpuFft::new()));
    let mesh: Vec<(f64, f64)> = particles.iter().map(|p| interpolate(p.position, &field)).collect();
    let direct = direct_accelerations(&particles, 1.0, false);

    for (i, ((ax, az), reference)) in mesh.iter().zip(&direct).enumerate() {
        assert_eq!(ax.signum(), reference.x.signum(), "particle {i} pulled the wrong way");
        assert!(az.abs() < 1e-9 && reference.z.abs() < 1e-12);
        // the 2D periodic mesh force falls off as 1/r, the direct sum as 1/r²
        let ratio = ax / reference.x;
        assert!((1.0..50.0).contains(&ratio), "particle {i} mesh/direct ratio {ratio}");
    }

    // both obey action = reaction: m₁a₁ = -m₂a₂
    let mesh_ratio = mesh[0].0 / -mesh[1].0;
    let direct_ratio = direct[0].x / -direct[1].x;
    assert!((direct_ratio - 3.0).abs() < 1e-12);
    assert!((mesh_ratio - 3.0).abs() < 1e-6, "mesh ratio {mesh_ratio}");
}

#[test]
fn solve_through_trait_object() {
    let density = random_grid(16, 7);
    let mut processor: Box<dyn FftProcessor> = Box::new(CpuFft::new());
    let dynamic = solve(&density, 1.0, processor.as_mut()).unwrap();
    let direct = solve_cpu(&density, 1.0, &CpuFft::new());
    assert_eq!(dynamic, direct);
}

#[test]
fn empty_grid_is_a_configuration_error() {
    let empty: Grid<Complex64> = Grid::new(0, 0);
    assert!(CpuFft::new().fft_2d(&empty).is_err());
}
