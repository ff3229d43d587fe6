//! Simulation and device parameters

use crate::error::SimulationError;
use crate::fallback::BackendMode;
use gravity_physics::{FORCE_CORRECTION_FACTOR, G};
use std::time::Duration;

/// Environment variable selecting the compute adapter (`auto`, an index, or a name substring)
pub const ADAPTER_ENV: &str = "GRAVITY_PM_ADAPTER";
/// Environment variable restricting wgpu backends (`vulkan`, `metal`, `dx12`, `gl`)
pub const BACKEND_ENV: &str = "GRAVITY_PM_WGPU_BACKEND";

/// Default capacity of each device-side cache (plans, kernels, buffers)
pub const DEFAULT_CACHE_CAPACITY: usize = 32;
/// Default bound on a single device wait
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Grid cells along x. Power-of-two widths take the fast device path.
    pub width: usize,
    /// Grid cells along z
    pub height: usize,
    pub particle_count: usize,
    pub gravitational_constant: f64,
    /// Multiplier on every kick
    pub force_correction: f64,
    pub backend_mode: BackendMode,
    /// Heavy body placed at the origin when spawning
    pub central_mass: Option<f64>,
    /// Seed for the particle spawner; `None` draws from the thread RNG
    pub seed: Option<u64>,
    pub device: DeviceOptions,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            particle_count: 10,
            gravitational_constant: G,
            force_correction: FORCE_CORRECTION_FACTOR,
            backend_mode: BackendMode::Auto,
            central_mass: None,
            seed: None,
            device: DeviceOptions::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.width == 0 || self.height == 0 {
            return Err(SimulationError::Configuration(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.gravitational_constant.is_finite() {
            return Err(SimulationError::Configuration(format!(
                "gravitational constant must be finite, got {}",
                self.gravitational_constant
            )));
        }
        if !self.force_correction.is_finite() {
            return Err(SimulationError::Configuration(format!(
                "force correction must be finite, got {}",
                self.force_correction
            )));
        }
        if let Some(mass) = self.central_mass {
            if !(mass.is_finite() && mass > 0.0) {
                return Err(SimulationError::Configuration(format!(
                    "central mass must be positive and finite, got {mass}"
                )));
            }
        }
        self.device.validate()
    }

    pub fn with_grid(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_gravitational_constant(mut self, g: f64) -> Self {
        self.gravitational_constant = g;
        self
    }

    pub fn with_force_correction(mut self, correction: f64) -> Self {
        self.force_correction = correction;
        self
    }

    pub fn with_backend_mode(mut self, mode: BackendMode) -> Self {
        self.backend_mode = mode;
        self
    }

    pub fn with_central_mass(mut self, mass: f64) -> Self {
        self.central_mass = Some(mass);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_device_options(mut self, device: DeviceOptions) -> Self {
        self.device = device;
        self
    }
}

/// How the compute device is chosen and bounded
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceOptions {
    /// `None` or `"auto"`: wgpu's preference. A number selects by enumeration
    /// index, anything else is a case-insensitive name substring.
    pub adapter: Option<String>,
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    /// Capacity of each LRU cache in the compute context
    pub cache_capacity: usize,
    /// Upper bound on one blocking device wait
    pub poll_timeout: Duration,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            adapter: None,
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl DeviceOptions {
    /// Defaults overridden by `GRAVITY_PM_ADAPTER` and `GRAVITY_PM_WGPU_BACKEND`
    pub fn from_env() -> Self {
        let adapter = std::env::var(ADAPTER_ENV).ok();
        let backend = std::env::var(BACKEND_ENV).ok();
        Self::default().with_overrides(adapter.as_deref(), backend.as_deref())
    }

    fn with_overrides(mut self, adapter: Option<&str>, backend: Option<&str>) -> Self {
        self.adapter = adapter
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty() && s != "auto");
        self.backends = match backend.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("vulkan") => wgpu::Backends::VULKAN,
            Some("metal") => wgpu::Backends::METAL,
            Some("dx12") => wgpu::Backends::DX12,
            Some("gl") => wgpu::Backends::GL,
            _ => wgpu::Backends::all(),
        };
        self
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.cache_capacity == 0 {
            return Err(SimulationError::Configuration(
                "device cache capacity must be at least 1".into(),
            ));
        }
        if self.poll_timeout.is_zero() {
            return Err(SimulationError::Configuration(
                "device poll timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.width, 256);
        assert_eq!(config.height, 256);
        assert_eq!(config.particle_count, 10);
        assert_eq!(config.gravitational_constant, 1.0);
        assert_eq!(config.force_correction, 0.5);
        assert_eq!(config.backend_mode, BackendMode::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let err = SimulationConfig::default().with_grid(0, 32).validate();
        assert!(matches!(err, Err(SimulationError::Configuration(_))));
        let err = SimulationConfig::default().with_grid(32, 0).validate();
        assert!(matches!(err, Err(SimulationError::Configuration(_))));
    }

    #[test]
    fn non_finite_constants_are_rejected() {
        let config = SimulationConfig::default().with_gravitational_constant(f64::NAN);
        assert!(config.validate().is_err());
        let config = SimulationConfig::default().with_force_correction(f64::INFINITY);
        assert!(config.validate().is_err());
        let config = SimulationConfig::default().with_central_mass(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_cache_capacity_is_rejected() {
        let device = DeviceOptions {
            cache_capacity: 0,
            ..DeviceOptions::default()
        };
        let config = SimulationConfig::default().with_device_options(device);
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_parse() {
        let opts = DeviceOptions::default().with_overrides(Some(" RTX "), Some("Vulkan"));
        assert_eq!(opts.adapter.as_deref(), Some("rtx"));
        assert_eq!(opts.backends, wgpu::Backends::VULKAN);

        let opts = DeviceOptions::default().with_overrides(Some("auto"), Some("unknown"));
        assert_eq!(opts.adapter, None);
        assert_eq!(opts.backends, wgpu::Backends::all());
    }
}
